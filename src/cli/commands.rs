use std::collections::BTreeMap;

use crate::config::content::ContentBundle;
use crate::config::simulation::SimulationConfig;
use crate::simulation;
use crate::world::map::{Layer, MapState};
use crate::world::render;
use crate::world::World;

fn load_content(config: &SimulationConfig) -> Result<ContentBundle, String> {
    ContentBundle::load(config.content_directory.as_deref())
        .map_err(|e| format!("Failed to load content: {}", e))
}

fn load_world(config: &SimulationConfig) -> Result<World, String> {
    let content = load_content(config)?;
    World::new(config, content).map_err(|e| format!("Failed to build world: {}", e))
}

/// Advance `days` days from a fresh world and print per-day statistics.
pub fn simulate(config: &SimulationConfig, days: u32, json: bool) -> Result<(), String> {
    let mut world = load_world(config)?;

    if !json {
        println!(
            "=== Simulating {} day(s) from {} (seed {}) ===",
            days, config.start_map, world.seed
        );
        println!(
            "{:>5}  {:<22} {:<8} {:>7} {:>6} {:>8} {:>7} {:>8} {:>6}",
            "Day", "Date", "Weather", "Tiles", "Grew", "Untilled", "Tilled", "Watered", "Lights"
        );
        println!("{}", "-".repeat(86));
    }

    for _ in 0..days {
        let stats = simulation::advance_one_day(&mut world);
        if json {
            let line = serde_json::to_string(&stats)
                .map_err(|e| format!("Cannot serialize statistics: {}", e))?;
            println!("{}", line);
        } else {
            println!(
                "{:>5}  {:<22} {:<8} {:>7} {:>6} {:>8} {:>7} {:>8} {:>6}",
                stats.day,
                stats.date,
                format!("{:?}", stats.weather),
                stats.tiles_updated,
                stats.stages_advanced,
                stats.untilled,
                stats.tilled_grass,
                stats.watered_grass,
                stats.lights_on
            );
        }
    }

    if !json {
        println!();
        println!("--- Growth Stages ---");
        let mut stages: BTreeMap<u8, u32> = BTreeMap::new();
        for state in world.maps.maps() {
            for (_, key) in state.keys_in_order() {
                if let Some(growth) = state.tile(key).and_then(|t| t.growth()) {
                    *stages.entry(growth.stage).or_default() += 1;
                }
            }
        }
        if stages.is_empty() {
            println!("  (nothing growing)");
        }
        for (stage, count) in &stages {
            println!("  Stage {}: {}", stage, count);
        }
    }
    Ok(())
}

/// Print a map's layers, collision grid, lights and exits. `map` defaults to
/// the start map.
pub fn inspect(config: &SimulationConfig, map: Option<&str>, json: bool) -> Result<(), String> {
    let world = load_world(config)?;
    let name = map.unwrap_or(config.start_map.as_str());
    let state = world.maps.map(name).ok_or_else(|| {
        let known: Vec<&str> = world.maps.maps().map(|m| m.name()).collect();
        format!("Map '{}' not found (known maps: {})", name, known.join(", "))
    })?;

    if json {
        let view = render::map_view(state, world.table(), &world.clock);
        let out = serde_json::to_string_pretty(&view)
            .map_err(|e| format!("Cannot serialize map view: {}", e))?;
        println!("{}", out);
        return Ok(());
    }

    inspect_map(&world, state);
    Ok(())
}

fn inspect_map(world: &World, state: &MapState) {
    let size = state.size();
    println!("=== Map: {} ===", state.name());
    println!("Kind: {:?}", state.kind());
    println!("Size: {} x {}", size.x, size.y);
    println!("Instances: {}", state.tile_count());
    println!();

    println!("--- Layers ---");
    for layer in Layer::ALL {
        let mut by_name: BTreeMap<&str, u32> = BTreeMap::new();
        for (_, key) in state.layer(layer).occupied() {
            let name = state
                .tile(key)
                .and_then(|t| world.table().get(t.base_tile_id))
                .map(|d| d.name.as_str())
                .unwrap_or("?");
            *by_name.entry(name).or_default() += 1;
        }
        println!("  {:?}: {} tile(s)", layer, by_name.values().sum::<u32>());
        for (name, count) in &by_name {
            println!("    {}: {}", name, count);
        }
    }
    println!();

    println!(
        "--- Collision ({} blocked) ---",
        state.collision().blocked_count()
    );
    for row in state.collision().rows() {
        let line: String = row.iter().map(|&b| if b { '#' } else { '.' }).collect();
        println!("  {}", line);
    }
    println!();

    println!("--- Lights ---");
    if state.lights().is_empty() {
        println!("  (none)");
    }
    for tile in state.lights().iter().filter_map(|k| state.tile(*k)) {
        println!(
            "  {:?} at ({}, {}) {}",
            tile.light_type(),
            tile.position.x,
            tile.position.y,
            if tile.is_on { "on" } else { "off" }
        );
    }
    println!();

    println!("--- Exits ---");
    if state.exits().is_empty() {
        println!("  (none)");
    }
    for exit in state.exits() {
        println!(
            "  [{}, {}, {}x{}] -> {} ({}, {})",
            exit.area.x,
            exit.area.y,
            exit.area.width,
            exit.area.height,
            exit.destination,
            exit.spawn.x,
            exit.spawn.y
        );
    }
}

/// Load the content, precache every map and report unresolved references.
pub fn validate(config: &SimulationConfig) -> Result<(), String> {
    let content = load_content(config)?;
    let problems = content.dangling_references();
    let tiles = content.tiles.len();
    let items = content.items.len();
    let world = World::new(config, content).map_err(|e| format!("Failed to build world: {}", e))?;

    println!("=== Validation ===");
    println!(
        "Content: {}",
        config.content_directory.as_deref().unwrap_or("(embedded)")
    );
    println!("Tiles: {}", tiles);
    println!("Items: {}", items);
    println!("Sprite sheets: {}", world.maps.sheet_count());
    for state in world.maps.maps() {
        let size = state.size();
        println!(
            "  {}: {}x{}, {} instance(s), {} light(s)",
            state.name(),
            size.x,
            size.y,
            state.tile_count(),
            state.lights().len()
        );
    }

    if problems.is_empty() {
        println!("OK");
        Ok(())
    } else {
        for p in &problems {
            println!("  ! {}", p);
        }
        Err(format!("{} unresolved reference(s)", problems.len()))
    }
}
