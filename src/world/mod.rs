pub mod definitions;
pub mod factory;
pub mod geometry;
pub mod growth;
pub mod interaction;
pub mod lighting;
pub mod manager;
pub mod map;
pub mod placement;
pub mod player;
pub mod render;
pub mod tile;

use std::sync::Arc;

use glam::IVec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

use crate::config::content::ContentBundle;
use crate::config::simulation::SimulationConfig;
use crate::error::WorldError;
use crate::items::dropped::{self, DroppedItem};
use crate::items::inventory::{Inventory, ItemSink};
use crate::items::{ItemCategory, ItemRegistry, ToolType};
use crate::simulation::calendar::DayClock;
use crate::simulation::statistics::DayStatistics;
use crate::simulation::weather::WeatherState;
use crate::world::definitions::TileDefinitionTable;
use crate::world::factory::TileFactory;
use crate::world::geometry::GridPos;
use crate::world::interaction::{ClickButton, Interaction, WorldEvent};
use crate::world::lighting::{Flicker, LightField};
use crate::world::manager::MapManager;
use crate::world::map::MapState;
use crate::world::player::Player;
use crate::world::render::MapView;

/// Inventory contents of a fresh world, in slot order.
pub const STARTING_ITEMS: [&str; 6] = [
    "Shears",
    "Spray Bottle",
    "Dahlia Seed",
    "Dahlia Seed",
    "Rocket Pop",
    "Wooden Hoe",
];

/// Everything one running game owns. Passed by `&mut` to the day driver and
/// the interaction layer; nothing here is global.
pub struct World {
    pub config: SimulationConfig,
    pub seed: u64,
    pub items: ItemRegistry,
    pub maps: MapManager,
    pub clock: DayClock,
    pub weather: WeatherState,
    pub player: Player,
    pub inventory: Inventory,
    pub drops: Vec<DroppedItem>,
    /// Host-facing notifications, drained by the caller.
    pub events: Vec<WorldEvent>,
    pub flicker: Flicker,
    pub rng: ChaCha8Rng,
}

impl World {
    /// Precache every map, enter `config.start_map` and stock the inventory.
    pub fn new(config: &SimulationConfig, content: ContentBundle) -> Result<Self, WorldError> {
        let seed = if config.seed == 0 {
            rand::thread_rng().r#gen()
        } else {
            config.seed
        };

        let mut maps = MapManager::new(Arc::new(content.tiles), TileFactory::new());
        maps.precache_all(&content.maps)?;
        maps.load_map(&config.start_map)?;

        let mut inventory = Inventory::new(config.inventory_slots, config.max_stack);
        for name in STARTING_ITEMS {
            match content.items.get(name) {
                Some(item) => {
                    inventory.insert(item.clone());
                }
                None => warn!(item = name, "Starting item missing from the item table"),
            }
        }

        info!(
            seed,
            start_map = %config.start_map,
            maps = content.maps.len(),
            "World created"
        );

        Ok(World {
            config: config.clone(),
            seed,
            items: content.items,
            maps,
            clock: DayClock::new(config.days_per_season),
            weather: WeatherState::default(),
            player: Player::at_cell(IVec2::from_array(config.spawn), config.max_health),
            inventory,
            drops: Vec::new(),
            events: Vec::new(),
            flicker: Flicker::default(),
            rng: ChaCha8Rng::seed_from_u64(seed),
        })
    }

    pub fn table(&self) -> &TileDefinitionTable {
        self.maps.table()
    }

    pub fn current_map(&self) -> Option<&MapState> {
        self.maps.current()
    }

    /// Tile hooks first, topmost layer down; the held item only when no
    /// tile handled the click.
    pub fn click(&mut self, cell: GridPos, button: ClickButton) -> bool {
        let first_event = self.events.len();
        let mut interaction = Interaction {
            maps: &mut self.maps,
            items: &self.items,
            sink: &mut self.inventory,
            drops: &mut self.drops,
            events: &mut self.events,
            rng: &mut self.rng,
            wet: self.weather.is_wet(),
        };
        if interaction.click(cell, button, &self.player) {
            self.follow_travel(first_event);
            return true;
        }
        self.use_held_item(cell, button)
    }

    fn use_held_item(&mut self, cell: GridPos, button: ClickButton) -> bool {
        let Some(item) = self.inventory.selected() else {
            return false;
        };
        match (item.category, button, item.tool) {
            (ItemCategory::Furniture | ItemCategory::Seed, ClickButton::Left, _) => {
                self.place_selected(cell)
            }
            (ItemCategory::Food | ItemCategory::Drink, ClickButton::Right, _) => {
                self.consume_selected()
            }
            (ItemCategory::Tool, ClickButton::Right, Some(tool)) => self.use_tool(cell, tool),
            _ => false,
        }
    }

    /// Swing `tool` at `cell`. Costs health whenever the cell is in reach,
    /// even if nothing there reacts.
    pub fn use_tool(&mut self, cell: GridPos, tool: ToolType) -> bool {
        if !self.player.is_within_reach(cell) {
            return false;
        }
        self.player.add_health(-tool.health_cost());
        let mut interaction = Interaction {
            maps: &mut self.maps,
            items: &self.items,
            sink: &mut self.inventory,
            drops: &mut self.drops,
            events: &mut self.events,
            rng: &mut self.rng,
            wet: self.weather.is_wet(),
        };
        let handled = interaction.use_tool(cell, tool);
        debug!(?tool, x = cell.x, y = cell.y, handled, health = self.player.health, "Tool used");
        handled
    }

    pub fn place_selected(&mut self, cell: GridPos) -> bool {
        let collider = self.player.collider();
        placement::place_selected(&mut self.maps, &self.items, &mut self.inventory, cell, collider)
    }

    /// Eat or drink the selected item.
    pub fn consume_selected(&mut self) -> bool {
        let Some(item) = self.inventory.selected().filter(|i| i.is_consumable()) else {
            return false;
        };
        let health = item.health;
        if let Some(item) = self.inventory.take_selected() {
            self.player.add_health(health);
            debug!(item = %item.name, health, now = self.player.health, "Item consumed");
        }
        true
    }

    /// Switch to `map` and stand the player on `spawn`. Nothing changes when
    /// the map was never loaded.
    pub fn travel(&mut self, map: &str, spawn: GridPos) -> Result<(), WorldError> {
        self.maps.load_map(map)?;
        self.player.teleport(spawn);
        info!(map, x = spawn.x, y = spawn.y, "Travelled");
        Ok(())
    }

    fn follow_travel(&mut self, first_event: usize) {
        let target = self.events[first_event..].iter().find_map(|e| match e {
            WorldEvent::Travel(target) => Some(target.clone()),
            _ => None,
        });
        if let Some(target) = target {
            if let Err(e) = self.travel(&target.map, target.spawn_cell()) {
                warn!(error = %e, "Door leads nowhere");
            }
        }
    }

    /// Take the first exit the player's collider touches. Returns the map
    /// entered, if any.
    pub fn check_exits(&mut self) -> Option<String> {
        let exit = self.maps.exit_touching(&self.player.collider())?.clone();
        match self.travel(&exit.destination, exit.spawn) {
            Ok(()) => Some(exit.destination),
            Err(e) => {
                warn!(error = %e, "Exit leads nowhere");
                None
            }
        }
    }

    /// Sleep until 06:00 and start the next day.
    pub fn sleep(&mut self) -> DayStatistics {
        self.clock.fast_forward_to_hour(6);
        crate::simulation::advance_one_day(self)
    }

    /// One frame: exits, flicker, the clock (advancing the day on rollover)
    /// and dropped items. Returns the day report when a day ended.
    pub fn update(&mut self, dt: f32) -> Option<DayStatistics> {
        if self.check_exits().is_some() {
            return None;
        }
        self.flicker.update(dt);
        let report = self
            .clock
            .tick(dt)
            .then(|| crate::simulation::advance_one_day(self));
        let map = self.maps.current_name().unwrap_or_default();
        let collected = dropped::update_all(
            &mut self.drops,
            map,
            dt,
            self.player.center(),
            &mut self.inventory,
        );
        if collected > 0 {
            debug!(collected, "Dropped items collected");
        }
        report
    }

    pub fn light_field(&self) -> LightField {
        LightField::capture(&self.maps, &self.clock, &self.weather, &self.flicker)
    }

    pub fn view(&self) -> Option<MapView> {
        self.current_map()
            .map(|state| render::map_view(state, self.table(), &self.clock))
    }

    pub fn drain_events(&mut self) -> Vec<WorldEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::map::Layer;
    use crate::world::tile::{Behavior, GrassState};

    fn world() -> World {
        let config = SimulationConfig {
            seed: 7,
            ..SimulationConfig::default()
        };
        World::new(&config, ContentBundle::embedded().unwrap()).unwrap()
    }

    fn select(world: &mut World, name: &str) {
        let slot = world
            .inventory
            .slots()
            .iter()
            .position(|s| s.as_ref().is_some_and(|s| s.item.name == name))
            .unwrap();
        world.inventory.select(slot);
    }

    fn grass_at(world: &World, cell: GridPos) -> GrassState {
        *world.maps.tile_at(Layer::Base, cell).unwrap().grass().unwrap()
    }

    #[test]
    fn new_world_starts_on_configured_map() {
        let w = world();
        assert_eq!(w.maps.current_name(), Some("Home Base"));
        assert_eq!(w.maps.maps().count(), 3);
        assert_eq!(w.player.anchor_cell(), IVec2::new(5, 5));
        assert_eq!(w.player.health, 100);
        assert_eq!(w.seed, 7);
    }

    #[test]
    fn starting_inventory_is_stocked() {
        let w = world();
        assert_eq!(w.inventory.count("Shears"), 1);
        assert_eq!(w.inventory.count("Dahlia Seed"), 2);
        assert_eq!(w.inventory.count("Wooden Hoe"), 1);
        assert_eq!(w.inventory.selected().unwrap().name, "Shears");
    }

    #[test]
    fn unknown_start_map_fails() {
        let config = SimulationConfig {
            start_map: "Atlantis".into(),
            ..SimulationConfig::default()
        };
        let err = World::new(&config, ContentBundle::embedded().unwrap()).err().unwrap();
        assert!(matches!(err, WorldError::MapNotFound(name) if name == "Atlantis"));
    }

    #[test]
    fn hoe_costs_health_even_when_nothing_reacts() {
        let mut w = world();
        select(&mut w, "Wooden Hoe");
        let cell = IVec2::new(5, 6);
        assert!(w.click(cell, ClickButton::Right));
        assert!(grass_at(&w, cell).tilled);
        assert_eq!(w.player.health, 98);

        // Spray on untilled grass: nothing handles it, health still drops.
        select(&mut w, "Spray Bottle");
        assert!(!w.click(IVec2::new(4, 5), ClickButton::Right));
        assert_eq!(w.player.health, 97);
    }

    #[test]
    fn tools_out_of_reach_are_free() {
        let mut w = world();
        assert!(!w.use_tool(IVec2::new(9, 9), ToolType::Hoe));
        assert_eq!(w.player.health, 100);
    }

    #[test]
    fn till_then_plant_a_seed() {
        let mut w = world();
        let cell = IVec2::new(6, 5);
        select(&mut w, "Dahlia Seed");
        assert!(!w.click(cell, ClickButton::Left), "untilled grass refuses the seed");
        assert!(w.use_tool(cell, ToolType::Hoe));
        select(&mut w, "Dahlia Seed");
        assert!(w.click(cell, ClickButton::Left));
        let plant = w.maps.tile_at(Layer::Object, cell).unwrap();
        assert_eq!(plant.growth().unwrap().species, "Dahlia");
        assert_eq!(w.inventory.count("Dahlia Seed"), 1);
    }

    #[test]
    fn consuming_food_restores_health_and_uses_it_up() {
        let mut w = world();
        w.player.health = 50;
        select(&mut w, "Rocket Pop");
        assert!(w.click(IVec2::new(5, 5), ClickButton::Right));
        assert_eq!(w.player.health, 60);
        assert_eq!(w.inventory.count("Rocket Pop"), 0);
        assert!(!w.consume_selected());
    }

    #[test]
    fn door_click_travels_between_maps() {
        let mut w = world();
        w.player.teleport(IVec2::new(14, 7));
        assert!(w.click(IVec2::new(14, 6), ClickButton::Right));
        assert_eq!(w.maps.current_name(), Some("House"));
        assert_eq!(w.player.anchor_cell(), IVec2::new(3, 8));

        assert!(w.click(IVec2::new(3, 9), ClickButton::Right));
        assert_eq!(w.maps.current_name(), Some("Home Base"));
        assert_eq!(w.player.anchor_cell(), IVec2::new(14, 7));
        let events = w.drain_events();
        assert_eq!(events.len(), 2);
        assert!(w.events.is_empty());
    }

    #[test]
    fn uncollected_drops_stay_on_their_map() {
        let mut w = world();
        let item = w.items.get("Daffodil").unwrap().clone();
        let drop = DroppedItem::spawn(item, "Home Base", IVec2::new(12, 2), &mut w.rng);
        let start = drop.position;
        w.drops.push(drop);

        w.travel("House", IVec2::new(3, 8)).unwrap();
        for _ in 0..30 {
            w.update(1.0 / 60.0);
        }
        assert_eq!(w.drops.len(), 1);
        assert_eq!(w.drops[0].position, start);

        w.travel("Home Base", IVec2::new(5, 5)).unwrap();
        for _ in 0..120 {
            w.update(1.0 / 60.0);
        }
        assert_eq!(w.drops.len(), 1, "out of the player's reach");
        assert!(w.drops[0].has_landed());
        assert_eq!(w.drops[0].map, "Home Base");
    }

    #[test]
    fn travel_to_unknown_map_keeps_current() {
        let mut w = world();
        assert!(w.travel("Atlantis", IVec2::ONE).is_err());
        assert_eq!(w.maps.current_name(), Some("Home Base"));
        assert_eq!(w.player.anchor_cell(), IVec2::new(5, 5));
    }

    #[test]
    fn walking_into_an_exit_changes_map() {
        let mut w = world();
        w.player.teleport(IVec2::new(19, 4));
        assert_eq!(w.update(0.016), None);
        assert_eq!(w.maps.current_name(), Some("Beech Forest"));
        assert_eq!(w.player.anchor_cell(), IVec2::new(1, 4));
        assert_eq!(w.check_exits(), None);
    }

    #[test]
    fn sleeping_starts_the_next_morning() {
        let mut w = world();
        w.player.health = 10;
        let report = w.sleep();
        assert_eq!(report.day, 1);
        assert_eq!(w.clock.days_played(), 1);
        assert_eq!(w.clock.clock_string(), "6:00 AM");
        assert_eq!(w.player.health, 100);
    }

    #[test]
    fn update_rolls_the_day_over() {
        let mut w = world();
        let mut reports = 0;
        for _ in 0..400 {
            if w.update(1.0).is_some() {
                reports += 1;
            }
        }
        assert_eq!(reports, 1);
        assert_eq!(w.clock.days_played(), 1);
    }

    #[test]
    fn sprayed_cell_grows_planted_seed_overnight() {
        let mut w = world();
        let cell = IVec2::new(6, 5);
        w.use_tool(cell, ToolType::Hoe);
        select(&mut w, "Dahlia Seed");
        assert!(w.place_selected(cell));
        assert!(w.use_tool(cell, ToolType::WateringCan));
        w.weather = WeatherState::default();
        w.sleep();
        let plant = w.maps.tile_at(Layer::Object, cell).unwrap();
        assert_eq!(plant.growth().unwrap().stage, 1);
        assert!(matches!(
            w.maps.tile_at(Layer::Base, cell).unwrap().behavior,
            Behavior::Grass(GrassState { tilled: true, .. })
        ));
    }

    #[test]
    fn views_reflect_the_current_map() {
        let w = world();
        let view = w.view().unwrap();
        assert_eq!(view.name, "Home Base");
        assert_eq!((view.width, view.height), (20, 12));
        let field = w.light_field();
        assert_eq!(field.lights.len(), 1);
    }
}
