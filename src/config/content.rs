use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::WorldError;
use crate::items::ItemRegistry;
use crate::world::definitions::TileDefinitionTable;
use crate::world::map::MapDefinition;

const EMBEDDED_TILES: &str = include_str!("../../assets/tiles.toml");
const EMBEDDED_ITEMS: &str = include_str!("../../assets/items.toml");
const EMBEDDED_MAPS: [(&str, &str); 3] = [
    ("maps/beech_forest.toml", include_str!("../../assets/maps/beech_forest.toml")),
    ("maps/home_base.toml", include_str!("../../assets/maps/home_base.toml")),
    ("maps/house.toml", include_str!("../../assets/maps/house.toml")),
];

/// Everything authored: tile table, item table and map layouts.
#[derive(Debug, Clone)]
pub struct ContentBundle {
    pub tiles: TileDefinitionTable,
    pub items: ItemRegistry,
    pub maps: Vec<MapDefinition>,
}

impl ContentBundle {
    /// Load from `directory` when given, otherwise from the content compiled
    /// into the binary.
    pub fn load(directory: Option<&str>) -> Result<Self, WorldError> {
        match directory {
            Some(dir) => Self::from_directory(Path::new(dir)),
            None => Self::embedded(),
        }
    }

    pub fn embedded() -> Result<Self, WorldError> {
        let root = Path::new("assets");
        let tiles = TileDefinitionTable::from_toml_str(EMBEDDED_TILES, &root.join("tiles.toml"))?;
        let items = ItemRegistry::from_toml_str(EMBEDDED_ITEMS, &root.join("items.toml"))?;
        let maps = EMBEDDED_MAPS
            .iter()
            .map(|(path, content)| MapDefinition::from_toml_str(content, &root.join(path)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::assemble(tiles, items, maps))
    }

    /// Expects `tiles.toml`, `items.toml` and a `maps/` directory of one TOML
    /// file per map. Maps load in file name order.
    pub fn from_directory(dir: &Path) -> Result<Self, WorldError> {
        let tiles = TileDefinitionTable::from_file(&dir.join("tiles.toml"))?;
        let items = ItemRegistry::from_file(&dir.join("items.toml"))?;

        let maps_dir = dir.join("maps");
        let mut paths: Vec<PathBuf> = std::fs::read_dir(&maps_dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "toml"))
            .collect();
        paths.sort();
        let maps = paths
            .iter()
            .map(|p| MapDefinition::from_file(p))
            .collect::<Result<Vec<_>, _>>()?;
        if maps.is_empty() {
            return Err(WorldError::Content {
                path: maps_dir,
                message: "no map files found".to_string(),
            });
        }
        Ok(Self::assemble(tiles, items, maps))
    }

    fn assemble(tiles: TileDefinitionTable, items: ItemRegistry, maps: Vec<MapDefinition>) -> Self {
        let bundle = ContentBundle { tiles, items, maps };
        info!(
            tiles = bundle.tiles.len(),
            items = bundle.items.len(),
            maps = bundle.maps.len(),
            "Content loaded"
        );
        for problem in bundle.dangling_references() {
            warn!(problem = %problem, "Unresolved content reference");
        }
        bundle
    }

    /// Exits and doors pointing at maps that do not exist, and items that
    /// place unknown tiles. These are not fatal: the affected exit or item
    /// simply does nothing.
    pub fn dangling_references(&self) -> Vec<String> {
        let names: BTreeSet<&str> = self.maps.iter().map(|m| m.name.as_str()).collect();
        let mut problems = Vec::new();
        for map in &self.maps {
            for exit in &map.exits {
                if !names.contains(exit.destination.as_str()) {
                    problems.push(format!(
                        "map '{}' has an exit to unknown map '{}'",
                        map.name, exit.destination
                    ));
                }
            }
        }
        for def in self.tiles.iter() {
            if let Some(door) = &def.door {
                if !names.contains(door.map.as_str()) {
                    problems.push(format!(
                        "door tile {} '{}' leads to unknown map '{}'",
                        def.id, def.name, door.map
                    ));
                }
            }
        }
        for item in self.items.iter() {
            if let Some(tile) = &item.placed_tile {
                if self.tiles.by_name(tile).is_none() {
                    problems.push(format!("item '{}' places unknown tile '{}'", item.name, tile));
                }
            }
        }
        problems
    }
}
