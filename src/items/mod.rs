pub mod dropped;
pub mod inventory;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::WorldError;
use crate::world::definitions::{BehaviorKind, TileDefinition, TileDefinitionTable};
use crate::world::growth::{DEAD_FLOWER, ROTTEN_FRUIT, Yield};
use crate::world::placement::{BaseRequirement, PlacementResolver, PlacementRule};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemCategory {
    Food,
    Drink,
    Furniture,
    Seed,
    Tool,
    Flower,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolType {
    Hoe,
    Shears,
    WateringCan,
}

impl ToolType {
    /// Health spent per use.
    pub fn health_cost(self) -> i32 {
        match self {
            ToolType::Hoe => 2,
            ToolType::Shears | ToolType::WateringCan => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedType {
    /// Needs tilled grass.
    FlowerPlant,
    FlowerBush,
    Tree,
}

/// Everything the inventory and UI need to know about one kind of item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDescriptor {
    pub name: String,
    pub category: ItemCategory,
    /// Icon position on the item sheet, in pixels.
    #[serde(default)]
    pub icon: [i32; 2],
    #[serde(default)]
    pub health: i32,
    #[serde(default)]
    pub placed_tile: Option<String>,
    #[serde(default)]
    pub tool: Option<ToolType>,
    #[serde(default)]
    pub seed: Option<SeedType>,
    #[serde(default)]
    pub description: String,
}

impl ItemDescriptor {
    /// Synthesized entry for a furniture tile with no item-table record.
    pub fn furniture_from(def: &TileDefinition) -> Self {
        ItemDescriptor {
            name: def.name.clone(),
            category: ItemCategory::Furniture,
            icon: [def.source[0], def.source[1]],
            health: 0,
            placed_tile: Some(def.name.clone()),
            tool: None,
            seed: None,
            description: String::new(),
        }
    }

    pub fn is_consumable(&self) -> bool {
        matches!(self.category, ItemCategory::Food | ItemCategory::Drink)
    }
}

#[derive(Deserialize)]
struct ItemFile {
    #[serde(rename = "item", default)]
    items: Vec<ItemDescriptor>,
}

/// Name-keyed item table, built once and shared read-only.
#[derive(Debug, Clone, Default)]
pub struct ItemRegistry {
    items: BTreeMap<String, ItemDescriptor>,
}

impl ItemRegistry {
    pub fn from_items(items: Vec<ItemDescriptor>) -> Self {
        ItemRegistry {
            items: items.into_iter().map(|i| (i.name.clone(), i)).collect(),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, WorldError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content, path)
    }

    pub fn from_toml_str(content: &str, source_path: &Path) -> Result<Self, WorldError> {
        let file: ItemFile = toml::from_str(content).map_err(|e| WorldError::Content {
            path: PathBuf::from(source_path),
            message: e.to_string(),
        })?;
        Ok(Self::from_items(file.items))
    }

    pub fn get(&self, name: &str) -> Option<&ItemDescriptor> {
        self.items.get(name)
    }

    /// Items in name order.
    pub fn iter(&self) -> impl Iterator<Item = &ItemDescriptor> {
        self.items.values()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Item produced by picking up a tile.
    pub fn descriptor_for_tile(&self, def: &TileDefinition) -> ItemDescriptor {
        self.get(&def.name)
            .cloned()
            .unwrap_or_else(|| ItemDescriptor::furniture_from(def))
    }

    /// Resolve a harvest yield to an item. Unknown names are logged and skipped.
    pub fn resolve_yield(&self, yielded: &Yield) -> Option<ItemDescriptor> {
        let name = match yielded {
            Yield::Named(name) => name.as_str(),
            Yield::SpoiledFrom(species) => match self.get(species).map(|i| i.category) {
                Some(ItemCategory::Food) => ROTTEN_FRUIT,
                _ => DEAD_FLOWER,
            },
        };
        let item = self.get(name).cloned();
        if item.is_none() {
            warn!(item = name, "Harvest yields an item missing from the item table");
        }
        item
    }
}

impl PlacementResolver for ItemRegistry {
    fn placement_rule(
        &self,
        item: &ItemDescriptor,
        table: &TileDefinitionTable,
    ) -> Option<PlacementRule> {
        let tile_name = item.placed_tile.as_deref().unwrap_or(&item.name);
        let def = table.by_name(tile_name)?;
        let base = match item.category {
            ItemCategory::Seed => match item.seed {
                Some(SeedType::FlowerPlant) => BaseRequirement::TilledGrass,
                _ => BaseRequirement::Grass,
            },
            ItemCategory::Furniture if def.behavior == BehaviorKind::Bed => BaseRequirement::Floor,
            ItemCategory::Furniture => BaseRequirement::GrassOrFloor,
            _ => return None,
        };
        Some(PlacementRule {
            tile_id: def.id,
            base,
        })
    }
}
