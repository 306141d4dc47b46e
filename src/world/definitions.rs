use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use glam::IVec2;
use serde::{Deserialize, Serialize};

use crate::error::WorldError;
use crate::world::geometry::{Footprint, GridPos, TILE_SIZE};

/// Table key of a tile definition. 0 marks an empty cell in map layers.
pub type TileId = u16;

pub const EMPTY_TILE: TileId = 0;

/// Which runtime behavior a definition instantiates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BehaviorKind {
    #[default]
    Static,
    Wall,
    Floor,
    Dirt,
    Grass,
    FlowerPlant,
    FlowerBush,
    FlowerTree,
    Tree,
    Lamp,
    InvisibleLight,
    Candle,
    Fireplace,
    Furniture,
    Fence,
    Bed,
    Window,
    Animated,
    Sky,
    BibleStand,
    Mailbox,
    Bridge,
    Door,
}

impl BehaviorKind {
    pub fn light_type(self) -> LightType {
        match self {
            BehaviorKind::Lamp => LightType::Bulb,
            BehaviorKind::InvisibleLight | BehaviorKind::Candle | BehaviorKind::Fireplace => {
                LightType::Flame
            }
            _ => LightType::None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LightType {
    None,
    Flame,
    Bulb,
}

/// Destination of a door tile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoorTarget {
    pub map: String,
    pub spawn: [i32; 2],
}

impl DoorTarget {
    pub fn spawn_cell(&self) -> GridPos {
        IVec2::from_array(self.spawn)
    }
}

fn default_collider_size() -> [i32; 2] {
    [1, 1]
}
fn default_source() -> [i32; 4] {
    [0, 0, TILE_SIZE, TILE_SIZE]
}

/// Immutable per-id tile metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileDefinition {
    pub id: TileId,
    pub name: String,
    /// Sprite sheet path; also the key into the shared sheet table.
    pub image: String,
    #[serde(default)]
    pub collides: bool,
    #[serde(default = "default_collider_size")]
    pub collider_size: [i32; 2],
    #[serde(default)]
    pub collider_offset: [i32; 2],
    /// Source rect on the sheet: x, y, width, height in pixels.
    #[serde(default = "default_source")]
    pub source: [i32; 4],
    /// Draw offset in pixels, independent of the collision footprint.
    #[serde(default)]
    pub draw_offset: [i32; 2],
    #[serde(default)]
    pub behavior: BehaviorKind,
    /// Species name for growth variants.
    #[serde(default)]
    pub param: Option<String>,
    /// Window states cycled on right-click, or day backdrops for skies.
    #[serde(default)]
    pub variants: Vec<TileId>,
    /// Night backdrops for skies.
    #[serde(default)]
    pub night_variants: Vec<TileId>,
    #[serde(default)]
    pub door: Option<DoorTarget>,
}

impl TileDefinition {
    pub fn collider_size(&self) -> IVec2 {
        IVec2::from_array(self.collider_size).max(IVec2::ONE)
    }

    pub fn collider_offset(&self) -> IVec2 {
        IVec2::from_array(self.collider_offset)
    }

    /// Collision footprint when anchored at `anchor`.
    pub fn footprint(&self, anchor: GridPos) -> Footprint {
        Footprint::anchored(anchor, self.collider_size(), self.collider_offset())
    }

    /// Footprint used when validating a placement. Beds reserve a second row
    /// for the sleeper on top of their collider.
    pub fn placement_footprint(&self, anchor: GridPos) -> Footprint {
        let size = match self.behavior {
            BehaviorKind::Bed => IVec2::new(3, 2),
            _ => self.collider_size(),
        };
        Footprint::anchored(anchor, size, self.collider_offset())
    }

    pub fn light_type(&self) -> LightType {
        self.behavior.light_type()
    }
}

#[derive(Deserialize)]
struct TileFile {
    #[serde(rename = "tile", default)]
    tiles: Vec<TileDefinition>,
}

/// Catalog of every tile definition, built once at startup and shared read-only.
#[derive(Debug, Clone)]
pub struct TileDefinitionTable {
    definitions: BTreeMap<TileId, TileDefinition>,
    by_name: HashMap<String, TileId>,
    max_footprint: IVec2,
}

impl TileDefinitionTable {
    pub fn from_definitions(definitions: Vec<TileDefinition>) -> Result<Self, WorldError> {
        let mut table = BTreeMap::new();
        let mut by_name = HashMap::new();
        for def in definitions {
            if def.id == EMPTY_TILE {
                return Err(WorldError::ReservedTileId);
            }
            let id = def.id;
            // First definition wins the name lookup; several tiles share names.
            by_name.entry(def.name.clone()).or_insert(id);
            if table.insert(id, def).is_some() {
                return Err(WorldError::DuplicateTileId(id));
            }
        }

        for def in table.values() {
            for &target in def.variants.iter().chain(def.night_variants.iter()) {
                if !table.contains_key(&target) {
                    return Err(WorldError::DanglingReference {
                        tile: def.id,
                        target,
                    });
                }
            }
        }

        let max_footprint = table
            .values()
            .map(|d| d.collider_size())
            .fold(IVec2::ONE, |acc, s| acc.max(s));

        Ok(TileDefinitionTable {
            definitions: table,
            by_name,
            max_footprint,
        })
    }

    pub fn from_file(path: &Path) -> Result<Self, WorldError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content, path)
    }

    pub fn from_toml_str(content: &str, source_path: &Path) -> Result<Self, WorldError> {
        let file: TileFile = toml::from_str(content).map_err(|e| WorldError::Content {
            path: PathBuf::from(source_path),
            message: e.to_string(),
        })?;
        Self::from_definitions(file.tiles)
    }

    pub fn get(&self, id: TileId) -> Option<&TileDefinition> {
        self.definitions.get(&id)
    }

    pub fn by_name(&self, name: &str) -> Option<&TileDefinition> {
        self.by_name.get(name).and_then(|id| self.definitions.get(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &TileDefinition> {
        self.definitions.values()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Largest collider width and height across the whole table.
    pub fn max_footprint(&self) -> IVec2 {
        self.max_footprint
    }

    /// Distinct sprite sheet paths in sorted order.
    pub fn image_paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = self.definitions.values().map(|d| d.image.as_str()).collect();
        paths.sort_unstable();
        paths.dedup();
        paths
    }
}
