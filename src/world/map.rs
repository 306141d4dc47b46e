use std::path::{Path, PathBuf};

use glam::IVec2;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::WorldError;
use crate::world::definitions::{LightType, TileDefinitionTable, TileId, EMPTY_TILE};
use crate::world::factory::TileFactory;
use crate::world::geometry::{row_major_index, Footprint, GridPos, PixelRect};
use crate::world::tile::TileInstance;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layer {
    Base,
    Decoration,
    Object,
}

impl Layer {
    /// Build and day-update order.
    pub const ALL: [Layer; 3] = [Layer::Base, Layer::Decoration, Layer::Object];
    /// Interaction priority: topmost layer first.
    pub const SEARCH_ORDER: [Layer; 3] = [Layer::Object, Layer::Decoration, Layer::Base];

    fn index(self) -> usize {
        match self {
            Layer::Base => 0,
            Layer::Decoration => 1,
            Layer::Object => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MapKind {
    #[default]
    Outside,
    Inside,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitDefinition {
    /// Trigger area in pixels: x, y, width, height.
    pub area: [i32; 4],
    pub destination: String,
    pub spawn: [i32; 2],
}

/// Authored map input. Rows are indexed `[y][x]`; 0 is an empty cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapDefinition {
    pub name: String,
    #[serde(default)]
    pub kind: MapKind,
    pub base: Vec<Vec<TileId>>,
    #[serde(default)]
    pub decoration: Vec<Vec<TileId>>,
    #[serde(default)]
    pub objects: Vec<Vec<TileId>>,
    #[serde(rename = "exit", default)]
    pub exits: Vec<ExitDefinition>,
}

impl MapDefinition {
    pub fn from_file(path: &Path) -> Result<Self, WorldError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content, path)
    }

    pub fn from_toml_str(content: &str, source_path: &Path) -> Result<Self, WorldError> {
        let def: MapDefinition = toml::from_str(content).map_err(|e| WorldError::Content {
            path: PathBuf::from(source_path),
            message: e.to_string(),
        })?;
        def.validate_shape()?;
        Ok(def)
    }

    pub fn height(&self) -> usize {
        self.base.len()
    }

    pub fn width(&self) -> usize {
        self.base.first().map(|r| r.len()).unwrap_or(0)
    }

    pub fn layer(&self, layer: Layer) -> &[Vec<TileId>] {
        match layer {
            Layer::Base => &self.base,
            Layer::Decoration => &self.decoration,
            Layer::Object => &self.objects,
        }
    }

    /// Every non-empty layer must match the base layer's dimensions.
    /// Decoration and object layers may be omitted entirely.
    pub fn validate_shape(&self) -> Result<(), WorldError> {
        let expected = (self.width(), self.height());
        for layer in Layer::ALL {
            let rows = self.layer(layer);
            if rows.is_empty() && layer != Layer::Base {
                continue;
            }
            let ragged = rows.iter().find(|r| r.len() != expected.0);
            if rows.len() != expected.1 || ragged.is_some() {
                return Err(WorldError::LayerShape {
                    map: self.name.clone(),
                    layer,
                    expected,
                    found: (ragged.map(|r| r.len()).unwrap_or(expected.0), rows.len()),
                });
            }
        }
        Ok(())
    }
}

/// Arena index of a tile instance within one map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TileKey(pub u32);

#[derive(Debug, Clone)]
pub struct LayerGrid {
    width: i32,
    height: i32,
    cells: Vec<Option<TileKey>>,
}

impl LayerGrid {
    fn new(width: i32, height: i32) -> Self {
        LayerGrid {
            width,
            height,
            cells: vec![None; (width * height).max(0) as usize],
        }
    }

    fn index(&self, pos: GridPos) -> Option<usize> {
        row_major_index(IVec2::new(self.width, self.height), pos)
    }

    pub fn get(&self, pos: GridPos) -> Option<TileKey> {
        self.index(pos).and_then(|i| self.cells[i])
    }

    fn set(&mut self, pos: GridPos, key: Option<TileKey>) {
        if let Some(i) = self.index(pos) {
            self.cells[i] = key;
        }
    }

    /// Occupied cells in row-major order.
    pub fn occupied(&self) -> impl Iterator<Item = (GridPos, TileKey)> + '_ {
        let w = self.width;
        self.cells.iter().enumerate().filter_map(move |(i, k)| {
            k.map(|key| (IVec2::new(i as i32 % w, i as i32 / w), key))
        })
    }
}

/// Derived walkability: true where any layer's colliding footprint covers the cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollisionGrid {
    width: i32,
    height: i32,
    blocked: Vec<bool>,
}

impl CollisionGrid {
    pub fn new(width: i32, height: i32) -> Self {
        CollisionGrid {
            width,
            height,
            blocked: vec![false; (width * height).max(0) as usize],
        }
    }

    fn index(&self, pos: GridPos) -> Option<usize> {
        row_major_index(IVec2::new(self.width, self.height), pos)
    }

    /// Out-of-bounds cells are never blocked.
    pub fn is_blocked(&self, pos: GridPos) -> bool {
        self.index(pos).map(|i| self.blocked[i]).unwrap_or(false)
    }

    /// Cells outside the grid are skipped silently.
    pub fn mark(&mut self, footprint: &Footprint, value: bool) {
        for cell in footprint.cells() {
            if let Some(i) = self.index(cell) {
                self.blocked[i] = value;
            }
        }
    }

    pub fn merge(&mut self, other: &CollisionGrid) {
        for (mine, theirs) in self.blocked.iter_mut().zip(other.blocked.iter()) {
            *mine |= *theirs;
        }
    }

    pub fn blocked_count(&self) -> usize {
        self.blocked.iter().filter(|b| **b).count()
    }

    pub fn rows(&self) -> impl Iterator<Item = &[bool]> {
        self.blocked.chunks(self.width.max(1) as usize)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapExit {
    pub area: PixelRect,
    pub destination: String,
    pub spawn: GridPos,
}

/// All mutable state of one map: three layers over an instance arena, the
/// derived collision grid and the light list.
#[derive(Debug, Clone)]
pub struct MapState {
    name: String,
    kind: MapKind,
    width: i32,
    height: i32,
    arena: Vec<Option<TileInstance>>,
    free: Vec<TileKey>,
    layers: [LayerGrid; 3],
    collision: CollisionGrid,
    lights: Vec<TileKey>,
    exits: Vec<MapExit>,
}

/// Output of building a single layer before it is merged into a map.
struct BuiltLayer {
    grid: LayerGrid,
    collision: CollisionGrid,
    lights: Vec<TileKey>,
}

impl MapState {
    pub fn empty(name: &str, kind: MapKind, width: i32, height: i32) -> Self {
        MapState {
            name: name.to_string(),
            kind,
            width,
            height,
            arena: Vec::new(),
            free: Vec::new(),
            layers: [
                LayerGrid::new(width, height),
                LayerGrid::new(width, height),
                LayerGrid::new(width, height),
            ],
            collision: CollisionGrid::new(width, height),
            lights: Vec::new(),
            exits: Vec::new(),
        }
    }

    /// Instantiate every layer of `def`. Unknown tile ids are fatal.
    pub fn build(
        def: &MapDefinition,
        table: &TileDefinitionTable,
        factory: &TileFactory,
    ) -> Result<Self, WorldError> {
        def.validate_shape()?;
        let mut state = MapState::empty(&def.name, def.kind, def.width() as i32, def.height() as i32);

        for layer in Layer::ALL {
            let built = state.build_layer(def.layer(layer), layer, table, factory)?;
            state.layers[layer.index()] = built.grid;
            state.collision.merge(&built.collision);
            state.lights.extend(built.lights);
        }

        state.exits = def
            .exits
            .iter()
            .map(|e| MapExit {
                area: PixelRect::new(e.area[0], e.area[1], e.area[2], e.area[3]),
                destination: e.destination.clone(),
                spawn: IVec2::from_array(e.spawn),
            })
            .collect();

        debug!(
            map = %state.name,
            tiles = state.tile_count(),
            lights = state.lights.len(),
            blocked = state.collision.blocked_count(),
            "Map built"
        );
        Ok(state)
    }

    fn build_layer(
        &mut self,
        rows: &[Vec<TileId>],
        layer: Layer,
        table: &TileDefinitionTable,
        factory: &TileFactory,
    ) -> Result<BuiltLayer, WorldError> {
        let mut built = BuiltLayer {
            grid: LayerGrid::new(self.width, self.height),
            collision: CollisionGrid::new(self.width, self.height),
            lights: Vec::new(),
        };
        for (y, row) in rows.iter().enumerate() {
            for (x, &id) in row.iter().enumerate() {
                if id == EMPTY_TILE {
                    continue;
                }
                let pos = IVec2::new(x as i32, y as i32);
                let tile_def = table.get(id).ok_or_else(|| WorldError::UnknownTileId {
                    map: self.name.clone(),
                    layer,
                    x: pos.x,
                    y: pos.y,
                    id,
                })?;
                let instance = factory.create(tile_def, pos, &self.name);
                let emits = instance.light_type() != LightType::None;
                let key = self.alloc(instance);
                built.grid.set(pos, Some(key));
                if tile_def.collides {
                    built.collision.mark(&tile_def.footprint(pos), true);
                }
                if emits {
                    built.lights.push(key);
                }
            }
        }
        Ok(built)
    }

    fn alloc(&mut self, instance: TileInstance) -> TileKey {
        match self.free.pop() {
            Some(key) => {
                self.arena[key.0 as usize] = Some(instance);
                key
            }
            None => {
                self.arena.push(Some(instance));
                TileKey(self.arena.len() as u32 - 1)
            }
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> MapKind {
        self.kind
    }

    pub fn size(&self) -> IVec2 {
        IVec2::new(self.width, self.height)
    }

    pub fn in_bounds(&self, pos: GridPos) -> bool {
        pos.x >= 0 && pos.y >= 0 && pos.x < self.width && pos.y < self.height
    }

    pub fn key_at(&self, layer: Layer, pos: GridPos) -> Option<TileKey> {
        self.layers[layer.index()].get(pos)
    }

    pub fn tile(&self, key: TileKey) -> Option<&TileInstance> {
        self.arena.get(key.0 as usize).and_then(|t| t.as_ref())
    }

    pub fn tile_mut(&mut self, key: TileKey) -> Option<&mut TileInstance> {
        self.arena.get_mut(key.0 as usize).and_then(|t| t.as_mut())
    }

    pub fn tile_at(&self, layer: Layer, pos: GridPos) -> Option<&TileInstance> {
        self.key_at(layer, pos).and_then(|k| self.tile(k))
    }

    pub fn tile_at_mut(&mut self, layer: Layer, pos: GridPos) -> Option<&mut TileInstance> {
        self.key_at(layer, pos).and_then(move |k| self.tile_mut(k))
    }

    pub fn layer(&self, layer: Layer) -> &LayerGrid {
        &self.layers[layer.index()]
    }

    /// Every instance key in base, decoration, object order, each row-major.
    pub fn keys_in_order(&self) -> Vec<(Layer, TileKey)> {
        Layer::ALL
            .iter()
            .flat_map(|&layer| self.layers[layer.index()].occupied().map(move |(_, k)| (layer, k)))
            .collect()
    }

    pub fn tile_count(&self) -> usize {
        self.arena.iter().filter(|t| t.is_some()).count()
    }

    /// Put `instance` into `layer` at its own position, evicting any current
    /// occupant. Light membership follows the instance's light type.
    /// Collision is left to the caller, which owns the definition table.
    pub fn insert(&mut self, layer: Layer, instance: TileInstance) -> Option<TileKey> {
        let pos = instance.position;
        if !self.in_bounds(pos) {
            return None;
        }
        self.remove(layer, pos);
        let emits = instance.light_type() != LightType::None;
        let key = self.alloc(instance);
        self.layers[layer.index()].set(pos, Some(key));
        if emits {
            self.add_light(key);
        }
        Some(key)
    }

    /// Empty the cell and drop its light entry. Collision is left to the caller.
    pub fn remove(&mut self, layer: Layer, pos: GridPos) -> Option<TileInstance> {
        let key = self.key_at(layer, pos)?;
        self.layers[layer.index()].set(pos, None);
        self.remove_light(key);
        let instance = self.arena.get_mut(key.0 as usize).and_then(|t| t.take());
        self.free.push(key);
        instance
    }

    pub fn lights(&self) -> &[TileKey] {
        &self.lights
    }

    /// Idempotent. Rejects keys that are not live light emitters.
    pub fn add_light(&mut self, key: TileKey) -> bool {
        let emits = self
            .tile(key)
            .map(|t| t.light_type() != LightType::None)
            .unwrap_or(false);
        if !emits || self.lights.contains(&key) {
            return false;
        }
        self.lights.push(key);
        true
    }

    /// Idempotent.
    pub fn remove_light(&mut self, key: TileKey) -> bool {
        let before = self.lights.len();
        self.lights.retain(|k| *k != key);
        self.lights.len() != before
    }

    pub fn collision(&self) -> &CollisionGrid {
        &self.collision
    }

    pub fn collision_mut(&mut self) -> &mut CollisionGrid {
        &mut self.collision
    }

    /// Re-derive collision from every live instance in every layer.
    pub fn rebuild_collision(&mut self, table: &TileDefinitionTable) {
        let mut grid = CollisionGrid::new(self.width, self.height);
        for layer in &self.layers {
            for (_, key) in layer.occupied() {
                let Some(tile) = self.tile(key) else { continue };
                if let Some(def) = table.get(tile.base_tile_id) {
                    if def.collides {
                        grid.mark(&def.footprint(tile.position), true);
                    }
                }
            }
        }
        self.collision = grid;
    }

    pub fn exits(&self) -> &[MapExit] {
        &self.exits
    }
}
