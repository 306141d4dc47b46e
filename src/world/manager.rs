use std::collections::BTreeMap;
use std::sync::Arc;

use glam::IVec2;
use tracing::{debug, info};

use crate::error::WorldError;
use crate::world::definitions::{TileDefinitionTable, TileId};
use crate::world::factory::TileFactory;
use crate::world::geometry::{GridPos, PixelRect, TILE_SIZE};
use crate::world::map::{Layer, MapDefinition, MapExit, MapState, TileKey};
use crate::world::tile::TileInstance;

/// Opaque handle the renderer uses to find a loaded sprite sheet.
pub type SheetHandle = usize;

/// Pixel collider of a placed tile, or `None` for tiles that do not collide.
pub fn collider_rect(table: &TileDefinitionTable, tile: &TileInstance) -> Option<PixelRect> {
    let def = table.get(tile.base_tile_id)?;
    if !def.collides {
        return None;
    }
    Some(def.footprint(tile.position).pixel_rect())
}

/// Find the interactable instance in `layer` whose footprint covers `cell`.
///
/// The cell itself is tried first. Because anchors sit at the bottom-left of
/// their footprint, any other owner must lie to the left of or below the
/// cell, within the largest footprint in the table. Those candidates only
/// count if their collider rectangle contains the cell's top-left pixel.
pub fn resolve_interactable(
    state: &MapState,
    table: &TileDefinitionTable,
    layer: Layer,
    cell: GridPos,
) -> Option<TileKey> {
    if let Some(key) = state.key_at(layer, cell) {
        if state.tile(key).is_some_and(|t| t.interactable) {
            return Some(key);
        }
    }

    let click = cell * TILE_SIZE;
    let max = table.max_footprint();
    for dx in 0..max.x {
        for dy in 0..max.y {
            if dx == 0 && dy == 0 {
                continue;
            }
            let anchor = cell + IVec2::new(-dx, dy);
            let Some(key) = state.key_at(layer, anchor) else {
                continue;
            };
            let Some(candidate) = state.tile(key) else {
                continue;
            };
            if !candidate.interactable {
                continue;
            }
            if collider_rect(table, candidate).is_some_and(|r| r.contains(click)) {
                return Some(key);
            }
        }
    }
    None
}

/// Owns every map's state. Maps are built once by `precache_all` and only
/// ever switched between afterwards, so per-tile state survives visits.
pub struct MapManager {
    table: Arc<TileDefinitionTable>,
    factory: TileFactory,
    sheets: BTreeMap<String, SheetHandle>,
    cache: BTreeMap<String, MapState>,
    current: Option<String>,
}

impl MapManager {
    pub fn new(table: Arc<TileDefinitionTable>, factory: TileFactory) -> Self {
        let sheets = table
            .image_paths()
            .into_iter()
            .enumerate()
            .map(|(i, p)| (p.to_string(), i))
            .collect();
        MapManager {
            table,
            factory,
            sheets,
            cache: BTreeMap::new(),
            current: None,
        }
    }

    pub fn table(&self) -> &TileDefinitionTable {
        &self.table
    }

    pub fn sheet(&self, image_path: &str) -> Option<SheetHandle> {
        self.sheets.get(image_path).copied()
    }

    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    /// Build every map not already cached. Returns how many were built.
    pub fn precache_all(&mut self, definitions: &[MapDefinition]) -> Result<usize, WorldError> {
        let mut seen = std::collections::HashSet::new();
        for def in definitions {
            if !seen.insert(def.name.as_str()) {
                return Err(WorldError::DuplicateMap(def.name.clone()));
            }
        }

        let mut built = 0;
        for def in definitions {
            if self.cache.contains_key(&def.name) {
                continue;
            }
            let state = MapState::build(def, &self.table, &self.factory)?;
            self.cache.insert(def.name.clone(), state);
            built += 1;
        }
        info!(built, cached = self.cache.len(), "Maps precached");
        Ok(built)
    }

    /// Make `name` the current map. The outgoing map's state already lives in
    /// the cache, so nothing is copied. Fails without switching when `name`
    /// was never precached.
    pub fn load_map(&mut self, name: &str) -> Result<(), WorldError> {
        if !self.cache.contains_key(name) {
            return Err(WorldError::MapNotFound(name.to_string()));
        }
        let from = self.current.replace(name.to_string());
        debug!(from = ?from, to = name, "Map switched");
        Ok(())
    }

    pub fn current_name(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn current(&self) -> Option<&MapState> {
        self.current.as_ref().and_then(|n| self.cache.get(n))
    }

    pub fn current_mut(&mut self) -> Option<&mut MapState> {
        match &self.current {
            Some(n) => self.cache.get_mut(n),
            None => None,
        }
    }

    pub fn map(&self, name: &str) -> Option<&MapState> {
        self.cache.get(name)
    }

    pub fn map_mut(&mut self, name: &str) -> Option<&mut MapState> {
        self.cache.get_mut(name)
    }

    pub fn is_cached(&self, name: &str) -> bool {
        self.cache.contains_key(name)
    }

    /// Cached maps in name order.
    pub fn maps(&self) -> impl Iterator<Item = &MapState> {
        self.cache.values()
    }

    pub fn maps_mut(&mut self) -> impl Iterator<Item = &mut MapState> {
        self.cache.values_mut()
    }

    pub fn is_in_bounds(&self, pos: GridPos) -> bool {
        self.current().is_some_and(|m| m.in_bounds(pos))
    }

    /// Out-of-bounds cells count as walkable so players can leave by an edge exit.
    pub fn is_walkable(&self, pos: GridPos) -> bool {
        match self.current() {
            Some(m) if m.in_bounds(pos) => !m.collision().is_blocked(pos),
            _ => true,
        }
    }

    pub fn collider_rect(&self, tile: &TileInstance) -> Option<PixelRect> {
        collider_rect(&self.table, tile)
    }

    /// Set or clear the collision footprint of tile `id` anchored at `pos`.
    pub fn update_collision(
        &mut self,
        map: &str,
        pos: GridPos,
        id: TileId,
        blocked: bool,
    ) -> Result<(), WorldError> {
        let footprint = self
            .table
            .get(id)
            .ok_or_else(|| WorldError::UnknownTileId {
                map: map.to_string(),
                layer: Layer::Object,
                x: pos.x,
                y: pos.y,
                id,
            })?
            .footprint(pos);
        let state = self
            .cache
            .get_mut(map)
            .ok_or_else(|| WorldError::MapNotFound(map.to_string()))?;
        state.collision_mut().mark(&footprint, blocked);
        Ok(())
    }

    pub fn tile_at(&self, layer: Layer, pos: GridPos) -> Option<&TileInstance> {
        self.current().and_then(|m| m.tile_at(layer, pos))
    }

    /// Object-layer lookup on a named map, used by tiles that must read the
    /// map they belong to rather than the current one.
    pub fn object_tile_at(&self, map: &str, pos: GridPos) -> Option<&TileInstance> {
        self.map(map).and_then(|m| m.tile_at(Layer::Object, pos))
    }

    pub fn interactable_at(&self, map: &str, layer: Layer, cell: GridPos) -> Option<TileKey> {
        self.map(map)
            .and_then(|m| resolve_interactable(m, &self.table, layer, cell))
    }

    pub fn add_light(&mut self, map: &str, key: TileKey) -> bool {
        self.map_mut(map).is_some_and(|m| m.add_light(key))
    }

    pub fn remove_light(&mut self, map: &str, key: TileKey) -> bool {
        self.map_mut(map).is_some_and(|m| m.remove_light(key))
    }

    /// Flip a light's on state. Returns the new state.
    pub fn toggle_light(&mut self, map: &str, key: TileKey) -> Option<bool> {
        let tile = self.map_mut(map)?.tile_mut(key)?;
        tile.is_on = !tile.is_on;
        Some(tile.is_on)
    }

    /// Light-emitting instances of the current map.
    pub fn lights(&self) -> Vec<&TileInstance> {
        match self.current() {
            Some(m) => m.lights().iter().filter_map(|k| m.tile(*k)).collect(),
            None => Vec::new(),
        }
    }

    /// Instantiate tile `id` at `pos`, registering its light and collision.
    pub fn place_tile(
        &mut self,
        map: &str,
        layer: Layer,
        pos: GridPos,
        id: TileId,
    ) -> Result<TileKey, WorldError> {
        let table = Arc::clone(&self.table);
        let def = table.get(id).ok_or_else(|| WorldError::UnknownTileId {
            map: map.to_string(),
            layer,
            x: pos.x,
            y: pos.y,
            id,
        })?;
        let instance = self.factory.create(def, pos, map);
        let state = self
            .cache
            .get_mut(map)
            .ok_or_else(|| WorldError::MapNotFound(map.to_string()))?;
        let key = state.insert(layer, instance).ok_or(WorldError::OutOfBounds {
            map: map.to_string(),
            x: pos.x,
            y: pos.y,
        })?;
        state.rebuild_collision(&table);
        Ok(key)
    }

    /// Remove the instance at `pos`, unregistering its light and collision.
    pub fn remove_tile(&mut self, map: &str, layer: Layer, pos: GridPos) -> Option<TileInstance> {
        let table = Arc::clone(&self.table);
        let state = self.cache.get_mut(map)?;
        let removed = state.remove(layer, pos)?;
        state.rebuild_collision(&table);
        Some(removed)
    }

    pub fn exit_touching(&self, rect: &PixelRect) -> Option<&MapExit> {
        self.current()?
            .exits()
            .iter()
            .find(|e| e.area.intersects(rect))
    }
}
