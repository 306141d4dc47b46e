use glam::IVec2;
use rand::RngCore;

use crate::world::geometry::{row_major_index, GridPos};
use crate::world::manager::MapManager;
use crate::world::map::{Layer, MapState};
use crate::world::tile::{Behavior, DayInput};

/// Per-cell facts one tile's day update may read about its neighbours in
/// other layers. Captured for the whole map before anything changes, so the
/// outcome does not depend on which tile is committed first.
#[derive(Debug, Clone)]
pub struct DaySnapshot {
    size: IVec2,
    water_credit: Vec<bool>,
    planted: Vec<bool>,
}

impl DaySnapshot {
    pub fn capture(state: &MapState, wet: bool) -> Self {
        let size = state.size();
        let len = (size.x * size.y).max(0) as usize;
        let mut snapshot = DaySnapshot {
            size,
            water_credit: vec![false; len],
            planted: vec![false; len],
        };
        for (pos, key) in state.layer(Layer::Base).occupied() {
            let grass = state.tile(key).and_then(|t| t.grass());
            if let (Some(g), Some(i)) = (grass, snapshot.index(pos)) {
                snapshot.water_credit[i] = g.watered || (g.tilled && wet);
            }
        }
        for (pos, key) in state.layer(Layer::Object).occupied() {
            let is_plant = state
                .tile(key)
                .is_some_and(|t| matches!(t.behavior, Behavior::FlowerPlant(_)));
            if let (true, Some(i)) = (is_plant, snapshot.index(pos)) {
                snapshot.planted[i] = true;
            }
        }
        snapshot
    }

    fn index(&self, pos: GridPos) -> Option<usize> {
        row_major_index(self.size, pos)
    }

    pub fn water_credit(&self, pos: GridPos) -> bool {
        self.index(pos).is_some_and(|i| self.water_credit[i])
    }

    pub fn planted(&self, pos: GridPos) -> bool {
        self.index(pos).is_some_and(|i| self.planted[i])
    }

    pub fn input_at(&self, pos: GridPos, untill_chance: f64) -> DayInput {
        DayInput {
            water_credit: self.water_credit(pos),
            planted: self.planted(pos),
            untill_chance,
        }
    }
}

/// Counters from one commit pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DayTally {
    pub tiles_updated: u32,
    pub stages_advanced: u32,
    pub untilled: u32,
}

impl DayTally {
    fn merge(&mut self, other: DayTally) {
        self.tiles_updated += other.tiles_updated;
        self.stages_advanced += other.stages_advanced;
        self.untilled += other.untilled;
    }
}

/// Snapshot then commit every tile of one map, layers base first, cells
/// row-major. `wet` is the weather of the day being closed; grass comes out
/// of the pass dry and is soaked again once the next day's weather is known.
pub fn update_map(
    state: &mut MapState,
    wet: bool,
    untill_chance: f64,
    rng: &mut dyn RngCore,
) -> DayTally {
    let snapshot = DaySnapshot::capture(state, wet);
    let mut tally = DayTally::default();
    for (_, key) in state.keys_in_order() {
        let Some(tile) = state.tile_mut(key) else {
            continue;
        };
        let input = snapshot.input_at(tile.position, untill_chance);
        let change = tile.day_update(&input, rng);
        tally.tiles_updated += 1;
        if change.grew {
            tally.stages_advanced += 1;
        }
        if change.untilled {
            tally.untilled += 1;
        }
    }
    tally
}

/// Run the day update on every cached map, current or not, in name order.
pub fn update_all_maps(
    maps: &mut MapManager,
    wet: bool,
    untill_chance: f64,
    rng: &mut dyn RngCore,
) -> DayTally {
    let mut tally = DayTally::default();
    for state in maps.maps_mut() {
        tally.merge(update_map(state, wet, untill_chance, rng));
    }
    tally
}

/// Let the new day's rain water every tilled grass cell on every cached map.
/// Returns how many cells were soaked.
pub fn soak_all_maps(maps: &mut MapManager, wet: bool) -> u32 {
    if !wet {
        return 0;
    }
    let mut soaked = 0;
    for state in maps.maps_mut() {
        for (_, key) in state.keys_in_order() {
            if state.tile_mut(key).is_some_and(|t| t.soak()) {
                soaked += 1;
            }
        }
    }
    soaked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::factory::TileFactory;
    use crate::world::map::tests::{test_map, test_table};
    use crate::world::tile::GrassState;
    use glam::IVec2;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::sync::Arc;

    const PLOT: IVec2 = IVec2::new(3, 3);

    fn planted_manager() -> MapManager {
        let mut m = MapManager::new(Arc::new(test_table()), TileFactory::new());
        m.precache_all(&[test_map("Home Base"), test_map("House")]).unwrap();
        m.load_map("Home Base").unwrap();
        m.place_tile("Home Base", Layer::Object, PLOT, 68).unwrap();
        set_grass(&mut m, "Home Base", GrassState { tilled: true, watered: false });
        m
    }

    fn set_grass(m: &mut MapManager, map: &str, state: GrassState) {
        m.map_mut(map)
            .unwrap()
            .tile_at_mut(Layer::Base, PLOT)
            .unwrap()
            .behavior = Behavior::Grass(state);
    }

    fn grass(m: &MapManager) -> GrassState {
        *m.map("Home Base").unwrap().tile_at(Layer::Base, PLOT).unwrap().grass().unwrap()
    }

    fn plant_progress(m: &MapManager) -> (u8, u32) {
        let g = m.map("Home Base").unwrap().tile_at(Layer::Object, PLOT).unwrap().growth().unwrap();
        (g.stage, g.days_in_stage)
    }

    #[test]
    fn wet_day_waters_grass_and_grows_plant() {
        let mut m = planted_manager();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let before = plant_progress(&m);
        update_all_maps(&mut m, true, 0.5, &mut rng);
        // One day per stage, so a credited day moves exactly one stage.
        assert_eq!(plant_progress(&m), (before.0 + 1, 0));
        assert!(!grass(&m).watered, "the ended day's rain is not carried over");
    }

    #[test]
    fn rain_is_credited_for_one_day_only() {
        let mut m = planted_manager();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        update_all_maps(&mut m, true, 0.5, &mut rng);
        soak_all_maps(&mut m, false);
        update_all_maps(&mut m, false, 0.5, &mut rng);
        assert_eq!(plant_progress(&m).0, 1);
    }

    #[test]
    fn new_days_rain_soaks_tilled_grass_and_counts_next_day() {
        let mut m = planted_manager();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        update_all_maps(&mut m, false, 0.5, &mut rng);
        assert_eq!(soak_all_maps(&mut m, true), 1);
        assert_eq!(grass(&m), GrassState { tilled: true, watered: true });
        assert_eq!(soak_all_maps(&mut m, true), 0);
        // The morning's rain stops; the soaked soil still carries the plant once.
        update_all_maps(&mut m, false, 0.5, &mut rng);
        assert_eq!(plant_progress(&m).0, 1);
        update_all_maps(&mut m, false, 0.5, &mut rng);
        assert_eq!(plant_progress(&m).0, 1);
    }

    #[test]
    fn dry_day_leaves_plant_alone() {
        let mut m = planted_manager();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let before = plant_progress(&m);
        update_all_maps(&mut m, false, 0.5, &mut rng);
        let g = grass(&m);
        assert!(g.tilled, "a planted cell is never untilled");
        assert!(!g.watered);
        assert_eq!(plant_progress(&m), before);
    }

    #[test]
    fn sprayed_grass_credits_plant_even_when_dry() {
        let mut m = planted_manager();
        set_grass(&mut m, "Home Base", GrassState { tilled: true, watered: true });
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let tally = update_all_maps(&mut m, false, 0.5, &mut rng);
        assert_eq!(plant_progress(&m).0, 1);
        assert!(!grass(&m).watered);
        assert!(tally.stages_advanced >= 1);
    }

    #[test]
    fn outcome_independent_of_commit_order() {
        // Committing the object layer first must give the same result as the
        // normal base-first order, because inputs come from the snapshot.
        let mut m = planted_manager();
        let state = m.map_mut("Home Base").unwrap();
        let snapshot = DaySnapshot::capture(state, true);
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut keys = state.keys_in_order();
        keys.reverse();
        for (_, key) in keys {
            let tile = state.tile_mut(key).unwrap();
            let input = snapshot.input_at(tile.position, 0.5);
            tile.day_update(&input, &mut rng);
        }
        assert!(!grass(&m).watered);
        assert_eq!(plant_progress(&m).0, 1);
    }

    #[test]
    fn every_cached_map_is_updated() {
        let mut m = planted_manager();
        m.place_tile("House", Layer::Object, PLOT, 68).unwrap();
        set_grass(&mut m, "House", GrassState { tilled: true, watered: true });
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let tally = update_all_maps(&mut m, false, 0.5, &mut rng);
        let house = m.map("House").unwrap().tile_at(Layer::Object, PLOT).unwrap();
        assert_eq!(house.growth().unwrap().stage, 1);
        let per_map = m.map("House").unwrap().tile_count() as u32;
        assert_eq!(tally.tiles_updated, per_map * 2);
    }

    #[test]
    fn unplanted_tilled_grass_can_revert() {
        let mut m = MapManager::new(Arc::new(test_table()), TileFactory::new());
        m.precache_all(&[test_map("Home Base")]).unwrap();
        set_grass(&mut m, "Home Base", GrassState { tilled: true, watered: false });
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let tally = update_all_maps(&mut m, false, 1.0, &mut rng);
        assert_eq!(tally.untilled, 1);
        assert_eq!(grass(&m), GrassState::default());
    }
}
