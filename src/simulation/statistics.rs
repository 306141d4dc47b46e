use std::collections::BTreeMap;

use serde::Serialize;

use crate::simulation::phase::DayTally;
use crate::simulation::weather::Weather;
use crate::world::World;

/// Aggregate metrics for one day advance, across every cached map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayStatistics {
    pub day: u64,
    pub date: String,
    /// Weather the finished day was updated under.
    pub ended_weather: Weather,
    /// Weather rolled for the day just starting.
    pub weather: Weather,
    pub maps: usize,
    pub tiles_updated: u32,
    pub stages_advanced: u32,
    pub untilled: u32,
    pub tilled_grass: u32,
    pub watered_grass: u32,
    pub lights_on: u32,
    /// Growing tiles per growth stage.
    pub stage_distribution: BTreeMap<u8, u32>,
    pub duration_ms: f32,
}

/// Compute statistics for the world right after a day advance.
pub fn compute_statistics(
    world: &World,
    ended_weather: Weather,
    tally: DayTally,
    duration_ms: f32,
) -> DayStatistics {
    let mut tilled_grass = 0;
    let mut watered_grass = 0;
    let mut lights_on = 0;
    let mut stage_distribution: BTreeMap<u8, u32> = BTreeMap::new();

    for state in world.maps.maps() {
        for (_, key) in state.keys_in_order() {
            let Some(tile) = state.tile(key) else {
                continue;
            };
            if let Some(grass) = tile.grass() {
                tilled_grass += grass.tilled as u32;
                watered_grass += grass.watered as u32;
            }
            if let Some(growth) = tile.growth() {
                *stage_distribution.entry(growth.stage).or_insert(0) += 1;
            }
        }
        lights_on += state
            .lights()
            .iter()
            .filter_map(|k| state.tile(*k))
            .filter(|t| t.is_on)
            .count() as u32;
    }

    DayStatistics {
        day: world.clock.days_played(),
        date: world.clock.date_string(),
        ended_weather,
        weather: world.weather.current,
        maps: world.maps.maps().count(),
        tiles_updated: tally.tiles_updated,
        stages_advanced: tally.stages_advanced,
        untilled: tally.untilled,
        tilled_grass,
        watered_grass,
        lights_on,
        stage_distribution,
        duration_ms,
    }
}
