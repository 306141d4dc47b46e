pub mod calendar;
pub mod phase;
pub mod statistics;
pub mod weather;

use std::time::Instant;

use tracing::info;

use crate::simulation::statistics::DayStatistics;
use crate::world::World;

/// Advance the world by one day.
///
/// Moves the calendar forward, runs the two-phase day update on every cached
/// map under the weather of the day that just ended, rolls the new day's
/// weather for the (possibly new) season, lets that rain soak tilled grass,
/// restores the player and reports.
pub fn advance_one_day(world: &mut World) -> DayStatistics {
    let start = Instant::now();

    world.clock.advance_day();

    let ended_weather = world.weather.current;
    let tally = phase::update_all_maps(
        &mut world.maps,
        world.weather.is_wet(),
        world.config.untill_chance,
        &mut world.rng,
    );

    world.weather.roll(world.clock.season(), &mut world.rng);
    let soaked = phase::soak_all_maps(&mut world.maps, world.weather.is_wet());
    world.player.restore();

    let duration_ms = start.elapsed().as_secs_f32() * 1000.0;
    let stats = statistics::compute_statistics(world, ended_weather, tally, duration_ms);
    info!(
        day = stats.day,
        date = %stats.date,
        weather = ?stats.weather,
        tiles = stats.tiles_updated,
        grew = stats.stages_advanced,
        untilled = stats.untilled,
        soaked,
        "Day advanced"
    );
    stats
}
