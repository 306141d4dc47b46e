use std::fmt;

use serde::{Deserialize, Serialize};

/// Length of one in-game day in real seconds.
pub const DAY_LENGTH_SECONDS: f32 = 960.0;
/// Clock value of a brand new game.
pub const START_TIME_SECONDS: f32 = 650.0;
pub const DEFAULT_DAYS_PER_SEASON: u32 = 28;

const FULL_DARKNESS: f32 = 0.85;
/// Half-width of the sunrise and sunset fades, in hours.
const TWILIGHT_HOURS: f32 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Season {
    Spring,
    Summer,
    Autumn,
    Winter,
}

impl Season {
    pub fn next(self) -> Season {
        match self {
            Season::Spring => Season::Summer,
            Season::Summer => Season::Autumn,
            Season::Autumn => Season::Winter,
            Season::Winter => Season::Spring,
        }
    }

    fn sunrise_hour(self) -> f32 {
        match self {
            Season::Spring => 6.5,
            Season::Summer => 5.5,
            Season::Autumn => 6.75,
            Season::Winter => 7.5,
        }
    }

    fn sunset_hour(self) -> f32 {
        match self {
            Season::Spring => 19.0,
            Season::Summer => 20.0,
            Season::Autumn => 18.25,
            Season::Winter => 17.0,
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Season::Spring => "Spring",
            Season::Summer => "Summer",
            Season::Autumn => "Autumn",
            Season::Winter => "Winter",
        };
        f.write_str(name)
    }
}

fn hour_to_seconds(hour: f32) -> f32 {
    hour / 24.0 * DAY_LENGTH_SECONDS
}

/// Time of day plus the calendar date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayClock {
    time: f32,
    days_played: u64,
    day_of_season: u32,
    season: Season,
    year: u32,
    days_per_season: u32,
}

impl DayClock {
    pub fn new(days_per_season: u32) -> Self {
        DayClock {
            time: START_TIME_SECONDS,
            days_played: 0,
            day_of_season: 1,
            season: Season::Spring,
            year: 1,
            days_per_season: days_per_season.max(1),
        }
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn days_played(&self) -> u64 {
        self.days_played
    }

    pub fn day_of_season(&self) -> u32 {
        self.day_of_season
    }

    pub fn season(&self) -> Season {
        self.season
    }

    pub fn year(&self) -> u32 {
        self.year
    }

    /// Seconds elapsed since the first day began.
    pub fn total_elapsed(&self) -> f64 {
        self.days_played as f64 * DAY_LENGTH_SECONDS as f64 + self.time as f64
    }

    /// Advance the clock. Returns true when the day rolled over; the caller
    /// is responsible for running the day advance.
    pub fn tick(&mut self, dt: f32) -> bool {
        self.time += dt.max(0.0);
        if self.time > DAY_LENGTH_SECONDS {
            self.time -= DAY_LENGTH_SECONDS;
            return true;
        }
        false
    }

    /// Move the calendar forward one day, wrapping season and year.
    pub fn advance_day(&mut self) {
        self.days_played += 1;
        self.day_of_season += 1;
        if self.day_of_season > self.days_per_season {
            self.day_of_season = 1;
            self.season = self.season.next();
            if self.season == Season::Spring {
                self.year += 1;
            }
        }
    }

    pub fn fast_forward_to_hour(&mut self, hour: u32) {
        self.time = hour_to_seconds(hour.min(23) as f32);
    }

    fn sunrise(&self) -> (f32, f32) {
        let h = self.season.sunrise_hour();
        (hour_to_seconds(h - TWILIGHT_HOURS), hour_to_seconds(h + TWILIGHT_HOURS))
    }

    fn sunset(&self) -> (f32, f32) {
        let h = self.season.sunset_hour();
        (hour_to_seconds(h - TWILIGHT_HOURS), hour_to_seconds(h + TWILIGHT_HOURS))
    }

    /// Strictly between the end of sunrise and the start of sunset.
    pub fn is_daytime(&self) -> bool {
        self.time > self.sunrise().1 && self.time < self.sunset().0
    }

    /// Darkness from the time of day alone: 0 by day, 0.85 by night, with a
    /// linear fade across sunrise and sunset.
    pub fn darkness(&self) -> f32 {
        let (rise_start, rise_end) = self.sunrise();
        if (rise_start..=rise_end).contains(&self.time) {
            let t = (self.time - rise_start) / (rise_end - rise_start);
            return FULL_DARKNESS * (1.0 - t);
        }
        let (set_start, set_end) = self.sunset();
        if (set_start..=set_end).contains(&self.time) {
            let t = (self.time - set_start) / (set_end - set_start);
            return FULL_DARKNESS * t;
        }
        if self.is_daytime() { 0.0 } else { FULL_DARKNESS }
    }

    pub fn date_string(&self) -> String {
        format!("{} {}, Year {}", self.season, self.day_of_season, self.year)
    }

    /// 12-hour clock rounded to the nearest quarter hour, e.g. `9:45 AM`.
    pub fn clock_string(&self) -> String {
        let hours_f = self.time / DAY_LENGTH_SECONDS * 24.0;
        let mut hours = hours_f as u32;
        let mut minutes = (((hours_f - hours as f32) * 60.0) / 15.0).round() as u32 * 15;
        if minutes == 60 {
            minutes = 0;
            hours = (hours + 1) % 24;
        }
        let period = if hours >= 12 { "PM" } else { "AM" };
        let display = match hours {
            0 => 12,
            h if h > 12 => h - 12,
            h => h,
        };
        format!("{}:{:02} {}", display, minutes, period)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_game_starts_spring_day_one() {
        let clock = DayClock::new(DEFAULT_DAYS_PER_SEASON);
        assert_eq!(clock.date_string(), "Spring 1, Year 1");
        assert_eq!(clock.time(), START_TIME_SECONDS);
        assert!(clock.is_daytime());
    }

    #[test]
    fn seasons_wrap_into_next_year() {
        let mut clock = DayClock::new(2);
        let mut dates = Vec::new();
        for _ in 0..8 {
            clock.advance_day();
            dates.push(clock.date_string());
        }
        assert_eq!(dates[0], "Spring 2, Year 1");
        assert_eq!(dates[1], "Summer 1, Year 1");
        assert_eq!(dates[5], "Winter 1, Year 1");
        assert_eq!(dates[7], "Spring 1, Year 2");
        assert_eq!(clock.days_played(), 8);
    }

    #[test]
    fn tick_reports_rollover() {
        let mut clock = DayClock::new(28);
        assert!(!clock.tick(DAY_LENGTH_SECONDS - START_TIME_SECONDS));
        assert!(clock.tick(1.0));
        assert!((clock.time() - 1.0).abs() < 1e-3);
    }

    #[test]
    fn darkness_fades_across_sunrise() {
        let mut clock = DayClock::new(28);
        clock.fast_forward_to_hour(2);
        assert_eq!(clock.darkness(), FULL_DARKNESS);
        // Spring sunrise is 6:30, so 6:30 sits halfway through the fade.
        clock.time = hour_to_seconds(6.5);
        assert!((clock.darkness() - FULL_DARKNESS / 2.0).abs() < 1e-3);
        clock.fast_forward_to_hour(12);
        assert_eq!(clock.darkness(), 0.0);
        clock.fast_forward_to_hour(22);
        assert_eq!(clock.darkness(), FULL_DARKNESS);
    }

    #[test]
    fn clock_string_rounds_to_quarter_hours() {
        let mut clock = DayClock::new(28);
        clock.fast_forward_to_hour(6);
        assert_eq!(clock.clock_string(), "6:00 AM");
        clock.fast_forward_to_hour(0);
        assert_eq!(clock.clock_string(), "12:00 AM");
        clock.time = hour_to_seconds(13.8);
        assert_eq!(clock.clock_string(), "1:45 PM");
        clock.time = hour_to_seconds(23.95);
        assert_eq!(clock.clock_string(), "12:00 AM");
    }

    #[test]
    fn fast_forward_clamps_hour() {
        let mut clock = DayClock::new(28);
        clock.fast_forward_to_hour(40);
        assert_eq!(clock.time(), hour_to_seconds(23.0));
    }
}
