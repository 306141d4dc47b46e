use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use crate::simulation::calendar::Season;

/// Ambient darkness while it rains, regardless of the hour.
pub const RAIN_DARKNESS: f32 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Weather {
    #[default]
    Sunny,
    Rain,
    Snow,
}

/// The day's weather. Rolled once per day advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct WeatherState {
    pub current: Weather,
}

impl WeatherState {
    /// Winter picks between sun and snow, every other season between sun and rain.
    pub fn roll(&mut self, season: Season, rng: &mut dyn RngCore) -> Weather {
        let wet = match season {
            Season::Winter => Weather::Snow,
            _ => Weather::Rain,
        };
        self.current = if rng.gen_bool(0.5) { wet } else { Weather::Sunny };
        self.current
    }

    /// Rain and snow both water tilled grass.
    pub fn is_wet(&self) -> bool {
        matches!(self.current, Weather::Rain | Weather::Snow)
    }

    pub fn is_raining(&self) -> bool {
        self.current == Weather::Rain
    }
}
