use glam::Vec2;
use serde::Serialize;

use crate::simulation::calendar::DayClock;
use crate::simulation::weather::{WeatherState, RAIN_DARKNESS};
use crate::world::definitions::LightType;
use crate::world::geometry::TILE_SIZE;
use crate::world::manager::MapManager;
use crate::world::tile::TileInstance;

const FLAME_RADIUS: f32 = 65.0;
const BULB_RADIUS: f32 = 55.0;
const FLICKER_INTERVAL: f32 = 0.5;
const FLICKER_PATTERN: [f32; 4] = [-1.0, -3.0, -1.5, 0.0];
/// Darkness right at a light source, and at the rim of its radius.
const LIT_DARKNESS: (f32, f32) = (0.1, 0.85);

/// What the renderer needs about one emitter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LightView {
    pub kind: LightType,
    /// World pixel position of the light source.
    pub position: [f32; 2],
    pub on: bool,
}

impl LightView {
    pub fn of(tile: &TileInstance) -> Self {
        let pixel = tile.position * TILE_SIZE + tile.light_offset();
        LightView {
            kind: tile.light_type(),
            position: pixel.as_vec2().to_array(),
            on: tile.is_on,
        }
    }

    fn radius(&self, flicker: f32) -> f32 {
        match self.kind {
            LightType::Flame => FLAME_RADIUS + flicker,
            LightType::Bulb => BULB_RADIUS,
            LightType::None => 0.0,
        }
    }
}

/// Ambient darkness before any light is applied: rain dims the day, night
/// dims everything, whichever is darker wins.
pub fn ambient_darkness(clock: &DayClock, weather: &WeatherState) -> f32 {
    let base = if weather.is_raining() { RAIN_DARKNESS } else { 0.0 };
    base.max(clock.darkness())
}

/// Cycles the flame radius wobble.
#[derive(Debug, Clone, Copy, Default)]
pub struct Flicker {
    timer: f32,
    index: usize,
}

impl Flicker {
    pub fn update(&mut self, dt: f32) {
        self.timer += dt;
        if self.timer >= FLICKER_INTERVAL {
            self.timer = 0.0;
            self.index = (self.index + 1) % FLICKER_PATTERN.len();
        }
    }

    pub fn offset(&self) -> f32 {
        FLICKER_PATTERN[self.index]
    }
}

/// Snapshot of the current map's lighting for one frame.
#[derive(Debug, Clone, Serialize)]
pub struct LightField {
    pub ambient: f32,
    pub lights: Vec<LightView>,
    #[serde(skip)]
    flicker: f32,
}

impl LightField {
    pub fn capture(maps: &MapManager, clock: &DayClock, weather: &WeatherState, flicker: &Flicker) -> Self {
        LightField {
            ambient: ambient_darkness(clock, weather),
            lights: maps.lights().into_iter().map(LightView::of).collect(),
            flicker: flicker.offset(),
        }
    }

    /// Darkness at a world pixel: ambient, lowered by every lit source in range.
    pub fn darkness_at(&self, point: Vec2) -> f32 {
        let mut darkness = self.ambient;
        for light in self.lights.iter().filter(|l| l.on) {
            let radius = light.radius(self.flicker);
            let dist = point.distance(Vec2::from_array(light.position));
            if dist >= radius {
                continue;
            }
            let t = (1.0 - dist / radius).clamp(0.0, 1.0);
            let lit = LIT_DARKNESS.0 + (LIT_DARKNESS.1 - LIT_DARKNESS.0) * (1.0 - t);
            darkness = darkness.min(lit);
        }
        darkness
    }

    pub fn lit_count(&self) -> usize {
        self.lights.iter().filter(|l| l.on).count()
    }
}
