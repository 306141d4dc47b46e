use glam::IVec2;
use rand::{Rng, RngCore};
use serde::Serialize;

use crate::world::definitions::{DoorTarget, LightType, TileId};
use crate::world::geometry::GridPos;
use crate::world::growth::{Growth, ShearOutcome, Yield};

const BIBLE_VERSES: [&str; 6] = [
    "The pages are well-worn from use.",
    "You feel a quiet sense of peace.",
    "Someone's bookmarked their favorite verse.",
    "You pause for a moment of reflection.",
    "You don't read long, but it feels grounding.",
    "The message is simple: be good, do good.",
];

pub const NO_MAIL: &str = "You have no mail.";
pub const BROKEN_BRIDGE: &str = "The bridge is broken.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct GrassState {
    pub tilled: bool,
    pub watered: bool,
}

/// Per-instance behavior state. Each variant carries only what it mutates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Behavior {
    Static,
    Wall,
    Floor,
    Dirt,
    Grass(GrassState),
    FlowerPlant(Growth),
    FlowerBush(Growth),
    FlowerTree(Growth),
    Tree(Growth),
    Lamp,
    InvisibleLight,
    Candle,
    Fireplace,
    Furniture,
    Fence,
    Bed,
    Window { variants: Vec<TileId>, index: usize },
    Animated,
    Sky {
        day: Vec<TileId>,
        night: Vec<TileId>,
        day_index: usize,
        night_index: usize,
    },
    BibleStand,
    Mailbox,
    Bridge,
    Door(DoorTarget),
}

/// What a base tile offers to things placed on top of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseCategory {
    Grass { tilled: bool },
    Floor,
    Dirt,
}

/// Side effects a hook requests. Hooks never reach into the map manager or
/// inventory themselves; the dispatcher applies these in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TileEffect {
    PickUp,
    ToggleLight,
    Drop { item: Yield, count: u32 },
    Message(String),
    SleepPrompt,
    Travel(DoorTarget),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HookOutcome {
    pub handled: bool,
    pub effects: Vec<TileEffect>,
}

impl HookOutcome {
    pub fn ignored() -> Self {
        HookOutcome::default()
    }

    pub fn handled() -> Self {
        HookOutcome {
            handled: true,
            effects: Vec::new(),
        }
    }

    pub fn with(effect: TileEffect) -> Self {
        HookOutcome {
            handled: true,
            effects: vec![effect],
        }
    }
}

/// Shared state a hook may read.
pub struct HookContext<'a> {
    pub wet: bool,
    pub rng: &'a mut dyn RngCore,
}

/// Per-cell inputs to a day update, captured before any tile changes.
#[derive(Debug, Clone, Copy, Default)]
pub struct DayInput {
    /// The base cell under this position is grass that counts as watered today.
    pub water_credit: bool,
    /// A flower plant occupies the object cell at this position.
    pub planted: bool,
    pub untill_chance: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DayChange {
    pub grew: bool,
    pub untilled: bool,
}

/// One occupied cell in one layer of one map.
#[derive(Debug, Clone, PartialEq)]
pub struct TileInstance {
    pub position: GridPos,
    pub base_tile_id: TileId,
    pub map_name: String,
    pub is_on: bool,
    pub interactable: bool,
    pub behavior: Behavior,
}

impl TileInstance {
    pub fn new(
        position: GridPos,
        base_tile_id: TileId,
        map_name: impl Into<String>,
        behavior: Behavior,
    ) -> Self {
        TileInstance {
            position,
            base_tile_id,
            map_name: map_name.into(),
            is_on: false,
            interactable: false,
            behavior,
        }
    }

    pub fn light_type(&self) -> LightType {
        match self.behavior {
            Behavior::Lamp => LightType::Bulb,
            Behavior::InvisibleLight | Behavior::Candle | Behavior::Fireplace => LightType::Flame,
            _ => LightType::None,
        }
    }

    /// Pixel offset of the light source from the tile's top-left corner.
    pub fn light_offset(&self) -> IVec2 {
        match self.behavior {
            Behavior::Lamp => IVec2::new(10, -14),
            Behavior::InvisibleLight => IVec2::new(14, 10),
            Behavior::Candle | Behavior::Fireplace => IVec2::new(3, 0),
            _ => IVec2::ZERO,
        }
    }

    pub fn base_category(&self) -> Option<BaseCategory> {
        match &self.behavior {
            Behavior::Grass(g) => Some(BaseCategory::Grass { tilled: g.tilled }),
            Behavior::Floor => Some(BaseCategory::Floor),
            Behavior::Dirt => Some(BaseCategory::Dirt),
            _ => None,
        }
    }

    /// Object-layer tiles that forbid placing anything on their cell.
    pub fn blocks_placement(&self) -> bool {
        matches!(self.behavior, Behavior::FlowerPlant(_))
    }

    pub fn grass(&self) -> Option<&GrassState> {
        match &self.behavior {
            Behavior::Grass(g) => Some(g),
            _ => None,
        }
    }

    pub fn growth(&self) -> Option<&Growth> {
        match &self.behavior {
            Behavior::FlowerPlant(g)
            | Behavior::FlowerBush(g)
            | Behavior::FlowerTree(g)
            | Behavior::Tree(g) => Some(g),
            _ => None,
        }
    }

    pub fn growth_mut(&mut self) -> Option<&mut Growth> {
        match &mut self.behavior {
            Behavior::FlowerPlant(g)
            | Behavior::FlowerBush(g)
            | Behavior::FlowerTree(g)
            | Behavior::Tree(g) => Some(g),
            _ => None,
        }
    }

    /// Tile id the renderer should draw.
    pub fn display_id(&self, daylight: bool) -> TileId {
        match &self.behavior {
            Behavior::Sky {
                day,
                night,
                day_index,
                night_index,
            } => {
                let (ids, idx) = if daylight {
                    (day, *day_index)
                } else {
                    (night, *night_index)
                };
                ids.get(idx).copied().unwrap_or(self.base_tile_id)
            }
            _ => self.base_tile_id,
        }
    }

    /// Frame offset into the definition's sprite strip.
    pub fn frame_index(&self, clock_seconds: f32) -> u32 {
        match &self.behavior {
            Behavior::Animated => ((clock_seconds.max(0.0) as u32) % 4) / 2,
            _ => self.growth().map(|g| g.stage as u32).unwrap_or(0),
        }
    }

    pub fn on_left_click(&mut self, _ctx: &mut HookContext<'_>) -> HookOutcome {
        match self.behavior {
            Behavior::Lamp
            | Behavior::Candle
            | Behavior::Fireplace
            | Behavior::Furniture
            | Behavior::Fence
            | Behavior::Bed => HookOutcome::with(TileEffect::PickUp),
            _ => HookOutcome::ignored(),
        }
    }

    pub fn on_right_click(&mut self, ctx: &mut HookContext<'_>) -> HookOutcome {
        match &mut self.behavior {
            Behavior::Lamp | Behavior::Candle | Behavior::Fireplace => {
                HookOutcome::with(TileEffect::ToggleLight)
            }
            Behavior::Bed => HookOutcome::with(TileEffect::SleepPrompt),
            Behavior::Window { variants, index } => {
                if variants.is_empty() {
                    return HookOutcome::ignored();
                }
                *index = (*index + 1) % variants.len();
                self.base_tile_id = variants[*index];
                HookOutcome::handled()
            }
            Behavior::BibleStand => {
                let verse = BIBLE_VERSES[ctx.rng.gen_range(0..BIBLE_VERSES.len())];
                HookOutcome::with(TileEffect::Message(verse.to_string()))
            }
            Behavior::Mailbox => HookOutcome::with(TileEffect::Message(NO_MAIL.to_string())),
            Behavior::Bridge => HookOutcome::with(TileEffect::Message(BROKEN_BRIDGE.to_string())),
            Behavior::Door(target) => HookOutcome::with(TileEffect::Travel(target.clone())),
            _ => HookOutcome::ignored(),
        }
    }

    pub fn on_hoe(&mut self, ctx: &mut HookContext<'_>) -> HookOutcome {
        match &mut self.behavior {
            Behavior::Grass(g) => {
                g.tilled = true;
                if ctx.wet {
                    g.watered = true;
                }
                HookOutcome::handled()
            }
            _ => HookOutcome::ignored(),
        }
    }

    pub fn on_spray(&mut self, _ctx: &mut HookContext<'_>) -> HookOutcome {
        match &mut self.behavior {
            Behavior::Grass(g) if g.tilled => {
                g.watered = true;
                HookOutcome::handled()
            }
            _ => HookOutcome::ignored(),
        }
    }

    pub fn on_shear(&mut self, _ctx: &mut HookContext<'_>) -> HookOutcome {
        let growth = match &mut self.behavior {
            Behavior::FlowerPlant(g) | Behavior::FlowerBush(g) | Behavior::FlowerTree(g) => g,
            _ => return HookOutcome::ignored(),
        };
        match growth.shear() {
            ShearOutcome::NotHarvestable => HookOutcome::ignored(),
            ShearOutcome::Immature | ShearOutcome::Harvested { item: None, .. } => {
                HookOutcome::handled()
            }
            ShearOutcome::Harvested {
                item: Some(item),
                count,
            } => HookOutcome::with(TileEffect::Drop { item, count }),
        }
    }

    /// Rain waters tilled grass for the day. Returns whether anything changed.
    pub fn soak(&mut self) -> bool {
        match &mut self.behavior {
            Behavior::Grass(g) if g.tilled && !g.watered => {
                g.watered = true;
                true
            }
            _ => false,
        }
    }

    /// Once-per-day transition. `input` was captured before any tile in the
    /// pass changed, so the result does not depend on iteration order.
    pub fn day_update(&mut self, input: &DayInput, rng: &mut dyn RngCore) -> DayChange {
        let mut change = DayChange::default();
        match &mut self.behavior {
            Behavior::Grass(g) => {
                // The day's water is used up; rain for the new day comes from `soak`.
                g.watered = false;
                if g.tilled && !input.planted && rng.gen_bool(input.untill_chance) {
                    g.tilled = false;
                    g.watered = false;
                    change.untilled = true;
                }
            }
            Behavior::FlowerPlant(g) => {
                if input.water_credit {
                    change.grew = g.tick();
                }
            }
            Behavior::FlowerBush(g) | Behavior::FlowerTree(g) | Behavior::Tree(g) => {
                change.grew = g.tick();
            }
            Behavior::Sky {
                day,
                night,
                day_index,
                night_index,
            } => {
                if !day.is_empty() {
                    *day_index = rng.gen_range(0..day.len());
                }
                if !night.is_empty() {
                    *night_index = rng.gen_range(0..night.len());
                }
            }
            _ => {}
        }
        change
    }
}
