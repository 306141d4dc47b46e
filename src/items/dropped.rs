use glam::{IVec2, Vec2};
use rand::{Rng, RngCore};
use uuid::{Builder, Uuid};

use crate::items::ItemDescriptor;
use crate::items::inventory::ItemSink;
use crate::world::geometry::{GridPos, TILE_SIZE};

const GRAVITY: f32 = 1200.0;
const ARC_DURATION: f32 = 0.6;
const MIN_LAUNCH_VY: f32 = -200.0;
const BOUNCE_THRESHOLD: f32 = 100.0;
const MAGNET_RADIUS: f32 = 40.0;
const COLLECT_RADIUS: f32 = 16.0;
const DROP_HEIGHT: f32 = 16.0;

/// An item lying in (or flying through) the world after a harvest.
#[derive(Debug, Clone)]
pub struct DroppedItem {
    pub id: Uuid,
    /// Map the item fell on. It only moves and can only be collected there.
    pub map: String,
    pub item: ItemDescriptor,
    pub position: Vec2,
    velocity: Vec2,
    ground: Vec2,
    landed: bool,
}

impl DroppedItem {
    /// Launch from the centre of `origin` on `map`, landing on a random cell
    /// within one tile of it.
    pub fn spawn(item: ItemDescriptor, map: &str, origin: GridPos, rng: &mut dyn RngCore) -> Self {
        let size = TILE_SIZE as f32;
        let start = origin.as_vec2() * size + Vec2::splat(size / 2.0) - Vec2::new(0.0, DROP_HEIGHT);
        let scatter = IVec2::new(rng.gen_range(-1..=1), rng.gen_range(-1..=1));
        let ground = (origin + scatter).as_vec2() * size + Vec2::splat(size / 2.0);

        let displacement = ground - start;
        let vx = displacement.x / ARC_DURATION;
        let vy = (displacement.y - 0.5 * GRAVITY * ARC_DURATION * ARC_DURATION) / ARC_DURATION;

        DroppedItem {
            id: Builder::from_random_bytes(rng.r#gen()).into_uuid(),
            map: map.to_string(),
            item,
            position: start,
            velocity: Vec2::new(vx, vy.min(MIN_LAUNCH_VY)),
            ground,
            landed: false,
        }
    }

    pub fn has_landed(&self) -> bool {
        self.landed
    }

    pub fn ground(&self) -> Vec2 {
        self.ground
    }

    /// Advance the arc, or drift toward `player` once landed if the
    /// inventory could take the item.
    pub fn update(&mut self, dt: f32, player: Vec2, sink: &dyn ItemSink) {
        if !self.landed {
            self.velocity.y += GRAVITY * dt;
            self.position += self.velocity * dt;
            if self.position.y >= self.ground.y {
                self.position.y = self.ground.y;
                if self.velocity.y.abs() > BOUNCE_THRESHOLD {
                    self.velocity.y *= -0.4;
                    self.velocity.x *= 0.6;
                } else {
                    self.velocity = Vec2::ZERO;
                    self.landed = true;
                }
            }
        } else if sink.can_accept(&self.item) && self.position.distance(player) < MAGNET_RADIUS {
            let toward = (player - self.position).normalize_or_zero();
            self.velocity += toward * 0.5;
            self.position += self.velocity;
            self.velocity *= 0.75;
        }
    }

    /// Move into `sink` when landed and close enough.
    pub fn try_collect(&self, player: Vec2, sink: &mut dyn ItemSink) -> bool {
        self.landed
            && self.position.distance(player) < COLLECT_RADIUS
            && sink.insert(self.item.clone())
    }
}

/// Step the dropped items lying on `map` and remove the ones the player
/// picked up. Items on other maps wait where they fell. Returns how many
/// were collected.
pub fn update_all(
    drops: &mut Vec<DroppedItem>,
    map: &str,
    dt: f32,
    player: Vec2,
    sink: &mut dyn ItemSink,
) -> usize {
    for drop in drops.iter_mut().filter(|d| d.map == map) {
        drop.update(dt, player, &*sink);
    }
    let before = drops.len();
    drops.retain(|d| d.map != map || !d.try_collect(player, &mut *sink));
    before - drops.len()
}
