use glam::{IVec2, Vec2};

use crate::world::geometry::{chebyshev, GridPos, PixelRect, TILE_SIZE};

pub const PLAYER_WIDTH: i32 = 16;
pub const PLAYER_HEIGHT: i32 = 32;
const COLLIDER_WIDTH: i32 = 12;
const COLLIDER_HEIGHT: i32 = 8;

/// The acting entity: a pixel position (sprite top-left) and a vital stat.
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub position: Vec2,
    pub health: i32,
    pub max_health: i32,
}

impl Player {
    pub fn new(position: Vec2, max_health: i32) -> Self {
        Player {
            position,
            health: max_health,
            max_health,
        }
    }

    /// Standing on `cell`: the sprite's feet occupy the cell's bottom row.
    pub fn at_cell(cell: GridPos, max_health: i32) -> Self {
        let mut p = Player::new(Vec2::ZERO, max_health);
        p.teleport(cell);
        p
    }

    pub fn teleport(&mut self, cell: GridPos) {
        self.position = Vec2::new(
            (cell.x * TILE_SIZE) as f32,
            ((cell.y + 1) * TILE_SIZE - PLAYER_HEIGHT) as f32,
        );
    }

    /// Feet-level collision box.
    pub fn collider(&self) -> PixelRect {
        let x = self.position.x.round() as i32;
        let y = self.position.y.round() as i32;
        PixelRect::new(
            x + (PLAYER_WIDTH - COLLIDER_WIDTH) / 2,
            y + PLAYER_HEIGHT - COLLIDER_HEIGHT,
            COLLIDER_WIDTH,
            COLLIDER_HEIGHT,
        )
    }

    /// Cell the player is standing on, judged from the bottom pixel row of the sprite.
    pub fn anchor_cell(&self) -> GridPos {
        IVec2::new(
            (self.position.x / TILE_SIZE as f32).round() as i32,
            ((self.position.y + PLAYER_HEIGHT as f32 - 1.0) / TILE_SIZE as f32).floor() as i32,
        )
    }

    /// Sprite centre, used for pickup magnetism.
    pub fn center(&self) -> Vec2 {
        self.position + Vec2::new(PLAYER_WIDTH as f32, PLAYER_HEIGHT as f32) / 2.0
    }

    pub fn is_within_reach(&self, cell: GridPos) -> bool {
        chebyshev(self.anchor_cell(), cell) <= 1
    }

    pub fn add_health(&mut self, delta: i32) {
        self.health = (self.health + delta).clamp(0, self.max_health);
    }

    pub fn restore(&mut self) {
        self.health = self.max_health;
    }
}
