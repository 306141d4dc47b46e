use rand::RngCore;
use serde::Serialize;
use tracing::debug;

use crate::items::dropped::DroppedItem;
use crate::items::inventory::ItemSink;
use crate::items::{ItemRegistry, ToolType};
use crate::world::definitions::DoorTarget;
use crate::world::geometry::GridPos;
use crate::world::manager::MapManager;
use crate::world::map::{Layer, TileKey};
use crate::world::player::Player;
use crate::world::tile::{HookContext, HookOutcome, TileEffect, TileInstance};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickButton {
    Left,
    Right,
}

/// Things the host (UI, travel, sleep) should react to after a dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum WorldEvent {
    Message(String),
    SleepPrompt,
    Travel(DoorTarget),
    PickedUp(String),
}

type Hook = fn(&mut TileInstance, &mut HookContext<'_>) -> HookOutcome;

/// Everything a dispatch may touch. Borrowed field by field from the owner
/// so hooks and effects never hold a second reference to map state.
pub struct Interaction<'a> {
    pub maps: &'a mut MapManager,
    pub items: &'a ItemRegistry,
    pub sink: &'a mut dyn ItemSink,
    pub drops: &'a mut Vec<DroppedItem>,
    pub events: &'a mut Vec<WorldEvent>,
    pub rng: &'a mut dyn RngCore,
    pub wet: bool,
}

impl Interaction<'_> {
    /// Mouse click on `cell` of the current map. Out of reach clicks are not handled.
    pub fn click(&mut self, cell: GridPos, button: ClickButton, player: &Player) -> bool {
        if !player.is_within_reach(cell) {
            return false;
        }
        let hook: Hook = match button {
            ClickButton::Left => TileInstance::on_left_click,
            ClickButton::Right => TileInstance::on_right_click,
        };
        self.dispatch(cell, hook)
    }

    /// Tool use on `cell`. The caller has already checked reach.
    pub fn use_tool(&mut self, cell: GridPos, tool: ToolType) -> bool {
        let hook: Hook = match tool {
            ToolType::Hoe => TileInstance::on_hoe,
            ToolType::WateringCan => TileInstance::on_spray,
            ToolType::Shears => TileInstance::on_shear,
        };
        self.dispatch(cell, hook)
    }

    fn dispatch(&mut self, cell: GridPos, hook: Hook) -> bool {
        let Some(map) = self.maps.current_name().map(str::to_string) else {
            return false;
        };
        for layer in Layer::SEARCH_ORDER {
            let Some(key) = self.maps.interactable_at(&map, layer, cell) else {
                continue;
            };
            let Some(tile) = self.maps.map_mut(&map).and_then(|m| m.tile_mut(key)) else {
                continue;
            };
            let mut ctx = HookContext {
                wet: self.wet,
                rng: &mut *self.rng,
            };
            let outcome = hook(tile, &mut ctx);
            if !outcome.handled {
                continue;
            }
            if self.apply(&map, layer, key, outcome.effects) {
                return true;
            }
        }
        false
    }

    /// Apply hook effects in order. Returns false only when a pickup had to
    /// be refused, in which case nothing was changed.
    fn apply(&mut self, map: &str, layer: Layer, key: TileKey, effects: Vec<TileEffect>) -> bool {
        for effect in effects {
            match effect {
                TileEffect::PickUp => {
                    if !self.pick_up(map, layer, key) {
                        return false;
                    }
                }
                TileEffect::ToggleLight => {
                    if let Some(on) = self.maps.toggle_light(map, key) {
                        debug!(map, on, "Light toggled");
                    }
                }
                TileEffect::Drop { item, count } => {
                    let Some(origin) = self.maps.map(map).and_then(|m| m.tile(key)).map(|t| t.position)
                    else {
                        continue;
                    };
                    let Some(descriptor) = self.items.resolve_yield(&item) else {
                        continue;
                    };
                    for _ in 0..count {
                        self.drops
                            .push(DroppedItem::spawn(descriptor.clone(), map, origin, &mut *self.rng));
                    }
                }
                TileEffect::Message(text) => self.events.push(WorldEvent::Message(text)),
                TileEffect::SleepPrompt => self.events.push(WorldEvent::SleepPrompt),
                TileEffect::Travel(target) => self.events.push(WorldEvent::Travel(target)),
            }
        }
        true
    }

    /// Check capacity first; only then remove the tile and hand it over.
    fn pick_up(&mut self, map: &str, layer: Layer, key: TileKey) -> bool {
        let Some(tile) = self.maps.map(map).and_then(|m| m.tile(key)) else {
            return false;
        };
        let position = tile.position;
        let Some(def) = self.maps.table().get(tile.base_tile_id) else {
            return false;
        };
        let item = self.items.descriptor_for_tile(def);
        if !self.sink.can_accept(&item) {
            debug!(item = %item.name, "Pickup refused, inventory full");
            return false;
        }
        if self.maps.remove_tile(map, layer, position).is_none() {
            return false;
        }
        let name = item.name.clone();
        self.sink.insert(item);
        debug!(item = %name, map, x = position.x, y = position.y, "Tile picked up");
        self.events.push(WorldEvent::PickedUp(name));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::inventory::Inventory;
    use crate::items::{ItemCategory, ItemDescriptor};
    use crate::world::factory::TileFactory;
    use crate::world::map::tests::{test_map, test_table};
    use glam::IVec2;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::sync::Arc;

    struct Fixture {
        maps: MapManager,
        items: ItemRegistry,
        inventory: Inventory,
        drops: Vec<DroppedItem>,
        events: Vec<WorldEvent>,
        rng: ChaCha8Rng,
    }

    impl Fixture {
        fn new() -> Self {
            let mut def = test_map("Home Base");
            // Bed on the decoration layer covering (1..=3, 2), lamp on top at (2,2).
            def.decoration = vec![vec![0; 6]; 5];
            def.decoration[2][1] = 250;
            def.objects[2][2] = 274;
            let mut maps = MapManager::new(Arc::new(test_table()), TileFactory::new());
            maps.precache_all(&[def]).unwrap();
            maps.load_map("Home Base").unwrap();
            Fixture {
                maps,
                items: ItemRegistry::from_items(vec![flower("Orange Hibiscus")]),
                inventory: Inventory::new(4, 10),
                drops: Vec::new(),
                events: Vec::new(),
                rng: ChaCha8Rng::seed_from_u64(7),
            }
        }

        fn interaction(&mut self) -> Interaction<'_> {
            Interaction {
                maps: &mut self.maps,
                items: &self.items,
                sink: &mut self.inventory,
                drops: &mut self.drops,
                events: &mut self.events,
                rng: &mut self.rng,
                wet: false,
            }
        }
    }

    fn flower(name: &str) -> ItemDescriptor {
        ItemDescriptor {
            name: name.into(),
            category: ItemCategory::Flower,
            icon: [0, 0],
            health: 0,
            placed_tile: None,
            tool: None,
            seed: None,
            description: String::new(),
        }
    }

    fn player_near(cell: IVec2) -> Player {
        Player::at_cell(cell, 100)
    }

    #[test]
    fn object_layer_wins_over_decoration() {
        let mut f = Fixture::new();
        let player = player_near(IVec2::new(2, 3));
        assert!(f.interaction().click(IVec2::new(2, 2), ClickButton::Right, &player));
        let lamp = f.maps.tile_at(Layer::Object, IVec2::new(2, 2)).unwrap();
        assert!(!lamp.is_on);
        assert!(f.events.is_empty(), "bed must not have been asked to sleep");

        // Next cell only holds the bed's footprint.
        assert!(f.interaction().click(IVec2::new(3, 2), ClickButton::Right, &player));
        assert_eq!(f.events, vec![WorldEvent::SleepPrompt]);
    }

    #[test]
    fn out_of_reach_click_is_ignored() {
        let mut f = Fixture::new();
        let player = player_near(IVec2::new(5, 4));
        assert!(!f.interaction().click(IVec2::new(2, 2), ClickButton::Right, &player));
        assert!(f.maps.tile_at(Layer::Object, IVec2::new(2, 2)).unwrap().is_on);
    }

    #[test]
    fn pickup_moves_tile_into_inventory() {
        let mut f = Fixture::new();
        let player = player_near(IVec2::new(4, 2));
        let lights_before = f.maps.lights().len();
        assert!(f.interaction().click(IVec2::new(4, 1), ClickButton::Left, &player));
        assert!(f.maps.tile_at(Layer::Object, IVec2::new(4, 1)).is_none());
        assert!(f.maps.is_walkable(IVec2::new(4, 1)));
        assert_eq!(f.maps.lights().len(), lights_before - 1);
        assert_eq!(f.inventory.count("tile 274"), 1);
        assert_eq!(f.events, vec![WorldEvent::PickedUp("tile 274".into())]);
    }

    #[test]
    fn full_inventory_leaves_tile_in_place() {
        let mut f = Fixture::new();
        f.inventory = Inventory::new(0, 10);
        let player = player_near(IVec2::new(4, 2));
        assert!(!f.interaction().click(IVec2::new(4, 1), ClickButton::Left, &player));
        assert!(f.maps.tile_at(Layer::Object, IVec2::new(4, 1)).is_some());
        assert!(!f.maps.is_walkable(IVec2::new(4, 1)));
        assert!(f.events.is_empty());
    }

    #[test]
    fn shearing_ripe_bush_scatters_drops() {
        let mut f = Fixture::new();
        let state = f.maps.current_mut().unwrap();
        state
            .tile_at_mut(Layer::Object, IVec2::new(1, 4))
            .unwrap()
            .growth_mut()
            .unwrap()
            .stage = 4;
        // Second footprint cell of the bush resolves back to its anchor.
        assert!(f.interaction().use_tool(IVec2::new(2, 4), ToolType::Shears));
        assert_eq!(f.drops.len(), 3);
        assert!(f.drops.iter().all(|d| d.item.name == "Orange Hibiscus"));
        let stage = f.maps.tile_at(Layer::Object, IVec2::new(1, 4)).unwrap().growth().unwrap().stage;
        assert_eq!(stage, 2);
    }

    #[test]
    fn immature_shear_absorbs_the_click() {
        let mut f = Fixture::new();
        assert!(f.interaction().use_tool(IVec2::new(1, 4), ToolType::Shears));
        assert!(f.drops.is_empty());
    }

    #[test]
    fn spray_falls_through_to_base_and_needs_tilling() {
        let mut f = Fixture::new();
        let cell = IVec2::new(3, 3);
        assert!(!f.interaction().use_tool(cell, ToolType::WateringCan));
        assert!(f.interaction().use_tool(cell, ToolType::Hoe));
        assert!(f.interaction().use_tool(cell, ToolType::WateringCan));
        let grass = f.maps.tile_at(Layer::Base, cell).unwrap().grass().copied().unwrap();
        assert!(grass.tilled && grass.watered);
    }
}
