use tracing::debug;

use crate::items::inventory::Inventory;
use crate::items::ItemDescriptor;
use crate::world::definitions::{TileDefinitionTable, TileId};
use crate::world::geometry::{Footprint, GridPos, PixelRect};
use crate::world::manager::MapManager;
use crate::world::map::Layer;
use crate::world::tile::BaseCategory;

/// Which base tile a placed item must sit on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseRequirement {
    Grass,
    TilledGrass,
    Floor,
    GrassOrFloor,
}

impl BaseRequirement {
    pub fn accepts(self, base: Option<BaseCategory>) -> bool {
        match (self, base) {
            (BaseRequirement::Grass, Some(BaseCategory::Grass { .. })) => true,
            (BaseRequirement::TilledGrass, Some(BaseCategory::Grass { tilled })) => tilled,
            (BaseRequirement::Floor, Some(BaseCategory::Floor)) => true,
            (
                BaseRequirement::GrassOrFloor,
                Some(BaseCategory::Grass { .. } | BaseCategory::Floor),
            ) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacementRule {
    pub tile_id: TileId,
    pub base: BaseRequirement,
}

/// Name-based lookup from an item to the tile it places.
pub trait PlacementResolver {
    fn placement_rule(
        &self,
        item: &ItemDescriptor,
        table: &TileDefinitionTable,
    ) -> Option<PlacementRule>;
}

/// Why one footprint cell was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellRejection {
    OutOfBounds,
    Blocked,
    Occupied,
    PlayerOverlap,
    WrongBase,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementCheck {
    pub allowed: bool,
    pub rule: Option<PlacementRule>,
    pub footprint: Option<Footprint>,
    /// Every refused cell, for the placement preview.
    pub rejected: Vec<(GridPos, CellRejection)>,
}

impl PlacementCheck {
    fn refused() -> Self {
        PlacementCheck {
            allowed: false,
            rule: None,
            footprint: None,
            rejected: Vec::new(),
        }
    }
}

/// Whether `item` can be placed with its anchor at `target` on the current
/// map. Every footprint cell must pass every check.
pub fn can_place(
    maps: &MapManager,
    resolver: &dyn PlacementResolver,
    item: &ItemDescriptor,
    target: GridPos,
    player_collider: PixelRect,
) -> PlacementCheck {
    let Some(state) = maps.current() else {
        return PlacementCheck::refused();
    };
    let table = maps.table();
    let Some(rule) = resolver.placement_rule(item, table) else {
        return PlacementCheck::refused();
    };
    let Some(def) = table.get(rule.tile_id) else {
        return PlacementCheck::refused();
    };

    let footprint = def.placement_footprint(target);
    let mut rejected = Vec::new();

    // The anchor cell gets the new instance; never orphan an existing one.
    if state.tile_at(Layer::Object, target).is_some() {
        rejected.push((target, CellRejection::Occupied));
    }

    for cell in footprint.cells() {
        let reason = if !state.in_bounds(cell) {
            Some(CellRejection::OutOfBounds)
        } else if state.collision().is_blocked(cell) {
            Some(CellRejection::Blocked)
        } else if state
            .tile_at(Layer::Object, cell)
            .is_some_and(|t| t.blocks_placement())
        {
            Some(CellRejection::Occupied)
        } else if def.collides && PixelRect::of_cell(cell).intersects(&player_collider) {
            Some(CellRejection::PlayerOverlap)
        } else if !rule
            .base
            .accepts(state.tile_at(Layer::Base, cell).and_then(|t| t.base_category()))
        {
            Some(CellRejection::WrongBase)
        } else {
            None
        };
        if let Some(reason) = reason {
            if !rejected.iter().any(|(c, _)| *c == cell) {
                rejected.push((cell, reason));
            }
        }
    }

    PlacementCheck {
        allowed: rejected.is_empty(),
        rule: Some(rule),
        footprint: Some(footprint),
        rejected,
    }
}

/// Place the selected inventory item at `target` if allowed, consuming one unit.
pub fn place_selected(
    maps: &mut MapManager,
    resolver: &dyn PlacementResolver,
    inventory: &mut Inventory,
    target: GridPos,
    player_collider: PixelRect,
) -> bool {
    let Some(item) = inventory.selected().cloned() else {
        return false;
    };
    let check = can_place(maps, resolver, &item, target, player_collider);
    let (true, Some(rule)) = (check.allowed, check.rule) else {
        return false;
    };
    let Some(map) = maps.current_name().map(str::to_string) else {
        return false;
    };
    if maps.place_tile(&map, Layer::Object, target, rule.tile_id).is_err() {
        return false;
    }
    inventory.take_selected();
    debug!(item = %item.name, map = %map, x = target.x, y = target.y, "Item placed");
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::inventory::ItemSink;
    use crate::items::{ItemCategory, ItemRegistry, SeedType};
    use crate::world::definitions::BehaviorKind;
    use crate::world::factory::TileFactory;
    use crate::world::map::tests::{tdef, test_map};
    use crate::world::map::MapDefinition;
    use crate::world::tile::{Behavior, GrassState};
    use glam::IVec2;
    use std::sync::Arc;

    fn table() -> TileDefinitionTable {
        let mut table_tile = tdef(247, BehaviorKind::Furniture, true, [1, 1]);
        table_tile.name = "Wooden Side Table".into();
        let mut display = tdef(318, BehaviorKind::Furniture, true, [2, 2]);
        display.name = "Flower Display".into();
        let mut bed = tdef(250, BehaviorKind::Bed, true, [3, 1]);
        bed.name = "Red Bed".into();
        let mut plant = tdef(68, BehaviorKind::FlowerPlant, false, [1, 1]);
        plant.name = "Daffodil Plant".into();
        plant.param = Some("Daffodil".into());
        let mut bush = tdef(72, BehaviorKind::FlowerBush, true, [2, 1]);
        bush.name = "Orange Hibiscus Bush".into();
        TileDefinitionTable::from_definitions(vec![
            tdef(28, BehaviorKind::Grass, false, [1, 1]),
            tdef(203, BehaviorKind::Floor, false, [1, 1]),
            tdef(220, BehaviorKind::Wall, true, [1, 3]),
            tdef(274, BehaviorKind::Lamp, true, [1, 1]),
            table_tile,
            display,
            bed,
            plant,
            bush,
        ])
        .unwrap()
    }

    fn item(name: &str, category: ItemCategory) -> ItemDescriptor {
        ItemDescriptor {
            name: name.into(),
            category,
            icon: [0, 0],
            health: 0,
            placed_tile: None,
            tool: None,
            seed: None,
            description: String::new(),
        }
    }

    fn seeds() -> ItemDescriptor {
        let mut s = item("Daffodil Seeds", ItemCategory::Seed);
        s.seed = Some(SeedType::FlowerPlant);
        s.placed_tile = Some("Daffodil Plant".into());
        s
    }

    fn manager_with(defs: &[MapDefinition], current: &str) -> MapManager {
        let mut m = MapManager::new(Arc::new(table()), TileFactory::new());
        m.precache_all(defs).unwrap();
        m.load_map(current).unwrap();
        m
    }

    fn far_away() -> PixelRect {
        PixelRect::new(-500, -500, 12, 8)
    }

    #[test]
    fn furniture_fits_on_free_grass() {
        let m = manager_with(&[test_map("Home Base")], "Home Base");
        let reg = ItemRegistry::default();
        let check = can_place(&m, &reg, &item("Wooden Side Table", ItemCategory::Furniture), IVec2::new(3, 3), far_away());
        assert!(check.allowed, "{:?}", check.rejected);
        assert_eq!(check.footprint.unwrap().size, IVec2::ONE);
    }

    #[test]
    fn one_blocked_cell_rejects_whole_footprint() {
        let m = manager_with(&[test_map("Home Base")], "Home Base");
        let reg = ItemRegistry::default();
        // 2x2 display anchored at (3,2) covers (3..=4, 1..=2); the lamp blocks (4,1).
        let check = can_place(&m, &reg, &item("Flower Display", ItemCategory::Furniture), IVec2::new(3, 2), far_away());
        assert!(!check.allowed);
        assert_eq!(check.rejected, vec![(IVec2::new(4, 1), CellRejection::Blocked)]);

        let ok = can_place(&m, &reg, &item("Flower Display", ItemCategory::Furniture), IVec2::new(3, 3), far_away());
        assert!(ok.allowed);
    }

    #[test]
    fn footprint_partly_off_map_is_rejected() {
        let m = manager_with(&[test_map("Home Base")], "Home Base");
        let reg = ItemRegistry::default();
        let check = can_place(&m, &reg, &item("Flower Display", ItemCategory::Furniture), IVec2::new(5, 3), far_away());
        assert!(!check.allowed);
        assert!(check.rejected.contains(&(IVec2::new(6, 2), CellRejection::OutOfBounds)));
    }

    #[test]
    fn colliding_item_cannot_overlap_player() {
        let m = manager_with(&[test_map("Home Base")], "Home Base");
        let reg = ItemRegistry::default();
        let player = PixelRect::new(3 * 16 + 2, 3 * 16 + 8, 12, 8);
        let check = can_place(&m, &reg, &item("Wooden Side Table", ItemCategory::Furniture), IVec2::new(3, 3), player);
        assert_eq!(check.rejected, vec![(IVec2::new(3, 3), CellRejection::PlayerOverlap)]);
    }

    #[test]
    fn flower_plant_seeds_need_tilled_grass() {
        let mut m = manager_with(&[test_map("Home Base")], "Home Base");
        let reg = ItemRegistry::default();
        let target = IVec2::new(3, 3);
        assert!(!can_place(&m, &reg, &seeds(), target, far_away()).allowed);

        let state = m.current_mut().unwrap();
        state.tile_at_mut(Layer::Base, target).unwrap().behavior =
            Behavior::Grass(GrassState { tilled: true, watered: false });
        assert!(can_place(&m, &reg, &seeds(), target, far_away()).allowed);
    }

    #[test]
    fn planted_cell_blocks_further_placement() {
        let mut m = manager_with(&[test_map("Home Base")], "Home Base");
        let reg = ItemRegistry::default();
        m.place_tile("Home Base", Layer::Object, IVec2::new(3, 3), 68).unwrap();
        let check = can_place(&m, &reg, &item("Wooden Side Table", ItemCategory::Furniture), IVec2::new(3, 3), far_away());
        assert!(!check.allowed);
        assert_eq!(check.rejected[0].1, CellRejection::Occupied);
    }

    #[test]
    fn bed_requires_floor() {
        let mut inside = test_map("House");
        inside.base = vec![vec![203; 6]; 5];
        let m = manager_with(&[test_map("Home Base"), inside], "House");
        let reg = ItemRegistry::default();
        let bed = item("Red Bed", ItemCategory::Furniture);
        let check = can_place(&m, &reg, &bed, IVec2::new(2, 3), far_away());
        assert!(check.allowed, "{:?}", check.rejected);
        assert_eq!(check.footprint.unwrap().size, IVec2::new(3, 2));

        let mut m = m;
        m.load_map("Home Base").unwrap();
        let outside = can_place(&m, &reg, &bed, IVec2::new(2, 3), far_away());
        assert!(outside.rejected.iter().all(|(_, r)| *r == CellRejection::WrongBase));
        assert!(!outside.allowed);
    }

    #[test]
    fn unplaceable_item_is_refused() {
        let m = manager_with(&[test_map("Home Base")], "Home Base");
        let reg = ItemRegistry::default();
        let check = can_place(&m, &reg, &item("Lemon", ItemCategory::Food), IVec2::new(3, 3), far_away());
        assert!(!check.allowed);
        assert!(check.footprint.is_none());
    }

    #[test]
    fn placing_consumes_item_and_registers_tile() {
        let mut m = manager_with(&[test_map("Home Base")], "Home Base");
        let reg = ItemRegistry::default();
        let mut inv = Inventory::new(4, 10);
        inv.insert(item("Wooden Side Table", ItemCategory::Furniture));
        assert!(place_selected(&mut m, &reg, &mut inv, IVec2::new(3, 3), far_away()));
        assert_eq!(inv.count("Wooden Side Table"), 0);
        assert!(!m.is_walkable(IVec2::new(3, 3)));
        assert_eq!(m.tile_at(Layer::Object, IVec2::new(3, 3)).unwrap().map_name, "Home Base");

        inv.insert(item("Wooden Side Table", ItemCategory::Furniture));
        assert!(!place_selected(&mut m, &reg, &mut inv, IVec2::new(3, 3), far_away()));
        assert_eq!(inv.count("Wooden Side Table"), 1);
    }

    #[test]
    fn placed_lamp_joins_light_list() {
        let mut m = manager_with(&[test_map("Home Base")], "Home Base");
        let reg = ItemRegistry::default();
        let mut inv = Inventory::new(4, 10);
        let mut lamp = item("tile 274", ItemCategory::Furniture);
        lamp.placed_tile = Some("tile 274".into());
        inv.insert(lamp);
        assert!(place_selected(&mut m, &reg, &mut inv, IVec2::new(2, 2), far_away()));
        assert_eq!(m.lights().len(), 2);
    }
}
