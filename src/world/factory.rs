use std::collections::HashMap;

use crate::world::definitions::{BehaviorKind, TileDefinition};
use crate::world::geometry::GridPos;
use crate::world::growth::{
    Growth, FLOWER_BUSH, FLOWER_PLANT, FLOWER_TREE, TREE, UNKNOWN_FLOWER, UNKNOWN_TREE,
};
use crate::world::tile::{Behavior, GrassState, TileInstance};

/// Builds the behavior state and initial flags for one behavior tag.
pub type Constructor = fn(&TileDefinition) -> Blueprint;

#[derive(Debug, Clone)]
pub struct Blueprint {
    pub behavior: Behavior,
    pub is_on: bool,
    pub interactable: bool,
}

impl Blueprint {
    fn inert(behavior: Behavior) -> Self {
        Blueprint {
            behavior,
            is_on: false,
            interactable: false,
        }
    }

    fn interactive(behavior: Behavior) -> Self {
        Blueprint {
            behavior,
            is_on: false,
            interactable: true,
        }
    }

    fn lit(mut self) -> Self {
        self.is_on = true;
        self
    }
}

fn species(def: &TileDefinition, fallback: &str) -> String {
    def.param.clone().unwrap_or_else(|| fallback.to_string())
}

/// Maps each behavior tag to its constructor. Tags without a registered
/// constructor produce an inert static tile.
pub struct TileFactory {
    constructors: HashMap<BehaviorKind, Constructor>,
}

impl Default for TileFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl TileFactory {
    /// An empty registry; every tile comes out static.
    pub fn empty() -> Self {
        TileFactory {
            constructors: HashMap::new(),
        }
    }

    /// Registry with every built-in behavior.
    pub fn new() -> Self {
        let mut f = Self::empty();
        f.register(BehaviorKind::Static, |_| Blueprint::inert(Behavior::Static));
        f.register(BehaviorKind::Wall, |_| Blueprint::inert(Behavior::Wall));
        f.register(BehaviorKind::Floor, |_| Blueprint::inert(Behavior::Floor));
        f.register(BehaviorKind::Dirt, |_| Blueprint::inert(Behavior::Dirt));
        f.register(BehaviorKind::Grass, |_| {
            Blueprint::interactive(Behavior::Grass(GrassState::default()))
        });
        f.register(BehaviorKind::FlowerPlant, |d| {
            Blueprint::interactive(Behavior::FlowerPlant(Growth::new(
                &FLOWER_PLANT,
                species(d, UNKNOWN_FLOWER),
            )))
        });
        f.register(BehaviorKind::FlowerBush, |d| {
            Blueprint::interactive(Behavior::FlowerBush(Growth::new(
                &FLOWER_BUSH,
                species(d, UNKNOWN_FLOWER),
            )))
        });
        f.register(BehaviorKind::FlowerTree, |d| {
            Blueprint::interactive(Behavior::FlowerTree(Growth::new(
                &FLOWER_TREE,
                species(d, UNKNOWN_TREE),
            )))
        });
        f.register(BehaviorKind::Tree, |d| {
            Blueprint::inert(Behavior::Tree(Growth::new(&TREE, species(d, UNKNOWN_TREE))))
        });
        f.register(BehaviorKind::Lamp, |_| Blueprint::interactive(Behavior::Lamp).lit());
        f.register(BehaviorKind::InvisibleLight, |_| {
            Blueprint::inert(Behavior::InvisibleLight).lit()
        });
        f.register(BehaviorKind::Candle, |_| Blueprint::interactive(Behavior::Candle));
        f.register(BehaviorKind::Fireplace, |_| {
            Blueprint::interactive(Behavior::Fireplace)
        });
        f.register(BehaviorKind::Furniture, |_| {
            Blueprint::interactive(Behavior::Furniture)
        });
        f.register(BehaviorKind::Fence, |_| Blueprint::interactive(Behavior::Fence));
        f.register(BehaviorKind::Bed, |_| Blueprint::interactive(Behavior::Bed).lit());
        f.register(BehaviorKind::Window, |d| {
            let index = d.variants.iter().position(|&v| v == d.id).unwrap_or(0);
            Blueprint::interactive(Behavior::Window {
                variants: d.variants.clone(),
                index,
            })
        });
        f.register(BehaviorKind::Animated, |_| Blueprint::inert(Behavior::Animated));
        f.register(BehaviorKind::Sky, |d| {
            Blueprint::inert(Behavior::Sky {
                day: d.variants.clone(),
                night: d.night_variants.clone(),
                day_index: 0,
                night_index: 0,
            })
        });
        f.register(BehaviorKind::BibleStand, |_| {
            Blueprint::interactive(Behavior::BibleStand)
        });
        f.register(BehaviorKind::Mailbox, |_| Blueprint::interactive(Behavior::Mailbox));
        f.register(BehaviorKind::Bridge, |_| Blueprint::interactive(Behavior::Bridge));
        f.register(BehaviorKind::Door, |d| match &d.door {
            Some(target) => Blueprint::interactive(Behavior::Door(target.clone())),
            None => Blueprint::inert(Behavior::Static),
        });
        f
    }

    pub fn register(&mut self, kind: BehaviorKind, constructor: Constructor) {
        self.constructors.insert(kind, constructor);
    }

    pub fn is_registered(&self, kind: BehaviorKind) -> bool {
        self.constructors.contains_key(&kind)
    }

    /// Fresh instance for `def` at `position` in `map_name`.
    pub fn create(&self, def: &TileDefinition, position: GridPos, map_name: &str) -> TileInstance {
        let blueprint = match self.constructors.get(&def.behavior) {
            Some(ctor) => ctor(def),
            None => Blueprint::inert(Behavior::Static),
        };
        let mut instance = TileInstance::new(position, def.id, map_name, blueprint.behavior);
        instance.is_on = blueprint.is_on;
        instance.interactable = blueprint.interactable;
        instance
    }
}
