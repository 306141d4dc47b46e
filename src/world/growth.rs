use serde::Serialize;

/// What a shear at the terminal stage yields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpoiledYield {
    DeadFlower,
    /// Resolved against the species item: food rots, flowers wilt.
    ByCategory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HarvestRule {
    /// Shearing at or above this stage resets the plant.
    pub threshold: u8,
    pub ripe_stage: u8,
    pub spoiled_stage: u8,
    pub spoiled: SpoiledYield,
    pub drops: u32,
    pub regrow_stage: u8,
}

/// Fixed growth parameters for one species family.
#[derive(Debug, PartialEq, Eq)]
pub struct GrowthConfig {
    pub max_stage: u8,
    /// Days spent in each stage before advancing; indexed by stage.
    pub days_per_stage: &'static [u32],
    /// Automatic growth stops once the stage reaches this value.
    pub ceiling: u8,
    pub harvest: Option<HarvestRule>,
}

pub const TREE: GrowthConfig = GrowthConfig {
    max_stage: 3,
    days_per_stage: &[2, 1, 1],
    ceiling: 3,
    harvest: None,
};

/// Fruit stays on the branch at stage 4; stage 5 is only reached by
/// explicit state, never by daily growth.
pub const FLOWER_TREE: GrowthConfig = GrowthConfig {
    max_stage: 5,
    days_per_stage: &[2, 1, 1, 1, 1],
    ceiling: 4,
    harvest: Some(HarvestRule {
        threshold: 4,
        ripe_stage: 4,
        spoiled_stage: 5,
        spoiled: SpoiledYield::ByCategory,
        drops: 3,
        regrow_stage: 3,
    }),
};

pub const FLOWER_BUSH: GrowthConfig = GrowthConfig {
    max_stage: 5,
    days_per_stage: &[2, 1, 1, 1, 1],
    ceiling: 5,
    harvest: Some(HarvestRule {
        threshold: 3,
        ripe_stage: 4,
        spoiled_stage: 5,
        spoiled: SpoiledYield::DeadFlower,
        drops: 3,
        regrow_stage: 2,
    }),
};

pub const FLOWER_PLANT: GrowthConfig = GrowthConfig {
    max_stage: 5,
    days_per_stage: &[1, 1, 1, 1, 1],
    ceiling: 5,
    harvest: Some(HarvestRule {
        threshold: 3,
        ripe_stage: 4,
        spoiled_stage: 5,
        spoiled: SpoiledYield::DeadFlower,
        drops: 1,
        regrow_stage: 2,
    }),
};

pub const UNKNOWN_FLOWER: &str = "Unknown Flower";
pub const UNKNOWN_TREE: &str = "Unknown Tree";

/// Item dropped by a harvest, before item-table resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Yield {
    Named(String),
    /// The spoiled form of the given species item.
    SpoiledFrom(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShearOutcome {
    /// The plant has no harvest rule at all.
    NotHarvestable,
    /// Below the maturity threshold; nothing changed.
    Immature,
    /// Stage was reset. `item` is `None` when sheared at a stage that yields nothing.
    Harvested { item: Option<Yield>, count: u32 },
}

/// `(stage, days_in_stage)` state machine shared by every growing tile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Growth {
    pub config: &'static GrowthConfig,
    pub stage: u8,
    pub days_in_stage: u32,
    pub species: String,
}

impl Growth {
    pub fn new(config: &'static GrowthConfig, species: impl Into<String>) -> Self {
        Growth {
            config,
            stage: 0,
            days_in_stage: 0,
            species: species.into(),
        }
    }

    pub fn is_saturated(&self) -> bool {
        self.stage >= self.config.ceiling
    }

    /// One simulated day. Returns true when the stage advanced.
    pub fn tick(&mut self) -> bool {
        if self.is_saturated() {
            return false;
        }
        self.days_in_stage += 1;
        let needed = self
            .config
            .days_per_stage
            .get(self.stage as usize)
            .copied()
            .unwrap_or(1);
        if self.days_in_stage >= needed {
            self.stage += 1;
            self.days_in_stage = 0;
            true
        } else {
            false
        }
    }

    pub fn shear(&mut self) -> ShearOutcome {
        let Some(rule) = self.config.harvest else {
            return ShearOutcome::NotHarvestable;
        };
        if self.stage < rule.threshold {
            return ShearOutcome::Immature;
        }

        let item = if self.stage == rule.ripe_stage {
            Some(Yield::Named(self.species.clone()))
        } else if self.stage >= rule.spoiled_stage {
            Some(match rule.spoiled {
                SpoiledYield::DeadFlower => Yield::Named(DEAD_FLOWER.to_string()),
                SpoiledYield::ByCategory => Yield::SpoiledFrom(self.species.clone()),
            })
        } else {
            None
        };

        self.stage = rule.regrow_stage;
        self.days_in_stage = 0;
        ShearOutcome::Harvested {
            item,
            count: rule.drops,
        }
    }
}

pub const DEAD_FLOWER: &str = "Dead Flower";
pub const ROTTEN_FRUIT: &str = "Rotten Fruit";

#[cfg(test)]
mod tests {
    use super::*;

    fn stages_after(config: &'static GrowthConfig, days: u32) -> u8 {
        let mut g = Growth::new(config, "Test");
        for _ in 0..days {
            g.tick();
        }
        g.stage
    }

    #[test]
    fn tree_growth_saturates_at_max_stage() {
        let observed: Vec<u8> = [0, 1, 2, 3, 4, 10]
            .iter()
            .map(|&d| stages_after(&TREE, d))
            .collect();
        assert_eq!(observed, vec![0, 0, 1, 2, 3, 3]);
    }

    #[test]
    fn growth_never_decreases_without_shear() {
        let mut g = Growth::new(&FLOWER_BUSH, "Red Rose");
        let mut last = 0;
        for _ in 0..30 {
            g.tick();
            assert!(g.stage >= last);
            assert!(g.stage <= g.config.max_stage);
            last = g.stage;
        }
        assert_eq!(g.stage, 5);
    }

    #[test]
    fn flower_tree_stops_one_below_max() {
        assert_eq!(stages_after(&FLOWER_TREE, 50), 4);
    }

    #[test]
    fn flower_plant_reaches_max() {
        assert_eq!(stages_after(&FLOWER_PLANT, 5), 5);
        assert_eq!(stages_after(&FLOWER_PLANT, 9), 5);
    }

    #[test]
    fn days_in_stage_resets_on_advance() {
        let mut g = Growth::new(&FLOWER_BUSH, "x");
        assert!(!g.tick());
        assert_eq!(g.days_in_stage, 1);
        assert!(g.tick());
        assert_eq!((g.stage, g.days_in_stage), (1, 0));
    }

    #[test]
    fn shear_ripe_plant_yields_species() {
        let mut g = Growth::new(&FLOWER_PLANT, "Daffodil");
        g.stage = 4;
        g.days_in_stage = 0;
        let outcome = g.shear();
        assert_eq!(
            outcome,
            ShearOutcome::Harvested {
                item: Some(Yield::Named("Daffodil".into())),
                count: 1
            }
        );
        assert_eq!(g.stage, 2);
    }

    #[test]
    fn shear_dead_bush_yields_three_dead_flowers() {
        let mut g = Growth::new(&FLOWER_BUSH, "Red Rose");
        g.stage = 5;
        assert_eq!(
            g.shear(),
            ShearOutcome::Harvested {
                item: Some(Yield::Named(DEAD_FLOWER.into())),
                count: 3
            }
        );
        assert_eq!((g.stage, g.days_in_stage), (2, 0));
    }

    #[test]
    fn shear_below_threshold_changes_nothing() {
        for stage in 0..3 {
            let mut g = Growth::new(&FLOWER_PLANT, "Daffodil");
            g.stage = stage;
            g.days_in_stage = 0;
            assert_eq!(g.shear(), ShearOutcome::Immature);
            assert_eq!(g.stage, stage);
        }
    }

    #[test]
    fn shear_at_threshold_resets_without_yield() {
        let mut g = Growth::new(&FLOWER_BUSH, "Moonflower");
        g.stage = 3;
        assert_eq!(
            g.shear(),
            ShearOutcome::Harvested {
                item: None,
                count: 3
            }
        );
        assert_eq!(g.stage, 2);
    }

    #[test]
    fn flower_tree_rotten_stage_resolves_by_category() {
        let mut g = Growth::new(&FLOWER_TREE, "Lemon");
        g.stage = 5;
        assert_eq!(
            g.shear(),
            ShearOutcome::Harvested {
                item: Some(Yield::SpoiledFrom("Lemon".into())),
                count: 3
            }
        );
        assert_eq!(g.stage, 3);

        g.stage = 3;
        assert_eq!(g.shear(), ShearOutcome::Immature);
    }

    #[test]
    fn plain_tree_is_not_harvestable() {
        let mut g = Growth::new(&TREE, UNKNOWN_TREE);
        g.stage = 3;
        assert_eq!(g.shear(), ShearOutcome::NotHarvestable);
        assert_eq!(g.stage, 3);
    }
}
