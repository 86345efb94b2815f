#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure difficulty engine that derives stages, spawn tables, and entity timings.
//!
//! Stages reward players who conserve their time bank: holding more time at
//! a given point of the run raises the stage just as surely as elapsed time
//! does. Both conditions are combined with OR semantics.

use std::time::Duration;

use rand::Rng;
use wegen_arcade_core::{DifficultyStage, EntityCatalog, EntityKind, EntityTypeDef};

const STAGE_FOUR_ELAPSED: Duration = Duration::from_secs(60);
const STAGE_THREE_ELAPSED: Duration = Duration::from_secs(40);
const STAGE_TWO_ELAPSED: Duration = Duration::from_secs(20);
const TIME_BANK_BAND_SECS: u32 = 20;

/// Multipliers applied to baseline hold and rise durations, indexed by stage.
const STAGE_SPEED_FACTORS: [f64; DifficultyStage::COUNT] = [1.0, 0.85, 0.7, 0.55];

/// Derives the difficulty stage from active elapsed time and the time bank.
#[must_use]
pub fn stage(elapsed: Duration, time_remaining: u32) -> DifficultyStage {
    let bands = time_remaining / TIME_BANK_BAND_SECS;
    if elapsed > STAGE_FOUR_ELAPSED || bands > 2 {
        DifficultyStage::Four
    } else if elapsed > STAGE_THREE_ELAPSED || bands > 1 {
        DifficultyStage::Three
    } else if elapsed > STAGE_TWO_ELAPSED {
        DifficultyStage::Two
    } else {
        DifficultyStage::One
    }
}

/// Factor applied to baseline durations at the provided stage.
#[must_use]
pub fn speed_factor(stage: DifficultyStage) -> f64 {
    STAGE_SPEED_FACTORS[stage.index()]
}

/// Interactable and animation durations for an entity at a given stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EntityTiming {
    /// Time the entity stays interactable.
    pub hold: Duration,
    /// Duration of the appearance animation.
    pub rise: Duration,
}

/// Scales the catalog baselines of an entity down as the stage increases.
#[must_use]
pub fn timing(definition: &EntityTypeDef, stage: DifficultyStage) -> EntityTiming {
    let factor = speed_factor(stage);
    EntityTiming {
        hold: scale(definition.hold(), factor),
        rise: scale(definition.rise(), factor),
    }
}

fn scale(duration: Duration, factor: f64) -> Duration {
    let millis = duration.as_millis() as f64 * factor;
    Duration::from_millis(millis.round() as u64)
}

/// Weighted spawn table for a single stage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WeightTable {
    entries: Vec<(EntityKind, u32)>,
    total: u32,
}

impl WeightTable {
    /// Builds the spawn table of the provided stage from catalog weights.
    #[must_use]
    pub fn for_stage(catalog: &EntityCatalog, stage: DifficultyStage) -> Self {
        let entries: Vec<(EntityKind, u32)> = catalog
            .iter()
            .map(|definition| (definition.kind(), definition.spawn_weight(stage)))
            .collect();
        let total = entries
            .iter()
            .fold(0_u32, |sum, (_, weight)| sum.saturating_add(*weight));
        Self { entries, total }
    }

    /// Entity kinds paired with their relative weights, in catalog order.
    #[must_use]
    pub fn entries(&self) -> &[(EntityKind, u32)] {
        &self.entries
    }

    /// Sum of every weight in the table.
    #[must_use]
    pub const fn total(&self) -> u32 {
        self.total
    }

    /// Resolves a roll in `[0, total)` by walking the cumulative weights.
    ///
    /// Returns `None` when the roll lies outside the table.
    #[must_use]
    pub fn pick(&self, roll: u32) -> Option<EntityKind> {
        let mut remaining = roll;
        for (kind, weight) in &self.entries {
            if remaining < *weight {
                return Some(*kind);
            }
            remaining -= weight;
        }
        None
    }

    /// Draws a kind with probability proportional to its weight.
    pub fn sample<R>(&self, rng: &mut R) -> Option<EntityKind>
    where
        R: Rng + ?Sized,
    {
        if self.total == 0 {
            return None;
        }
        self.pick(rng.gen_range(0..self.total))
    }
}

/// Difficulty engine holding the precomputed spawn tables of every stage.
#[derive(Debug)]
pub struct DifficultyEngine {
    catalog: &'static EntityCatalog,
    tables: Vec<WeightTable>,
}

impl Default for DifficultyEngine {
    fn default() -> Self {
        Self::new(EntityCatalog::standard())
    }
}

impl DifficultyEngine {
    /// Creates an engine over the provided catalog.
    #[must_use]
    pub fn new(catalog: &'static EntityCatalog) -> Self {
        let tables = DifficultyStage::ALL
            .iter()
            .map(|stage| WeightTable::for_stage(catalog, *stage))
            .collect();
        Self { catalog, tables }
    }

    /// Catalog the engine draws definitions from.
    #[must_use]
    pub fn catalog(&self) -> &'static EntityCatalog {
        self.catalog
    }

    /// Derives the current stage. See [`stage`].
    #[must_use]
    pub fn stage(&self, elapsed: Duration, time_remaining: u32) -> DifficultyStage {
        stage(elapsed, time_remaining)
    }

    /// Spawn table of the provided stage.
    #[must_use]
    pub fn weight_table(&self, stage: DifficultyStage) -> &WeightTable {
        &self.tables[stage.index()]
    }

    /// Stage-scaled timings of the provided entity kind.
    #[must_use]
    pub fn timing(&self, kind: EntityKind, stage: DifficultyStage) -> EntityTiming {
        timing(self.catalog.get(kind), stage)
    }
}
