//! Process-wide immutable table of entity definitions.

use std::time::Duration;

use crate::{DifficultyStage, EntityKind};

/// How a completed entity affects the score and the time bank.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntityBehavior {
    /// Credits combo-multiplied points.
    Standard,
    /// Adds its time effect to the time bank.
    Clock,
    /// Subtracts points and seconds and breaks the combo.
    Bomb,
    /// Applies one uniformly drawn mystery effect.
    Mystery,
}

/// Immutable catalog entry describing one entity type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EntityTypeDef {
    kind: EntityKind,
    base_points: i32,
    hits_required: u32,
    time_effect_seconds: Option<i32>,
    hold: Duration,
    rise: Duration,
    spawn_weights: [u32; DifficultyStage::COUNT],
    behavior: EntityBehavior,
    precision: bool,
}

impl EntityTypeDef {
    /// Kind identifying the entry.
    #[must_use]
    pub const fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Points credited before the combo multiplier. Negative for penalties.
    #[must_use]
    pub const fn base_points(&self) -> i32 {
        self.base_points
    }

    /// Number of hits needed to complete the entity. Always at least one.
    #[must_use]
    pub const fn hits_required(&self) -> u32 {
        self.hits_required
    }

    /// Signed adjustment applied to the time bank on completion.
    #[must_use]
    pub const fn time_effect_seconds(&self) -> Option<i32> {
        self.time_effect_seconds
    }

    /// Baseline interactable duration at stage one.
    #[must_use]
    pub const fn hold(&self) -> Duration {
        self.hold
    }

    /// Baseline appearance animation duration at stage one.
    #[must_use]
    pub const fn rise(&self) -> Duration {
        self.rise
    }

    /// Relative spawn weight at the provided stage.
    #[must_use]
    pub const fn spawn_weight(&self, stage: DifficultyStage) -> u32 {
        self.spawn_weights[stage.index()]
    }

    /// Scoring behavior applied on completion.
    #[must_use]
    pub const fn behavior(&self) -> EntityBehavior {
        self.behavior
    }

    /// Whether completing the entity counts as a perfect hit.
    #[must_use]
    pub const fn precision(&self) -> bool {
        self.precision
    }
}

/// Read-only table of every entity type, indexed by [`EntityKind`].
#[derive(Debug)]
pub struct EntityCatalog {
    entries: [EntityTypeDef; EntityKind::COUNT],
}

static STANDARD: EntityCatalog = EntityCatalog {
    entries: [
        EntityTypeDef {
            kind: EntityKind::WegenNormal,
            base_points: 10,
            hits_required: 1,
            time_effect_seconds: None,
            hold: Duration::from_millis(1_200),
            rise: Duration::from_millis(200),
            spawn_weights: [70, 58, 44, 30],
            behavior: EntityBehavior::Standard,
            precision: false,
        },
        EntityTypeDef {
            kind: EntityKind::WegenGolden,
            base_points: 30,
            hits_required: 1,
            time_effect_seconds: None,
            hold: Duration::from_millis(750),
            rise: Duration::from_millis(150),
            spawn_weights: [5, 8, 10, 12],
            behavior: EntityBehavior::Standard,
            precision: true,
        },
        EntityTypeDef {
            kind: EntityKind::WegenArmored,
            base_points: 25,
            hits_required: 3,
            time_effect_seconds: None,
            hold: Duration::from_millis(1_800),
            rise: Duration::from_millis(250),
            spawn_weights: [0, 8, 12, 16],
            behavior: EntityBehavior::Standard,
            precision: true,
        },
        EntityTypeDef {
            kind: EntityKind::Clock,
            base_points: 0,
            hits_required: 1,
            time_effect_seconds: Some(5),
            hold: Duration::from_millis(1_000),
            rise: Duration::from_millis(200),
            spawn_weights: [12, 10, 8, 6],
            behavior: EntityBehavior::Clock,
            precision: false,
        },
        EntityTypeDef {
            kind: EntityKind::Bomb,
            base_points: -20,
            hits_required: 1,
            time_effect_seconds: Some(-15),
            hold: Duration::from_millis(1_400),
            rise: Duration::from_millis(200),
            spawn_weights: [8, 10, 16, 22],
            behavior: EntityBehavior::Bomb,
            precision: false,
        },
        EntityTypeDef {
            kind: EntityKind::Mystery,
            base_points: 0,
            hits_required: 1,
            time_effect_seconds: None,
            hold: Duration::from_millis(1_000),
            rise: Duration::from_millis(200),
            spawn_weights: [5, 6, 10, 14],
            behavior: EntityBehavior::Mystery,
            precision: false,
        },
    ],
};

impl EntityCatalog {
    /// Returns the catalog shared by every session in the process.
    #[must_use]
    pub fn standard() -> &'static Self {
        &STANDARD
    }

    /// Looks up the definition of the provided kind.
    #[must_use]
    pub fn get(&self, kind: EntityKind) -> &EntityTypeDef {
        &self.entries[kind.index()]
    }

    /// Iterator over every definition in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &EntityTypeDef> {
        self.entries.iter()
    }
}
