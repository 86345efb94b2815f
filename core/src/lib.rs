#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Wegen Arcade minigame.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative session, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the session executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems and
//! collaborators to react to deterministically. Systems consume event streams,
//! query immutable snapshots, and respond exclusively with new command batches.

mod catalog;
mod config;

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub use catalog::{EntityBehavior, EntityCatalog, EntityTypeDef};
pub use config::{ConfigError, GameConfig, SessionConfig, SpawnConfig};

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Wegen Arcade.";

/// Fraction of a grid cell covered by the clickable region of its slot.
pub const HIT_BOX_RATIO: f32 = 0.8;

/// Lifecycle states of a game session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Session has been built but the countdown has not started.
    Waiting,
    /// Countdown and spawn timers are live.
    Running,
    /// Every timer is frozen in place until the session resumes.
    Paused,
    /// Terminal state; the final result has been emitted.
    Ended,
}

/// Reasons a session transitions into [`SessionStatus::Ended`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// The time bank reached zero.
    TimeExpired,
    /// The host explicitly ended the session.
    Requested,
    /// The host is about to terminate (page unload, process shutdown).
    ForcedTermination,
}

/// Commands that express all permissible session mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Starts the countdown and spawn timers. Valid only while waiting.
    Start,
    /// Freezes every live timer. Valid only while running.
    Pause,
    /// Restarts frozen timers. Valid only while paused.
    Resume,
    /// Advances the session clock by the provided delta time.
    Tick {
        /// Duration of monotonic time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Requests that an entity appear in a hidden slot.
    ShowEntity {
        /// Slot that should display the entity.
        slot: SlotId,
        /// Catalog entry describing the entity.
        kind: EntityKind,
        /// Time the entity stays interactable before hiding on its own.
        hold: Duration,
        /// Duration of the appearance animation, forwarded to the renderer.
        rise: Duration,
    },
    /// Registers a pointer hit landing inside a slot's region.
    HitSlot {
        /// Slot that received the hit.
        slot: SlotId,
    },
    /// Registers a pointer press that narrowly missed a visible entity.
    RegisterNearMiss {
        /// Visible slot closest to the pointer.
        slot: SlotId,
        /// Pointer location expressed in world units.
        point: WorldPoint,
    },
    /// Ends the session. Idempotent.
    End,
    /// Signals that the host is about to terminate.
    Terminate,
    /// Repositions slot regions in place after the viewport changed.
    ConfigureLayout {
        /// New layout for the existing slots.
        layout: SlotLayout,
    },
}

/// Events broadcast by the session after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Confirms that the session left the waiting state.
    SessionStarted {
        /// Initial contents of the time bank in whole seconds.
        time_remaining: u32,
        /// Number of slots laid out in the grid.
        slots: u32,
    },
    /// Indicates that the active session clock advanced.
    TimeAdvanced {
        /// Duration of active time that elapsed in the tick.
        dt: Duration,
    },
    /// Reports that one countdown second elapsed.
    CountdownTicked {
        /// Seconds left in the time bank after the decrement.
        time_remaining: u32,
    },
    /// Announces that the derived difficulty stage changed.
    StageChanged {
        /// Stage that became active.
        stage: DifficultyStage,
    },
    /// Confirms that an entity appeared in a slot.
    EntityShown {
        /// Slot that now displays the entity.
        slot: SlotId,
        /// Entity that appeared.
        kind: EntityKind,
        /// Hits required before the entity is completed.
        hits_remaining: u32,
        /// Interactable duration armed for the slot.
        hold: Duration,
        /// Appearance animation duration.
        rise: Duration,
    },
    /// Reports a hit on a multi-hit entity that still requires more hits.
    EntityPartiallyHit {
        /// Slot that received the hit.
        slot: SlotId,
        /// Entity occupying the slot.
        kind: EntityKind,
        /// Hits still required after this one.
        hits_remaining: u32,
    },
    /// Reports that an entity received its final hit and was scored.
    EntityCompleted {
        /// Slot that was cleared.
        slot: SlotId,
        /// Entity that was completed.
        kind: EntityKind,
        /// Score or time effect applied for the completion.
        effect: HitEffect,
        /// Score after the effect.
        score: u32,
        /// Combo count after the effect.
        combo: u32,
        /// Time bank after the effect.
        time_remaining: u32,
    },
    /// Reports that an entity hid itself after its hold duration elapsed.
    EntityExpired {
        /// Slot that was cleared.
        slot: SlotId,
        /// Entity that left without being completed.
        kind: EntityKind,
    },
    /// Reports that a slot was force-hidden while the session ended.
    SlotCleared {
        /// Slot that was cleared.
        slot: SlotId,
    },
    /// Reports a pointer press that narrowly missed a visible entity.
    NearMiss {
        /// Visible slot closest to the pointer.
        slot: SlotId,
        /// Pointer location expressed in world units.
        point: WorldPoint,
        /// Total misses recorded in the session so far.
        miss_count: u32,
    },
    /// Confirms that every timer was frozen.
    SessionPaused,
    /// Confirms that frozen timers restarted.
    SessionResumed,
    /// Confirms that slot regions were repositioned.
    LayoutConfigured {
        /// Layout now in effect.
        layout: SlotLayout,
    },
    /// Terminal event carrying the final result. Emitted at most once.
    SessionEnded {
        /// Final result of the session.
        result: SessionResult,
    },
}

/// Unique identifier assigned to a slot in the grid.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct SlotId(u32);

impl SlotId {
    /// Creates a new slot identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Entity types listed in the [`EntityCatalog`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// Default target worth a handful of points.
    WegenNormal,
    /// Short-lived precision target worth more points.
    WegenGolden,
    /// Multi-hit target.
    WegenArmored,
    /// Adds seconds to the time bank.
    Clock,
    /// Costs points and seconds, and breaks the combo.
    Bomb,
    /// Applies one random effect.
    Mystery,
}

impl EntityKind {
    /// Number of entity kinds in the catalog.
    pub const COUNT: usize = 6;

    /// Every entity kind in catalog order.
    pub const ALL: [EntityKind; Self::COUNT] = [
        Self::WegenNormal,
        Self::WegenGolden,
        Self::WegenArmored,
        Self::Clock,
        Self::Bomb,
        Self::Mystery,
    ];

    /// Stable string identifier used by collaborators and logs.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::WegenNormal => "wegen_normal",
            Self::WegenGolden => "wegen_golden",
            Self::WegenArmored => "wegen_armored",
            Self::Clock => "clock",
            Self::Bomb => "bomb",
            Self::Mystery => "mystery",
        }
    }

    /// Position of the kind inside [`EntityKind::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::WegenNormal => 0,
            Self::WegenGolden => 1,
            Self::WegenArmored => 2,
            Self::Clock => 3,
            Self::Bomb => 4,
            Self::Mystery => 5,
        }
    }
}

/// Discrete difficulty level derived from elapsed time and the time bank.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DifficultyStage {
    /// Opening stage.
    One,
    /// Reached after twenty seconds of play.
    Two,
    /// Introduces paired spawns.
    Three,
    /// Hardest stage.
    Four,
}

impl DifficultyStage {
    /// Number of stages.
    pub const COUNT: usize = 4;

    /// Every stage in ascending order.
    pub const ALL: [DifficultyStage; Self::COUNT] =
        [Self::One, Self::Two, Self::Three, Self::Four];

    /// Numeric stage level in the range `1..=4`.
    #[must_use]
    pub const fn get(self) -> u8 {
        match self {
            Self::One => 1,
            Self::Two => 2,
            Self::Three => 3,
            Self::Four => 4,
        }
    }

    /// Zero-based index suitable for per-stage tables.
    #[must_use]
    pub const fn index(self) -> usize {
        self.get() as usize - 1
    }
}

/// Random outcomes of a completed mystery entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MysteryEffect {
    /// Removes ten seconds from the time bank.
    TimePenalty,
    /// Adds five seconds to the time bank.
    TimeBonus,
    /// Adds fifty points.
    LargeScoreBonus,
    /// Adds fifteen points.
    SmallScoreBonus,
}

impl MysteryEffect {
    /// Every mystery effect, each drawn with equal probability.
    pub const ALL: [MysteryEffect; 4] = [
        Self::TimePenalty,
        Self::TimeBonus,
        Self::LargeScoreBonus,
        Self::SmallScoreBonus,
    ];
}

/// Score and time-bank effect applied when an entity is completed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HitEffect {
    /// Points credited after the combo multiplier.
    Points {
        /// Points added to the score.
        awarded: u32,
    },
    /// Seconds added to the time bank.
    TimeBonus {
        /// Seconds added.
        seconds: u32,
    },
    /// Bomb penalty applied to both score and time bank.
    Bomb {
        /// Points actually removed after clamping at zero.
        score_lost: u32,
        /// Seconds actually removed after clamping at zero.
        seconds_lost: u32,
    },
    /// Random mystery outcome.
    Mystery(MysteryEffect),
}

/// Location expressed in world units (the renderer's logical pixels).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldPoint {
    /// Horizontal coordinate.
    pub x: f32,
    /// Vertical coordinate.
    pub y: f32,
}

impl WorldPoint {
    /// Creates a new point.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned clickable region of a slot expressed in world units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SlotRegion {
    origin: WorldPoint,
    size: f32,
}

impl SlotRegion {
    /// Constructs a square region from its upper-left corner and edge length.
    #[must_use]
    pub const fn new(origin: WorldPoint, size: f32) -> Self {
        Self { origin, size }
    }

    /// Upper-left corner of the region.
    #[must_use]
    pub const fn origin(&self) -> WorldPoint {
        self.origin
    }

    /// Edge length of the region.
    #[must_use]
    pub const fn size(&self) -> f32 {
        self.size
    }

    /// Center of the region.
    #[must_use]
    pub fn center(&self) -> WorldPoint {
        let half = self.size / 2.0;
        WorldPoint::new(self.origin.x + half, self.origin.y + half)
    }

    /// Reports whether the point lies inside the region, edges included.
    #[must_use]
    pub fn contains(&self, point: WorldPoint) -> bool {
        point.x >= self.origin.x
            && point.x <= self.origin.x + self.size
            && point.y >= self.origin.y
            && point.y <= self.origin.y + self.size
    }

    /// Euclidean distance from the point to the closest edge of the region.
    ///
    /// Points inside the region report a distance of zero.
    #[must_use]
    pub fn distance_to(&self, point: WorldPoint) -> f32 {
        let max_x = self.origin.x + self.size;
        let max_y = self.origin.y + self.size;
        let dx = (self.origin.x - point.x).max(point.x - max_x).max(0.0);
        let dy = (self.origin.y - point.y).max(point.y - max_y).max(0.0);
        (dx * dx + dy * dy).sqrt()
    }
}

/// Grid layout that maps slots onto world-space regions.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SlotLayout {
    columns: u32,
    rows: u32,
    cell_size: f32,
    origin: WorldPoint,
}

impl SlotLayout {
    /// Creates a layout of `columns` by `rows` square cells.
    #[must_use]
    pub const fn new(columns: u32, rows: u32, cell_size: f32, origin: WorldPoint) -> Self {
        Self {
            columns,
            rows,
            cell_size,
            origin,
        }
    }

    /// Number of cell columns.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of cell rows.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Edge length of a cell in world units.
    #[must_use]
    pub const fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Upper-left corner of the grid.
    #[must_use]
    pub const fn origin(&self) -> WorldPoint {
        self.origin
    }

    /// Total number of slots described by the layout.
    #[must_use]
    pub const fn slot_count(&self) -> u32 {
        self.columns.saturating_mul(self.rows)
    }

    /// Computes the clickable region of the slot, if it belongs to the layout.
    ///
    /// Slots are numbered row by row. The region is centered inside its cell
    /// and covers [`HIT_BOX_RATIO`] of the cell edge.
    #[must_use]
    pub fn region(&self, slot: SlotId) -> Option<SlotRegion> {
        if self.columns == 0 || slot.get() >= self.slot_count() {
            return None;
        }

        let column = slot.get() % self.columns;
        let row = slot.get() / self.columns;
        let size = self.cell_size * HIT_BOX_RATIO;
        let inset = (self.cell_size - size) / 2.0;
        let origin = WorldPoint::new(
            self.origin.x + column as f32 * self.cell_size + inset,
            self.origin.y + row as f32 * self.cell_size + inset,
        );
        Some(SlotRegion::new(origin, size))
    }
}

/// Final outcome of a session, emitted exactly once.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionResult {
    /// Score after the end-of-run bonus.
    pub score: u32,
    /// Score before the end-of-run bonus.
    pub raw_score: u32,
    /// Whether the flawless-run bonus multiplied the score.
    pub bonus_applied: bool,
    /// Near misses recorded during the session.
    pub miss_count: u32,
    /// Precision entities completed during the session.
    pub perfect_hit_count: u32,
    /// Trigger that ended the session.
    pub reason: EndReason,
}

/// Immutable representation of a single slot used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SlotSnapshot {
    /// Identifier of the slot.
    pub id: SlotId,
    /// Clickable region of the slot.
    pub region: SlotRegion,
    /// Entity currently occupying the slot.
    pub occupant: Option<EntityKind>,
    /// Hits still required to complete the occupant.
    pub hits_remaining: u32,
    /// Whether the slot currently displays an entity.
    pub visible: bool,
    /// Interactable time left before the occupant hides on its own.
    pub hold_remaining: Option<Duration>,
}

/// Read-only snapshot describing every slot of the grid.
#[derive(Clone, Debug, Default)]
pub struct SlotView {
    snapshots: Vec<SlotSnapshot>,
}

impl SlotView {
    /// Creates a new slot view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<SlotSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured slot snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &SlotSnapshot> {
        self.snapshots.iter()
    }

    /// Iterator over the slots that currently display an entity.
    pub fn visible(&self) -> impl Iterator<Item = &SlotSnapshot> {
        self.snapshots.iter().filter(|snapshot| snapshot.visible)
    }

    /// Identifiers of the slots eligible for a new spawn.
    #[must_use]
    pub fn hidden_ids(&self) -> Vec<SlotId> {
        self.snapshots
            .iter()
            .filter(|snapshot| !snapshot.visible)
            .map(|snapshot| snapshot.id)
            .collect()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<SlotSnapshot> {
        self.snapshots
    }
}

/// Read-only summary of the session counters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// Lifecycle state.
    pub status: SessionStatus,
    /// Difficulty stage derived on the latest tick.
    pub stage: DifficultyStage,
    /// Active time since the session started, excluding pauses.
    pub elapsed: Duration,
    /// Seconds left in the time bank.
    pub time_remaining: u32,
    /// Current score.
    pub score: u32,
    /// Current combo streak.
    pub combo: u32,
    /// Near misses recorded so far.
    pub miss_count: u32,
    /// Precision entities completed so far.
    pub perfect_hit_count: u32,
}
