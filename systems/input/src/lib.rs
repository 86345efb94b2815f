#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system translating pointer presses into hit and near-miss commands.

use wegen_arcade_core::{
    Command, SessionConfig, SessionSnapshot, SessionStatus, SlotId, SlotView, WorldPoint,
};

/// Outcome of resolving a single pointer press.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Resolution {
    /// The press landed inside a visible slot.
    Hit(SlotId),
    /// The press missed every visible slot but landed close to one.
    NearMiss {
        /// Closest visible slot.
        slot: SlotId,
        /// Distance from the press to the slot's region.
        distance: f32,
    },
    /// The press landed far from every visible slot.
    Miss,
}

/// Resolves pointer presses against the visible slots of the grid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InputResolver {
    near_miss_radius: f32,
}

impl InputResolver {
    /// Creates a resolver that treats presses within `near_miss_radius` as near misses.
    #[must_use]
    pub const fn new(near_miss_radius: f32) -> Self {
        Self { near_miss_radius }
    }

    /// Classifies a single press.
    ///
    /// Hits win over near misses. Among near-miss candidates the closest slot
    /// wins, with ties going to the lower slot id.
    #[must_use]
    pub fn resolve(&self, point: WorldPoint, slots: &SlotView) -> Resolution {
        if let Some(hit) = slots.visible().find(|slot| slot.region.contains(point)) {
            return Resolution::Hit(hit.id);
        }

        let mut best: Option<Candidate> = None;
        for slot in slots.visible() {
            let candidate = Candidate {
                slot: slot.id,
                distance: slot.region.distance_to(point),
            };
            if candidate.distance > self.near_miss_radius {
                continue;
            }
            match best {
                Some(current) if !candidate.precedes(&current) => {}
                _ => best = Some(candidate),
            }
        }

        best.map_or(Resolution::Miss, |candidate| Resolution::NearMiss {
            slot: candidate.slot,
            distance: candidate.distance,
        })
    }

    /// Resolves the frame's presses and emits the matching commands.
    ///
    /// Presses are ignored unless the session is running.
    pub fn handle(
        &self,
        presses: &[WorldPoint],
        session: &SessionSnapshot,
        slots: &SlotView,
        out: &mut Vec<Command>,
    ) {
        if session.status != SessionStatus::Running {
            return;
        }

        for point in presses {
            match self.resolve(*point, slots) {
                Resolution::Hit(slot) => out.push(Command::HitSlot { slot }),
                Resolution::NearMiss { slot, .. } => out.push(Command::RegisterNearMiss {
                    slot,
                    point: *point,
                }),
                Resolution::Miss => {}
            }
        }
    }
}

impl From<&SessionConfig> for InputResolver {
    fn from(config: &SessionConfig) -> Self {
        Self::new(config.near_miss_radius)
    }
}

impl Default for InputResolver {
    fn default() -> Self {
        Self::from(&SessionConfig::default())
    }
}

#[derive(Clone, Copy, Debug)]
struct Candidate {
    slot: SlotId,
    distance: f32,
}

impl Candidate {
    fn precedes(&self, other: &Self) -> bool {
        if self.distance != other.distance {
            return self.distance < other.distance;
        }

        self.slot < other.slot
    }
}
