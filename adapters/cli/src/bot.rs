//! Seeded stand-in for a human player.

use std::time::Duration;

use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use wegen_arcade_core::{EntityKind, SlotSnapshot, SlotView, WorldPoint};

/// Presses aimed at a bomb are aborted with this probability.
const BOMB_AVOIDANCE: f64 = 0.9;

/// Clicks visible entities after a fixed reaction delay.
#[derive(Debug)]
pub(crate) struct Bot {
    rng: ChaCha8Rng,
    accuracy: f64,
    miss_offset: f32,
    reaction: Duration,
    cooldown: Duration,
}

impl Bot {
    /// `accuracy` is the chance that a press lands inside the target.
    /// Inaccurate presses land `miss_offset` units beyond the target's edge.
    pub(crate) fn new(seed: u64, accuracy: f64, miss_offset: f32, reaction: Duration) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            accuracy: accuracy.clamp(0.0, 1.0),
            miss_offset,
            reaction,
            cooldown: reaction,
        }
    }

    /// Advances the bot by one frame, returning a press when it is ready to click.
    pub(crate) fn press(&mut self, dt: Duration, view: &SlotView) -> Option<WorldPoint> {
        self.cooldown = self.cooldown.saturating_sub(dt);
        if !self.cooldown.is_zero() {
            return None;
        }

        let candidates: Vec<&SlotSnapshot> = view.visible().collect();
        let target = *candidates.choose(&mut self.rng)?;
        if target.occupant == Some(EntityKind::Bomb) && self.rng.gen_bool(BOMB_AVOIDANCE) {
            return None;
        }

        self.cooldown = self.reaction;
        let center = target.region.center();
        if self.rng.gen_bool(self.accuracy) {
            return Some(center);
        }

        let reach = target.region.size() / 2.0 + self.miss_offset;
        let direction = if self.rng.gen_bool(0.5) { 1.0 } else { -1.0 };
        Some(WorldPoint::new(center.x, center.y + direction * reach))
    }
}
