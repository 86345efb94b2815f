#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Combo, score, and time-bank arithmetic for completed entities.
//!
//! Every mutation of the score or the time bank goes through [`Scoring`], and
//! every mutation clamps at zero immediately so neither counter can be
//! observed negative.

use std::time::Duration;

use rand::Rng;
use wegen_arcade_core::{
    EntityBehavior, EntityTypeDef, HitEffect, MysteryEffect, SessionConfig,
};

/// Combo multiplier ceiling.
pub const MAX_COMBO_MULTIPLIER: f64 = 2.0;
const COMBO_STEP: f64 = 0.1;

const MYSTERY_TIME_PENALTY_SECS: i64 = 10;
const MYSTERY_TIME_BONUS_SECS: i64 = 5;
const MYSTERY_LARGE_SCORE_BONUS: i64 = 50;
const MYSTERY_SMALL_SCORE_BONUS: i64 = 15;

/// Multiplier applied to standard entity points for a hit that extends a
/// streak of `chained` earlier hits.
#[must_use]
pub fn combo_multiplier(chained: u32) -> f64 {
    (1.0 + COMBO_STEP * f64::from(chained)).min(MAX_COMBO_MULTIPLIER)
}

/// Mutable score, combo, and time-bank counters of one session.
#[derive(Clone, Debug, PartialEq)]
pub struct Scoreboard {
    score: u32,
    combo: u32,
    last_hit: Option<Duration>,
    time_remaining: u32,
    miss_count: u32,
    perfect_hit_count: u32,
    finalized: Option<FinalScore>,
}

impl Scoreboard {
    /// Creates a fresh scoreboard holding the provided time bank.
    #[must_use]
    pub const fn new(time_bank_secs: u32) -> Self {
        Self {
            score: 0,
            combo: 0,
            last_hit: None,
            time_remaining: time_bank_secs,
            miss_count: 0,
            perfect_hit_count: 0,
            finalized: None,
        }
    }

    /// Creates a scoreboard that already holds `score` points.
    #[must_use]
    pub const fn with_score(time_bank_secs: u32, score: u32) -> Self {
        let mut board = Self::new(time_bank_secs);
        board.score = score;
        board
    }

    /// Current score.
    #[must_use]
    pub const fn score(&self) -> u32 {
        self.score
    }

    /// Current combo streak.
    #[must_use]
    pub const fn combo(&self) -> u32 {
        self.combo
    }

    /// Seconds left in the time bank.
    #[must_use]
    pub const fn time_remaining(&self) -> u32 {
        self.time_remaining
    }

    /// Near misses recorded so far.
    #[must_use]
    pub const fn miss_count(&self) -> u32 {
        self.miss_count
    }

    /// Precision entities completed so far.
    #[must_use]
    pub const fn perfect_hit_count(&self) -> u32 {
        self.perfect_hit_count
    }

    /// Final score, once [`Scoring::finalize`] ran.
    #[must_use]
    pub const fn final_score(&self) -> Option<FinalScore> {
        self.finalized
    }

    fn add_score(&mut self, delta: i64) -> i64 {
        let before = self.score;
        self.score = clamp_counter(i64::from(before) + delta);
        i64::from(self.score) - i64::from(before)
    }

    fn add_time(&mut self, delta: i64) -> i64 {
        let before = self.time_remaining;
        self.time_remaining = clamp_counter(i64::from(before) + delta);
        i64::from(self.time_remaining) - i64::from(before)
    }
}

fn clamp_counter(value: i64) -> u32 {
    value.clamp(0, i64::from(u32::MAX)) as u32
}

/// Outcome of the end-of-run bonus computation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FinalScore {
    /// Score after the bonus.
    pub score: u32,
    /// Score before the bonus.
    pub raw_score: u32,
    /// Whether the flawless-run bonus was applied.
    pub bonus_applied: bool,
}

/// Scoring parameters derived from the session configuration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScoringConfig {
    combo_window: Duration,
    perfect_bonus_threshold: u32,
    perfect_bonus_multiplier: f64,
}

impl ScoringConfig {
    /// Creates scoring parameters.
    #[must_use]
    pub const fn new(
        combo_window: Duration,
        perfect_bonus_threshold: u32,
        perfect_bonus_multiplier: f64,
    ) -> Self {
        Self {
            combo_window,
            perfect_bonus_threshold,
            perfect_bonus_multiplier,
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self::from(&SessionConfig::default())
    }
}

impl From<&SessionConfig> for ScoringConfig {
    fn from(config: &SessionConfig) -> Self {
        Self::new(
            config.combo_window(),
            config.perfect_bonus_threshold,
            config.perfect_bonus_multiplier,
        )
    }
}

/// Scoring engine applying entity effects to a [`Scoreboard`].
#[derive(Clone, Copy, Debug, Default)]
pub struct Scoring {
    config: ScoringConfig,
}

impl Scoring {
    /// Creates a scoring engine with the provided parameters.
    #[must_use]
    pub const fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    /// Applies the effect of a completed entity at session time `now`.
    ///
    /// The combo is updated first. Mystery entities draw their effect from
    /// `rng`; all other behaviors are deterministic.
    pub fn apply_completed_hit<R>(
        &self,
        board: &mut Scoreboard,
        definition: &EntityTypeDef,
        now: Duration,
        rng: &mut R,
    ) -> HitEffect
    where
        R: Rng + ?Sized,
    {
        self.advance_combo(board, now);

        if definition.precision() {
            board.perfect_hit_count = board.perfect_hit_count.saturating_add(1);
        }

        match definition.behavior() {
            EntityBehavior::Standard => {
                let multiplier = combo_multiplier(board.combo.saturating_sub(1));
                let points = (f64::from(definition.base_points()) * multiplier).round() as i64;
                let added = board.add_score(points);
                HitEffect::Points {
                    awarded: added.max(0) as u32,
                }
            }
            EntityBehavior::Clock => {
                let seconds = i64::from(definition.time_effect_seconds().unwrap_or(0));
                let added = board.add_time(seconds);
                HitEffect::TimeBonus {
                    seconds: added.max(0) as u32,
                }
            }
            EntityBehavior::Bomb => {
                let score_delta = board.add_score(i64::from(definition.base_points()));
                let time_delta =
                    board.add_time(i64::from(definition.time_effect_seconds().unwrap_or(0)));
                board.combo = 0;
                HitEffect::Bomb {
                    score_lost: score_delta.unsigned_abs() as u32,
                    seconds_lost: time_delta.unsigned_abs() as u32,
                }
            }
            EntityBehavior::Mystery => {
                let effect = MysteryEffect::ALL[rng.gen_range(0..MysteryEffect::ALL.len())];
                apply_mystery(board, effect);
                HitEffect::Mystery(effect)
            }
        }
    }

    /// Records a near miss: the combo breaks and the miss counter grows.
    pub fn register_near_miss(&self, board: &mut Scoreboard) {
        board.miss_count = board.miss_count.saturating_add(1);
        board.combo = 0;
    }

    /// Removes one second from the time bank and returns what is left.
    pub fn countdown_second(&self, board: &mut Scoreboard) -> u32 {
        let _ = board.add_time(-1);
        board.time_remaining
    }

    /// Applies the end-of-run bonus exactly once and returns the final score.
    ///
    /// Later calls return the stored result without touching the score.
    pub fn finalize(&self, board: &mut Scoreboard) -> FinalScore {
        if let Some(done) = board.finalized {
            return done;
        }

        let raw_score = board.score;
        let bonus_applied = board.miss_count == 0
            && board.perfect_hit_count > self.config.perfect_bonus_threshold;
        if bonus_applied {
            let boosted = (f64::from(raw_score) * self.config.perfect_bonus_multiplier).round();
            board.score = clamp_counter(boosted as i64);
        }

        let done = FinalScore {
            score: board.score,
            raw_score,
            bonus_applied,
        };
        board.finalized = Some(done);
        done
    }

    fn advance_combo(&self, board: &mut Scoreboard, now: Duration) {
        let within_window = board
            .last_hit
            .map_or(false, |last| now.saturating_sub(last) < self.config.combo_window);
        board.combo = if within_window {
            board.combo.saturating_add(1)
        } else {
            1
        };
        board.last_hit = Some(now);
    }
}

fn apply_mystery(board: &mut Scoreboard, effect: MysteryEffect) {
    match effect {
        MysteryEffect::TimePenalty => {
            let _ = board.add_time(-MYSTERY_TIME_PENALTY_SECS);
        }
        MysteryEffect::TimeBonus => {
            let _ = board.add_time(MYSTERY_TIME_BONUS_SECS);
        }
        MysteryEffect::LargeScoreBonus => {
            let _ = board.add_score(MYSTERY_LARGE_SCORE_BONUS);
        }
        MysteryEffect::SmallScoreBonus => {
            let _ = board.add_score(MYSTERY_SMALL_SCORE_BONUS);
        }
    }
}
