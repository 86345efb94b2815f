#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic spawn scheduler that emits entity show commands.

use std::time::Duration;

use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use wegen_arcade_core::{
    Command, DifficultyStage, Event, SessionSnapshot, SessionStatus, SlotId, SlotView,
    SpawnConfig,
};
use wegen_arcade_system_difficulty::DifficultyEngine;

const MAX_MULTI_SPAWN: usize = 2;

/// Configuration parameters required to construct the spawning system.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    base_interval: Duration,
    final_interval: Duration,
    final_phase_secs: u32,
    rng_seed: u64,
}

impl Config {
    /// Creates a new configuration using the provided cadences and seed.
    #[must_use]
    pub const fn new(
        base_interval: Duration,
        final_interval: Duration,
        final_phase_secs: u32,
        rng_seed: u64,
    ) -> Self {
        Self {
            base_interval,
            final_interval,
            final_phase_secs,
            rng_seed,
        }
    }

    /// Interval used while the time bank holds at least the final-phase threshold.
    #[must_use]
    pub const fn base_interval(&self) -> Duration {
        self.base_interval
    }

    /// Interval used once the time bank drops below the final-phase threshold.
    #[must_use]
    pub const fn final_interval(&self) -> Duration {
        self.final_interval
    }
}

impl From<&SpawnConfig> for Config {
    fn from(config: &SpawnConfig) -> Self {
        Self::new(
            config.base_interval(),
            config.final_interval(),
            config.final_phase_secs,
            config.seed,
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from(&SpawnConfig::default())
    }
}

/// Pure system that periodically asks the session to reveal entities.
///
/// Spawn progress accumulates only from `TimeAdvanced` events, so a paused
/// session keeps its partial progress until it resumes.
#[derive(Debug)]
pub struct Spawning {
    config: Config,
    accumulator: Duration,
    rng: ChaCha8Rng,
}

impl Spawning {
    /// Creates a new spawning system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            accumulator: Duration::ZERO,
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
        }
    }

    /// Spawn progress carried towards the next attempt.
    #[must_use]
    pub const fn accumulated(&self) -> Duration {
        self.accumulator
    }

    /// Interval in effect for the provided time bank.
    #[must_use]
    pub fn interval_for(&self, time_remaining: u32) -> Duration {
        if time_remaining < self.config.final_phase_secs {
            self.config.final_interval
        } else {
            self.config.base_interval
        }
    }

    /// Consumes events and immutable views to emit show commands.
    pub fn handle(
        &mut self,
        events: &[Event],
        session: &SessionSnapshot,
        slots: &SlotView,
        difficulty: &DifficultyEngine,
        out: &mut Vec<Command>,
    ) {
        match session.status {
            SessionStatus::Running => {}
            SessionStatus::Paused => return,
            SessionStatus::Waiting | SessionStatus::Ended => {
                self.accumulator = Duration::ZERO;
                return;
            }
        }

        let accumulated = events
            .iter()
            .filter_map(|event| match event {
                Event::TimeAdvanced { dt } => Some(*dt),
                _ => None,
            })
            .fold(Duration::ZERO, Duration::saturating_add);
        if accumulated.is_zero() {
            return;
        }

        let interval = self.interval_for(session.time_remaining);
        if interval.is_zero() {
            return;
        }

        self.accumulator = self.accumulator.saturating_add(accumulated);
        let mut claimed: Vec<SlotId> = Vec::new();
        while self.accumulator >= interval {
            self.accumulator -= interval;
            self.spawn_batch(session.stage, slots, difficulty, &mut claimed, out);
        }
    }

    fn spawn_batch(
        &mut self,
        stage: DifficultyStage,
        slots: &SlotView,
        difficulty: &DifficultyEngine,
        claimed: &mut Vec<SlotId>,
        out: &mut Vec<Command>,
    ) {
        let hidden: Vec<SlotId> = slots
            .hidden_ids()
            .into_iter()
            .filter(|slot| !claimed.contains(slot))
            .collect();
        if hidden.is_empty() {
            return;
        }

        let count = self.batch_size(stage);
        let chosen: Vec<SlotId> = hidden
            .choose_multiple(&mut self.rng, count)
            .copied()
            .collect();

        let table = difficulty.weight_table(stage);
        for slot in chosen {
            let Some(kind) = table.sample(&mut self.rng) else {
                continue;
            };
            let timing = difficulty.timing(kind, stage);
            claimed.push(slot);
            out.push(Command::ShowEntity {
                slot,
                kind,
                hold: timing.hold,
                rise: timing.rise,
            });
        }
    }

    fn batch_size(&mut self, stage: DifficultyStage) -> usize {
        if stage >= DifficultyStage::Three {
            self.rng.gen_range(1..=MAX_MULTI_SPAWN)
        } else {
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn final_phase_switches_interval() {
        let spawning = Spawning::new(Config::default());
        assert_eq!(spawning.interval_for(20), Duration::from_millis(1_000));
        assert_eq!(spawning.interval_for(19), Duration::from_millis(600));
        assert_eq!(spawning.interval_for(0), Duration::from_millis(600));
    }

    #[test]
    fn early_stages_spawn_single_entities() {
        let mut spawning = Spawning::new(Config::default());
        for _ in 0..32 {
            assert_eq!(spawning.batch_size(DifficultyStage::One), 1);
            assert_eq!(spawning.batch_size(DifficultyStage::Two), 1);
        }
    }
}
