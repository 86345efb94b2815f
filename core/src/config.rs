//! Tunable parameters for sessions and the spawn scheduler.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{SlotLayout, WorldPoint};

/// Aggregated tuning knobs for a game session.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Session clock, grid, and scoring parameters.
    pub session: SessionConfig,
    /// Spawn cadence parameters.
    pub spawn: SpawnConfig,
}

impl GameConfig {
    /// Checks that every parameter describes a playable session.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.session.time_bank_secs == 0 {
            return Err(ConfigError::EmptyTimeBank);
        }
        if self.session.columns == 0 || self.session.rows == 0 {
            return Err(ConfigError::EmptyGrid {
                columns: self.session.columns,
                rows: self.session.rows,
            });
        }
        if !(self.session.cell_size.is_finite() && self.session.cell_size > 0.0) {
            return Err(ConfigError::InvalidCellSize(self.session.cell_size));
        }
        if !(self.session.near_miss_radius.is_finite() && self.session.near_miss_radius >= 0.0) {
            return Err(ConfigError::InvalidNearMissRadius(
                self.session.near_miss_radius,
            ));
        }
        if self.spawn.base_interval_ms == 0 || self.spawn.final_interval_ms == 0 {
            return Err(ConfigError::ZeroSpawnInterval);
        }
        Ok(())
    }
}

/// Session clock, grid, and scoring parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Seconds in the time bank when the session starts.
    pub time_bank_secs: u32,
    /// Number of slot columns.
    pub columns: u32,
    /// Number of slot rows.
    pub rows: u32,
    /// Edge length of a grid cell in world units.
    pub cell_size: f32,
    /// Maximum gap between hits that keeps a combo alive.
    pub combo_window_ms: u64,
    /// Distance outside a visible slot that still counts as a near miss.
    pub near_miss_radius: f32,
    /// Perfect hits that must be exceeded for the flawless-run bonus.
    pub perfect_bonus_threshold: u32,
    /// Score multiplier granted by the flawless-run bonus.
    pub perfect_bonus_multiplier: f64,
    /// Seed for the mystery-effect random stream.
    pub seed: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            time_bank_secs: 30,
            columns: 3,
            rows: 3,
            cell_size: 120.0,
            combo_window_ms: 1_000,
            near_miss_radius: 50.0,
            perfect_bonus_threshold: 10,
            perfect_bonus_multiplier: 1.5,
            seed: 0x5745_4745_4e00_0001,
        }
    }
}

impl SessionConfig {
    /// Combo window expressed as a duration.
    #[must_use]
    pub fn combo_window(&self) -> Duration {
        Duration::from_millis(self.combo_window_ms)
    }

    /// Grid layout anchored at the world origin.
    #[must_use]
    pub fn layout(&self) -> SlotLayout {
        SlotLayout::new(
            self.columns,
            self.rows,
            self.cell_size,
            WorldPoint::new(0.0, 0.0),
        )
    }
}

/// Spawn cadence parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnConfig {
    /// Interval between spawn ticks while plenty of time remains.
    pub base_interval_ms: u64,
    /// Accelerated interval used during the final phase.
    pub final_interval_ms: u64,
    /// Time-bank threshold below which the final phase begins.
    pub final_phase_secs: u32,
    /// Seed for the spawn random stream.
    pub seed: u64,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            base_interval_ms: 1_000,
            final_interval_ms: 600,
            final_phase_secs: 20,
            seed: 0x4d59_5df4_d0f3_3173,
        }
    }
}

impl SpawnConfig {
    /// Base spawn interval expressed as a duration.
    #[must_use]
    pub fn base_interval(&self) -> Duration {
        Duration::from_millis(self.base_interval_ms)
    }

    /// Final-phase spawn interval expressed as a duration.
    #[must_use]
    pub fn final_interval(&self) -> Duration {
        Duration::from_millis(self.final_interval_ms)
    }
}

/// Reasons a [`GameConfig`] cannot drive a session.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// The time bank would start empty.
    #[error("time bank must hold at least one second")]
    EmptyTimeBank,
    /// The grid would contain no slots.
    #[error("grid of {columns}x{rows} contains no slots")]
    EmptyGrid {
        /// Configured column count.
        columns: u32,
        /// Configured row count.
        rows: u32,
    },
    /// The cell size is not a positive finite number.
    #[error("cell size {0} must be a positive finite number")]
    InvalidCellSize(f32),
    /// The near-miss radius is negative or not finite.
    #[error("near-miss radius {0} must be a non-negative finite number")]
    InvalidNearMissRadius(f32),
    /// A spawn interval of zero would spawn without bound.
    #[error("spawn intervals must be longer than zero")]
    ZeroSpawnInterval,
}
