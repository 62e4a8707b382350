//! # Simulation Configuration
//!
//! TOML-backed tuning for every manager, with defaults that match the
//! documented intervals (one-second ticks, 1.5-second combat rounds). All
//! sections are optional; an empty document yields the defaults.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use ember_combat::CombatConfig;
use ember_movement::MoverConfig;
use ember_sched::{ClockConfig, QueueConfig, WorldTime};

use crate::error::SimResult;

/// Task queue tuning.
#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct QueueSettings {
    /// Maximum task bodies running at once.
    pub max_concurrent_tasks: usize,
    /// Initial ring-buffer capacity.
    pub initial_capacity: usize,
}

impl Default for QueueSettings {
    fn default() -> Self {
        let defaults = QueueConfig::default();
        Self {
            max_concurrent_tasks: defaults.max_concurrent_tasks,
            initial_capacity: defaults.initial_capacity,
        }
    }
}

/// World clock tuning.
#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClockSettings {
    /// Milliseconds per world tick.
    pub tick_interval_ms: u64,
    /// Ticks per world day.
    pub day_length: u64,
}

impl Default for ClockSettings {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1000,
            day_length: 24,
        }
    }
}

/// Combat tuning.
#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CombatSettings {
    /// Milliseconds between combat rounds.
    pub round_interval_ms: u64,
    /// Whether victors loot defeated NPCs automatically.
    pub auto_loot: bool,
    /// Seed for the combat dice.
    pub dice_seed: u64,
}

impl Default for CombatSettings {
    fn default() -> Self {
        Self {
            round_interval_ms: 1500,
            auto_loot: true,
            dice_seed: 0,
        }
    }
}

/// NPC movement tuning.
#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct MovementSettings {
    /// Milliseconds between movement scans.
    pub scan_interval_ms: u64,
    /// Seed for exit selection.
    pub seed: u64,
}

impl Default for MovementSettings {
    fn default() -> Self {
        Self {
            scan_interval_ms: 10_000,
            seed: 0,
        }
    }
}

/// Complete simulation tuning, one section per manager.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Task queue section.
    pub queue: QueueSettings,
    /// World clock section.
    pub clock: ClockSettings,
    /// Combat section.
    pub combat: CombatSettings,
    /// NPC movement section.
    pub movement: MovementSettings,
}

impl SimulationConfig {
    /// Parses a TOML document. Missing sections take their defaults;
    /// unknown keys are rejected.
    ///
    /// # Errors
    ///
    /// Returns [`crate::SimError::Config`] on malformed input.
    pub fn from_toml(text: &str) -> SimResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Reads and parses a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`crate::SimError::Io`] or [`crate::SimError::Config`].
    pub fn load(path: impl AsRef<Path>) -> SimResult<Self> {
        Self::from_toml(&std::fs::read_to_string(path)?)
    }

    /// The queue section as the scheduler's config type.
    #[must_use]
    pub fn queue_config(&self) -> QueueConfig {
        QueueConfig {
            max_concurrent_tasks: self.queue.max_concurrent_tasks,
            initial_capacity: self.queue.initial_capacity,
        }
    }

    /// The clock section as the scheduler's config type.
    #[must_use]
    pub fn clock_config(&self) -> ClockConfig {
        ClockConfig {
            tick_interval: Duration::from_millis(self.clock.tick_interval_ms),
            day_length: self.clock.day_length,
            start: WorldTime::default(),
        }
    }

    /// The combat section as the combat engine's config type.
    #[must_use]
    pub fn combat_config(&self) -> CombatConfig {
        CombatConfig {
            round_interval: Duration::from_millis(self.combat.round_interval_ms),
            auto_loot: self.combat.auto_loot,
        }
    }

    /// The movement section as the mover's config type.
    #[must_use]
    pub fn mover_config(&self) -> MoverConfig {
        MoverConfig {
            scan_interval: Duration::from_millis(self.movement.scan_interval_ms),
            seed: self.movement.seed,
        }
    }
}
