//! Controller timing configuration.
//!
//! All tunable delays for the hood controller.  Values can be overridden
//! through a [`ConfigPort`](crate::app::ports::ConfigPort); the defaults
//! match the hood's own remote behaviour.

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;

/// Capacity of the recent-sends cache; `send_cache_depth` may not exceed it.
pub const MAX_SEND_CACHE_DEPTH: usize = 8;

/// Core controller configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoodConfig {
    // --- Resends ---
    /// Delay before a ramp step or fast-off resend (milliseconds)
    pub step_delay_ms: u32,

    // --- Run-out ---
    /// Wind-down period after a delayed power-off (milliseconds)
    pub run_out_delay_ms: u32,

    // --- Reserved timers (declared, never armed) ---
    /// Automatic stop after continuous running (milliseconds)
    pub auto_stop_delay_ms: u32,
    /// Automatic speed reduction after running at high speed (milliseconds)
    pub power_reduce_delay_ms: u32,

    // --- Diagnostics ---
    /// Number of recent outgoing payloads kept for inspection (1-8)
    pub send_cache_depth: u8,
}

impl Default for HoodConfig {
    fn default() -> Self {
        Self {
            step_delay_ms: 50,
            run_out_delay_ms: 10 * 60 * 1000,          // 10 min
            auto_stop_delay_ms: 3 * 60 * 60 * 1000,    // 3 h
            power_reduce_delay_ms: 6 * 60 * 1000,      // 6 min
            send_cache_depth: 4,
        }
    }
}

impl HoodConfig {
    /// Range-check every field.  Out-of-range values are rejected, never
    /// clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(10..=1_000).contains(&self.step_delay_ms) {
            return Err(ConfigError::ValidationFailed(
                "step_delay_ms must be 10-1000",
            ));
        }
        if !(1_000..=3_600_000).contains(&self.run_out_delay_ms) {
            return Err(ConfigError::ValidationFailed(
                "run_out_delay_ms must be 1000-3600000",
            ));
        }
        if self.step_delay_ms.saturating_mul(10) >= self.run_out_delay_ms {
            return Err(ConfigError::ValidationFailed(
                "run_out_delay_ms must exceed ten resend steps",
            ));
        }
        if !(60_000..=86_400_000).contains(&self.auto_stop_delay_ms) {
            return Err(ConfigError::ValidationFailed(
                "auto_stop_delay_ms must be 60000-86400000",
            ));
        }
        if !(60_000..=86_400_000).contains(&self.power_reduce_delay_ms) {
            return Err(ConfigError::ValidationFailed(
                "power_reduce_delay_ms must be 60000-86400000",
            ));
        }
        if self.send_cache_depth == 0 || usize::from(self.send_cache_depth) > MAX_SEND_CACHE_DEPTH {
            return Err(ConfigError::ValidationFailed(
                "send_cache_depth must be 1-8",
            ));
        }
        Ok(())
    }
}
