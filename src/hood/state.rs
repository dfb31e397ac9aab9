//! Shadow state kept on behalf of a hood that cannot report its own state.

use super::{OnOffAction, Speed};

/// Semantic device state.
///
/// `speed_level` is not stored; it is always derived from `speed` via
/// [`HoodState::speed_level`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HoodState {
    /// Current or last-commanded speed.  Stays nonzero during a run-out.
    pub speed: Speed,
    pub light: bool,
    /// A delayed power-off is pending.
    pub run_out_active: bool,
    /// Transient run-out choice for the next power-off, consumed once.
    pub off_run_out: Option<bool>,
    /// Ramp target; present only while a ramp is in progress.
    pub target_speed: Option<Speed>,
    /// Last nonzero speed, restored on power-on.
    pub speed_history: Option<Speed>,
    /// Last light value, restored on power-on.
    pub light_history: Option<bool>,
}

impl HoodState {
    pub fn speed_level(&self) -> &'static str {
        self.speed.level()
    }

    /// The speed a power-on restores.
    pub fn remembered_speed(&self) -> Speed {
        self.speed_history
            .filter(|s| !s.is_off())
            .unwrap_or(Speed::MIN_ON)
    }

    /// Semantic power state: running and not winding down.
    pub fn is_on(&self) -> bool {
        !self.speed.is_off() && !self.run_out_active
    }

    /// Speed shown to the outside world: the ramp target if one is set.
    pub fn reported_speed(&self) -> Speed {
        self.target_speed.unwrap_or(self.speed)
    }

    /// Record a speed reached by a step, keeping the last nonzero one.
    pub(crate) fn remember_speed(&mut self) {
        if !self.speed.is_off() {
            self.speed_history = Some(self.speed);
        }
    }
}

/// Per-device policy stored alongside the shadow state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoodSettings {
    pub onoff_action: OnOffAction,
    /// Whether a bare off request winds down (`off_run_out`) or stops at once.
    pub run_out: bool,
}

impl Default for HoodSettings {
    fn default() -> Self {
        Self {
            onoff_action: OnOffAction::Device,
            run_out: true,
        }
    }
}
