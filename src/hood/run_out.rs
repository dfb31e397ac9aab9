//! Run-out (delayed power-off) controller.
//!
//! Pressing power on a running hood does not stop the fan: the hood winds
//! down for a while first.  A second press during that window stops it at
//! once.  The controller mirrors this by either arming the run-out timer or,
//! when the transient `off_run_out` flag is explicitly `false`, sending the
//! second press itself a moment later (fast-off).

use log::info;

use super::state::HoodState;
use super::{Effect, Speed, TimerAction, Unit};
use crate::config::HoodConfig;
use crate::timers::TimerPurpose;

/// Which way a power-off is completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OffMode {
    /// Resend onoff after the step delay.
    FastOff,
    /// Arm the run-out timer.
    Delayed,
}

impl OffMode {
    /// Select the mode from the transient flag.  Only an explicit `false`
    /// bypasses the wind-down.
    pub fn select(off_run_out: Option<bool>) -> Self {
        match off_run_out {
            Some(false) => Self::FastOff,
            _ => Self::Delayed,
        }
    }
}

/// Effects that cancel any pending wind-down.
pub fn cancel_effects(effects: &mut Vec<Effect>) {
    effects.push(Effect::Cancel(TimerPurpose::RunOut));
    effects.push(Effect::Cancel(TimerPurpose::FastOff));
}

/// Start a power-off that just became pending.  Consumes `off_run_out`.
pub fn begin(state: &mut HoodState, config: &HoodConfig, effects: &mut Vec<Effect>) -> OffMode {
    let mode = OffMode::select(state.off_run_out.take());
    match mode {
        OffMode::FastOff => {
            info!("RunOut: fast-off, resending onoff in {}ms", config.step_delay_ms);
            effects.push(Effect::Arm {
                purpose: TimerPurpose::FastOff,
                delay_ms: config.step_delay_ms,
                action: TimerAction::Resend(Unit::OnOff),
            });
        }
        OffMode::Delayed => {
            info!("RunOut: winding down for {}ms", config.run_out_delay_ms);
            effects.push(Effect::Arm {
                purpose: TimerPurpose::RunOut,
                delay_ms: config.run_out_delay_ms,
                action: TimerAction::FinalizeRunOut,
            });
        }
    }
    mode
}

/// Run-out timer expiry: the hood has stopped.
pub fn finalize(state: &mut HoodState) {
    state.speed = Speed::OFF;
    state.run_out_active = false;
}
