//! Ramp controller.
//!
//! The remote only steps one speed at a time.  After each step has been
//! applied, a pending `target_speed` is chased by scheduling another step
//! in the same direction; once the target is reached, or a step moved the
//! other way, the target is dropped.

use log::debug;

use super::state::HoodState;
use super::{Direction, Effect, TimerAction};
use crate::config::HoodConfig;
use crate::timers::TimerPurpose;

/// Continue (or finish) a ramp after a step in `direction` was applied.
pub fn continue_ramp(
    state: &mut HoodState,
    direction: Direction,
    config: &HoodConfig,
    effects: &mut Vec<Effect>,
) {
    let Some(target) = state.target_speed else {
        effects.push(Effect::Cancel(TimerPurpose::RampStep));
        return;
    };

    let short = match direction {
        Direction::Up => state.speed < target,
        Direction::Down => state.speed > target,
    };

    if short {
        debug!(
            "Ramp: at {} heading {:?} to {}, next step in {}ms",
            state.speed, direction, target, config.step_delay_ms
        );
        effects.push(Effect::Cancel(TimerPurpose::RampStep));
        effects.push(Effect::Arm {
            purpose: TimerPurpose::RampStep,
            delay_ms: config.step_delay_ms,
            action: TimerAction::Resend(direction.unit()),
        });
    } else {
        debug!("Ramp: finished at {} (target {})", state.speed, target);
        state.target_speed = None;
        effects.push(Effect::Cancel(TimerPurpose::RampStep));
    }
}
