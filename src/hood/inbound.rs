//! Inbound signal interpreter.
//!
//! Applies one received toggle (from the physical remote, or the echo of
//! one of our own transmissions) to the shadow state.  Returns the new
//! state, the mirror payload for the transport layer, and the timer work
//! the step requires.

use log::debug;

use super::state::HoodState;
use super::{Command, Direction, Effect, OutgoingPayload, SignalEvent, Unit, ramp, run_out};
use crate::config::HoodConfig;
use crate::timers::TimerPurpose;

/// Result of interpreting one signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub state: HoodState,
    pub payload: OutgoingPayload,
    pub effects: Vec<Effect>,
}

/// Interpret a raw event.  Unrecognised units yield `None` and leave the
/// state untouched.
pub fn interpret_event(
    state: &HoodState,
    event: &SignalEvent,
    config: &HoodConfig,
) -> Option<Transition> {
    match Unit::parse_received(&event.unit) {
        Some(unit) => Some(interpret(state, unit, config)),
        None => {
            debug!("Inbound: ignoring unit '{}'", event.unit);
            None
        }
    }
}

/// Interpret a recognised unit.  [`Unit::None`] is a pass-through.
pub fn interpret(state: &HoodState, unit: Unit, config: &HoodConfig) -> Transition {
    let mut next = *state;
    let mut effects = Vec::new();

    let command = match unit {
        Unit::OnOff => Some(power_toggle(&mut next, config, &mut effects)),
        Unit::Light => {
            next.light = !next.light;
            next.light_history = Some(next.light);
            Some(if next.light {
                Command::LightOn
            } else {
                Command::LightOff
            })
        }
        Unit::Increase => Some(speed_step(&mut next, Direction::Up, config, &mut effects)),
        Unit::Decrease => Some(speed_step(&mut next, Direction::Down, config, &mut effects)),
        Unit::None => None,
    };

    let payload = OutgoingPayload::new(
        unit,
        command,
        next.reported_speed(),
        next.light,
        next.is_on(),
    );

    debug!(
        "Inbound: {} -> {:?} speed={} light={} run_out={}",
        unit, command, next.speed, next.light, next.run_out_active
    );

    Transition {
        state: next,
        payload,
        effects,
    }
}

fn power_toggle(state: &mut HoodState, config: &HoodConfig, effects: &mut Vec<Effect>) -> Command {
    run_out::cancel_effects(effects);

    let was_on = !state.speed.is_off();
    let was_running_out = state.run_out_active;
    let command = if was_running_out || was_on {
        Command::Off
    } else {
        Command::On
    };

    match command {
        Command::On => {
            state.speed = state.remembered_speed();
            state.light = state.light_history.unwrap_or(state.light);
        }
        _ => {
            if was_running_out {
                run_out::finalize(state);
            }
            state.light = false;
        }
    }

    // A power toggle abandons any ramp in progress.
    state.target_speed = None;
    effects.push(Effect::Cancel(TimerPurpose::RampStep));
    state.run_out_active = command == Command::Off && !was_running_out;

    if state.run_out_active {
        run_out::begin(state, config, effects);
    } else {
        state.off_run_out = None;
    }

    command
}

fn speed_step(
    state: &mut HoodState,
    direction: Direction,
    config: &HoodConfig,
    effects: &mut Vec<Effect>,
) -> Command {
    // Any step means the hood is still running.
    run_out::cancel_effects(effects);
    state.run_out_active = false;
    state.speed = state.speed.step(direction);
    state.remember_speed();
    ramp::continue_ramp(state, direction, config, effects);
    match direction {
        Direction::Up => Command::Increase,
        Direction::Down => Command::Decrease,
    }
}
