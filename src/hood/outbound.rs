//! Outbound command assembler.
//!
//! Turns a semantic request into the single RF unit to transmit (or
//! [`Unit::None`]) plus the state the hood will be in once that unit has
//! been applied.  Only intent is written back to the shadow state here
//! (ramp target, transient run-out choice); the physical toggle itself is
//! applied when the transmission is echoed through
//! [`inbound::interpret`](super::inbound::interpret).

use log::debug;
use serde::Deserialize;

use super::state::{HoodSettings, HoodState};
use super::{Command, Effect, OnOffAction, OutgoingPayload, Speed, Unit, run_out};

/// A fresh request from the outside world.
///
/// Either an explicit `command`, or any of the capability fields.  When
/// several fields are present, `onoff` wins over `speed`, which wins over
/// `light`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct HoodRequest {
    pub command: Option<Command>,
    pub onoff: Option<bool>,
    pub speed: Option<Speed>,
    pub light: Option<bool>,
}

impl HoodRequest {
    pub fn command(command: Command) -> Self {
        Self {
            command: Some(command),
            ..Self::default()
        }
    }

    pub fn onoff(on: bool) -> Self {
        Self {
            onoff: Some(on),
            ..Self::default()
        }
    }

    pub fn speed(speed: Speed) -> Self {
        Self {
            speed: Some(speed),
            ..Self::default()
        }
    }

    pub fn light(on: bool) -> Self {
        Self {
            light: Some(on),
            ..Self::default()
        }
    }
}

/// Result of assembling a fresh request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assembly {
    /// State to persist before transmitting (intent fields only).
    pub state: HoodState,
    pub payload: OutgoingPayload,
    /// Timer work to run before transmitting.
    pub effects: Vec<Effect>,
}

/// Pick the command a request stands for, consulting the device policy
/// for bare on/off requests.
pub fn resolve_command(
    request: &HoodRequest,
    state: &HoodState,
    settings: &HoodSettings,
) -> Option<Command> {
    if let Some(cmd) = request.command {
        return Some(cmd);
    }
    if let Some(on) = request.onoff {
        let cmd = match (settings.onoff_action, on) {
            (OnOffAction::Light, true) => Command::LightOn,
            (OnOffAction::Light, false) => Command::LightOff,
            (OnOffAction::Hood, true) => Command::Speed(state.remembered_speed()),
            (OnOffAction::Hood, false) => Command::Speed(Speed::OFF),
            (OnOffAction::Device, true) => Command::On,
            (OnOffAction::Device, false) if settings.run_out => Command::OffRunOut,
            (OnOffAction::Device, false) => Command::Off,
        };
        return Some(cmd);
    }
    if let Some(speed) = request.speed {
        return Some(Command::Speed(speed));
    }
    request.light.map(|on| {
        if on {
            Command::LightOn
        } else {
            Command::LightOff
        }
    })
}

struct Projection {
    unit: Unit,
    speed: Speed,
    light: bool,
    onoff: bool,
}

/// Resolve `command` against the current state.
///
/// Power commands resolve against [`HoodState::is_on`].  While a run-out is
/// pending the fan is still turning, so a request to switch on only calls
/// the wind-down off; a further `off_run_out` has nothing left to do and a
/// plain `off` sends the second press that stops the fan at once.
pub fn assemble(state: &HoodState, command: Command) -> Assembly {
    let mut next = *state;
    let mut effects = Vec::new();
    let running = state.is_on();
    let winding_down = state.run_out_active && !state.speed.is_off();
    let unchanged = Projection {
        unit: Unit::None,
        speed: state.speed,
        light: state.light,
        onoff: state.is_on(),
    };
    let power_on = Projection {
        unit: Unit::OnOff,
        speed: state.remembered_speed(),
        light: state.light_history.unwrap_or(state.light),
        onoff: true,
    };
    let power_off = Projection {
        unit: Unit::OnOff,
        speed: Speed::OFF,
        light: false,
        onoff: false,
    };

    let p = match command {
        Command::On | Command::ToggleOnOff | Command::ToggleOnOffRunOut if winding_down => {
            next.run_out_active = false;
            next.off_run_out = None;
            run_out::cancel_effects(&mut effects);
            Projection {
                onoff: true,
                ..unchanged
            }
        }
        Command::On if running => unchanged,
        Command::On => power_on,
        Command::OffRunOut if winding_down => unchanged,
        Command::Off | Command::OffRunOut if running || winding_down => {
            next.off_run_out = Some(command == Command::OffRunOut);
            power_off
        }
        Command::Off | Command::OffRunOut => unchanged,
        Command::ToggleOnOff | Command::ToggleOnOffRunOut if running => {
            next.off_run_out = Some(command == Command::ToggleOnOffRunOut);
            power_off
        }
        Command::ToggleOnOff | Command::ToggleOnOffRunOut => power_on,
        Command::LightOn | Command::LightOff => {
            let desired = command == Command::LightOn;
            Projection {
                unit: if desired == state.light {
                    Unit::None
                } else {
                    Unit::Light
                },
                light: desired,
                ..unchanged
            }
        }
        Command::ToggleLight => Projection {
            unit: Unit::Light,
            light: !state.light,
            ..unchanged
        },
        Command::Increase | Command::Decrease => {
            next.target_speed = None;
            let (unit, speed) = if command == Command::Increase {
                (Unit::Increase, state.speed.step_up())
            } else {
                (Unit::Decrease, state.speed.step_down())
            };
            Projection {
                unit,
                speed,
                light: state.light,
                onoff: !speed.is_off(),
            }
        }
        Command::Speed(desired) => {
            let unit = if desired == state.speed {
                next.target_speed = None;
                Unit::None
            } else {
                next.target_speed = Some(desired);
                if desired > state.speed {
                    Unit::Increase
                } else {
                    Unit::Decrease
                }
            };
            Projection {
                unit,
                speed: desired,
                light: state.light,
                onoff: if unit.transmits() {
                    !desired.is_off()
                } else {
                    state.is_on()
                },
            }
        }
    };

    debug!("Outbound: {} -> unit={} speed={}", command, p.unit, p.speed);

    Assembly {
        state: next,
        payload: OutgoingPayload::new(p.unit, Some(command), p.speed, p.light, p.onoff),
        effects,
    }
}

/// Build the payload for an internal resend of `unit`.  No resolution takes
/// place; the persisted state is mirrored as-is.
pub fn assemble_repeated(state: &HoodState, unit: Unit) -> OutgoingPayload {
    OutgoingPayload::new(
        unit,
        Command::for_unit(unit),
        state.speed,
        state.light,
        state.is_on(),
    )
}
