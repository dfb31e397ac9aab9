//! Hood domain model and the pure state-to-signal translation engine.
//!
//! ```text
//!  HoodRequest ──▶ outbound::assemble ──▶ OutgoingPayload ──▶ TransportPort
//!                                              │ (unit != none)
//!                                              ▼
//!  SignalEvent ──▶ inbound::interpret ──▶ HoodState' + Effects
//!                        │
//!                        ├── ramp::continue_ramp   (increase / decrease)
//!                        └── run_out::begin         (onoff)
//! ```
//!
//! Nothing in this module performs I/O.  Every function takes the current
//! [`HoodState`](state::HoodState) by value or reference and returns the new
//! state together with a list of [`Effect`]s that the
//! [`HoodService`](crate::app::service::HoodService) executes against the
//! timer registry.

pub mod inbound;
pub mod outbound;
pub mod ramp;
pub mod run_out;
pub mod state;

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::timers::TimerPurpose;

// ---------------------------------------------------------------------------
// Speed
// ---------------------------------------------------------------------------

/// Fan speed, 0 (stopped) through [`Speed::MAX`].
///
/// The inner value is private so a `Speed` can never leave the valid range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Speed(u8);

const SPEED_LEVELS: [&str; 5] = ["speed_0", "speed_1", "speed_2", "speed_3", "speed_4"];

impl Speed {
    pub const OFF: Self = Self(0);
    pub const MIN_ON: Self = Self(1);
    pub const MAX: Self = Self(4);

    /// Construct from a raw value, rejecting anything above [`Speed::MAX`].
    pub const fn new(raw: u8) -> Option<Self> {
        if raw <= Self::MAX.0 { Some(Self(raw)) } else { None }
    }

    /// Construct from a raw value, clamping into range.
    pub const fn saturating(raw: u8) -> Self {
        if raw > Self::MAX.0 { Self::MAX } else { Self(raw) }
    }

    pub const fn get(self) -> u8 {
        self.0
    }

    pub const fn is_off(self) -> bool {
        self.0 == 0
    }

    /// One step up, clamped at [`Speed::MAX`].
    pub const fn step_up(self) -> Self {
        Self::saturating(self.0 + 1)
    }

    /// One step down, clamped at [`Speed::OFF`].
    pub const fn step_down(self) -> Self {
        Self(self.0.saturating_sub(1))
    }

    /// Apply one step in `direction`.
    pub const fn step(self, direction: Direction) -> Self {
        match direction {
            Direction::Up => self.step_up(),
            Direction::Down => self.step_down(),
        }
    }

    /// The `"speed_N"` level string derived from this speed.
    pub const fn level(self) -> &'static str {
        SPEED_LEVELS[self.0 as usize]
    }

    /// Parse a `"speed_N"` level string.
    pub fn from_level(level: &str) -> Option<Self> {
        level
            .strip_prefix("speed_")
            .and_then(|n| n.parse::<u8>().ok())
            .and_then(Self::new)
    }
}

impl fmt::Display for Speed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.level())
    }
}

impl Serialize for Speed {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.0)
    }
}

impl<'de> Deserialize<'de> for Speed {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = u8::deserialize(deserializer)?;
        Self::new(raw).ok_or_else(|| serde::de::Error::custom("speed out of range 0-4"))
    }
}

/// Direction of a single speed step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    /// The RF unit that moves the hood in this direction.
    pub const fn unit(self) -> Unit {
        match self {
            Self::Up => Unit::Increase,
            Self::Down => Unit::Decrease,
        }
    }
}

// ---------------------------------------------------------------------------
// RF units
// ---------------------------------------------------------------------------

/// The RF toggle channel carried by a signal.
///
/// [`Unit::None`] is the outbound "do not transmit" sentinel and is never
/// produced by parsing a received signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    OnOff,
    Light,
    Increase,
    Decrease,
    None,
}

impl Unit {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OnOff => "onoff",
            Self::Light => "light",
            Self::Increase => "increase",
            Self::Decrease => "decrease",
            Self::None => "none",
        }
    }

    /// Parse a received unit name.  `"none"` and unknown names yield `None`.
    pub fn parse_received(raw: &str) -> Option<Self> {
        match raw {
            "onoff" => Some(Self::OnOff),
            "light" => Some(Self::Light),
            "increase" => Some(Self::Increase),
            "decrease" => Some(Self::Decrease),
            _ => None,
        }
    }

    /// Whether this unit results in an RF transmission.
    pub const fn transmits(self) -> bool {
        !matches!(self, Self::None)
    }

    /// Step direction for the speed units.
    pub const fn direction(self) -> Option<Direction> {
        match self {
            Self::Increase => Some(Direction::Up),
            Self::Decrease => Some(Direction::Down),
            _ => None,
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Semantic commands
// ---------------------------------------------------------------------------

/// A semantic command, either requested from outside or derived from a
/// received signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    On,
    Off,
    OffRunOut,
    ToggleOnOff,
    ToggleOnOffRunOut,
    LightOn,
    LightOff,
    ToggleLight,
    Increase,
    Decrease,
    /// Jump to an explicit speed (`speed_0` .. `speed_4`).
    Speed(Speed),
}

impl Command {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::On => "on",
            Self::Off => "off",
            Self::OffRunOut => "off_run_out",
            Self::ToggleOnOff => "toggle_onoff",
            Self::ToggleOnOffRunOut => "toggle_onoff_run_out",
            Self::LightOn => "light_on",
            Self::LightOff => "light_off",
            Self::ToggleLight => "toggle_light",
            Self::Increase => "increase",
            Self::Decrease => "decrease",
            Self::Speed(speed) => speed.level(),
        }
    }

    /// The command a bare repeated transmission of `unit` stands for.
    pub const fn for_unit(unit: Unit) -> Option<Self> {
        match unit {
            Unit::OnOff => Some(Self::ToggleOnOff),
            Unit::Light => Some(Self::ToggleLight),
            Unit::Increase => Some(Self::Increase),
            Unit::Decrease => Some(Self::Decrease),
            Unit::None => None,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when an explicit command string is not recognised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandParseError(pub String);

impl fmt::Display for CommandParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown command '{}'", self.0)
    }
}

impl FromStr for Command {
    type Err = CommandParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let cmd = match s {
            "on" => Self::On,
            "off" => Self::Off,
            "off_run_out" => Self::OffRunOut,
            "toggle_onoff" => Self::ToggleOnOff,
            "toggle_onoff_run_out" => Self::ToggleOnOffRunOut,
            "light_on" => Self::LightOn,
            "light_off" => Self::LightOff,
            "toggle_light" => Self::ToggleLight,
            "increase" => Self::Increase,
            "decrease" => Self::Decrease,
            other => match Speed::from_level(other) {
                Some(speed) => Self::Speed(speed),
                None => return Err(CommandParseError(other.to_string())),
            },
        };
        Ok(cmd)
    }
}

impl Serialize for Command {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Command {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Per-device policy
// ---------------------------------------------------------------------------

/// What a bare on/off request means for this device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnOffAction {
    /// On/off toggles the light only.
    Light,
    /// On jumps to the remembered speed, off ramps down to speed 0.
    Hood,
    /// On/off toggles real power.
    #[default]
    Device,
}

impl OnOffAction {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "light" => Some(Self::Light),
            "hood" => Some(Self::Hood),
            "device" => Some(Self::Device),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Hood => "hood",
            Self::Device => "device",
        }
    }
}

// ---------------------------------------------------------------------------
// Wire-facing records
// ---------------------------------------------------------------------------

/// A toggle event received from the transport collaborator.
///
/// The unit is kept as the raw string so that unrecognised units can be
/// passed through without being an error.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SignalEvent {
    pub unit: String,
}

impl SignalEvent {
    pub fn new(unit: impl Into<String>) -> Self {
        Self { unit: unit.into() }
    }

    pub fn from_unit(unit: Unit) -> Self {
        Self::new(unit.as_str())
    }
}

/// The record handed to the transport collaborator after every request or
/// received signal.  `unit == none` means "do not transmit".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingPayload {
    pub unit: Unit,
    pub command: Option<Command>,
    pub speed: Speed,
    pub speed_level: &'static str,
    pub light: bool,
    pub onoff: bool,
}

impl OutgoingPayload {
    pub fn new(unit: Unit, command: Option<Command>, speed: Speed, light: bool, onoff: bool) -> Self {
        Self {
            unit,
            command,
            speed,
            speed_level: speed.level(),
            light,
            onoff,
        }
    }

    pub const fn transmits(&self) -> bool {
        self.unit.transmits()
    }
}

// ---------------------------------------------------------------------------
// Effects
// ---------------------------------------------------------------------------

/// Work to run when a timer fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerAction {
    /// Run-out expired: mark the hood fully off.
    FinalizeRunOut,
    /// Send `unit` again through the repeated path.
    Resend(Unit),
}

/// Side effect requested by the pure engine, executed by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    Cancel(TimerPurpose),
    Arm {
        purpose: TimerPurpose,
        delay_ms: u32,
        action: TimerAction,
    },
}
