//! Outbound application events.
//!
//! The [`HoodService`](super::service::HoodService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other side
//! decide what to do with them: log to the console, publish to a home
//! automation bus, update a dashboard.

use crate::hood::state::HoodSettings;
use crate::hood::{Command, OutgoingPayload};
use crate::timers::TimerPurpose;

/// Where an applied signal came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalSource {
    /// Received from the physical remote.
    Remote,
    /// One of our own transmissions.
    Echo,
}

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// A unit was handed to the transport.  `repeated` marks internal resends.
    Transmitted {
        payload: OutgoingPayload,
        repeated: bool,
    },

    /// A request resolved to no transmission.
    Suppressed(Command),

    /// A signal was applied to the shadow state.
    Applied {
        source: SignalSource,
        payload: OutgoingPayload,
    },

    /// A received frame was dropped (unknown unit or foreign address).
    Ignored(String),

    /// A timer fired.
    TimerFired(TimerPurpose),

    /// The run-out window elapsed and the hood is now off.
    RunOutFinalized,

    /// Per-device policy changed.
    SettingsUpdated(HoodSettings),
}
