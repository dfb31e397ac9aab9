//! Inbound commands to the application service.
//!
//! These represent everything the outside world (automation rules, the RF
//! receiver, a settings form) can ask of the
//! [`HoodService`](super::service::HoodService).

use crate::config::HoodConfig;
use crate::hood::SignalEvent;
use crate::hood::outbound::HoodRequest;
use crate::hood::state::HoodSettings;

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone)]
pub enum AppCommand {
    /// Drive the hood towards a semantic state.
    Request(HoodRequest),

    /// A toggle frame received from the physical remote.
    Signal(SignalEvent),

    /// Replace the per-device policy (`onoff_action`, `run_out`).
    UpdateSettings(HoodSettings),

    /// Hot-reload timing configuration.  Affects timers armed afterwards.
    UpdateConfig(HoodConfig),
}
