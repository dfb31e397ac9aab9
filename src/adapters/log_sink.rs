//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing each application event as a single
//! structured log line.  A home-automation bus adapter would implement the
//! same trait.

use log::{Level, log};

use crate::app::events::{AppEvent, SignalSource};
use crate::app::ports::EventSink;
use crate::hood::OutgoingPayload;
use crate::timers::TimerPurpose;

/// Adapter that logs every [`AppEvent`].
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

fn command_str(p: &OutgoingPayload) -> &'static str {
    p.command.map_or("-", |c| c.as_str())
}

/// Level and text of the log line for `event`.
pub fn render(event: &AppEvent) -> (Level, String) {
    match event {
        AppEvent::Transmitted { payload, repeated } => {
            let tag = if *repeated { "RAMP" } else { "TX" };
            (
                Level::Info,
                format!(
                    "{} | unit={} command={} | {} light={} onoff={}",
                    tag,
                    payload.unit,
                    command_str(payload),
                    payload.speed_level,
                    payload.light,
                    payload.onoff,
                ),
            )
        }
        AppEvent::Suppressed(command) => (
            Level::Info,
            format!("TX | {} already satisfied, nothing sent", command),
        ),
        AppEvent::Applied { source, payload } => {
            let origin = match source {
                SignalSource::Remote => "remote",
                SignalSource::Echo => "echo",
            };
            (
                Level::Info,
                format!(
                    "RX | {} unit={} command={} | {} light={} onoff={}",
                    origin,
                    payload.unit,
                    command_str(payload),
                    payload.speed_level,
                    payload.light,
                    payload.onoff,
                ),
            )
        }
        AppEvent::Ignored(unit) => (Level::Debug, format!("RX | ignored unit '{}'", unit)),
        AppEvent::TimerFired(TimerPurpose::RunOut) => {
            (Level::Info, "RUNOUT | window elapsed".to_string())
        }
        AppEvent::TimerFired(purpose) => (Level::Debug, format!("TIMER | {} fired", purpose)),
        AppEvent::RunOutFinalized => (Level::Info, "RUNOUT | hood off".to_string()),
        AppEvent::SettingsUpdated(s) => (
            Level::Info,
            format!(
                "SETTINGS | onoff_action={} run_out={}",
                s.onoff_action.as_str(),
                s.run_out
            ),
        ),
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        let (level, line) = render(event);
        log!(level, "{}", line);
    }
}
