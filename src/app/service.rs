//! Application service, the hexagonal core.
//!
//! [`HoodService`] owns the timer registry, the send cache and the live
//! configuration.  Shadow state is not held in memory: every operation
//! loads the record through the [`StoragePort`], applies a pure engine
//! step, persists, and only then executes the step's timer effects.
//!
//! ```text
//!   HoodRequest ──▶ ┌─────────────────────────────┐ ──▶ TransportPort
//!                   │         HoodService          │
//!   SignalEvent ──▶ │ assemble · interpret · timers│ ◀─▶ StoragePort
//!                   └─────────────────────────────┘ ──▶ EventSink
//! ```
//!
//! Every unit handed to the transport is echoed back through the inbound
//! interpreter, so our own transmissions and the physical remote move the
//! shadow state by the same rules.

use heapless::Deque;
use log::{debug, info, warn};

use crate::config::{HoodConfig, MAX_SEND_CACHE_DEPTH};
use crate::error::Result;
use crate::hood::outbound::{self, HoodRequest};
use crate::hood::state::HoodSettings;
use crate::hood::{Command, Effect, OutgoingPayload, SignalEvent, TimerAction, Unit};
use crate::hood::{inbound, run_out};
use crate::store::{ShadowRecord, ShadowStore};
use crate::timers::{TimerPurpose, TimerRegistry};

use super::commands::AppCommand;
use super::events::{AppEvent, SignalSource};
use super::ports::{ConfigError, ConfigPort, EventSink, StoragePort, TimePort, TransportPort};

// ───────────────────────────────────────────────────────────────
// HoodService
// ───────────────────────────────────────────────────────────────

/// Orchestrates the translation engine for one hood.
pub struct HoodService {
    config: HoodConfig,
    store: ShadowStore,
    timers: TimerRegistry,
    /// Most recent assembled payloads, oldest first.
    sent: Deque<OutgoingPayload, MAX_SEND_CACHE_DEPTH>,
    transmit_count: u64,
    config_dirty: bool,
}

impl HoodService {
    pub fn new(config: HoodConfig) -> Self {
        Self::with_store(config, ShadowStore::default())
    }

    /// Use a non-default record location.
    pub fn with_store(config: HoodConfig, store: ShadowStore) -> Self {
        Self {
            config,
            store,
            timers: TimerRegistry::new(),
            sent: Deque::new(),
            transmit_count: 0,
            config_dirty: false,
        }
    }

    /// Construct from persisted configuration, falling back to defaults
    /// when nothing has been stored yet.
    pub fn from_config_port(port: &impl ConfigPort) -> Result<Self> {
        let config = match port.load() {
            Ok(c) => c,
            Err(ConfigError::NotFound) => {
                info!("HoodService: no stored config, using defaults");
                HoodConfig::default()
            }
            Err(e) => return Err(e.into()),
        };
        Ok(Self::new(config))
    }

    // ── Outbound ──────────────────────────────────────────────

    /// Resolve a semantic request, persist the intent, and transmit.
    ///
    /// Returns the assembled payload.  `unit == none` means nothing was
    /// sent.  If the intent cannot be persisted nothing is transmitted; a
    /// failure to persist the echoed state is returned after the send.
    pub fn handle_request(
        &mut self,
        request: &HoodRequest,
        now_ms: u64,
        dev: &mut (impl StoragePort + TransportPort),
        sink: &mut impl EventSink,
    ) -> Result<OutgoingPayload> {
        let mut record = self.store.load(&*dev)?;

        let Some(command) = outbound::resolve_command(request, &record.state, &record.settings)
        else {
            debug!("HoodService: empty request");
            let s = &record.state;
            let payload =
                OutgoingPayload::new(Unit::None, None, s.reported_speed(), s.light, s.is_on());
            self.cache(payload);
            return Ok(payload);
        };

        let assembly = outbound::assemble(&record.state, command);
        if assembly.state.target_speed != record.state.target_speed {
            // A new (or dropped) target supersedes any step still queued.
            self.timers.cancel(TimerPurpose::RampStep);
        }
        if assembly.state != record.state {
            record.state = assembly.state;
            record = self.store.save(dev, &record)?;
        }
        self.run_effects(&assembly.effects, now_ms)?;
        self.transmit(assembly.payload, false, record, now_ms, dev, sink)
    }

    /// Parse an explicit command string and handle it as a request.
    pub fn handle_command_str(
        &mut self,
        command: &str,
        now_ms: u64,
        dev: &mut (impl StoragePort + TransportPort),
        sink: &mut impl EventSink,
    ) -> Result<OutgoingPayload> {
        let command: Command = command.parse()?;
        self.handle_request(&HoodRequest::command(command), now_ms, dev, sink)
    }

    // ── Inbound ───────────────────────────────────────────────

    /// Apply a frame received from the physical remote.
    ///
    /// Frames addressed elsewhere and unrecognised units are dropped
    /// without touching the shadow state.
    pub fn handle_signal(
        &mut self,
        event: &SignalEvent,
        now_ms: u64,
        dev: &mut (impl StoragePort + TransportPort),
        sink: &mut impl EventSink,
    ) -> Result<Option<OutgoingPayload>> {
        if !dev.matches(event) {
            sink.emit(&AppEvent::Ignored(event.unit.clone()));
            return Ok(None);
        }
        let Some(unit) = Unit::parse_received(&event.unit) else {
            debug!("HoodService: unknown unit '{}'", event.unit);
            sink.emit(&AppEvent::Ignored(event.unit.clone()));
            return Ok(None);
        };

        let record = self.store.load(&*dev)?;
        let payload = self.apply(unit, record, now_ms, dev)?;
        sink.emit(&AppEvent::Applied {
            source: SignalSource::Remote,
            payload,
        });
        Ok(Some(payload))
    }

    /// Re-establish timers after a restart.
    ///
    /// Timers live in memory only, so a persisted run-out is re-armed with
    /// a full window and a half-finished ramp is dropped.
    pub fn resume(&mut self, now_ms: u64, storage: &mut impl StoragePort) -> Result<()> {
        let mut record = self.store.load(&*storage)?;
        let mut changed = false;

        if record.state.target_speed.take().is_some() {
            info!("HoodService: dropping interrupted ramp");
            changed = true;
        }
        if record.state.run_out_active
            && !self.timers.is_armed(TimerPurpose::RunOut)
            && !self.timers.is_armed(TimerPurpose::FastOff)
        {
            info!("HoodService: resuming run-out");
            self.timers.arm(
                TimerPurpose::RunOut,
                now_ms,
                self.config.run_out_delay_ms,
                TimerAction::FinalizeRunOut,
            )?;
        }
        if changed {
            self.store.save(storage, &record)?;
        }
        Ok(())
    }

    // ── Timers ────────────────────────────────────────────────

    /// Run every timer due at `now_ms`.  Returns how many fired.
    pub fn poll_timers(
        &mut self,
        now_ms: u64,
        dev: &mut (impl StoragePort + TransportPort),
        sink: &mut impl EventSink,
    ) -> Result<usize> {
        let mut fired = 0;
        while let Some(timer) = self.timers.poll_next(now_ms) {
            fired += 1;
            sink.emit(&AppEvent::TimerFired(timer.purpose));
            match timer.action {
                TimerAction::Resend(unit) => {
                    let record = self.store.load(&*dev)?;
                    let payload = outbound::assemble_repeated(&record.state, unit);
                    self.transmit(payload, true, record, now_ms, dev, sink)?;
                }
                TimerAction::FinalizeRunOut => self.finalize_run_out(dev, sink)?,
            }
        }
        Ok(fired)
    }

    /// [`poll_timers`](Self::poll_timers) against a clock.
    pub fn poll(
        &mut self,
        clock: &impl TimePort,
        dev: &mut (impl StoragePort + TransportPort),
        sink: &mut impl EventSink,
    ) -> Result<usize> {
        self.poll_timers(clock.now_ms(), dev, sink)
    }

    // ── Command handling ──────────────────────────────────────

    /// Process an external command.  Returns the payload for requests
    /// and applied signals.
    pub fn handle_command(
        &mut self,
        cmd: AppCommand,
        now_ms: u64,
        dev: &mut (impl StoragePort + TransportPort),
        sink: &mut impl EventSink,
    ) -> Result<Option<OutgoingPayload>> {
        match cmd {
            AppCommand::Request(request) => {
                self.handle_request(&request, now_ms, dev, sink).map(Some)
            }
            AppCommand::Signal(event) => self.handle_signal(&event, now_ms, dev, sink),
            AppCommand::UpdateSettings(settings) => {
                self.update_settings(settings, dev, sink)?;
                Ok(None)
            }
            AppCommand::UpdateConfig(config) => {
                if let Err(e) = config.validate() {
                    warn!("Rejected config update: {}", e);
                    return Err(e.into());
                }
                self.config = config;
                self.config_dirty = true;
                info!("Configuration updated at runtime");
                Ok(None)
            }
        }
    }

    /// Persist new per-device policy.
    pub fn update_settings(
        &mut self,
        settings: HoodSettings,
        storage: &mut impl StoragePort,
        sink: &mut impl EventSink,
    ) -> Result<()> {
        let saved = self.store.save_settings(storage, settings)?;
        info!(
            "Settings: onoff_action={} run_out={}",
            saved.onoff_action.as_str(),
            saved.run_out
        );
        sink.emit(&AppEvent::SettingsUpdated(saved));
        Ok(())
    }

    /// Flush a runtime config change.  Returns `true` if a save happened.
    pub fn save_config_if_dirty(&mut self, port: &impl ConfigPort) -> Result<bool> {
        if !self.config_dirty {
            return Ok(false);
        }
        if let Err(e) = port.save(&self.config) {
            warn!("Config save failed: {}", e);
            return Err(e.into());
        }
        self.config_dirty = false;
        info!("Config saved");
        Ok(true)
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn config(&self) -> &HoodConfig {
        &self.config
    }

    pub fn is_config_dirty(&self) -> bool {
        self.config_dirty
    }

    /// When the host loop should call [`poll_timers`](Self::poll_timers) next.
    pub fn next_deadline(&self) -> Option<u64> {
        self.timers.next_deadline()
    }

    pub fn is_armed(&self, purpose: TimerPurpose) -> bool {
        self.timers.is_armed(purpose)
    }

    /// Recently assembled payloads, oldest first.
    pub fn recent_sends(&self) -> impl Iterator<Item = &OutgoingPayload> {
        self.sent.iter()
    }

    pub fn last_sent(&self) -> Option<&OutgoingPayload> {
        self.sent.back()
    }

    /// Units handed to the transport since construction.
    pub fn transmit_count(&self) -> u64 {
        self.transmit_count
    }

    // ── Internal ──────────────────────────────────────────────

    fn transmit(
        &mut self,
        payload: OutgoingPayload,
        repeated: bool,
        record: ShadowRecord,
        now_ms: u64,
        dev: &mut (impl StoragePort + TransportPort),
        sink: &mut impl EventSink,
    ) -> Result<OutgoingPayload> {
        self.cache(payload);

        if !payload.transmits() {
            if let Some(command) = payload.command {
                debug!("HoodService: '{}' needs no transmission", command);
                sink.emit(&AppEvent::Suppressed(command));
            }
            return Ok(payload);
        }

        dev.send(&payload);
        self.transmit_count += 1;
        sink.emit(&AppEvent::Transmitted { payload, repeated });

        let echo = self.apply(payload.unit, record, now_ms, dev)?;
        sink.emit(&AppEvent::Applied {
            source: SignalSource::Echo,
            payload: echo,
        });
        Ok(payload)
    }

    /// Interpret `unit` against `record`, persist, then run the effects.
    fn apply(
        &mut self,
        unit: Unit,
        mut record: ShadowRecord,
        now_ms: u64,
        dev: &mut (impl StoragePort + TransportPort),
    ) -> Result<OutgoingPayload> {
        let transition = inbound::interpret(&record.state, unit, &self.config);
        record.state = transition.state;
        self.store.save(dev, &record)?;
        self.run_effects(&transition.effects, now_ms)?;
        dev.report(&transition.payload);
        Ok(transition.payload)
    }

    fn run_effects(&mut self, effects: &[Effect], now_ms: u64) -> Result<()> {
        for effect in effects {
            match *effect {
                Effect::Cancel(purpose) => {
                    self.timers.cancel(purpose);
                }
                Effect::Arm {
                    purpose,
                    delay_ms,
                    action,
                } => self.timers.arm(purpose, now_ms, delay_ms, action)?,
            }
        }
        Ok(())
    }

    fn finalize_run_out(
        &mut self,
        dev: &mut (impl StoragePort + TransportPort),
        sink: &mut impl EventSink,
    ) -> Result<()> {
        let mut record = self.store.load(&*dev)?;
        if !record.state.run_out_active {
            debug!("HoodService: run-out already resolved");
            return Ok(());
        }
        run_out::finalize(&mut record.state);
        let record = self.store.save(dev, &record)?;
        let s = &record.state;
        dev.report(&OutgoingPayload::new(
            Unit::None,
            Some(Command::Off),
            s.reported_speed(),
            s.light,
            s.is_on(),
        ));
        sink.emit(&AppEvent::RunOutFinalized);
        Ok(())
    }

    fn cache(&mut self, payload: OutgoingPayload) {
        let depth = usize::from(self.config.send_cache_depth).min(MAX_SEND_CACHE_DEPTH);
        if depth == 0 {
            return;
        }
        while self.sent.len() >= depth {
            self.sent.pop_front();
        }
        if self.sent.push_back(payload).is_err() {
            warn!("HoodService: send cache full");
        }
    }
}
