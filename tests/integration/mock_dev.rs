//! Mock adapters for host-side integration tests.
//!
//! `MockDevice` combines the settings store and the RF transport, the way
//! a real device driver exposes both to the service.

use hoodctl::adapters::memory_store::MemoryStore;
use hoodctl::app::events::AppEvent;
use hoodctl::app::ports::{EventSink, StorageError, StoragePort, TransportPort};
use hoodctl::app::service::HoodService;
use hoodctl::config::HoodConfig;
use hoodctl::hood::state::{HoodSettings, HoodState};
use hoodctl::hood::{OutgoingPayload, SignalEvent, Speed, Unit};
use hoodctl::store::{ShadowRecord, ShadowStore};

// ── MockDevice ───────────────────────────────────────────────

pub struct MockDevice {
    pub store: MemoryStore,
    pub sent: Vec<OutgoingPayload>,
    pub reports: Vec<OutgoingPayload>,
    /// Whether received frames are addressed to this device.
    pub accept: bool,
}

impl MockDevice {
    pub fn new() -> Self {
        Self {
            store: MemoryStore::new(),
            sent: Vec::new(),
            reports: Vec::new(),
            accept: true,
        }
    }

    /// A device whose stored record already holds `state`.
    pub fn with_state(state: HoodState) -> Self {
        let mut dev = Self::new();
        let record = ShadowRecord {
            state,
            settings: HoodSettings::default(),
        };
        ShadowStore::default().save(&mut dev, &record).unwrap();
        dev
    }

    /// A device running at `speed`, which is also its remembered speed.
    pub fn running_at(speed: u8) -> Self {
        Self::with_state(HoodState {
            speed: Speed::saturating(speed),
            speed_history: Speed::new(speed).filter(|s| !s.is_off()),
            ..HoodState::default()
        })
    }

    pub fn state(&self) -> HoodState {
        ShadowStore::default().load(self).unwrap().state
    }

    pub fn set_settings(&mut self, settings: HoodSettings) {
        ShadowStore::default().save_settings(self, settings).unwrap();
    }

    pub fn units_sent(&self) -> Vec<Unit> {
        self.sent.iter().map(|p| p.unit).collect()
    }

    pub fn count_sent(&self, unit: Unit) -> usize {
        self.sent.iter().filter(|p| p.unit == unit).count()
    }
}

impl StoragePort for MockDevice {
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        self.store.read(namespace, key, buf)
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        self.store.write(namespace, key, data)
    }

    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError> {
        self.store.delete(namespace, key)
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        self.store.exists(namespace, key)
    }
}

impl TransportPort for MockDevice {
    fn send(&mut self, payload: &OutgoingPayload) {
        assert!(payload.transmits(), "unit none must never reach the radio");
        self.sent.push(*payload);
    }

    fn report(&mut self, payload: &OutgoingPayload) {
        self.reports.push(*payload);
    }

    fn matches(&self, _event: &SignalEvent) -> bool {
        self.accept
    }
}

// ── RecordingSink ────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Helpers ──────────────────────────────────────────────────

pub fn service() -> HoodService {
    HoodService::new(HoodConfig::default())
}

/// Fire every timer due up to and including `until_ms`, in deadline order.
/// Returns the time of the last poll.
pub fn run_timers_until(
    svc: &mut HoodService,
    dev: &mut MockDevice,
    sink: &mut RecordingSink,
    until_ms: u64,
) -> u64 {
    let mut now = 0;
    while let Some(deadline) = svc.next_deadline() {
        if deadline > until_ms {
            break;
        }
        now = deadline;
        svc.poll_timers(now, dev, sink).unwrap();
    }
    now
}
