//! Fuzz target: mixed request / signal / timer sequences
//!
//! Drives the service with an arbitrary interleaving of semantic requests,
//! remote frames and clock advances, and verifies:
//! - no panics and no timer-slot conflicts
//! - speed stays in 0..=4
//! - `unit none` never reaches the transport
//! - once every timer has fired, no ramp target is left behind
//!
//! cargo fuzz run fuzz_signal_sequence

#![no_main]

use hoodctl::Error;
use hoodctl::adapters::memory_store::MemoryStore;
use hoodctl::app::events::AppEvent;
use hoodctl::app::ports::{EventSink, StorageError, StoragePort, TransportPort};
use hoodctl::app::service::HoodService;
use hoodctl::config::HoodConfig;
use hoodctl::hood::outbound::HoodRequest;
use hoodctl::hood::{OutgoingPayload, SignalEvent, Speed};
use hoodctl::store::ShadowStore;
use libfuzzer_sys::fuzz_target;

#[derive(Default)]
struct Dev {
    store: MemoryStore,
}

impl StoragePort for Dev {
    fn read(&self, ns: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        self.store.read(ns, key, buf)
    }
    fn write(&mut self, ns: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        self.store.write(ns, key, data)
    }
    fn delete(&mut self, ns: &str, key: &str) -> Result<(), StorageError> {
        self.store.delete(ns, key)
    }
    fn exists(&self, ns: &str, key: &str) -> bool {
        self.store.exists(ns, key)
    }
}

impl TransportPort for Dev {
    fn send(&mut self, payload: &OutgoingPayload) {
        assert!(payload.transmits());
    }
}

struct Quiet;
impl EventSink for Quiet {
    fn emit(&mut self, _event: &AppEvent) {}
}

const COMMANDS: [&str; 15] = [
    "on",
    "off",
    "off_run_out",
    "toggle_onoff",
    "toggle_onoff_run_out",
    "light_on",
    "light_off",
    "toggle_light",
    "increase",
    "decrease",
    "speed_0",
    "speed_1",
    "speed_2",
    "speed_3",
    "speed_4",
];

const UNITS: [&str; 5] = ["onoff", "light", "increase", "decrease", "bogus"];

fn check(result: Result<(), Error>) {
    if let Err(e) = result {
        panic!("unexpected error: {e}");
    }
}

fuzz_target!(|data: &[u8]| {
    let mut svc = HoodService::new(HoodConfig::default());
    let mut dev = Dev::default();
    let mut now: u64 = 0;

    for pair in data.chunks_exact(2) {
        let (op, arg) = (pair[0], pair[1]);
        let result = match op % 4 {
            0 => svc
                .handle_command_str(COMMANDS[usize::from(arg) % COMMANDS.len()], now, &mut dev, &mut Quiet)
                .map(drop),
            1 => svc
                .handle_signal(&SignalEvent::new(UNITS[usize::from(arg) % UNITS.len()]), now, &mut dev, &mut Quiet)
                .map(drop),
            2 => svc
                .handle_request(&HoodRequest::onoff(arg & 1 == 1), now, &mut dev, &mut Quiet)
                .map(drop),
            _ => {
                now += u64::from(arg) * 40;
                svc.poll_timers(now, &mut dev, &mut Quiet).map(drop)
            }
        };
        check(result);

        let state = ShadowStore::default().load(&dev).expect("load").state;
        assert!(state.speed <= Speed::MAX);
    }

    // Let every pending ramp step and resend play out (run-out included).
    while let Some(deadline) = svc.next_deadline() {
        check(svc.poll_timers(deadline, &mut dev, &mut Quiet).map(drop));
    }
    let state = ShadowStore::default().load(&dev).expect("load").state;
    assert_eq!(state.target_speed, None);
    assert!(!state.run_out_active);
});
