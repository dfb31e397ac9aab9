//! Fuzz target: shadow record decoding
//!
//! Stores arbitrary bytes as the settings record and verifies:
//! - `load` never panics and never errors on content alone
//! - every decoded field is in range
//! - saving the decoded record and loading it again is a fixed point
//!
//! cargo fuzz run fuzz_shadow_record

#![no_main]

use hoodctl::adapters::memory_store::MemoryStore;
use hoodctl::app::ports::StoragePort;
use hoodctl::hood::Speed;
use hoodctl::store::{MAX_RECORD_SIZE, RECORD_KEY, RECORD_NAMESPACE, ShadowStore};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > MAX_RECORD_SIZE {
        return;
    }
    let mut store = MemoryStore::new();
    store
        .write(RECORD_NAMESPACE, RECORD_KEY, data)
        .expect("memory store accepts writes");

    let shadow = ShadowStore::default();
    let rec = shadow.load(&store).expect("content never fails a load");

    assert!(rec.state.speed <= Speed::MAX);
    if let Some(t) = rec.state.target_speed {
        assert!(t <= Speed::MAX);
    }
    if let Some(h) = rec.state.speed_history {
        assert!(!h.is_off());
    }

    // Foreign keys may push an oversize record past the limit; that is a
    // save error, not a decode error.
    if shadow.save(&mut store, &rec).is_ok() {
        assert_eq!(shadow.load(&store).expect("reload"), rec);
    }
});
