//! Shadow state store.
//!
//! The hood cannot be queried, so its semantic state lives in a settings
//! record owned by an external key-value store.  This module is the only
//! place that touches that record: every field is validated and defaulted
//! on the way in, and `speed`/`speedLevel` are recomputed on the way out.
//!
//! Record layout (JSON object under `hood::record`):
//!
//! | key            | type          | default     |
//! |----------------|---------------|-------------|
//! | `speedLevel`   | `"speed_N"`   | `"speed_0"` |
//! | `speed`        | 0–4           | from level  |
//! | `light`        | bool          | false       |
//! | `runOutActive` | bool          | false       |
//! | `offRunOut`    | bool / null   | null        |
//! | `targetSpeed`  | 0–4 / null    | null        |
//! | `speedHistory` | 1–4 / null    | null        |
//! | `lightHistory` | bool / null   | null        |
//! | `onoff_action` | string        | `"device"`  |
//! | `run_out`      | bool          | true        |
//!
//! Keys the controller does not own are preserved on save.

use log::{info, warn};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::app::ports::{StorageError, StoragePort};
use crate::hood::state::{HoodSettings, HoodState};
use crate::hood::{OnOffAction, Speed};

pub const RECORD_NAMESPACE: &str = "hood";
pub const RECORD_KEY: &str = "record";

/// Upper bound for the serialised record.
pub const MAX_RECORD_SIZE: usize = 1024;

/// Everything the controller keeps in the settings record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ShadowRecord {
    pub state: HoodState,
    pub settings: HoodSettings,
}

#[derive(Serialize)]
struct RecordFields<'a> {
    speed: u8,
    #[serde(rename = "speedLevel")]
    speed_level: &'a str,
    light: bool,
    #[serde(rename = "offRunOut")]
    off_run_out: Option<bool>,
    #[serde(rename = "runOutActive")]
    run_out_active: bool,
    #[serde(rename = "targetSpeed")]
    target_speed: Option<u8>,
    #[serde(rename = "speedHistory")]
    speed_history: Option<u8>,
    #[serde(rename = "lightHistory")]
    light_history: Option<bool>,
    onoff_action: &'a str,
    run_out: bool,
}

impl<'a> From<&'a ShadowRecord> for RecordFields<'a> {
    fn from(r: &'a ShadowRecord) -> Self {
        let s = &r.state;
        Self {
            speed: s.speed.get(),
            speed_level: s.speed_level(),
            light: s.light,
            off_run_out: s.off_run_out,
            run_out_active: s.run_out_active,
            target_speed: s.target_speed.map(Speed::get),
            speed_history: s.speed_history.map(Speed::get),
            light_history: s.light_history,
            onoff_action: r.settings.onoff_action.as_str(),
            run_out: r.settings.run_out,
        }
    }
}

/// Load/save boundary for the shadow record.
#[derive(Debug, Clone)]
pub struct ShadowStore {
    namespace: &'static str,
    key: &'static str,
}

impl Default for ShadowStore {
    fn default() -> Self {
        Self::new(RECORD_NAMESPACE, RECORD_KEY)
    }
}

impl ShadowStore {
    pub fn new(namespace: &'static str, key: &'static str) -> Self {
        Self { namespace, key }
    }

    /// Read the record.  A missing record yields defaults; an unreadable
    /// one yields defaults with a warning.  Storage failures other than
    /// `NotFound` are returned.
    pub fn load(&self, storage: &impl StoragePort) -> Result<ShadowRecord, StorageError> {
        match self.read_object(storage)? {
            Some(obj) => Ok(decode(&obj)),
            None => Ok(ShadowRecord::default()),
        }
    }

    /// Persist the full record and return what was written.  Keys already
    /// stored are kept, so a failure to read them aborts the save.
    pub fn save(
        &self,
        storage: &mut impl StoragePort,
        record: &ShadowRecord,
    ) -> Result<ShadowRecord, StorageError> {
        let mut obj = self.read_object(storage)?.unwrap_or_default();
        let fields = serde_json::to_value(RecordFields::from(record))
            .map_err(|_| StorageError::IoError)?;
        if let Value::Object(fields) = fields {
            obj.extend(fields);
        }

        let bytes = serde_json::to_vec(&Value::Object(obj)).map_err(|_| StorageError::IoError)?;
        if bytes.len() > MAX_RECORD_SIZE {
            warn!("ShadowStore: record too large ({} bytes)", bytes.len());
            return Err(StorageError::Full);
        }
        storage.write(self.namespace, self.key, &bytes)?;
        Ok(*record)
    }

    pub fn load_settings(&self, storage: &impl StoragePort) -> Result<HoodSettings, StorageError> {
        Ok(self.load(storage)?.settings)
    }

    /// Replace the policy fields, leaving the state fields as stored.
    pub fn save_settings(
        &self,
        storage: &mut impl StoragePort,
        settings: HoodSettings,
    ) -> Result<HoodSettings, StorageError> {
        let mut record = self.load(storage)?;
        record.settings = settings;
        Ok(self.save(storage, &record)?.settings)
    }

    fn read_object(&self, storage: &impl StoragePort) -> Result<Option<Map<String, Value>>, StorageError> {
        let mut buf = [0u8; MAX_RECORD_SIZE];
        let len = match storage.read(self.namespace, self.key, &mut buf) {
            Ok(len) => len,
            Err(StorageError::NotFound) => {
                info!("ShadowStore: no record, using defaults");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        match serde_json::from_slice::<Value>(&buf[..len]) {
            Ok(Value::Object(obj)) => Ok(Some(obj)),
            Ok(_) | Err(_) => {
                warn!("ShadowStore: record is not a JSON object, using defaults");
                Ok(None)
            }
        }
    }
}

// ── Field decoding ────────────────────────────────────────────

fn decode(obj: &Map<String, Value>) -> ShadowRecord {
    let speed = obj
        .get("speedLevel")
        .and_then(Value::as_str)
        .and_then(Speed::from_level)
        .or_else(|| speed_field(obj, "speed"))
        .unwrap_or(Speed::OFF);

    let state = HoodState {
        speed,
        light: bool_field(obj, "light").unwrap_or(false),
        run_out_active: bool_field(obj, "runOutActive").unwrap_or(false),
        off_run_out: bool_field(obj, "offRunOut"),
        target_speed: speed_field(obj, "targetSpeed"),
        speed_history: speed_field(obj, "speedHistory").filter(|s| !s.is_off()),
        light_history: bool_field(obj, "lightHistory"),
    };

    let settings = HoodSettings {
        onoff_action: obj
            .get("onoff_action")
            .and_then(Value::as_str)
            .and_then(OnOffAction::parse)
            .unwrap_or_default(),
        run_out: bool_field(obj, "run_out").unwrap_or(true),
    };

    ShadowRecord { state, settings }
}

fn bool_field(obj: &Map<String, Value>, key: &str) -> Option<bool> {
    obj.get(key).and_then(Value::as_bool)
}

fn speed_field(obj: &Map<String, Value>, key: &str) -> Option<Speed> {
    obj.get(key)
        .and_then(Value::as_u64)
        .and_then(|n| u8::try_from(n).ok())
        .and_then(Speed::new)
}
