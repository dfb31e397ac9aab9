//! Port traits: the hexagonal boundary between the hood controller and the
//! outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ HoodService (domain)
//! ```
//!
//! Driven adapters (settings storage, RF transport, event sinks, clocks)
//! implement these traits.  The [`HoodService`](super::service::HoodService)
//! consumes them via generics, so the translation engine never touches a
//! radio or a settings database directly.

use crate::config::HoodConfig;
use crate::hood::{OutgoingPayload, SignalEvent};

// ───────────────────────────────────────────────────────────────
// Transport port (driven adapter: domain → RF layer)
// ───────────────────────────────────────────────────────────────

/// The RF transport collaborator.
///
/// Bit-level encoding, addressing and pairing live behind this trait.
pub trait TransportPort {
    /// Transmit a payload.  Fire-and-forget: the hood never acknowledges.
    /// Never called with `unit == none`.
    fn send(&mut self, payload: &OutgoingPayload);

    /// Receive the state mirror produced after a signal was applied.
    /// Nothing is transmitted for a report.
    fn report(&mut self, _payload: &OutgoingPayload) {}

    /// Whether a received frame is addressed to this device.
    fn matches(&self, _event: &SignalEvent) -> bool {
        true
    }
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Time port (driven adapter: monotonic clock → domain)
// ───────────────────────────────────────────────────────────────

/// Monotonic milliseconds, used to drive the timer registry.
pub trait TimePort {
    fn now_ms(&self) -> u64;
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists controller timing configuration.
///
/// Implementations MUST validate before persisting and reject invalid
/// ranges with [`ConfigError::ValidationFailed`] instead of clamping.
pub trait ConfigPort {
    /// Returns [`HoodConfig::default()`] if nothing is stored.
    fn load(&self) -> Result<HoodConfig, ConfigError>;

    fn save(&self, config: &HoodConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Storage port (driven adapter: domain ↔ settings store)
// ───────────────────────────────────────────────────────────────

/// Persistent key-value storage holding the shadow-state record.
///
/// Durability and retry policy belong to the implementation; the
/// controller surfaces any error to its caller unchanged.
pub trait StoragePort {
    /// Read a value.  Returns the number of bytes written to `buf`.
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError>;

    /// Write a value atomically.
    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Delete a key.  Returns `Ok(())` even if the key didn't exist.
    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError>;

    /// Check whether a key exists without reading it.
    fn exists(&self, namespace: &str, key: &str) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// No config found in storage.
    NotFound,
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    ValidationFailed(&'static str),
    /// Underlying storage is full.
    StorageFull,
    /// Generic I/O error from the storage backend.
    IoError,
}

/// Errors from [`StoragePort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Requested key does not exist.
    NotFound,
    /// Storage is full, or the value exceeds the record size limit.
    Full,
    /// Generic I/O error.
    IoError,
    /// The store refused the write.
    Rejected,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::StorageFull => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::Full => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
            Self::Rejected => write!(f, "write rejected"),
        }
    }
}
