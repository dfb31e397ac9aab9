//! Unified error type for the hood controller.
//!
//! Every fallible service operation funnels into [`Error`], keeping the
//! host loop's error handling uniform.  Malformed inbound signals are not
//! errors; they are dropped by the interpreter.

use core::fmt;

use crate::app::ports::{ConfigError, StorageError};
use crate::hood::CommandParseError;
use crate::timers::TimerError;

// ---------------------------------------------------------------------------
// Top-level controller error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The settings store rejected a read or write.
    Storage(StorageError),
    /// Timing configuration could not be loaded or saved.
    Config(ConfigError),
    /// A timer slot was armed while occupied.
    Timer(TimerError),
    /// An explicit command string was not recognised.
    Command(CommandParseError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Storage(e) => write!(f, "storage: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Timer(e) => write!(f, "timer: {e}"),
            Self::Command(e) => write!(f, "command: {e}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<TimerError> for Error {
    fn from(e: TimerError) -> Self {
        Self::Timer(e)
    }
}

impl From<CommandParseError> for Error {
    fn from(e: CommandParseError) -> Self {
        Self::Command(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

pub type Result<T> = core::result::Result<T, Error>;
