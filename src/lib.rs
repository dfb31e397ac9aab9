//! Shadow-state controller for RF-remote kitchen extraction hoods.
//!
//! The hood's remote only knows four stateless toggles (power, light,
//! increase, decrease) and the hood never answers.  This crate keeps the
//! state the hood cannot report and turns semantic requests ("speed 3",
//! "off without run-out") into the toggle sequences that reach them.
//!
//! Layout:
//! - [`hood`]: pure engine: state model, interpreter, assembler, ramp and
//!   run-out controllers.
//! - [`app`]: service, commands, events and port traits.
//! - [`adapters`]: concrete ports for hosts and tests.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod hood;
pub mod store;
pub mod timers;

mod error;

pub use error::{Error, Result};
