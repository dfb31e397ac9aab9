//! Application core: orchestration around the pure engine, no direct I/O.
//!
//! The [`service::HoodService`] drives the translation engine in
//! [`crate::hood`]: it loads and saves shadow state, transmits resolved
//! units, and runs the timer registry.  All interaction with the radio and
//! the settings store happens through **port traits** defined in
//! [`ports`], keeping this layer fully testable with mock adapters.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
