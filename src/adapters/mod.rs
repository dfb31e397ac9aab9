//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter          | Implements     | Connects to                 |
//! |------------------|----------------|-----------------------------|
//! | `json_transport` | TransportPort  | RF encoder via JSON lines   |
//! | `log_sink`       | EventSink      | `log` facade                |
//! | `memory_store`   | ConfigPort     | In-memory settings store    |
//! |                  | StoragePort    |                             |
//! | `time`           | TimePort       | `std::time::Instant`        |

pub mod json_transport;
pub mod log_sink;
pub mod memory_store;
pub mod time;
