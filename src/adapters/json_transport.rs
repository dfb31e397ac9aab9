//! JSON-lines transport adapter.
//!
//! Writes every transmitted payload as one JSON object per line to any
//! `std::io::Write`.  The RF encoder (or a test harness) reads the lines
//! on the other side; bit-level encoding stays out of this crate.
//!
//! ```text
//! {"unit":"increase","command":"speed_3","speed":3,"speedLevel":"speed_3","light":false,"onoff":true}
//! ```

use std::io::Write;

use log::{debug, warn};

use crate::app::ports::TransportPort;
use crate::hood::OutgoingPayload;

pub struct JsonLineTransport<W: Write> {
    writer: W,
    /// Also write state reports (marked `"report":true`).
    include_reports: bool,
    write_errors: u32,
}

impl<W: Write> JsonLineTransport<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            include_reports: false,
            write_errors: 0,
        }
    }

    pub fn with_reports(mut self, include: bool) -> Self {
        self.include_reports = include;
        self
    }

    /// Sends lost to I/O failures since construction.
    pub fn write_errors(&self) -> u32 {
        self.write_errors
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_line(&mut self, value: &serde_json::Value) {
        let mut line = match serde_json::to_vec(value) {
            Ok(line) => line,
            Err(e) => {
                warn!("JsonLineTransport: encode failed: {}", e);
                return;
            }
        };
        line.push(b'\n');
        let result = self
            .writer
            .write_all(&line)
            .and_then(|()| self.writer.flush());
        if let Err(e) = result {
            self.write_errors = self.write_errors.saturating_add(1);
            warn!("JsonLineTransport: write failed: {}", e);
        }
    }
}

impl<W: Write> TransportPort for JsonLineTransport<W> {
    fn send(&mut self, payload: &OutgoingPayload) {
        if !payload.transmits() {
            debug!("JsonLineTransport: dropping unit none");
            return;
        }
        match serde_json::to_value(payload) {
            Ok(v) => self.write_line(&v),
            Err(e) => warn!("JsonLineTransport: encode failed: {}", e),
        }
    }

    fn report(&mut self, payload: &OutgoingPayload) {
        if !self.include_reports {
            return;
        }
        match serde_json::to_value(payload) {
            Ok(serde_json::Value::Object(mut obj)) => {
                obj.insert("report".into(), serde_json::Value::Bool(true));
                self.write_line(&serde_json::Value::Object(obj));
            }
            Ok(_) => {}
            Err(e) => warn!("JsonLineTransport: encode failed: {}", e),
        }
    }
}
