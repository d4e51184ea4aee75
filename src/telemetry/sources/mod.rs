//! Source-specific telemetry normalizers. Each producer speaks its own raw
//! event vocabulary; each `parse` function here translates one producer's
//! payload shape into the internal [`TelemetryEvent`](super::event::TelemetryEvent)
//! vocabulary the signal processor understands. See spec.md §6.1.

pub mod browser;
pub mod desktop;
pub mod ide;
pub mod lms;
