//! Process-level plumbing shared by estate binaries.

pub mod telemetry;

pub use telemetry::{init_telemetry, LogFormat, TelemetryError, DEFAULT_FILTER};
