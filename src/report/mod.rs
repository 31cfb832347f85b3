//! Test run reporting
//!
//! Outcome events, the text formats used for durations and timestamps, and
//! the engine that renders per-test lines and the end-of-run summary.

pub mod engine;
pub mod event;
pub mod format;

pub use engine::{ReportingEngine, RunTotals};
pub use event::{OutcomeEvent, OutcomeKind};
pub use format::{format_duration, format_timestamp, DEFAULT_TIMESTAMP_FORMAT};
