//! Quackers - console test run reporter
//!
//! Quackers prints one line per finished test, then a summary of slow tests,
//! failures and totals. Every line can carry a prefix and every section can be
//! framed by marker lines, so tools reading interleaved console output can cut
//! the report back out. Behavior is configured from `QUACKERS_*` environment
//! variables and host parameters.

// Allow multiple crate versions from dependencies (can't easily control)
#![allow(clippy::multiple_crate_versions)]

pub mod config;
pub mod host;
pub mod output;
pub mod report;
pub mod telemetry;

// Re-export commonly used types
pub use config::{describe, render_help, resolve, RawSource, ReporterConfig, Resolution};
pub use host::{guard, read_events, Session};
pub use output::{ConsoleSink, MemorySink, OutputSink, Painter, Role, Theme};
pub use report::{OutcomeEvent, OutcomeKind, ReportingEngine, RunTotals};
