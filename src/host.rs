//! Host glue
//!
//! Connects a test host to the reporter: resolves configuration once at
//! startup, reports configuration warnings and help, then feeds run-start,
//! per-test and run-complete notifications into the [`ReportingEngine`].
//!
//! A reporter must never abort the test run it is observing, so every
//! host-facing call goes through [`guard`], which turns errors and panics
//! into a framed report on the error sink.

use std::io::BufRead;
use std::panic::{self, AssertUnwindSafe};

use anyhow::{anyhow, Context, Result};
use tracing::error;

use crate::config::{render_help, resolve, RawSource, Resolution};
use crate::output::{OutputSink, Painter, Role, Theme};
use crate::report::{OutcomeEvent, ReportingEngine, RunTotals};

const FAULT_BANNER: &str = "=================== QUACKERS ERROR ======================";
const FAULT_FOOTER: &str = "==================== continue ================";

/// Run `operation`, reporting any error or panic to `err` instead of
/// propagating it. Returns `None` when the operation did not complete.
pub fn guard<T, E>(operation: &str, err: &mut E, f: impl FnOnce() -> Result<T>) -> Option<T>
where
    E: OutputSink + ?Sized,
{
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => Some(value),
        Ok(Err(e)) => {
            report_fault(operation, &e, err);
            None
        }
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            report_fault(operation, &anyhow!("panicked: {message}"), err);
            None
        }
    }
}

fn report_fault<E: OutputSink + ?Sized>(operation: &str, fault: &anyhow::Error, err: &mut E) {
    error!(operation, error = %format!("{fault:#}"), "reporter fault");
    err.write_line(FAULT_BANNER);
    err.write_line(&format!("Error running '{operation}': {fault:#}"));
    err.write_line(FAULT_FOOTER);
}

/// Write configuration warnings, and help when requested, to `err`
pub fn report_resolution<E: OutputSink + ?Sized>(
    resolution: &Resolution,
    painter: &Painter,
    err: &mut E,
) {
    for diagnostic in &resolution.diagnostics {
        err.write_line(&painter.paint(Role::Fail, &format!("WARNING: {diagnostic}")));
    }
    if resolution.help_requested {
        for line in render_help(&resolution.config) {
            err.write_line(&painter.paint(Role::Warn, &line));
        }
    }
}

/// Parse JSON-lines outcome events, skipping blank lines.
///
/// Each item is one line's result, so a malformed line does not stop the
/// lines after it.
pub fn read_events<R: BufRead>(reader: R) -> impl Iterator<Item = Result<OutcomeEvent>> {
    reader
        .lines()
        .enumerate()
        .filter_map(|(index, line)| {
            let number = index + 1;
            let line = match line.with_context(|| format!("Failed to read event line {number}")) {
                Ok(line) => line,
                Err(e) => return Some(Err(e)),
            };
            if line.trim().is_empty() {
                return None;
            }
            Some(
                serde_json::from_str(&line)
                    .with_context(|| format!("Failed to parse event on line {number}")),
            )
        })
}

/// A configured reporter attached to one host
pub struct Session<S> {
    engine: ReportingEngine<S>,
    debug: bool,
}

impl<S: OutputSink> Session<S> {
    /// Resolve configuration from both sources, report problems to `err`
    /// and build the engine writing to `out`.
    pub fn start<E: OutputSink + ?Sized>(
        env: &RawSource,
        params: &RawSource,
        out: S,
        err: &mut E,
    ) -> Self {
        let resolution = resolve(env, params);
        let painter = Painter::new(
            Theme::from_name(resolution.config.theme.as_deref().unwrap_or_default()),
            !resolution.config.no_color,
        );
        report_resolution(&resolution, &painter, err);

        Self {
            debug: resolution.debug,
            engine: ReportingEngine::with_painter(resolution.config, painter, out),
        }
    }

    /// The engine this session drives
    pub const fn engine(&self) -> &ReportingEngine<S> {
        &self.engine
    }

    /// Whether the reserved debug key was set
    pub const fn debug(&self) -> bool {
        self.debug
    }

    /// Host notification: a run is starting
    pub fn run_started(&self) {
        self.engine.reset();
    }

    /// Host notification: one test finished
    pub fn test_result(&self, event: &OutcomeEvent) {
        self.engine.record(event);
    }

    /// Host notification: the run is over
    pub fn run_complete(&self) {
        self.engine.show_summary();
    }

    /// Drive a complete run from a JSON-lines event stream.
    ///
    /// Malformed lines are reported to `err` and skipped.
    pub fn replay<R, E>(&self, reader: R, err: &mut E) -> RunTotals
    where
        R: BufRead,
        E: OutputSink + ?Sized,
    {
        guard("TestRunStart", err, || {
            self.run_started();
            Ok(())
        });
        let mut events = read_events(reader);
        loop {
            let step = guard("TestResult", err, || match events.next() {
                Some(item) => {
                    self.test_result(&item?);
                    Ok(true)
                }
                None => Ok(false),
            });
            if step == Some(false) {
                break;
            }
        }
        guard("TestRunComplete", err, || {
            self.run_complete();
            Ok(())
        });
        self.engine.totals()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::MemorySink;

    fn env(pairs: &[(&str, &str)]) -> RawSource {
        RawSource::environment(pairs.iter().copied())
    }

    fn params(pairs: &[(&str, &str)]) -> RawSource {
        RawSource::parameters(pairs.iter().copied())
    }

    #[test]
    fn test_guard_passes_value_through() {
        let mut err = MemorySink::new();
        assert_eq!(guard("op", &mut err, || Ok(7)), Some(7));
        assert!(err.lines().is_empty());
    }

    #[test]
    fn test_guard_reports_error() {
        let mut err = MemorySink::new();
        let result: Option<()> = guard("Initialize", &mut err, || {
            Err(anyhow!("inner")).context("outer")
        });
        assert!(result.is_none());
        let lines = err.lines();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], FAULT_BANNER);
        assert_eq!(lines[1], "Error running 'Initialize': outer: inner");
        assert_eq!(lines[2], FAULT_FOOTER);
    }

    #[test]
    fn test_guard_catches_panic() {
        let mut err = MemorySink::new();
        let result: Option<()> = guard("TestResult", &mut err, || panic!("kaboom"));
        assert!(result.is_none());
        assert!(err.lines()[1].contains("panicked: kaboom"));
    }

    #[test]
    fn test_read_events_skips_blank_lines_and_reports_bad_ones() {
        let input = "{\"test_name\":\"a\",\"outcome\":\"pass\",\"duration_ms\":5}\n\n\
                     not json\n\
                     {\"test_name\":\"b\",\"outcome\":\"fail\"}\n";
        let items: Vec<_> = read_events(input.as_bytes()).collect();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].as_ref().unwrap().test_name, "a");
        let bad = items[1].as_ref().unwrap_err();
        assert!(bad.to_string().contains("line 3"));
        assert_eq!(items[2].as_ref().unwrap().test_name, "b");
    }

    #[test]
    fn test_session_reports_unknown_key_and_help() {
        let mut err = MemorySink::new();
        let session = Session::start(
            &env(&[]),
            &params(&[("NoColor", "yes"), ("fooo", "bar")]),
            MemorySink::new(),
            &mut err,
        );
        let lines = err.lines();
        assert_eq!(lines[0], "WARNING: Unrecognised quackers parameter: fooo=bar");
        assert_eq!(lines[1], "Quackers configuration help:");
        assert!(lines
            .iter()
            .any(|l| l == "QUACKERS_NO_COLOR : disable colored output (also set by NO_COLOR) (true)"));
        assert!(!session.debug());
    }

    #[test]
    fn test_session_quiet_when_configuration_clean() {
        let mut err = MemorySink::new();
        let _session = Session::start(
            &env(&[("QUACKERS_NO_COLOR", "1")]),
            &params(&[("ShowTotals", "true")]),
            MemorySink::new(),
            &mut err,
        );
        assert!(err.lines().is_empty());
    }

    #[test]
    fn test_replay_runs_a_whole_session() {
        let out = MemorySink::new();
        let mut err = MemorySink::new();
        let session = Session::start(
            &env(&[("NO_COLOR", "1")]),
            &params(&[("debug", "yes"), ("FailureStartMarker", "::failures::")]),
            out.clone(),
            &mut err,
        );
        assert!(session.debug());

        let input = "{\"test_name\":\"a\",\"outcome\":\"pass\",\"duration_ms\":5}\n\
                     {\"test_name\":\"b\",\"outcome\":\"fail\",\"error_message\":\"x\"}\n\
                     garbage\n";
        let totals = session.replay(input.as_bytes(), &mut err);

        assert_eq!(totals.passed, 1);
        assert_eq!(totals.failed, 1);
        assert!(out.lines().contains(&"::failures::".to_string()));
        assert!(out.lines().contains(&"  x".to_string()));
        assert!(err.contents().contains("Failed to parse event on line 3"));
    }

    #[test]
    fn test_replay_survives_out_of_range_duration() {
        let out = MemorySink::new();
        let mut err = MemorySink::new();
        let session = Session::start(
            &env(&[]),
            &params(&[("NoColor", "true")]),
            out.clone(),
            &mut err,
        );

        let input = "{\"test_name\":\"a\",\"outcome\":\"pass\",\"duration_ms\":1e30}\n\
                     {\"test_name\":\"b\",\"outcome\":\"pass\",\"duration_ms\":5}\n";
        let totals = session.replay(input.as_bytes(), &mut err);

        assert_eq!(totals.passed, 1);
        assert_eq!(out.lines()[0], "✅ b [5 ms]");
        assert!(err.lines().contains(&FAULT_BANNER.to_string()));
        assert!(err.contents().contains("Failed to parse event on line 1"));
    }
}
