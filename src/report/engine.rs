//! Reporting engine
//!
//! [`ReportingEngine`] turns a stream of [`OutcomeEvent`]s into one immediate
//! line per test, and at the end of a run renders a summary of slow tests,
//! failures and totals framed by the configured markers.
//!
//! The engine is shared by reference between the threads delivering events.
//! Run state and the output writer live behind one mutex, so "update counters
//! and buffers" plus "write the line" happen as a single unit per event, and
//! a summary never sees buffers grow half way through.
//!
//! [`ReportingEngine::reset`] starts a run. [`ReportingEngine::show_summary`]
//! does not clear anything: events logged after a summary keep accumulating
//! until the next reset.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Local};
use tracing::debug;

use super::event::{OutcomeEvent, OutcomeKind};
use super::format::{
    format_duration, format_run_time, format_timestamp, DEFAULT_TIMESTAMP_FORMAT, SLOW_SUFFIX,
};
use crate::config::ReporterConfig;
use crate::output::{LineWriter, OutputSink, Painter, Role, Theme};

const STORED_FAILURE_INDENT: &str = "  ";
const INLINE_FAILURE_INDENT: &str = "    ";

/// Counters and buffers for one run
#[derive(Debug, Clone)]
struct RunState {
    passed: usize,
    failed: usize,
    skipped: usize,
    started_at: DateTime<Local>,
    failures: Vec<OutcomeEvent>,
    slow: Vec<OutcomeEvent>,
}

impl RunState {
    fn new(started_at: DateTime<Local>) -> Self {
        Self {
            passed: 0,
            failed: 0,
            skipped: 0,
            started_at,
            failures: Vec::new(),
            slow: Vec::new(),
        }
    }
}

/// Snapshot of the run counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunTotals {
    /// Passed tests
    pub passed: usize,
    /// Failed tests
    pub failed: usize,
    /// Skipped and not-found tests
    pub skipped: usize,
    /// Failures held for the summary
    pub failures_buffered: usize,
    /// Slow tests held for the summary
    pub slow_buffered: usize,
}

impl RunTotals {
    /// Passed + failed + skipped
    #[must_use]
    pub const fn total(&self) -> usize {
        self.passed + self.failed + self.skipped
    }
}

struct Inner<S> {
    state: RunState,
    out: LineWriter<S>,
}

/// Stateful test reporter writing through an [`OutputSink`]
pub struct ReportingEngine<S> {
    config: ReporterConfig,
    painter: Painter,
    inner: Mutex<Inner<S>>,
}

impl<S: OutputSink> ReportingEngine<S> {
    /// Build an engine from resolved configuration.
    ///
    /// Coloring follows `Theme` and `NoColor`. Call [`Self::reset`] before
    /// the first event of a run.
    pub fn new(config: ReporterConfig, sink: S) -> Self {
        let theme = Theme::from_name(config.theme.as_deref().unwrap_or_default());
        let painter = Painter::new(theme, !config.no_color);
        Self::with_painter(config, painter, sink)
    }

    /// Build an engine with an explicit painter
    pub fn with_painter(config: ReporterConfig, painter: Painter, sink: S) -> Self {
        let prefix = config.log_prefix.clone().unwrap_or_default();
        Self {
            painter,
            inner: Mutex::new(Inner {
                state: RunState::new(Local::now()),
                out: LineWriter::new(sink, prefix),
            }),
            config,
        }
    }

    /// The configuration this engine was built with
    pub const fn config(&self) -> &ReporterConfig {
        &self.config
    }

    /// The painter in use
    pub const fn painter(&self) -> &Painter {
        &self.painter
    }

    fn lock(&self) -> MutexGuard<'_, Inner<S>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start a run: zero the counters, drop buffered events, note the time.
    pub fn reset(&self) {
        let mut inner = self.lock();
        inner.state = RunState::new(Local::now());
        debug!(config = ?self.config, "run reset");
    }

    /// Route an event to the logging call for its outcome
    pub fn record(&self, event: &OutcomeEvent) {
        match event.kind {
            OutcomeKind::Pass => self.log_pass(event),
            OutcomeKind::Fail => self.log_fail(event),
            OutcomeKind::Skip => self.log_skipped(event),
            OutcomeKind::None => self.log_none(event),
            OutcomeKind::NotFound => self.log_not_found(event),
        }
    }

    // Each log call stamps and writes its line while holding the lock, so
    // output order always agrees with the printed timestamps.

    /// Count a pass and print its line
    pub fn log_pass(&self, event: &OutcomeEvent) {
        let slow = self.is_slow(event.duration);
        let mut inner = self.lock();
        let line = format!(
            "{} [{}]",
            self.head(self.config.pass_label.as_deref(), event, Role::Pass),
            self.duration_text(event.duration, slow)
        );
        inner.state.passed += 1;
        if slow {
            inner.state.slow.push(event.clone());
        }
        inner.out.emit(&line);
        debug!(test = %event.test_name, slow, "pass");
    }

    /// Count a failure, buffer it for the summary and print its line
    pub fn log_fail(&self, event: &OutcomeEvent) {
        let slow = self.is_slow(event.duration);
        let mut inner = self.lock();
        let line = format!(
            "{} [{}]",
            self.head(self.config.fail_label.as_deref(), event, Role::Fail),
            self.duration_text(event.duration, slow)
        );
        inner.state.failed += 1;
        inner.state.failures.push(event.clone());
        if slow {
            inner.state.slow.push(event.clone());
        }
        inner.out.emit(&line);
        if self.config.output_failures_inline {
            self.emit_failure_body(&mut inner.out, event, INLINE_FAILURE_INDENT);
        }
        debug!(test = %event.test_name, slow, "fail");
    }

    /// Count a skip and print its line with the reason, if any
    pub fn log_skipped(&self, event: &OutcomeEvent) {
        let mut inner = self.lock();
        let line = self.disabled_line(self.config.skip_label.as_deref(), event);
        inner.state.skipped += 1;
        inner.out.emit(&line);
    }

    /// Print a line for a test with no outcome. No counter changes.
    pub fn log_none(&self, event: &OutcomeEvent) {
        let mut inner = self.lock();
        let line = self.disabled_line(self.config.none_label.as_deref(), event);
        inner.out.emit(&line);
    }

    /// Count a not-found test as skipped and print its line
    pub fn log_not_found(&self, event: &OutcomeEvent) {
        let mut inner = self.lock();
        let line = self.head(self.config.not_found_label.as_deref(), event, Role::Error);
        inner.state.skipped += 1;
        inner.out.emit(&line);
    }

    /// Render the summary.
    ///
    /// Order: summary start marker, slow tests (when highlighting is on),
    /// failures (when there are any), totals (when enabled), summary
    /// complete marker. Buffers are left as they were.
    pub fn show_summary(&self) {
        let mut guard = self.lock();
        let Inner { state, out } = &mut *guard;
        let config = &self.config;

        emit_marker(out, config.summary_start_marker.as_deref());

        if config.highlight_slow_tests {
            self.emit_slow_section(out, state);
        }

        if !state.failures.is_empty() {
            self.emit_failure_section(out, state);
        }

        if config.show_totals {
            Self::emit_totals(out, state, config);
        }

        emit_marker(out, config.summary_complete_marker.as_deref());
        debug!(
            passed = state.passed,
            failed = state.failed,
            skipped = state.skipped,
            "summary rendered"
        );
    }

    /// Current counters
    pub fn totals(&self) -> RunTotals {
        let inner = self.lock();
        RunTotals {
            passed: inner.state.passed,
            failed: inner.state.failed,
            skipped: inner.state.skipped,
            failures_buffered: inner.state.failures.len(),
            slow_buffered: inner.state.slow.len(),
        }
    }

    /// Buffered failures, in encounter order
    pub fn failures(&self) -> Vec<OutcomeEvent> {
        self.lock().state.failures.clone()
    }

    /// Buffered slow tests, in encounter order
    pub fn slow_tests(&self) -> Vec<OutcomeEvent> {
        self.lock().state.slow.clone()
    }

    /// When the current run started
    pub fn started_at(&self) -> DateTime<Local> {
        self.lock().state.started_at
    }

    fn is_slow(&self, duration: Duration) -> bool {
        if !self.config.highlight_slow_tests {
            return false;
        }
        let elapsed = i128::try_from(duration.as_millis()).unwrap_or(i128::MAX);
        elapsed >= i128::from(self.config.slow_test_threshold_ms)
    }

    fn test_name(&self, event: &OutcomeEvent) -> String {
        format!(
            "{}{}",
            self.config.test_name_prefix.as_deref().unwrap_or_default(),
            event.test_name
        )
    }

    /// `{label}[ {timestamp}] {name}`, painted for `role`
    fn head(&self, label: Option<&str>, event: &OutcomeEvent, role: Role) -> String {
        let stamp = if self.config.show_timestamps {
            let pattern = self
                .config
                .timestamp_format
                .as_deref()
                .unwrap_or(DEFAULT_TIMESTAMP_FORMAT);
            format!(" {}", format_timestamp(&Local::now(), pattern))
        } else {
            String::new()
        };
        let text = format!(
            "{}{stamp} {}",
            label.unwrap_or_default(),
            self.test_name(event)
        );
        self.painter.paint(role, &text)
    }

    fn duration_text(&self, duration: Duration, slow: bool) -> String {
        let text = format_duration(duration);
        if slow {
            self.painter.paint(Role::Slow, &format!("{text}{SLOW_SUFFIX}"))
        } else {
            text
        }
    }

    fn disabled_line(&self, label: Option<&str>, event: &OutcomeEvent) -> String {
        let head = self.head(label, event, Role::Disabled);
        let reason = event.message();
        if reason.is_empty() {
            head
        } else {
            format!(
                "{head} [ {} ]",
                self.painter.paint(Role::DisabledReason, reason)
            )
        }
    }

    fn emit_failure_body(&self, out: &mut LineWriter<S>, event: &OutcomeEvent, indent: &str) {
        out.emit_indented(event.message(), indent, |l| self.painter.paint(Role::Error, l));
        out.emit_indented(event.trace(), indent, |l| {
            self.painter.paint(Role::StackTrace, l)
        });
    }

    fn emit_slow_section(&self, out: &mut LineWriter<S>, state: &RunState) {
        let config = &self.config;
        match config.slow_summary_start_marker.as_deref() {
            Some(marker) => out.emit(marker),
            None if !state.slow.is_empty() => out.emit(&self.painter.paint(Role::Warn, "Slow tests:")),
            None => {}
        }

        let limit = usize::try_from(config.max_slow_tests_to_display).unwrap_or(0);
        for (i, event) in state.slow.iter().take(limit).enumerate() {
            let index = index_text(config.slow_index_placeholder.as_deref(), i);
            let line = format!(
                "{index} {} ({})",
                self.test_name(event),
                format_duration(event.duration)
            );
            out.emit(&self.painter.paint(Role::Warn, &line));
        }

        emit_marker(out, config.slow_summary_complete_marker.as_deref());
    }

    fn emit_failure_section(&self, out: &mut LineWriter<S>, state: &RunState) {
        let config = &self.config;
        out.blank();
        match config.failure_start_marker.as_deref() {
            Some(marker) => out.emit(marker),
            None => out.emit(&self.painter.paint(Role::Fail, "Failures:")),
        }

        for (i, event) in state.failures.iter().enumerate() {
            out.blank();
            let index = index_text(config.failure_index_placeholder.as_deref(), i);
            let line = format!("{index} {}", self.test_name(event));
            out.emit(&self.painter.paint(Role::Fail, &line));
            self.emit_failure_body(out, event, STORED_FAILURE_INDENT);
        }

        emit_marker(out, config.failure_complete_marker.as_deref());
    }

    fn emit_totals(out: &mut LineWriter<S>, state: &RunState, config: &ReporterConfig) {
        let finished = Local::now();
        out.blank();
        match config.summary_totals_start_marker.as_deref() {
            Some(marker) => out.emit(marker),
            None => out.emit("Test results:"),
        }
        out.emit(&format!("  Passed:   {}", state.passed));
        out.emit(&format!("  Failed:   {}", state.failed));
        out.emit(&format!("  Skipped:  {}", state.skipped));
        out.emit(&format!(
            "  Total:    {}",
            state.passed + state.failed + state.skipped
        ));
        out.emit(&format!(
            "  Run time: {}",
            format_run_time(&state.started_at, &finished)
        ));
        out.emit(&format!(
            "  Started:  {}",
            format_timestamp(&state.started_at, DEFAULT_TIMESTAMP_FORMAT)
        ));
        out.emit(&format!(
            "  Finished: {}",
            format_timestamp(&finished, DEFAULT_TIMESTAMP_FORMAT)
        ));
        emit_marker(out, config.summary_totals_complete_marker.as_deref());
    }
}

fn emit_marker<S: OutputSink>(out: &mut LineWriter<S>, marker: Option<&str>) {
    if let Some(marker) = marker {
        out.emit(marker);
    }
}

/// `[n]` (1-based), or the placeholder when one is configured
fn index_text(placeholder: Option<&str>, zero_based: usize) -> String {
    placeholder.map_or_else(|| format!("[{}]", zero_based + 1), str::to_string)
}
