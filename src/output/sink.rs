//! Line-oriented output
//!
//! [`OutputSink`] is where finished lines go. [`LineWriter`] sits in front of
//! a sink and guarantees that every physical line carries the configured log
//! prefix, which is what lets external tools cut marker-framed sections out of
//! interleaved console output.

use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

/// Receives finished output lines, one at a time
pub trait OutputSink {
    /// Write one line. `line` never contains a newline.
    fn write_line(&mut self, line: &str);
}

impl<S: OutputSink + ?Sized> OutputSink for Box<S> {
    fn write_line(&mut self, line: &str) {
        (**self).write_line(line);
    }
}

/// Which standard stream a [`ConsoleSink`] writes to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    /// Standard output
    Stdout,
    /// Standard error
    Stderr,
}

/// Writes lines to stdout or stderr
#[derive(Debug, Clone, Copy)]
pub struct ConsoleSink {
    stream: Stream,
}

impl ConsoleSink {
    /// Sink writing to standard output
    #[must_use]
    pub const fn stdout() -> Self {
        Self {
            stream: Stream::Stdout,
        }
    }

    /// Sink writing to standard error
    #[must_use]
    pub const fn stderr() -> Self {
        Self {
            stream: Stream::Stderr,
        }
    }
}

impl OutputSink for ConsoleSink {
    fn write_line(&mut self, line: &str) {
        // A closed pipe must not take the test run down with it
        let _ = match self.stream {
            Stream::Stdout => writeln!(io::stdout().lock(), "{line}"),
            Stream::Stderr => writeln!(io::stderr().lock(), "{line}"),
        };
    }
}

/// Collects lines in memory. Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    lines: Arc<Mutex<Vec<String>>>,
}

impl MemorySink {
    /// An empty sink
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every line written so far
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Everything written so far, newline-joined
    #[must_use]
    pub fn contents(&self) -> String {
        self.lines().join("\n")
    }

    /// Drop everything written so far
    pub fn clear(&self) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl OutputSink for MemorySink {
    fn write_line(&mut self, line: &str) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line.to_string());
    }
}

/// Splits text into physical lines and prefixes each one
#[derive(Debug)]
pub struct LineWriter<S> {
    sink: S,
    prefix: String,
}

impl<S: OutputSink> LineWriter<S> {
    /// Wrap `sink`, prefixing every line with `prefix`
    pub fn new(sink: S, prefix: impl Into<String>) -> Self {
        Self {
            sink,
            prefix: prefix.into(),
        }
    }

    /// The configured line prefix
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Write `text`, which may span several lines.
    ///
    /// Each `\n`-separated fragment loses any trailing `\r` and is written as
    /// its own prefixed line.
    pub fn emit(&mut self, text: &str) {
        for part in text.split('\n') {
            let part = part.trim_end_matches('\r');
            let line = format!("{}{part}", self.prefix);
            self.sink.write_line(&line);
        }
    }

    /// Write each line of `body` with `indent` in front of it.
    ///
    /// An empty body writes nothing.
    pub fn emit_indented(&mut self, body: &str, indent: &str, mut paint: impl FnMut(&str) -> String) {
        if body.is_empty() {
            return;
        }
        for part in body.split('\n') {
            let part = part.trim_end_matches('\r');
            let text = paint(&format!("{indent}{part}"));
            self.emit(&text);
        }
    }

    /// Write an empty (prefix-only) line
    pub fn blank(&mut self) {
        self.emit("");
    }

    /// Borrow the underlying sink
    pub const fn sink(&self) -> &S {
        &self.sink
    }

    /// Unwrap, returning the sink
    pub fn into_inner(self) -> S {
        self.sink
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sink_shares_buffer_between_clones() {
        let sink = MemorySink::new();
        let mut writer = sink.clone();
        writer.write_line("one");
        writer.write_line("two");
        assert_eq!(sink.lines(), vec!["one", "two"]);
        assert_eq!(sink.contents(), "one\ntwo");
        sink.clear();
        assert!(sink.lines().is_empty());
    }

    #[test]
    fn test_emit_prefixes_every_line() {
        let sink = MemorySink::new();
        let mut writer = LineWriter::new(sink.clone(), "[q] ");
        writer.emit("first\r\nsecond\nthird");
        assert_eq!(sink.lines(), vec!["[q] first", "[q] second", "[q] third"]);
    }

    #[test]
    fn test_emit_without_prefix() {
        let sink = MemorySink::new();
        let mut writer = LineWriter::new(sink.clone(), "");
        writer.emit("plain");
        assert_eq!(sink.lines(), vec!["plain"]);
    }

    #[test]
    fn test_emit_keeps_leading_whitespace() {
        let sink = MemorySink::new();
        let mut writer = LineWriter::new(sink.clone(), ">");
        writer.emit("  indented  ");
        assert_eq!(sink.lines(), vec![">  indented  "]);
    }

    #[test]
    fn test_blank_line_still_prefixed() {
        let sink = MemorySink::new();
        let mut writer = LineWriter::new(sink.clone(), "##");
        writer.blank();
        assert_eq!(sink.lines(), vec!["##"]);
    }

    #[test]
    fn test_emit_indented_empty_body_writes_nothing() {
        let sink = MemorySink::new();
        let mut writer = LineWriter::new(sink.clone(), "> ");
        writer.emit_indented("", "    ", str::to_string);
        assert!(sink.lines().is_empty());
    }

    #[test]
    fn test_emit_indented_splits_and_indents() {
        let sink = MemorySink::new();
        let mut writer = LineWriter::new(sink.clone(), "> ");
        writer.emit_indented("at a()\r\nat b()", "  ", str::to_string);
        assert_eq!(sink.lines(), vec![">   at a()", ">   at b()"]);
    }

    #[test]
    fn test_boxed_sink() {
        let sink = MemorySink::new();
        let mut boxed: Box<dyn OutputSink> = Box::new(sink.clone());
        boxed.write_line("x");
        assert_eq!(sink.lines(), vec!["x"]);
    }
}
