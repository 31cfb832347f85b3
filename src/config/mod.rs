//! Reporter configuration
//!
//! The option catalog, the raw sources options are read from, and the
//! resolver that turns both into a typed [`ReporterConfig`].

pub mod options;
pub mod resolver;
pub mod source;

pub use options::{describe, OptionDescriptor, OptionKind, OptionValue, ReporterConfig};
pub use resolver::{debug_requested, render_help, resolve, Diagnostic, DiagnosticKind, Resolution, Severity};
pub use source::{RawSource, SourceKind};
