//! Console output
//!
//! Line sinks, the prefixing line writer, and role-based coloring.

pub mod sink;
pub mod theme;

pub use sink::{ConsoleSink, LineWriter, MemorySink, OutputSink, Stream};
pub use theme::{Painter, Role, Theme};
