//! Line-oriented report sinks.
//!
//! The engine emits one summary line per generation through a
//! [`ReportSink`]. The engine never depends on what the sink does with the
//! text; the no-op [`NullSink`] is always safe.

use std::io::Write;

/// An abstract sink accepting line-oriented text.
pub trait ReportSink {
    /// Accepts one line of report text (without a trailing newline).
    fn line(&mut self, text: &str);
}

/// Discards all report lines.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ReportSink for NullSink {
    fn line(&mut self, _text: &str) {}
}

/// Collects report lines in memory, mainly for tests and post-run display.
#[derive(Debug, Default, Clone)]
pub struct BufferSink {
    lines: Vec<String>,
}

impl BufferSink {
    /// Creates an empty buffer sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// The lines received so far, in order.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

impl ReportSink for BufferSink {
    fn line(&mut self, text: &str) {
        self.lines.push(text.to_owned());
    }
}

/// Writes each report line, newline-terminated, to an [`io::Write`](Write).
///
/// Write errors are swallowed: reporting is best-effort and must never
/// disturb the run.
#[derive(Debug)]
pub struct WriterSink<W: Write> {
    writer: W,
}

impl<W: Write> WriterSink<W> {
    /// Wraps a writer.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Consumes the sink and returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ReportSink for WriterSink<W> {
    fn line(&mut self, text: &str) {
        let _ = writeln!(self.writer, "{text}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_sink_is_safe() {
        let mut sink = NullSink;
        sink.line("generation=1 best=0.5 age=0");
    }

    #[test]
    fn test_buffer_sink_collects_in_order() {
        let mut sink = BufferSink::new();
        sink.line("first");
        sink.line("second");
        assert_eq!(sink.lines(), &["first".to_owned(), "second".to_owned()]);
    }

    #[test]
    fn test_writer_sink_appends_newlines() {
        let mut sink = WriterSink::new(Vec::new());
        sink.line("a");
        sink.line("b");
        let out = sink.into_inner();
        assert_eq!(String::from_utf8(out).unwrap(), "a\nb\n");
    }
}
