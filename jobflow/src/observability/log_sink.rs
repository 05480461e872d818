//! Injectable sinks for debug log lines.

use parking_lot::Mutex;
use tracing::debug;

/// Receives debug log lines from a pipeline.
#[cfg_attr(test, mockall::automock)]
pub trait LogSink: Send + Sync {
    /// Writes one line.
    fn log(&self, message: &str);
}

/// Prints each line to standard output. The default sink.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutLogSink;

impl LogSink for StdoutLogSink {
    fn log(&self, message: &str) {
        println!("{message}");
    }
}

/// Forwards each line to `tracing` at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogSink;

impl LogSink for TracingLogSink {
    fn log(&self, message: &str) {
        debug!(target: "jobflow::debug", "{}", message);
    }
}

/// Keeps lines in memory.
#[derive(Debug, Default)]
pub struct MemoryLogSink {
    lines: Mutex<Vec<String>>,
}

impl MemoryLogSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the captured lines.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    /// Returns true if any captured line contains `needle`.
    #[must_use]
    pub fn contains(&self, needle: &str) -> bool {
        self.lines.lock().iter().any(|l| l.contains(needle))
    }
}

impl LogSink for MemoryLogSink {
    fn log(&self, message: &str) {
        self.lines.lock().push(message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sink_captures_lines() {
        let sink = MemoryLogSink::new();
        sink.log("first");
        sink.log("second line");

        assert_eq!(sink.lines(), vec!["first", "second line"]);
        assert!(sink.contains("second"));
        assert!(!sink.contains("third"));
    }

    #[test]
    fn test_stdout_and_tracing_sinks() {
        StdoutLogSink.log("hello");
        TracingLogSink.log("hello");
    }
}
