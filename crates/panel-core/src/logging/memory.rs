//! In-memory logger that records every line

use parking_lot::Mutex;

use super::traits::Logger;

/// Severity of a recorded log line
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

/// A logger that keeps every message in memory
///
/// Useful for asserting that contained failures (catalog fallbacks,
/// auxiliary server errors) were reported rather than swallowed.
#[derive(Debug, Default)]
pub struct MemoryLogger {
    lines: Mutex<Vec<(LogLevel, String)>>,
}

impl MemoryLogger {
    /// Create an empty memory logger
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded lines, oldest first
    pub fn lines(&self) -> Vec<(LogLevel, String)> {
        self.lines.lock().clone()
    }

    /// Whether any line at `level` contains `needle`
    pub fn contains(&self, level: LogLevel, needle: &str) -> bool {
        self.lines
            .lock()
            .iter()
            .any(|(l, m)| *l == level && m.contains(needle))
    }

    /// Number of lines recorded at `level`
    pub fn count(&self, level: LogLevel) -> usize {
        self.lines.lock().iter().filter(|(l, _)| *l == level).count()
    }

    /// Drop all recorded lines
    pub fn clear(&self) {
        self.lines.lock().clear();
    }

    fn push(&self, level: LogLevel, message: &str) {
        self.lines.lock().push((level, message.to_string()));
    }
}

impl Logger for MemoryLogger {
    fn debug(&self, message: &str) {
        self.push(LogLevel::Debug, message);
    }

    fn info(&self, message: &str) {
        self.push(LogLevel::Info, message);
    }

    fn warn(&self, message: &str) {
        self.push(LogLevel::Warn, message);
    }

    fn error(&self, message: &str) {
        self.push(LogLevel::Error, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_logger_records_levels() {
        let logger = MemoryLogger::new();
        logger.info("starting");
        logger.warn("catalog unavailable");
        logger.error("clone failed");

        assert_eq!(logger.lines().len(), 3);
        assert!(logger.contains(LogLevel::Warn, "catalog"));
        assert!(!logger.contains(LogLevel::Info, "catalog"));
        assert_eq!(logger.count(LogLevel::Error), 1);

        logger.clear();
        assert!(logger.lines().is_empty());
    }

    #[test]
    fn test_log_macros() {
        let logger = MemoryLogger::new();
        crate::log_warn!(logger, "[Test] {} of {}", 1, 2);
        assert!(logger.contains(LogLevel::Warn, "[Test] 1 of 2"));
    }
}
