//! Console logger implementation

use super::traits::Logger;

/// A logger that writes info lines to stdout and everything else to stderr
///
/// Debug lines are only printed when the logger was built with
/// [`ConsoleLogger::verbose`], which the CLI maps to `--verbose`.
#[derive(Debug, Clone)]
pub struct ConsoleLogger {
    prefix: String,
    show_debug: bool,
}

impl Default for ConsoleLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleLogger {
    /// Create a console logger with the `[Panel]` prefix
    pub fn new() -> Self {
        Self {
            prefix: "[Panel]".to_string(),
            show_debug: false,
        }
    }

    /// Create a console logger with a custom prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            show_debug: false,
        }
    }

    /// Also print debug lines
    pub fn verbose(mut self, show_debug: bool) -> Self {
        self.show_debug = show_debug;
        self
    }
}

impl Logger for ConsoleLogger {
    fn debug(&self, message: &str) {
        if self.show_debug {
            eprintln!("{} DEBUG: {}", self.prefix, message);
        }
    }

    fn info(&self, message: &str) {
        println!("{} INFO: {}", self.prefix, message);
    }

    fn warn(&self, message: &str) {
        eprintln!("{} WARN: {}", self.prefix, message);
    }

    fn error(&self, message: &str) {
        eprintln!("{} ERROR: {}", self.prefix, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_logger_creation() {
        let logger = ConsoleLogger::new();
        assert_eq!(logger.prefix, "[Panel]");
        assert!(!logger.show_debug);

        let custom = ConsoleLogger::with_prefix("[panel-cli]").verbose(true);
        assert_eq!(custom.prefix, "[panel-cli]");
        assert!(custom.show_debug);
    }
}
