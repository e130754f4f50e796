//! Sinks for the per-column report blocks a check emits.

use super::outcome::TestResult;

/// Receives one formatted block per tested column.
pub trait CheckLogger: Send + Sync {
    /// Receives a block.
    fn log(&self, message: &str);

    /// Receives a block together with the result it reports.
    ///
    /// Sinks that grade messages override this; the text is never inspected.
    fn log_outcome(&self, message: &str, _result: TestResult) {
        self.log(message);
    }
}

/// Discards every message.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLogger;

impl CheckLogger for NoopLogger {
    fn log(&self, _message: &str) {}
}

/// Forwards blocks to `tracing`: failures at WARN, everything else at INFO.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl TracingLogger {
    fn level_for(result: TestResult) -> tracing::Level {
        if result.is_fail() {
            tracing::Level::WARN
        } else {
            tracing::Level::INFO
        }
    }
}

impl CheckLogger for TracingLogger {
    fn log(&self, message: &str) {
        tracing::info!("\n{}", message);
    }

    fn log_outcome(&self, message: &str, result: TestResult) {
        if Self::level_for(result) == tracing::Level::WARN {
            tracing::warn!("\n{}", message);
        } else {
            tracing::info!("\n{}", message);
        }
    }
}

impl<F> CheckLogger for F
where
    F: Fn(&str) + Send + Sync,
{
    fn log(&self, message: &str) {
        self(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_closure_logger_captures_messages() {
        let messages = Mutex::new(Vec::new());
        let logger = |message: &str| messages.lock().unwrap().push(message.to_string());

        logger.log("first");
        CheckLogger::log(&logger, "second");

        assert_eq!(*messages.lock().unwrap(), ["first", "second"]);
    }

    #[test]
    fn test_noop_logger_is_silent() {
        NoopLogger.log("ignored");
        NoopLogger.log_outcome("ignored", TestResult::Fail);
    }

    #[test]
    fn test_closure_logger_receives_outcome_blocks() {
        let messages = Mutex::new(Vec::new());
        let logger = |message: &str| messages.lock().unwrap().push(message.to_string());

        logger.log_outcome("block", TestResult::Pass);
        assert_eq!(*messages.lock().unwrap(), ["block"]);
    }

    #[test]
    fn test_tracing_level_follows_result_not_text() {
        assert_eq!(TracingLogger::level_for(TestResult::Fail), tracing::Level::WARN);
        assert_eq!(TracingLogger::level_for(TestResult::Pass), tracing::Level::INFO);
    }
}
