use std::{error::Error, sync::Arc};

use call_harness_common::LogLevel;
use tracing::{Level, event};

use crate::{LogCollector, LogEntry, LogRecord, LogSnapshot};

/// Logging sink capability handed to subjects under test.
///
/// Messages arrive already formatted; loggers never parse templates.
pub trait Logger: Send + Sync {
    fn log(&self, level: LogLevel, message: &str, error: Option<&(dyn Error + 'static)>);

    fn trace(&self, message: &str) {
        self.log(LogLevel::Trace, message, None);
    }

    fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message, None);
    }

    fn info(&self, message: &str) {
        self.log(LogLevel::Information, message, None);
    }

    fn warn(&self, message: &str) {
        self.log(LogLevel::Warning, message, None);
    }

    fn error(&self, message: &str, error: Option<&(dyn Error + 'static)>) {
        self.log(LogLevel::Error, message, error);
    }

    fn critical(&self, message: &str, error: Option<&(dyn Error + 'static)>) {
        self.log(LogLevel::Critical, message, error);
    }
}

impl<L: Logger + ?Sized> Logger for Arc<L> {
    fn log(&self, level: LogLevel, message: &str, error: Option<&(dyn Error + 'static)>) {
        (**self).log(level, message, error);
    }
}

impl<L: Logger + ?Sized> Logger for &L {
    fn log(&self, level: LogLevel, message: &str, error: Option<&(dyn Error + 'static)>) {
        (**self).log(level, message, error);
    }
}

/// In-memory logger for one category, writing into a (possibly shared) [`LogCollector`].
#[derive(Clone, Debug)]
pub struct FakeLogger {
    category: String,
    collector: LogCollector,
}

impl FakeLogger {
    pub fn new(category: impl Into<String>) -> Self {
        Self::with_collector(category, LogCollector::new())
    }

    pub fn with_collector(category: impl Into<String>, collector: LogCollector) -> Self {
        Self {
            category: category.into(),
            collector,
        }
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn collector(&self) -> &LogCollector {
        &self.collector
    }

    pub fn snapshot(&self) -> LogSnapshot {
        self.collector.snapshot()
    }

    pub fn latest(&self) -> Option<LogRecord> {
        self.collector.latest()
    }
}

impl Logger for FakeLogger {
    fn log(&self, level: LogLevel, message: &str, error: Option<&(dyn Error + 'static)>) {
        let entry = LogEntry::new(level, message).with_category(self.category.as_str());
        let entry = match error {
            Some(error) => entry.with_error(error),
            None => entry,
        };
        self.collector.emit_record(entry);
    }
}

/// Production logger forwarding to `tracing`, with the category as a `category` field.
#[derive(Clone, Debug)]
pub struct TracingLogger {
    category: String,
}

impl TracingLogger {
    pub fn new(category: impl Into<String>) -> Self {
        Self {
            category: category.into(),
        }
    }
}

macro_rules! forward_event {
    ($level:expr, $category:expr, $message:expr, $error:expr) => {
        match $error {
            Some(error) => event!($level, category = $category, error, "{}", $message),
            None => event!($level, category = $category, "{}", $message),
        }
    };
}

impl Logger for TracingLogger {
    fn log(&self, level: LogLevel, message: &str, error: Option<&(dyn Error + 'static)>) {
        let category = self.category.as_str();
        match level {
            LogLevel::Trace => forward_event!(Level::TRACE, category, message, error),
            LogLevel::Debug => forward_event!(Level::DEBUG, category, message, error),
            LogLevel::Information => forward_event!(Level::INFO, category, message, error),
            LogLevel::Warning => forward_event!(Level::WARN, category, message, error),
            LogLevel::Error | LogLevel::Critical => {
                forward_event!(Level::ERROR, category, message, error)
            }
        }
    }
}
