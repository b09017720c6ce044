use std::{collections::BTreeMap, error::Error, fmt::Display};

use call_harness_common::LogLevel;
use chrono::{DateTime, Utc};

/// One captured log emission. Records are never modified after they are appended.
#[derive(Clone, Debug, PartialEq)]
pub struct LogRecord {
    pub sequence: u64,
    pub level: LogLevel,
    pub message: String,
    pub error: Option<ErrorDetail>,
    pub category: Option<String>,
    pub fields: BTreeMap<String, String>,
    pub timestamp: DateTime<Utc>,
}

impl LogRecord {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }
}

impl Display for LogRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{} [{}]", self.sequence, self.level)?;
        if let Some(category) = &self.category {
            write!(f, " {category}:")?;
        }
        write!(f, " {}", self.message)?;
        if let Some(error) = &self.error {
            write!(f, " ({error})")?;
        }
        Ok(())
    }
}

/// Error captured alongside a log record, flattened to text so records stay `Clone`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ErrorDetail {
    pub message: String,
    /// Messages of the `source()` chain, outermost first.
    pub chain: Vec<String>,
}

impl ErrorDetail {
    pub fn from_error(error: &(dyn Error + 'static)) -> Self {
        let mut chain = Vec::new();
        let mut source = error.source();
        while let Some(cause) = source {
            chain.push(cause.to_string());
            source = cause.source();
        }
        Self {
            message: error.to_string(),
            chain,
        }
    }

    pub fn from_message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            chain: Vec::new(),
        }
    }

    /// Whether the message or any cause contains `text`.
    pub fn contains(&self, text: &str) -> bool {
        self.message.contains(text) || self.chain.iter().any(|cause| cause.contains(text))
    }
}

impl Display for ErrorDetail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        for cause in &self.chain {
            write!(f, ": {cause}")?;
        }
        Ok(())
    }
}

/// A record before the collector assigns its sequence position and timestamp.
#[derive(Clone, Debug)]
pub struct LogEntry {
    pub(crate) level: LogLevel,
    pub(crate) message: String,
    pub(crate) error: Option<ErrorDetail>,
    pub(crate) category: Option<String>,
    pub(crate) fields: BTreeMap<String, String>,
}

impl LogEntry {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            error: None,
            category: None,
            fields: BTreeMap::new(),
        }
    }

    pub fn with_error(self, error: &(dyn Error + 'static)) -> Self {
        Self {
            error: Some(ErrorDetail::from_error(error)),
            ..self
        }
    }

    pub fn with_error_detail(self, error: Option<ErrorDetail>) -> Self {
        Self { error, ..self }
    }

    pub fn with_category(self, category: impl Into<String>) -> Self {
        Self {
            category: Some(category.into()),
            ..self
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Display) -> Self {
        self.fields.insert(name.into(), value.to_string());
        self
    }

    pub(crate) fn into_record(self, sequence: u64) -> LogRecord {
        LogRecord {
            sequence,
            level: self.level,
            message: self.message,
            error: self.error,
            category: self.category,
            fields: self.fields,
            timestamp: Utc::now(),
        }
    }
}
