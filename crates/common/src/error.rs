use std::{error::Error, fmt, sync::Arc};

use serde_json::Value;
use thiserror::Error;

use crate::Times;

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("Unexpected call: {operation}({})", format_arguments(.arguments))]
    UnexpectedCall {
        operation: String,
        arguments: Vec<Value>,
    },
    #[error(
        "Unsatisfied expectation: {operation}({matcher}) expected {expected}, was called {actual} time(s)"
    )]
    UnsatisfiedExpectation {
        operation: String,
        matcher: String,
        expected: Times,
        actual: usize,
    },
    #[error(
        "Ambiguous expectation for {operation}: ({registered}) overlaps earlier ({existing}) and loses every shared call"
    )]
    DuplicateAmbiguousExpectation {
        operation: String,
        existing: String,
        registered: String,
    },
    #[error("{0}")]
    Raised(MockFailure),
    #[error("Failed to encode value for {operation}: {source}")]
    Encoding {
        operation: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to decode return value of {operation}: {source}")]
    Decoding {
        operation: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("{} verification failures:\n{}", .0.len(), format_failures(.0))]
    Verification(Vec<HarnessError>),
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl HarnessError {
    /// Folds the failures of one verification pass into a single result.
    pub fn collect(mut failures: Vec<HarnessError>) -> Result<(), HarnessError> {
        match failures.len() {
            0 => Ok(()),
            1 => Err(failures.remove(0)),
            _ => Err(HarnessError::Verification(failures)),
        }
    }

    /// Flattens nested verification failures.
    pub fn failures(&self) -> Vec<&HarnessError> {
        match self {
            HarnessError::Verification(inner) => inner.iter().flat_map(|e| e.failures()).collect(),
            other => vec![other],
        }
    }
}

fn format_arguments(arguments: &[Value]) -> String {
    arguments
        .iter()
        .map(|a| a.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn format_failures(failures: &[HarnessError]) -> String {
    failures
        .iter()
        .map(|f| format!("  - {f}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// An error configured on an expectation, handed back to the caller each time the
/// expectation fires.
#[derive(Clone)]
pub struct MockFailure(Arc<dyn Error + Send + Sync + 'static>);

impl MockFailure {
    pub fn new<E>(error: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        Self(Arc::new(error))
    }

    pub fn msg(message: impl Into<String>) -> Self {
        Self::new(MessageError(message.into()))
    }
}

impl fmt::Debug for MockFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for MockFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl Error for MockFailure {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.0.source()
    }
}

#[derive(Debug, Error)]
#[error("{0}")]
struct MessageError(String);
