use std::{fmt, sync::Arc};

use call_harness_common::MockFailure;
use serde_json::Value;

type CallbackFn = Arc<dyn Fn(&[Value]) -> Result<Value, MockFailure> + Send + Sync>;

/// What a matched expectation does with the call.
#[derive(Clone)]
pub enum Outcome {
    Returns(Value),
    Fails(MockFailure),
    /// Runs with the actual arguments; used both for computed returns and side effects.
    Callback(CallbackFn),
}

impl Outcome {
    pub fn returns(value: impl Into<Value>) -> Self {
        Outcome::Returns(value.into())
    }

    pub fn fails(failure: MockFailure) -> Self {
        Outcome::Fails(failure)
    }

    pub fn callback<F>(callback: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, MockFailure> + Send + Sync + 'static,
    {
        Outcome::Callback(Arc::new(callback))
    }

    pub fn apply(&self, arguments: &[Value]) -> Result<Value, MockFailure> {
        match self {
            Outcome::Returns(value) => Ok(value.clone()),
            Outcome::Fails(failure) => Err(failure.clone()),
            Outcome::Callback(callback) => callback(arguments),
        }
    }
}

impl Default for Outcome {
    fn default() -> Self {
        Outcome::Returns(Value::Null)
    }
}

impl fmt::Debug for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Returns(value) => f.debug_tuple("Returns").field(value).finish(),
            Outcome::Fails(failure) => f.debug_tuple("Fails").field(failure).finish(),
            Outcome::Callback(_) => write!(f, "Callback(..)"),
        }
    }
}
