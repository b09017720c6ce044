use call_harness_common::{HarnessError, MockFailure, Times};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::{
    ArgumentMatcher, CallRecorder, ExpectationId, Matcher, Outcome, RecordedCall,
    encode_arguments,
};

type Result<T> = std::result::Result<T, HarnessError>;

/// One collaborator's capability surface, backed by a shared [`CallRecorder`].
///
/// Test doubles hold a `Surface` and forward each trait method through [`Surface::call`]
/// with the method name and its arguments as a tuple.
#[derive(Clone, Debug)]
pub struct Surface {
    recorder: CallRecorder,
    capability: String,
}

impl Surface {
    pub(crate) fn new(recorder: CallRecorder, capability: String) -> Self {
        Self {
            recorder,
            capability,
        }
    }

    pub fn capability(&self) -> &str {
        &self.capability
    }

    pub fn recorder(&self) -> &CallRecorder {
        &self.recorder
    }

    /// Operation identifier of `method` on this surface.
    pub fn operation(&self, method: &str) -> String {
        self.recorder.operation_name(&self.capability, method)
    }

    pub fn expect(&self, method: &str) -> ExpectationBuilder {
        ExpectationBuilder::new(self.recorder.clone(), self.operation(method))
    }

    pub fn invoke(&self, method: &str, arguments: Vec<Value>) -> Result<Value> {
        self.recorder.invoke(&self.operation(method), arguments)
    }

    /// Typed call for doubles whose return type decodes from the configured value.
    pub fn call<A, R>(&self, method: &str, args: A) -> Result<R>
    where
        A: Serialize,
        R: DeserializeOwned,
    {
        let operation = self.operation(method);
        let value = self.invoke_encoded(&operation, &args)?;
        serde_json::from_value(value).map_err(|source| HarnessError::Decoding { operation, source })
    }

    /// Like [`Surface::call`], but an empty value (a lenient miss or an explicit `null`)
    /// becomes `R::default()`.
    pub fn call_or_default<A, R>(&self, method: &str, args: A) -> Result<R>
    where
        A: Serialize,
        R: DeserializeOwned + Default,
    {
        let operation = self.operation(method);
        match self.invoke_encoded(&operation, &args)? {
            Value::Null => Ok(R::default()),
            value => serde_json::from_value(value)
                .map_err(|source| HarnessError::Decoding { operation, source }),
        }
    }

    fn invoke_encoded<A: Serialize>(&self, operation: &str, args: &A) -> Result<Value> {
        let arguments = encode_arguments(args).map_err(|source| HarnessError::Encoding {
            operation: operation.to_string(),
            source,
        })?;
        self.recorder.invoke(operation, arguments)
    }

    pub fn verify(&self, method: &str, matcher: impl Into<ArgumentMatcher>, times: Times) -> Result<()> {
        self.recorder
            .verify(&self.operation(method), &matcher.into(), times)
    }

    /// Calls recorded against this surface, in arrival order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        let prefix = self.operation("");
        self.recorder
            .calls()
            .into_iter()
            .filter(|call| call.operation.starts_with(&prefix))
            .collect()
    }

    pub fn calls_to(&self, method: &str) -> Vec<RecordedCall> {
        self.recorder.calls_to(&self.operation(method))
    }
}

/// Builds one expectation; nothing is registered until [`ExpectationBuilder::register`].
#[must_use = "expectations are only registered by calling `register`"]
pub struct ExpectationBuilder {
    recorder: CallRecorder,
    operation: String,
    matcher: ArgumentMatcher,
    outcome: Outcome,
    times: Times,
    encoding_error: Option<serde_json::Error>,
}

impl ExpectationBuilder {
    fn new(recorder: CallRecorder, operation: String) -> Self {
        Self {
            recorder,
            operation,
            matcher: ArgumentMatcher::default(),
            outcome: Outcome::default(),
            times: Times::default(),
            encoding_error: None,
        }
    }

    pub fn with(self, matchers: Vec<Matcher>) -> Self {
        Self {
            matcher: ArgumentMatcher::new(matchers),
            ..self
        }
    }

    /// Exact match on every element of the argument tuple.
    pub fn with_args<A: Serialize>(self, args: A) -> Self {
        match ArgumentMatcher::exact_args(&args) {
            Ok(matcher) => Self { matcher, ..self },
            Err(error) => self.encoding_failed(error),
        }
    }

    pub fn returns<T: Serialize>(self, value: T) -> Self {
        match serde_json::to_value(value) {
            Ok(value) => Self {
                outcome: Outcome::Returns(value),
                ..self
            },
            Err(error) => self.encoding_failed(error),
        }
    }

    /// Return value computed from the actual arguments.
    pub fn returns_with<F>(self, compute: F) -> Self
    where
        F: Fn(&[Value]) -> Value + Send + Sync + 'static,
    {
        Self {
            outcome: Outcome::callback(move |arguments| Ok(compute(arguments))),
            ..self
        }
    }

    pub fn fails(self, failure: MockFailure) -> Self {
        Self {
            outcome: Outcome::Fails(failure),
            ..self
        }
    }

    /// Side-effect callback; its result is handed back to the caller.
    pub fn calls<F>(self, callback: F) -> Self
    where
        F: Fn(&[Value]) -> std::result::Result<Value, MockFailure> + Send + Sync + 'static,
    {
        Self {
            outcome: Outcome::callback(callback),
            ..self
        }
    }

    pub fn times(self, times: Times) -> Self {
        Self { times, ..self }
    }

    pub fn register(self) -> Result<ExpectationId> {
        if let Some(source) = self.encoding_error {
            return Err(HarnessError::Encoding {
                operation: self.operation,
                source,
            });
        }
        self.recorder
            .register(self.operation, self.matcher, self.outcome, self.times)
    }

    fn encoding_failed(self, error: serde_json::Error) -> Self {
        Self {
            encoding_error: self.encoding_error.or(Some(error)),
            ..self
        }
    }
}
