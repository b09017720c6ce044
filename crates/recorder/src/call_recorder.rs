use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use call_harness_common::{HarnessConfig, HarnessError, Times, VerificationMode};
use chrono::Utc;
use serde_json::Value;
use tracing::{debug, instrument, trace, warn};

use crate::{
    ArgumentMatcher, ExpectationId, ExpectationSummary, Outcome, RecordedCall, Surface,
    expectation::Expectation,
};

type Result<T> = std::result::Result<T, HarnessError>;

#[derive(Debug, Default)]
struct RecorderState {
    expectations: Vec<Expectation>,
    calls: Vec<RecordedCall>,
    next_expectation: usize,
    next_sequence: u64,
}

/// Resolves calls from test doubles against registered expectations and audits coverage.
///
/// Clones share state, so one recorder can stand behind every double of a test and verify
/// them together.
#[derive(Clone, Debug)]
pub struct CallRecorder {
    state: Arc<Mutex<RecorderState>>,
    mode: VerificationMode,
    saturate: bool,
    separator: String,
}

impl CallRecorder {
    pub fn new(mode: VerificationMode) -> Self {
        Self::from_config(&HarnessConfig {
            mode,
            ..HarnessConfig::default()
        })
    }

    pub fn strict() -> Self {
        Self::new(VerificationMode::Strict)
    }

    pub fn lenient() -> Self {
        Self::new(VerificationMode::Lenient)
    }

    pub fn from_config(config: &HarnessConfig) -> Self {
        Self {
            state: Arc::new(Mutex::new(RecorderState::default())),
            mode: config.mode,
            saturate: config.saturate_expectations,
            separator: config.surface_separator.clone(),
        }
    }

    /// When off, capped expectations keep matching after reaching their cap and
    /// `verify_all` reports the excess.
    pub fn with_saturation(self, saturate: bool) -> Self {
        Self { saturate, ..self }
    }

    pub fn mode(&self) -> VerificationMode {
        self.mode
    }

    /// Handle for one collaborator's capability surface.
    pub fn surface(&self, capability: impl Into<String>) -> Surface {
        Surface::new(self.clone(), capability.into())
    }

    pub(crate) fn operation_name(&self, capability: &str, method: &str) -> String {
        format!("{capability}{}{method}", self.separator)
    }

    pub fn register(
        &self,
        operation: impl Into<String>,
        matcher: ArgumentMatcher,
        outcome: Outcome,
        times: Times,
    ) -> Result<ExpectationId> {
        let mut state = self.lock();
        let id = ExpectationId(state.next_expectation);
        let expectation = Expectation {
            id,
            operation: operation.into(),
            matcher,
            outcome,
            times,
            consumed: 0,
        };

        if let Some(existing) = state
            .expectations
            .iter()
            .find(|existing| existing.shadows(&expectation, self.saturate))
        {
            let existing_matcher = existing.matcher.to_string();
            if self.mode.is_strict() {
                return Err(HarnessError::DuplicateAmbiguousExpectation {
                    operation: expectation.operation,
                    existing: existing_matcher,
                    registered: expectation.matcher.to_string(),
                });
            }
            warn!(
                operation = expectation.operation,
                existing = existing_matcher,
                registered = %expectation.matcher,
                "Expectation overlaps an earlier one and loses every shared call"
            );
        }

        debug!(
            operation = expectation.operation,
            matcher = %expectation.matcher,
            times = %expectation.times,
            id = %id,
            "Registered expectation"
        );
        state.next_expectation += 1;
        state.expectations.push(expectation);
        Ok(id)
    }

    /// Resolves one call. Every call is recorded, whether or not an expectation accepts it.
    ///
    /// A call landing on an expectation that forbids calls (`Never`) counts against it; strict
    /// mode fails the call right away.
    pub fn invoke(&self, operation: &str, arguments: Vec<Value>) -> Result<Value> {
        let (sequence, matched, outcome, forbidden) = {
            let mut state = self.lock();
            let sequence = state.next_sequence;
            state.next_sequence += 1;

            let (matched, outcome, forbidden) = match state
                .expectations
                .iter_mut()
                .find(|e| e.accepts(operation, &arguments, self.saturate))
            {
                Some(expectation) => {
                    expectation.consumed += 1;
                    let forbidden = expectation.times.forbids_calls().then(|| {
                        HarnessError::UnsatisfiedExpectation {
                            operation: expectation.operation.clone(),
                            matcher: expectation.matcher.to_string(),
                            expected: expectation.times,
                            actual: expectation.consumed,
                        }
                    });
                    (
                        Some(expectation.id),
                        Some(expectation.outcome.clone()),
                        forbidden,
                    )
                }
                None => (None, None, None),
            };

            state.calls.push(RecordedCall {
                sequence,
                operation: operation.to_string(),
                arguments: arguments.clone(),
                timestamp: Utc::now(),
                matched,
                verified: false,
            });
            (sequence, matched, outcome, forbidden)
        };

        trace!(operation, sequence, matched = ?matched, "Recorded call");

        if let Some(violation) = forbidden {
            if self.mode.is_strict() {
                return Err(violation);
            }
            warn!(operation, sequence, "Call hit an expectation that forbids it");
        }

        // The lock is released so callbacks may call back into the recorder.
        match outcome {
            Some(outcome) => outcome.apply(&arguments).map_err(HarnessError::Raised),
            None if self.mode.is_strict() => Err(HarnessError::UnexpectedCall {
                operation: operation.to_string(),
                arguments,
            }),
            None => {
                warn!(operation, sequence, "No expectation matched, returning empty value");
                Ok(Value::Null)
            }
        }
    }

    /// Fails for every expectation whose consumption does not satisfy its `Times`.
    #[instrument(level = "debug", skip_all)]
    pub fn verify_all(&self) -> Result<()> {
        let state = self.lock();
        let failures = state
            .expectations
            .iter()
            .filter(|e| !e.is_satisfied())
            .map(|e| HarnessError::UnsatisfiedExpectation {
                operation: e.operation.clone(),
                matcher: e.matcher.to_string(),
                expected: e.times,
                actual: e.consumed,
            })
            .collect::<Vec<_>>();
        debug!(
            expectations = state.expectations.len(),
            failures = failures.len(),
            "Verified expectations"
        );
        HarnessError::collect(failures)
    }

    /// Fails for every recorded call that neither matched an expectation nor was counted
    /// by an explicit `verify`.
    #[instrument(level = "debug", skip_all)]
    pub fn verify_no_other_calls(&self) -> Result<()> {
        let state = self.lock();
        let failures = state
            .calls
            .iter()
            .filter(|call| !call.is_accounted_for())
            .map(|call| HarnessError::UnexpectedCall {
                operation: call.operation.clone(),
                arguments: call.arguments.clone(),
            })
            .collect::<Vec<_>>();
        debug!(
            calls = state.calls.len(),
            failures = failures.len(),
            "Verified no other calls"
        );
        HarnessError::collect(failures)
    }

    /// Checks how often `operation` was called with arguments accepted by `matcher`.
    /// On success the counted calls are marked as verified.
    #[instrument(level = "debug", skip(self, matcher), fields(matcher = %matcher))]
    pub fn verify(&self, operation: &str, matcher: &ArgumentMatcher, times: Times) -> Result<()> {
        let mut state = self.lock();
        let actual = state
            .calls
            .iter()
            .filter(|call| call.operation == operation && matcher.matches(&call.arguments))
            .count();

        if !times.is_satisfied_by(actual) {
            return Err(HarnessError::UnsatisfiedExpectation {
                operation: operation.to_string(),
                matcher: matcher.to_string(),
                expected: times,
                actual,
            });
        }

        state
            .calls
            .iter_mut()
            .filter(|call| call.operation == operation && matcher.matches(&call.arguments))
            .for_each(|call| call.verified = true);
        Ok(())
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock().calls.clone()
    }

    pub fn calls_to(&self, operation: &str) -> Vec<RecordedCall> {
        self.lock()
            .calls
            .iter()
            .filter(|call| call.operation == operation)
            .cloned()
            .collect()
    }

    pub fn call_count(&self, operation: &str) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|call| call.operation == operation)
            .count()
    }

    pub fn expectations(&self) -> Vec<ExpectationSummary> {
        self.lock()
            .expectations
            .iter()
            .map(Expectation::summary)
            .collect()
    }

    /// Drops all expectations and recorded calls.
    pub fn reset(&self) {
        *self.lock() = RecorderState::default();
    }

    fn lock(&self) -> MutexGuard<'_, RecorderState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for CallRecorder {
    fn default() -> Self {
        Self::strict()
    }
}
