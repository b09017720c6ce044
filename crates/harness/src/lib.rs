//! Strict-verification test harness: a call recorder for hand-written doubles and a log
//! collector for asserting on what the subject logged.
//!
//! ```ignore
//! let harness = TestHarness::strict();
//! let gateway = harness.surface("PaymentGateway");
//! gateway.expect("process_payment").with_args(("C1", 99.99)).returns(true).register()?;
//! // ... run the subject ...
//! harness.verify()?;
//! ```

mod test_harness;

#[cfg(test)]
mod scenarios;

pub use test_harness::TestHarness;

pub use call_harness_common::{
    HarnessConfig, HarnessError, LogLevel, MockFailure, Times, VerificationMode,
};
pub use call_harness_logs::{
    CollectorLayer, ErrorDetail, FakeLogger, LogCollector, LogEntry, LogRecord, LogSnapshot,
    Logger, TracingLogger,
};
pub use call_harness_recorder::{
    ArgumentMatcher, CallRecorder, ExpectationBuilder, ExpectationId, ExpectationSummary, Matcher,
    Outcome, RecordedCall, Surface,
};

/// Installs a `fmt` subscriber writing through the test writer. Later calls are no-ops.
pub fn init_test_tracing(level: LogLevel) {
    let _ = tracing_subscriber::fmt()
        .with_max_level(level.as_level_filter())
        .with_test_writer()
        .try_init();
}
