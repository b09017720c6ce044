use std::sync::{Mutex, PoisonError};

use call_harness_common::{HarnessConfig, HarnessError};
use call_harness_logs::{FakeLogger, LogCollector, LogSnapshot};
use call_harness_recorder::{CallRecorder, Surface};
use tracing::{debug, instrument, subscriber::DefaultGuard};

/// Recorder and log collector for one test, verified at teardown.
///
/// Unless `verify_on_drop` is off, dropping the harness runs [`TestHarness::verify`] and panics
/// with the failures, so a test cannot forget its teardown checks. An explicit `verify` only
/// stands in for teardown while no calls or expectations have been added since.
#[derive(Debug)]
pub struct TestHarness {
    config: HarnessConfig,
    recorder: CallRecorder,
    collector: LogCollector,
    verified_at: Mutex<Option<Activity>>,
}

/// Recorded calls and registered expectations at the time of a verification.
type Activity = (usize, usize);

impl TestHarness {
    pub fn new() -> Self {
        Self::from_config(HarnessConfig::default())
    }

    pub fn strict() -> Self {
        Self::from_config(HarnessConfig::strict())
    }

    pub fn lenient() -> Self {
        Self::from_config(HarnessConfig::lenient())
    }

    /// Harness configured from `call_harness.*` and `CALL_HARNESS_*` variables.
    pub fn load() -> Result<Self, HarnessError> {
        Ok(Self::from_config(HarnessConfig::load()?))
    }

    pub fn from_config(config: HarnessConfig) -> Self {
        debug!(mode = ?config.mode, saturate = config.saturate_expectations, "Creating test harness");
        Self {
            recorder: CallRecorder::from_config(&config),
            collector: LogCollector::new(),
            config,
            verified_at: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn recorder(&self) -> &CallRecorder {
        &self.recorder
    }

    pub fn collector(&self) -> &LogCollector {
        &self.collector
    }

    pub fn surface(&self, capability: &str) -> Surface {
        self.recorder.surface(capability)
    }

    /// Logger for `category` writing into this harness's collector.
    pub fn logger(&self, category: &str) -> FakeLogger {
        FakeLogger::with_collector(category, self.collector.clone())
    }

    pub fn snapshot(&self) -> LogSnapshot {
        self.collector.snapshot()
    }

    /// Installs the `fmt` test subscriber at the configured `log_level`.
    pub fn init_tracing(&self) {
        crate::init_test_tracing(self.config.log_level);
    }

    /// Captures `tracing` events from the current thread at the configured level until the
    /// guard is dropped.
    pub fn capture_tracing(&self) -> DefaultGuard {
        self.collector.capture_until_dropped(self.config.capture_level)
    }

    /// Runs `verify_all` and, when configured, `verify_no_other_calls`, reporting every
    /// failure from both passes.
    #[instrument(level = "debug", skip_all)]
    pub fn verify(&self) -> Result<(), HarnessError> {
        *self
            .verified_at
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(self.activity());

        let mut failures = Vec::new();
        if let Err(e) = self.recorder.verify_all() {
            failures.extend(flatten(e));
        }
        if self.config.verify_no_other_calls {
            if let Err(e) = self.recorder.verify_no_other_calls() {
                failures.extend(flatten(e));
            }
        }
        HarnessError::collect(failures)
    }
}

impl TestHarness {
    fn activity(&self) -> Activity {
        (
            self.recorder.calls().len(),
            self.recorder.expectations().len(),
        )
    }

    fn verified_current_activity(&self) -> bool {
        let verified_at = *self
            .verified_at
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        verified_at == Some(self.activity())
    }
}

fn flatten(error: HarnessError) -> Vec<HarnessError> {
    match error {
        HarnessError::Verification(inner) => inner,
        other => vec![other],
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TestHarness {
    fn drop(&mut self) {
        if !self.config.verify_on_drop
            || std::thread::panicking()
            || self.verified_current_activity()
        {
            return;
        }
        if let Err(e) = self.verify() {
            panic!("Test harness verification failed: {e}");
        }
    }
}
