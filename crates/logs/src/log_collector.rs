use std::{
    error::Error,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use call_harness_common::LogLevel;
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::{layer::SubscriberExt, registry};

use crate::{CollectorLayer, LogEntry, LogRecord, LogSnapshot};

#[derive(Debug, Default)]
struct CollectorState {
    records: Vec<LogRecord>,
    next_sequence: u64,
}

/// Append-only sink of log records for one test.
///
/// Clones share the same records, so a collector can be handed to several loggers and
/// still be inspected from the test.
#[derive(Clone, Debug, Default)]
pub struct LogCollector {
    state: Arc<Mutex<CollectorState>>,
}

impl LogCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&self, level: LogLevel, message: impl Into<String>, error: Option<&(dyn Error + 'static)>) {
        let entry = LogEntry::new(level, message);
        let entry = match error {
            Some(error) => entry.with_error(error),
            None => entry,
        };
        self.emit_record(entry);
    }

    pub fn emit_record(&self, entry: LogEntry) {
        let mut state = self.lock();
        let sequence = state.next_sequence;
        state.next_sequence += 1;
        state.records.push(entry.into_record(sequence));
    }

    /// Copy of every record appended since the last `clear`.
    pub fn snapshot(&self) -> LogSnapshot {
        LogSnapshot::new(self.lock().records.clone())
    }

    /// Drops all records and restarts sequence positions at zero. Snapshots already taken
    /// keep their records.
    pub fn clear(&self) {
        *self.lock() = CollectorState::default();
    }

    pub fn latest(&self) -> Option<LogRecord> {
        self.lock().records.last().cloned()
    }

    pub fn count(&self) -> usize {
        self.lock().records.len()
    }

    /// `tracing` layer appending every event at or above `min_level` to this collector.
    pub fn layer(&self, min_level: LogLevel) -> CollectorLayer {
        CollectorLayer::new(self.clone(), min_level)
    }

    /// Routes `tracing` events on the current thread into this collector while `f` runs.
    pub fn capture<F, R>(&self, min_level: LogLevel, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let subscriber = registry().with(self.layer(min_level));
        tracing::subscriber::with_default(subscriber, f)
    }

    /// Routes `tracing` events on the current thread into this collector until the guard
    /// is dropped.
    pub fn capture_until_dropped(&self, min_level: LogLevel) -> DefaultGuard {
        let subscriber = registry().with(self.layer(min_level));
        tracing::subscriber::set_default(subscriber)
    }

    fn lock(&self) -> MutexGuard<'_, CollectorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
