//! Log snapshot collector.
//!
//! Subjects under test log through the [`Logger`] capability (or plain `tracing` macros
//! captured by [`CollectorLayer`]); tests read the records back from
//! [`LogCollector::snapshot`].

mod collector_layer;
mod log_collector;
mod log_record;
mod logger;
mod snapshot;

pub use collector_layer::CollectorLayer;
pub use log_collector::LogCollector;
pub use log_record::{ErrorDetail, LogEntry, LogRecord};
pub use logger::{FakeLogger, Logger, TracingLogger};
pub use snapshot::LogSnapshot;

pub use call_harness_common::LogLevel;
