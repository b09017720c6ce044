use std::{ops::Deref, sync::Arc};

use call_harness_common::LogLevel;

use crate::LogRecord;

/// Immutable point-in-time copy of collected records, in emission order.
///
/// Filtering returns a new snapshot; the collector is never touched.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LogSnapshot {
    records: Arc<[LogRecord]>,
}

impl LogSnapshot {
    pub(crate) fn new(records: Vec<LogRecord>) -> Self {
        Self {
            records: records.into(),
        }
    }

    pub fn filter<P>(&self, predicate: P) -> LogSnapshot
    where
        P: Fn(&LogRecord) -> bool,
    {
        Self::new(
            self.records
                .iter()
                .filter(|&record| predicate(record))
                .cloned()
                .collect(),
        )
    }

    pub fn at_least(&self, level: LogLevel) -> LogSnapshot {
        self.filter(|record| record.level >= level)
    }

    pub fn with_level(&self, level: LogLevel) -> LogSnapshot {
        self.filter(|record| record.level == level)
    }

    pub fn containing(&self, text: &str) -> LogSnapshot {
        self.filter(|record| record.message.contains(text))
    }

    pub fn with_category(&self, category: &str) -> LogSnapshot {
        self.filter(|record| record.category.as_deref() == Some(category))
    }

    pub fn any<P>(&self, predicate: P) -> bool
    where
        P: Fn(&LogRecord) -> bool,
    {
        self.records.iter().any(predicate)
    }

    pub fn first_where<P>(&self, predicate: P) -> Option<&LogRecord>
    where
        P: Fn(&LogRecord) -> bool,
    {
        self.records.iter().find(|&record| predicate(record))
    }

    pub fn latest(&self) -> Option<&LogRecord> {
        self.records.last()
    }

    pub fn messages(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.message.as_str()).collect()
    }
}

impl Deref for LogSnapshot {
    type Target = [LogRecord];

    fn deref(&self) -> &Self::Target {
        &self.records
    }
}

impl<'a> IntoIterator for &'a LogSnapshot {
    type Item = &'a LogRecord;
    type IntoIter = std::slice::Iter<'a, LogRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
