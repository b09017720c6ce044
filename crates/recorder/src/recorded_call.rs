use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{ExpectationId, decode_argument};

/// An invocation observed by the recorder, matched or not.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordedCall {
    pub sequence: u64,
    pub operation: String,
    pub arguments: Vec<Value>,
    pub timestamp: DateTime<Utc>,
    pub matched: Option<ExpectationId>,
    /// Set once an explicit `verify` counted this call.
    pub verified: bool,
}

impl RecordedCall {
    pub fn argument<T: DeserializeOwned>(&self, index: usize) -> Option<T> {
        decode_argument(&self.arguments, index)
    }

    pub fn is_accounted_for(&self) -> bool {
        self.matched.is_some() || self.verified
    }
}
