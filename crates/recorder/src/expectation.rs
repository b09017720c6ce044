use std::fmt::Display;

use call_harness_common::Times;

use crate::{ArgumentMatcher, Outcome};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExpectationId(pub(crate) usize);

impl Display for ExpectationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Expectation {
    pub(crate) id: ExpectationId,
    pub(crate) operation: String,
    pub(crate) matcher: ArgumentMatcher,
    pub(crate) outcome: Outcome,
    pub(crate) times: Times,
    pub(crate) consumed: usize,
}

impl Expectation {
    /// Whether `arguments` would be routed to this expectation.
    pub(crate) fn accepts(&self, operation: &str, arguments: &[serde_json::Value], saturate: bool) -> bool {
        self.operation == operation
            && !(saturate && self.times.is_exhausted_by(self.consumed))
            && self.matcher.matches(arguments)
    }

    /// Whether this expectation, registered first, takes every call that `later` also accepts.
    ///
    /// A capped expectation stops matching once consumed, which orders the two; an uncapped
    /// one, or any one when caps are not enforced, shadows every overlapping registration.
    /// A `Never` expectation is capped too and is read as carving its calls out of later ones.
    pub(crate) fn shadows(&self, later: &Expectation, saturate: bool) -> bool {
        self.operation == later.operation
            && !(saturate && self.times.is_capped())
            && self.matcher.overlaps(&later.matcher)
    }

    pub(crate) fn is_satisfied(&self) -> bool {
        self.times.is_satisfied_by(self.consumed)
    }

    pub(crate) fn summary(&self) -> ExpectationSummary {
        ExpectationSummary {
            id: self.id,
            operation: self.operation.clone(),
            matcher: self.matcher.to_string(),
            times: self.times,
            consumed: self.consumed,
        }
    }
}

/// Read-only view of a registered expectation.
#[derive(Clone, Debug, PartialEq)]
pub struct ExpectationSummary {
    pub id: ExpectationId,
    pub operation: String,
    pub matcher: String,
    pub times: Times,
    pub consumed: usize,
}
