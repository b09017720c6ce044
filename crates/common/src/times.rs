use std::fmt::Display;

/// How many times an expectation is allowed, or required, to be consumed.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum Times {
    Never,
    #[default]
    Once,
    Exactly(usize),
    AtLeast(usize),
    AtLeastOnce,
    AtMost(usize),
    AnyNumber,
}

impl Times {
    pub fn min(&self) -> usize {
        match self {
            Times::Never | Times::AtMost(_) | Times::AnyNumber => 0,
            Times::Once | Times::AtLeastOnce => 1,
            Times::Exactly(n) | Times::AtLeast(n) => *n,
        }
    }

    pub fn max(&self) -> Option<usize> {
        match self {
            Times::Never => Some(0),
            Times::Once => Some(1),
            Times::Exactly(n) | Times::AtMost(n) => Some(*n),
            Times::AtLeast(_) | Times::AtLeastOnce | Times::AnyNumber => None,
        }
    }

    pub fn is_capped(&self) -> bool {
        self.max().is_some()
    }

    pub fn is_satisfied_by(&self, count: usize) -> bool {
        count >= self.min() && self.max().is_none_or(|max| count <= max)
    }

    /// Whether a capped expectation has been consumed up to its cap.
    ///
    /// `Never` is never exhausted: forbidden calls keep landing on it so they are counted.
    pub fn is_exhausted_by(&self, count: usize) -> bool {
        self.max().is_some_and(|max| max > 0 && count >= max)
    }

    /// Whether any call at all violates this constraint.
    pub fn forbids_calls(&self) -> bool {
        self.max() == Some(0)
    }
}

impl Display for Times {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Times::Never => write!(f, "never"),
            Times::Once => write!(f, "exactly 1 time"),
            Times::Exactly(n) => write!(f, "exactly {n} time(s)"),
            Times::AtLeast(n) => write!(f, "at least {n} time(s)"),
            Times::AtLeastOnce => write!(f, "at least 1 time"),
            Times::AtMost(n) => write!(f, "at most {n} time(s)"),
            Times::AnyNumber => write!(f, "any number of times"),
        }
    }
}
