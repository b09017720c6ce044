use std::{fmt, sync::Arc};

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

type PredicateFn = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// Accepts or rejects a single positional argument.
#[derive(Clone)]
pub enum Matcher {
    Exact(Value),
    Any,
    Predicate {
        description: String,
        predicate: PredicateFn,
    },
}

impl Matcher {
    pub fn exact(value: impl Into<Value>) -> Self {
        Matcher::Exact(value.into())
    }

    /// Exact match on any serializable value, e.g. a domain struct.
    pub fn try_exact<T: Serialize>(value: &T) -> Result<Self, serde_json::Error> {
        serde_json::to_value(value).map(Matcher::Exact)
    }

    pub fn any() -> Self {
        Matcher::Any
    }

    pub fn predicate<F>(description: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Matcher::Predicate {
            description: description.into(),
            predicate: Arc::new(predicate),
        }
    }

    /// Predicate over the decoded argument. Arguments that do not decode as `T` are rejected.
    pub fn satisfying<T, F>(description: impl Into<String>, predicate: F) -> Self
    where
        T: DeserializeOwned,
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Self::predicate(description, move |value| {
            T::deserialize(value).is_ok_and(|decoded| predicate(&decoded))
        })
    }

    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Matcher::Exact(expected) => expected == value,
            Matcher::Any => true,
            Matcher::Predicate { predicate, .. } => predicate(value),
        }
    }

    /// Whether some argument could be accepted by both matchers.
    ///
    /// Two predicates cannot be compared and are treated as disjoint.
    pub fn overlaps(&self, other: &Matcher) -> bool {
        match (self, other) {
            (Matcher::Any, _) | (_, Matcher::Any) => true,
            (Matcher::Exact(a), Matcher::Exact(b)) => a == b,
            (Matcher::Exact(value), predicate @ Matcher::Predicate { .. })
            | (predicate @ Matcher::Predicate { .. }, Matcher::Exact(value)) => {
                predicate.matches(value)
            }
            (Matcher::Predicate { .. }, Matcher::Predicate { .. }) => false,
        }
    }
}

impl fmt::Display for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Matcher::Exact(value) => write!(f, "{value}"),
            Matcher::Any => write!(f, "_"),
            Matcher::Predicate { description, .. } => write!(f, "<{description}>"),
        }
    }
}

impl fmt::Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Matcher::Exact(value) => f.debug_tuple("Exact").field(value).finish(),
            Matcher::Any => write!(f, "Any"),
            Matcher::Predicate { description, .. } => {
                f.debug_tuple("Predicate").field(description).finish()
            }
        }
    }
}

/// Positional matchers for every parameter of an operation.
#[derive(Clone, Debug, Default)]
pub struct ArgumentMatcher(Vec<Matcher>);

impl ArgumentMatcher {
    pub fn new(matchers: Vec<Matcher>) -> Self {
        Self(matchers)
    }

    /// Exact matchers for every element of an argument tuple.
    pub fn exact_args<A: Serialize>(args: &A) -> Result<Self, serde_json::Error> {
        Ok(Self(
            encode_arguments(args)?
                .into_iter()
                .map(Matcher::Exact)
                .collect(),
        ))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn matches(&self, arguments: &[Value]) -> bool {
        self.0.len() == arguments.len()
            && self
                .0
                .iter()
                .zip(arguments)
                .all(|(matcher, argument)| matcher.matches(argument))
    }

    pub fn overlaps(&self, other: &ArgumentMatcher) -> bool {
        self.0.len() == other.0.len()
            && self
                .0
                .iter()
                .zip(&other.0)
                .all(|(left, right)| left.overlaps(right))
    }
}

impl From<Vec<Matcher>> for ArgumentMatcher {
    fn from(matchers: Vec<Matcher>) -> Self {
        Self(matchers)
    }
}

impl fmt::Display for ArgumentMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = self
            .0
            .iter()
            .map(|m| m.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "{rendered}")
    }
}

/// Turns an argument tuple into positional values.
///
/// Anything serializing to a JSON array is spread into one value per element and anything
/// serializing to `null` means no arguments; every other value is a single argument. This
/// applies to bare values as well as tuples, so a bare `Vec` becomes one argument per element
/// and a bare `None` becomes no arguments. Wrap such values in a one-element tuple, e.g.
/// `(items,)` or `(None::<u32>,)`, to pass them as a single argument.
pub fn encode_arguments<A: Serialize>(args: &A) -> Result<Vec<Value>, serde_json::Error> {
    Ok(match serde_json::to_value(args)? {
        Value::Array(values) => values,
        Value::Null => Vec::new(),
        single => vec![single],
    })
}

/// Decodes one positional argument, `None` if it is missing or has another shape.
pub fn decode_argument<T: DeserializeOwned>(arguments: &[Value], index: usize) -> Option<T> {
    arguments
        .get(index)
        .and_then(|value| T::deserialize(value).ok())
}
