use serde::{Deserialize, Serialize};

/// Policy applied to calls that no expectation accepts.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationMode {
    /// Any call without a matching expectation fails with `UnexpectedCall`.
    #[default]
    Strict,
    /// Unmatched calls return an empty value and are left for `verify_no_other_calls`.
    Lenient,
}

impl VerificationMode {
    pub fn is_strict(&self) -> bool {
        matches!(self, VerificationMode::Strict)
    }
}
