mod error;
mod log_level;
mod times;
mod verification_mode;
pub mod config;

pub use crate::config::HarnessConfig;
pub use error::{HarnessError, MockFailure};
pub use log_level::LogLevel;
pub use times::Times;
pub use verification_mode::VerificationMode;
