use config::{Config, ConfigBuilder, ConfigError, Environment, File, builder::DefaultState};
use serde::{Deserialize, Serialize};

use crate::{LogLevel, VerificationMode};

/// Default separator between a capability name and its method name = "::"
const DEFAULT_SURFACE_SEPARATOR: &str = "::";

/// Default minimum level captured from `tracing` events = information
const DEFAULT_CAPTURE_LEVEL: LogLevel = LogLevel::Information;

/// Default level for the test `fmt` subscriber = debug
const DEFAULT_LOG_LEVEL: LogLevel = LogLevel::Debug;

const CONFIG_FILE_NAME: &str = "call_harness";
const ENV_PREFIX: &str = "CALL_HARNESS";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct HarnessConfig {
    /// Policy for calls no expectation accepts
    #[serde(default)]
    pub mode: VerificationMode,

    /// Capped expectations stop matching once consumed up to their cap
    #[serde(default = "default_true")]
    pub saturate_expectations: bool,

    /// Verify the recorder when a `TestHarness` is dropped
    #[serde(default = "default_true")]
    pub verify_on_drop: bool,

    /// Include `verify_no_other_calls` in teardown verification
    #[serde(default = "default_true")]
    pub verify_no_other_calls: bool,

    /// Minimum level turned into log records by the capture layer
    /// Defaults given by [`DEFAULT_CAPTURE_LEVEL`]
    #[serde(default = "default_capture_level")]
    pub capture_level: LogLevel,

    /// Maximum level printed by the test subscriber
    /// Defaults given by [`DEFAULT_LOG_LEVEL`]
    #[serde(default = "default_log_level")]
    pub log_level: LogLevel,

    /// Joins capability and method names into operation identifiers
    /// Defaults given by [`DEFAULT_SURFACE_SEPARATOR`]
    #[serde(default = "default_surface_separator")]
    pub surface_separator: String,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            mode: VerificationMode::default(),
            saturate_expectations: true,
            verify_on_drop: true,
            verify_no_other_calls: true,
            capture_level: DEFAULT_CAPTURE_LEVEL,
            log_level: DEFAULT_LOG_LEVEL,
            surface_separator: DEFAULT_SURFACE_SEPARATOR.to_string(),
        }
    }
}

impl HarnessConfig {
    /// Load configuration from multiple sources in order of priority:
    /// 1. Configuration file (call_harness.toml, call_harness.yaml, call_harness.json)
    /// 2. Environment variables (prefixed with CALL_HARNESS_)
    pub fn load() -> Result<Self, ConfigError> {
        let builder =
            Config::builder().add_source(File::with_name(CONFIG_FILE_NAME).required(false));
        Self::build(builder, Self::environment())
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let builder = Config::builder().add_source(File::with_name(path));
        Self::build(builder, Self::environment())
    }

    /// `CALL_HARNESS_*` variables, e.g. `CALL_HARNESS_SATURATE_EXPECTATIONS=false`.
    fn environment() -> Environment {
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
    }

    fn build(
        builder: ConfigBuilder<DefaultState>,
        environment: Environment,
    ) -> Result<Self, ConfigError> {
        let config = builder.add_source(environment).build()?;

        let harness_config: Self = config.try_deserialize()?;

        harness_config.validate()?;

        Ok(harness_config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.surface_separator.is_empty() {
            return Err(ConfigError::Message(
                "surface_separator cannot be empty".to_string(),
            ));
        }
        if self.surface_separator.chars().any(char::is_whitespace) {
            return Err(ConfigError::Message(format!(
                "surface_separator cannot contain whitespace: {:?}",
                self.surface_separator
            )));
        }
        Ok(())
    }

    pub fn strict() -> Self {
        Self::default()
    }

    pub fn lenient() -> Self {
        Self {
            mode: VerificationMode::Lenient,
            ..Self::default()
        }
    }

    pub fn with_saturation(self, saturate_expectations: bool) -> Self {
        Self {
            saturate_expectations,
            ..self
        }
    }

    pub fn with_verify_on_drop(self, verify_on_drop: bool) -> Self {
        Self {
            verify_on_drop,
            ..self
        }
    }

    pub fn with_verify_no_other_calls(self, verify_no_other_calls: bool) -> Self {
        Self {
            verify_no_other_calls,
            ..self
        }
    }

    pub fn with_capture_level(self, capture_level: LogLevel) -> Self {
        Self {
            capture_level,
            ..self
        }
    }
}

// Default values for serde defaults
fn default_true() -> bool {
    true
}

fn default_capture_level() -> LogLevel {
    DEFAULT_CAPTURE_LEVEL
}

fn default_log_level() -> LogLevel {
    DEFAULT_LOG_LEVEL
}

fn default_surface_separator() -> String {
    DEFAULT_SURFACE_SEPARATOR.to_string()
}
