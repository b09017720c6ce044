mod harness_config;

pub use harness_config::HarnessConfig;
