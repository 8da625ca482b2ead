//! Configuration: command-line options, machine profile, environment overrides.

pub mod app_config;
pub mod args;
pub mod defaults;
pub mod validation;

pub use app_config::AppConfig;
pub use args::{ArgsOutcome, RunOptions, TriggerKind, parse_args};

/// Configuration problems detected before the pipeline starts.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("No output filename was provided. Use `output=FILENAME`")]
    MissingOutput,

    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Failed to load machine profile {path}: {reason}")]
    Profile { path: String, reason: String },
}
