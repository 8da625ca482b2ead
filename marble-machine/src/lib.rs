//! Drawing-to-plotter runner: acquires a frame, extracts a path and writes
//! a motion script, optionally looping on an operator trigger.

pub mod bootstrap;
pub mod capture;
pub mod config;
pub mod logging;
pub mod runner;
pub mod services;
pub mod trigger;

use std::path::PathBuf;

use path_extract::ExtractError;
use tokio_util::sync::CancellationToken;

use capture::FrameSource;
use trigger::TriggerSource;

pub use bootstrap::{data_dir, load_dotenv};
pub use config::args::USAGE;
pub use config::{AppConfig, ArgsOutcome, ConfigError, RunOptions, TriggerKind, parse_args};
pub use runner::{RunOutcome, RunState, Runner};

/// Failures that abort the current run.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error(transparent)]
    Capture(#[from] ExtractError),

    #[error("Capture command failed: {0}")]
    CaptureCommand(String),

    #[error("Trigger read failed: {0}")]
    Trigger(#[source] std::io::Error),

    #[error("Trigger input closed")]
    TriggerClosed,

    #[error("Failed to write {}: {source}", path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Background task failed: {0}")]
    Task(String),
}

/// Result type alias for run operations.
pub type Result<T> = std::result::Result<T, RunError>;

/// Build the frame source and trigger for `config` and drive them until the
/// run completes or `token` is cancelled.
pub async fn run(config: AppConfig, token: &CancellationToken) -> Result<RunOutcome> {
    let source = capture::Source::from_config(&config);
    let trigger = trigger::Trigger::from_config(&config);
    tracing::info!(
        source = %source.describe(),
        trigger = %trigger.describe(),
        mode = %config.options.extractor,
        repeat = config.options.repeat,
        "Starting run"
    );
    let mut runner = Runner::from_config(source, trigger, &config);
    runner.run(token).await
}
