//! MarbleMachine command-line entry point.
//!
//! `marble-machine input=drawing.png output=drawing.gcode [bed_shake=true] [mode=contour]`

use tokio_util::sync::CancellationToken;

use marble_machine_lib::config::defaults::env_help;
use marble_machine_lib::{AppConfig, ArgsOutcome, RunOutcome, USAGE, logging, parse_args};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Step 1: Options (help exits before anything else runs)
    let options = match parse_args(std::env::args().skip(1))? {
        ArgsOutcome::Help => {
            println!("{USAGE}\n\n{}", env_help());
            return Ok(());
        }
        ArgsOutcome::Run(options) => options,
    };

    // Step 2: Environment, before anything reads RUST_LOG or MARBLE_*
    let dotenv = marble_machine_lib::load_dotenv();

    // Step 3: Tracing
    logging::init(options.log_file.as_deref())?;
    match dotenv {
        Some(path) => tracing::info!("Loaded .env from: {path}"),
        None => tracing::debug!("No .env file found, using system environment variables"),
    }

    // Step 4: Machine profile and overrides
    let config = AppConfig::load(options)?;
    for warning in &config.warnings {
        tracing::warn!("{warning}");
    }
    tracing::info!(
        output = %config.options.output.display(),
        max_x = config.profile.max_x,
        max_y = config.profile.max_y,
        border_x = config.profile.border_x,
        border_y = config.profile.border_y,
        feed_rate = config.profile.initial_feed_rate,
        debug = config.profile.debug,
        "MarbleMachine starting"
    );

    // Step 5: Ctrl+C cancels whatever the run is waiting on; a second one exits
    let token = CancellationToken::new();
    let watcher = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received, shutting down");
            watcher.cancel();
        }
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Second interrupt, exiting now");
            std::process::exit(130);
        }
    });

    // Step 6: Run
    match marble_machine_lib::run(config, &token).await {
        Ok(RunOutcome::Completed { iterations }) => {
            tracing::info!(iterations, "Run completed");
        }
        Ok(RunOutcome::Interrupted { iterations }) => {
            tracing::info!(iterations, "Run stopped by operator");
        }
        Err(e) => {
            tracing::error!("Run failed: {e}");
            return Err(e.into());
        }
    }
    Ok(())
}
