//! The capture loop as an explicit state machine.
//!
//! ```text
//! Idle -> [AwaitingNextTrigger] -> Capturing -> Processing -+-> ShuttingDown
//!              ^                                            |
//!              +--------------- repeat ---------------------+
//! ```
//!
//! Every wait races the cancellation token. Cancellation ends the run as
//! [`RunOutcome::Interrupted`], which is not an error.

use std::future::Future;
use std::path::PathBuf;

use tokio_util::sync::CancellationToken;

use crate::RunError;
use crate::capture::FrameSource;
use crate::config::AppConfig;
use crate::services::plot_pipeline::{PlotSettings, process_canvas, write_script};
use crate::trigger::TriggerSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Capturing,
    Processing,
    AwaitingNextTrigger,
    ShuttingDown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Completed { iterations: usize },
    Interrupted { iterations: usize },
}

/// `None` if `token` is cancelled first.
async fn until_cancelled<F: Future>(token: &CancellationToken, fut: F) -> Option<F::Output> {
    tokio::select! {
        biased;
        _ = token.cancelled() => None,
        out = fut => Some(out),
    }
}

pub struct Runner<S, T> {
    source: S,
    trigger: T,
    settings: PlotSettings,
    output: PathBuf,
    repeat: bool,
    state: RunState,
    history: Vec<RunState>,
    iterations: usize,
}

impl<S, T> Runner<S, T>
where
    S: FrameSource,
    T: TriggerSource,
{
    pub fn new(source: S, trigger: T, settings: PlotSettings, output: PathBuf, repeat: bool) -> Self {
        Self {
            source,
            trigger,
            settings,
            output,
            repeat,
            state: RunState::Idle,
            history: vec![RunState::Idle],
            iterations: 0,
        }
    }

    pub fn from_config(source: S, trigger: T, config: &AppConfig) -> Self {
        Self::new(
            source,
            trigger,
            PlotSettings::from_config(config),
            config.options.output.clone(),
            config.options.repeat,
        )
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Every state entered so far, starting with `Idle`.
    pub fn history(&self) -> &[RunState] {
        &self.history
    }

    /// Drive the loop until it completes, fails or `token` is cancelled.
    pub async fn run(&mut self, token: &CancellationToken) -> Result<RunOutcome, RunError> {
        let result = self.drive(token).await;
        self.transition(RunState::ShuttingDown);
        result
    }

    fn transition(&mut self, next: RunState) {
        tracing::debug!(from = ?self.state, to = ?next, "Run state");
        self.state = next;
        self.history.push(next);
    }

    fn interrupted(&self) -> RunOutcome {
        tracing::info!(iterations = self.iterations, "Run interrupted");
        RunOutcome::Interrupted {
            iterations: self.iterations,
        }
    }

    async fn drive(&mut self, token: &CancellationToken) -> Result<RunOutcome, RunError> {
        let mut wait_first = self.source.needs_trigger();
        loop {
            if wait_first {
                self.transition(RunState::AwaitingNextTrigger);
                let waited = until_cancelled(token, self.trigger.wait()).await;
                match waited {
                    None => return Ok(self.interrupted()),
                    Some(Err(RunError::TriggerClosed)) => {
                        tracing::info!("Trigger input closed, stopping");
                        return Ok(RunOutcome::Completed {
                            iterations: self.iterations,
                        });
                    }
                    Some(result) => result?,
                }
            }

            self.transition(RunState::Capturing);
            let acquired = until_cancelled(token, self.source.acquire()).await;
            let Some(canvas) = acquired else {
                return Ok(self.interrupted());
            };
            let canvas = canvas?;

            self.transition(RunState::Processing);
            let settings = self.settings.clone();
            let task = tokio::task::spawn_blocking(move || {
                let script = process_canvas(&canvas, &settings);
                (script.render(), script.feature_count, script.summary())
            });
            // Render only; an abandoned task finishes detached without writing.
            let Some(joined) = until_cancelled(token, task).await else {
                return Ok(self.interrupted());
            };
            let (text, features, summary) = joined.map_err(|e| RunError::Task(e.to_string()))?;
            if token.is_cancelled() {
                return Ok(self.interrupted());
            }
            write_script(&self.output, &text)?;

            self.iterations += 1;
            tracing::info!(
                iteration = self.iterations,
                features,
                moves = summary.move_lines,
                lines = summary.total(),
                output = %self.output.display(),
                "Script written"
            );

            if !self.repeat {
                return Ok(RunOutcome::Completed {
                    iterations: self.iterations,
                });
            }
            wait_first = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use path_extract::{Canvas, ExtractError};

    struct ScriptedSource {
        frame: Canvas,
        needs_trigger: bool,
        fail: bool,
        cancel_on_acquire: Option<CancellationToken>,
        dropped: Arc<AtomicBool>,
    }

    impl ScriptedSource {
        fn new(needs_trigger: bool) -> Self {
            let mut frame = Canvas::blank();
            frame.set_foreground(500, 500);
            Self {
                frame,
                needs_trigger,
                fail: false,
                cancel_on_acquire: None,
                dropped: Arc::new(AtomicBool::new(false)),
            }
        }
    }

    impl Drop for ScriptedSource {
        fn drop(&mut self) {
            self.dropped.store(true, Ordering::SeqCst);
        }
    }

    impl FrameSource for ScriptedSource {
        fn describe(&self) -> String {
            "scripted".into()
        }

        fn needs_trigger(&self) -> bool {
            self.needs_trigger
        }

        async fn acquire(&mut self) -> Result<Canvas, RunError> {
            if let Some(token) = &self.cancel_on_acquire {
                token.cancel();
            }
            if self.fail {
                return Err(ExtractError::InputUnavailable {
                    source_name: "scripted".into(),
                    reason: "no frame".into(),
                }
                .into());
            }
            Ok(self.frame.clone())
        }
    }

    enum Exhausted {
        Close,
        Block,
        Cancel(CancellationToken),
    }

    /// Fires `presses` times, then behaves per `exhausted`.
    struct ScriptedTrigger {
        presses: usize,
        exhausted: Exhausted,
    }

    impl ScriptedTrigger {
        fn new(presses: usize, exhausted: Exhausted) -> Self {
            Self { presses, exhausted }
        }
    }

    impl TriggerSource for ScriptedTrigger {
        fn describe(&self) -> String {
            "scripted".into()
        }

        async fn wait(&mut self) -> Result<(), RunError> {
            if self.presses > 0 {
                self.presses -= 1;
                return Ok(());
            }
            match &self.exhausted {
                Exhausted::Close => return Err(RunError::TriggerClosed),
                Exhausted::Cancel(token) => token.cancel(),
                Exhausted::Block => {}
            }
            std::future::pending::<()>().await;
            Ok(())
        }
    }

    fn output_path(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("marble-runner-{name}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir.join("out.gcode")
    }

    fn cleanup(path: &Path) {
        if let Some(dir) = path.parent() {
            std::fs::remove_dir_all(dir).unwrap();
        }
    }

    fn runner(
        source: ScriptedSource,
        trigger: ScriptedTrigger,
        output: &Path,
        repeat: bool,
    ) -> Runner<ScriptedSource, ScriptedTrigger> {
        Runner::new(source, trigger, PlotSettings::default(), output.to_path_buf(), repeat)
    }

    #[tokio::test]
    async fn test_single_file_run() {
        let output = output_path("single");
        let trigger = ScriptedTrigger::new(0, Exhausted::Block);
        let mut runner = runner(ScriptedSource::new(false), trigger, &output, false);

        let outcome = runner.run(&CancellationToken::new()).await.unwrap();
        assert_eq!(outcome, RunOutcome::Completed { iterations: 1 });
        assert_eq!(
            runner.history(),
            &[RunState::Idle, RunState::Capturing, RunState::Processing, RunState::ShuttingDown]
        );
        let text = std::fs::read_to_string(&output).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert!(text.starts_with("M203 X5000 Y5000 Z5000\n"));
        cleanup(&output);
    }

    #[tokio::test]
    async fn test_camera_waits_for_trigger_first() {
        let output = output_path("camera");
        let trigger = ScriptedTrigger::new(1, Exhausted::Block);
        let mut runner = runner(ScriptedSource::new(true), trigger, &output, false);

        let outcome = runner.run(&CancellationToken::new()).await.unwrap();
        assert_eq!(outcome, RunOutcome::Completed { iterations: 1 });
        assert_eq!(runner.history()[1], RunState::AwaitingNextTrigger);
        assert_eq!(runner.state(), RunState::ShuttingDown);
        cleanup(&output);
    }

    #[tokio::test]
    async fn test_repeat_until_cancelled() {
        let output = output_path("repeat");
        let token = CancellationToken::new();
        let trigger = ScriptedTrigger::new(2, Exhausted::Cancel(token.clone()));
        let mut runner = runner(ScriptedSource::new(false), trigger, &output, true);

        let outcome = runner.run(&token).await;

        assert_eq!(outcome.unwrap(), RunOutcome::Interrupted { iterations: 3 });
        let processed = runner
            .history()
            .iter()
            .filter(|s| **s == RunState::Processing)
            .count();
        assert_eq!(processed, 3);
        assert_eq!(
            &runner.history()[runner.history().len() - 2..],
            &[RunState::AwaitingNextTrigger, RunState::ShuttingDown]
        );
        cleanup(&output);
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let output = output_path("precancel");
        let token = CancellationToken::new();
        token.cancel();
        let trigger = ScriptedTrigger::new(5, Exhausted::Block);
        let mut runner = runner(ScriptedSource::new(true), trigger, &output, true);

        let outcome = runner.run(&token).await.unwrap();
        assert_eq!(outcome, RunOutcome::Interrupted { iterations: 0 });
        assert!(!output.exists());
        cleanup(&output);
    }

    #[tokio::test]
    async fn test_closed_trigger_completes() {
        let output = output_path("closed");
        let trigger = ScriptedTrigger::new(1, Exhausted::Close);
        let mut runner = runner(ScriptedSource::new(false), trigger, &output, true);

        let outcome = runner.run(&CancellationToken::new()).await.unwrap();
        assert_eq!(outcome, RunOutcome::Completed { iterations: 2 });
        cleanup(&output);
    }

    #[tokio::test]
    async fn test_capture_failure_aborts_without_output() {
        let output = output_path("fail");
        let mut source = ScriptedSource::new(false);
        source.fail = true;
        let dropped = source.dropped.clone();
        let trigger = ScriptedTrigger::new(0, Exhausted::Block);
        let mut runner = runner(source, trigger, &output, true);

        let err = runner.run(&CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, RunError::Capture(ExtractError::InputUnavailable { .. })));
        assert_eq!(runner.state(), RunState::ShuttingDown);
        assert!(!output.exists());

        drop(runner);
        assert!(dropped.load(Ordering::SeqCst));
        cleanup(&output);
    }

    #[tokio::test]
    async fn test_interrupt_during_processing_writes_nothing() {
        let output = output_path("midprocess");
        let token = CancellationToken::new();
        let mut source = ScriptedSource::new(false);
        source.cancel_on_acquire = Some(token.clone());
        let trigger = ScriptedTrigger::new(0, Exhausted::Block);
        let mut runner = runner(source, trigger, &output, false);

        let outcome = runner.run(&token).await.unwrap();
        assert_eq!(outcome, RunOutcome::Interrupted { iterations: 0 });
        assert_eq!(
            &runner.history()[runner.history().len() - 2..],
            &[RunState::Processing, RunState::ShuttingDown]
        );

        // Give the detached conversion time to finish.
        tokio::time::sleep(std::time::Duration::from_millis(300)).await;
        assert!(!output.exists());
        cleanup(&output);
    }

    #[cfg(unix)]
    #[test]
    fn test_interrupt_while_input_held_open() {
        use std::os::unix::net::UnixStream;
        use std::time::{Duration, Instant};

        use crate::trigger::ManualTrigger;

        let output = output_path("heldopen");
        // The writer end stays open, so the reader thread blocks forever.
        let (reader, _writer) = UnixStream::pair().unwrap();
        let started = Instant::now();

        let rt = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .unwrap();
        let outcome = rt.block_on(async {
            let token = CancellationToken::new();
            let canceller = token.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                canceller.cancel();
            });
            let mut runner = Runner::new(
                ScriptedSource::new(true),
                ManualTrigger::new(reader),
                PlotSettings::default(),
                output.clone(),
                true,
            );
            tokio::time::timeout(Duration::from_secs(5), runner.run(&token)).await
        });
        drop(rt);

        let outcome = outcome.expect("run did not stop").unwrap();
        assert_eq!(outcome, RunOutcome::Interrupted { iterations: 0 });
        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(!output.exists());
        cleanup(&output);
    }
}
