//! What the runner waits on between captures: ENTER on stdin, or a button
//! wired to a GPIO value file.

use std::future::Future;
use std::io::{BufRead, BufReader, Read, Stdin};
use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use crate::RunError;
use crate::config::{AppConfig, TriggerKind};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(20);

const LINE_QUEUE_CAPACITY: usize = 8;

pub trait TriggerSource {
    fn describe(&self) -> String;

    /// Resolve once the operator asks for the next capture.
    fn wait(&mut self) -> impl Future<Output = Result<(), RunError>>;
}

/// Waits for a line on a reader, normally stdin.
///
/// Lines are read on a dedicated OS thread that feeds a channel, so an
/// abandoned wait never holds the runtime open on a blocking read.
pub struct ManualTrigger<R> {
    reader: Option<R>,
    lines: Option<mpsc::Receiver<std::io::Result<()>>>,
}

impl ManualTrigger<Stdin> {
    pub fn stdin() -> Self {
        Self::new(std::io::stdin())
    }
}

impl<R> ManualTrigger<R>
where
    R: Read + Send + 'static,
{
    /// The reader thread starts on the first wait.
    pub fn new(reader: R) -> Self {
        Self {
            reader: Some(reader),
            lines: None,
        }
    }

    fn lines(&mut self) -> Result<&mut mpsc::Receiver<std::io::Result<()>>, RunError> {
        if let Some(reader) = self.reader.take() {
            self.lines = Some(spawn_line_reader(reader)?);
        }
        self.lines.as_mut().ok_or(RunError::TriggerClosed)
    }
}

/// One message per line; the channel closes at EOF or after a read error.
fn spawn_line_reader<R>(reader: R) -> Result<mpsc::Receiver<std::io::Result<()>>, RunError>
where
    R: Read + Send + 'static,
{
    let (tx, rx) = mpsc::channel(LINE_QUEUE_CAPACITY);
    std::thread::Builder::new()
        .name("trigger-lines".into())
        .spawn(move || {
            for line in BufReader::new(reader).lines() {
                let failed = line.is_err();
                if tx.blocking_send(line.map(drop)).is_err() || failed {
                    break;
                }
            }
        })
        .map_err(RunError::Trigger)?;
    Ok(rx)
}

impl<R> TriggerSource for ManualTrigger<R>
where
    R: Read + Send + 'static,
{
    fn describe(&self) -> String {
        "manual (ENTER)".into()
    }

    async fn wait(&mut self) -> Result<(), RunError> {
        let lines = self.lines()?;
        tracing::info!("Press ENTER to capture the next drawing");
        match lines.recv().await {
            Some(line) => line.map_err(RunError::Trigger),
            None => Err(RunError::TriggerClosed),
        }
    }
}

/// Polls a sysfs-style GPIO value file and fires on a falling edge (1 then 0).
#[derive(Debug, Clone)]
pub struct EdgeTrigger {
    path: PathBuf,
    poll_interval: Duration,
    last: Option<bool>,
}

impl EdgeTrigger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            last: None,
        }
    }

    /// Builder: set the polling period.
    pub fn with_poll_interval(mut self, val: Duration) -> Self {
        self.poll_interval = val;
        self
    }

    /// Current line level. `None` while the file is empty.
    async fn read_level(&self) -> Result<Option<bool>, RunError> {
        let text = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(RunError::Trigger)?;
        match text.trim() {
            "" => Ok(None),
            "1" => Ok(Some(true)),
            "0" => Ok(Some(false)),
            other => Err(RunError::Trigger(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("unexpected GPIO value `{other}` in {}", self.path.display()),
            ))),
        }
    }
}

impl TriggerSource for EdgeTrigger {
    fn describe(&self) -> String {
        format!("gpio {}", self.path.display())
    }

    async fn wait(&mut self) -> Result<(), RunError> {
        tracing::info!(path = %self.path.display(), "Waiting for button press");
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            let Some(level) = self.read_level().await? else {
                continue;
            };
            let previous = self.last.replace(level);
            if previous == Some(true) && !level {
                tracing::debug!("Falling edge detected");
                return Ok(());
            }
        }
    }
}

/// The triggers a run can use.
pub enum Trigger {
    Manual(ManualTrigger<Stdin>),
    Edge(EdgeTrigger),
}

impl Trigger {
    pub fn from_config(config: &AppConfig) -> Self {
        match config.options.trigger {
            TriggerKind::Manual => Self::Manual(ManualTrigger::stdin()),
            TriggerKind::Gpio => Self::Edge(EdgeTrigger::new(config.gpio_value_path.clone())),
        }
    }
}

impl TriggerSource for Trigger {
    fn describe(&self) -> String {
        match self {
            Self::Manual(t) => t.describe(),
            Self::Edge(t) => t.describe(),
        }
    }

    async fn wait(&mut self) -> Result<(), RunError> {
        match self {
            Self::Manual(t) => t.wait().await,
            Self::Edge(t) => t.wait().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gpio_file(name: &str, initial: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("marble-gpio-{name}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("value");
        std::fs::write(&path, initial).unwrap();
        path
    }

    fn cleanup(path: &PathBuf) {
        if let Some(dir) = path.parent() {
            std::fs::remove_dir_all(dir).unwrap();
        }
    }

    #[tokio::test]
    async fn test_manual_trigger_lines_then_eof() {
        let mut trigger = ManualTrigger::new(&b"\nnext\n"[..]);
        trigger.wait().await.unwrap();
        trigger.wait().await.unwrap();
        assert!(matches!(trigger.wait().await, Err(RunError::TriggerClosed)));
    }

    #[tokio::test]
    async fn test_edge_trigger_fires_on_falling_edge() {
        let path = gpio_file("fall", "1\n");
        let mut trigger = EdgeTrigger::new(&path).with_poll_interval(Duration::from_millis(5));

        let press = async {
            tokio::time::sleep(Duration::from_millis(60)).await;
            std::fs::write(&path, "0\n").unwrap();
        };
        let (result, ()) = tokio::join!(
            tokio::time::timeout(Duration::from_secs(5), trigger.wait()),
            press
        );
        assert!(result.expect("trigger timed out").is_ok());
        cleanup(&path);
    }

    #[tokio::test]
    async fn test_edge_trigger_ignores_held_button() {
        // Already low when waiting starts: no edge yet.
        let path = gpio_file("held", "0\n");
        let mut trigger = EdgeTrigger::new(&path).with_poll_interval(Duration::from_millis(5));
        let result = tokio::time::timeout(Duration::from_millis(100), trigger.wait()).await;
        assert!(result.is_err());
        cleanup(&path);
    }

    #[tokio::test]
    async fn test_edge_trigger_rejects_garbage() {
        let path = gpio_file("garbage", "high\n");
        let mut trigger = EdgeTrigger::new(&path).with_poll_interval(Duration::from_millis(5));
        assert!(matches!(trigger.wait().await, Err(RunError::Trigger(_))));
        cleanup(&path);
    }

    #[tokio::test]
    async fn test_edge_trigger_missing_file() {
        let mut trigger = EdgeTrigger::new("/nonexistent/gpio/value");
        assert!(matches!(trigger.wait().await, Err(RunError::Trigger(_))));
    }
}
