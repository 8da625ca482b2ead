//! Frame sources: an image file on disk, or a still from an external
//! webcam capture command.

use std::future::Future;
use std::path::{Path, PathBuf};

use path_extract::{Canvas, ExtractError, canvas_from_bytes, load_canvas};
use tokio::process::Command;

use crate::RunError;
use crate::config::AppConfig;
use crate::config::defaults::CAPTURE_PATH_PLACEHOLDER;

/// Something that yields one binarized canvas per acquisition.
pub trait FrameSource {
    fn describe(&self) -> String;

    /// Whether the operator should confirm before the first capture.
    fn needs_trigger(&self) -> bool;

    fn acquire(&mut self) -> impl Future<Output = Result<Canvas, RunError>>;
}

/// Reloads the same image file on every acquisition.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl FrameSource for FileSource {
    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }

    fn needs_trigger(&self) -> bool {
        false
    }

    async fn acquire(&mut self) -> Result<Canvas, RunError> {
        let path = self.path.clone();
        let canvas = tokio::task::spawn_blocking(move || load_canvas(&path))
            .await
            .map_err(|e| RunError::Task(e.to_string()))??;
        Ok(canvas)
    }
}

/// Removes a capture file when dropped.
#[derive(Debug)]
pub struct CameraSession {
    path: PathBuf,
}

impl CameraSession {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for CameraSession {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "Removed capture file"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("Failed to remove capture file {}: {e}", self.path.display()),
        }
    }
}

/// Captures a still through an external command such as `fswebcam`.
#[derive(Debug, Clone)]
pub struct CameraSource {
    command: String,
    capture_dir: PathBuf,
}

impl CameraSource {
    pub fn new(command: impl Into<String>, capture_dir: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
            capture_dir: capture_dir.into(),
        }
    }

    fn next_capture_path(&self) -> PathBuf {
        let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S%.3f");
        self.capture_dir.join(format!("capture-{stamp}.jpg"))
    }
}

/// Split a capture command line and substitute the output path.
pub fn build_command(template: &str, path: &Path) -> Result<Vec<String>, RunError> {
    let path = path.to_string_lossy();
    let argv: Vec<String> = template
        .split_whitespace()
        .map(|token| token.replace(CAPTURE_PATH_PLACEHOLDER, &path))
        .collect();
    if argv.is_empty() {
        return Err(RunError::CaptureCommand("capture command is empty".into()));
    }
    Ok(argv)
}

impl FrameSource for CameraSource {
    fn describe(&self) -> String {
        format!("camera ({})", self.command)
    }

    fn needs_trigger(&self) -> bool {
        true
    }

    async fn acquire(&mut self) -> Result<Canvas, RunError> {
        tokio::fs::create_dir_all(&self.capture_dir)
            .await
            .map_err(|e| {
                RunError::CaptureCommand(format!(
                    "cannot create {}: {e}",
                    self.capture_dir.display()
                ))
            })?;

        let session = CameraSession::new(self.next_capture_path());
        let argv = build_command(&self.command, session.path())?;
        tracing::debug!(command = %argv.join(" "), "Capturing frame");

        let output = Command::new(&argv[0])
            .args(&argv[1..])
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| RunError::CaptureCommand(format!("{}: {e}", argv[0])))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RunError::CaptureCommand(format!(
                "{} exited with {}: {}",
                argv[0],
                output.status,
                stderr.trim()
            )));
        }

        let source_name = session.path().display().to_string();
        let bytes = tokio::fs::read(session.path()).await.map_err(|e| {
            ExtractError::InputUnavailable {
                source_name: source_name.clone(),
                reason: e.to_string(),
            }
        })?;
        let canvas = tokio::task::spawn_blocking(move || canvas_from_bytes(&bytes, &source_name))
            .await
            .map_err(|e| RunError::Task(e.to_string()))??;
        tracing::info!(path = %session.path().display(), "Captured frame");
        Ok(canvas)
    }
}

/// The frame sources a run can use.
#[derive(Debug, Clone)]
pub enum Source {
    File(FileSource),
    Camera(CameraSource),
}

impl Source {
    /// File input when one was given, the camera otherwise.
    pub fn from_config(config: &AppConfig) -> Self {
        match &config.options.input {
            Some(path) => Self::File(FileSource::new(path)),
            None => Self::Camera(CameraSource::new(
                config.capture_command.clone(),
                config.capture_dir(),
            )),
        }
    }
}

impl FrameSource for Source {
    fn describe(&self) -> String {
        match self {
            Self::File(s) => s.describe(),
            Self::Camera(s) => s.describe(),
        }
    }

    fn needs_trigger(&self) -> bool {
        match self {
            Self::File(s) => s.needs_trigger(),
            Self::Camera(s) => s.needs_trigger(),
        }
    }

    async fn acquire(&mut self) -> Result<Canvas, RunError> {
        match self {
            Self::File(s) => s.acquire().await,
            Self::Camera(s) => s.acquire().await,
        }
    }
}
