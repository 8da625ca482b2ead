//! Tracing setup: console output plus an optional JSON-lines log file.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub timestamp: String,
    pub level: String,
    pub target: String,
    pub message: String,
    pub fields: Map<String, Value>,
}

/// Appends one JSON object per event to a file.
pub struct FileLogLayer {
    file: Mutex<File>,
}

impl FileLogLayer {
    pub fn open(path: &Path) -> std::io::Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    fn write_entry(&self, entry: &LogEntry) {
        let Ok(line) = serde_json::to_string(entry) else {
            return;
        };
        let Ok(mut file) = self.file.lock() else {
            return;
        };
        let _ = writeln!(file, "{line}");
    }
}

impl<S> Layer<S> for FileLogLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        self.write_entry(&entry_from_event(event));
    }
}

fn entry_from_event(event: &Event<'_>) -> LogEntry {
    let meta = event.metadata();
    let mut entry = LogEntry {
        timestamp: chrono::Local::now().to_rfc3339(),
        level: meta.level().to_string().to_lowercase(),
        target: meta.target().to_string(),
        message: meta.name().to_string(),
        fields: Map::new(),
    };
    event.record(&mut EntryRecorder(&mut entry));
    entry
}

/// Writes event fields straight into a [`LogEntry`]; `message` replaces
/// the event name.
struct EntryRecorder<'a>(&'a mut LogEntry);

impl EntryRecorder<'_> {
    fn put(&mut self, field: &Field, value: impl Into<Value>) {
        match (field.name(), value.into()) {
            ("message", Value::String(text)) => self.0.message = text,
            ("message", other) => self.0.message = other.to_string(),
            (name, value) => {
                self.0.fields.insert(name.to_string(), value);
            }
        }
    }
}

impl Visit for EntryRecorder<'_> {
    fn record_u64(&mut self, field: &Field, value: u64) {
        self.put(field, value);
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.put(field, value);
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.put(field, value);
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.put(field, value);
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.put(field, value);
    }

    // Errors reach here through the default `record_error`.
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.put(field, format!("{value:?}"));
    }
}

/// Install the global subscriber. `RUST_LOG` overrides the `info` default.
pub fn init(log_file: Option<&Path>) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let file_layer = log_file.map(FileLogLayer::open).transpose()?;

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .try_init()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::Registry;

    #[test]
    fn test_file_layer_writes_json_lines() {
        let dir = std::env::temp_dir().join(format!("marble-log-{}", std::process::id()));
        let path = dir.join("nested").join("run.log");
        let layer = FileLogLayer::open(&path).unwrap();
        let subscriber = Registry::default().with(layer);

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(features = 3_u64, mode = "contour", "Script written");
            tracing::warn!(ratio = 0.5, path = ?"out.gcode", "Second line");
        });

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["level"], "info");
        assert_eq!(first["message"], "Script written");
        assert_eq!(first["fields"]["features"], 3);
        assert_eq!(first["fields"]["mode"], "contour");

        let second: Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["level"], "warn");
        assert_eq!(second["message"], "Second line");
        assert_eq!(second["fields"]["ratio"], 0.5);
        assert_eq!(second["fields"]["path"], "\"out.gcode\"");

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
