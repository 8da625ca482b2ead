//! Motion-command scripts for plotting hardware.
//!
//! Maps canvas-space points into a machine's travel space and serializes
//! them as line-oriented G-code, with an optional bed-agitation burst and
//! feed-rate preamble.

pub mod command;
pub mod emitter;
pub mod machine;
pub mod mapper;

// Re-exports for convenience
pub use command::{BED_SHAKE_COUNT, DeviceCommand, ShakeLevel};
pub use emitter::{CommandEmitter, ScriptSummary, render};
pub use machine::{MachineProfile, ZPolicy};
pub use mapper::{Axis, CoordinateMapper, DevicePoint, round3};

/// Side length of the canvas that mapped points come from.
pub const CANVAS_EXTENT: f64 = 1000.0;

/// Errors from parsing script-level settings.
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("Unknown Z policy: {0} (expected mirror-y or flat)")]
    UnknownZPolicy(String),
}
