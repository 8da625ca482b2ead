//! Assembly of complete motion scripts.

use tracing::debug;

use crate::command::{BED_SHAKE_COUNT, DeviceCommand, ShakeLevel};
use crate::machine::MachineProfile;
use crate::mapper::DevicePoint;

/// Builds the command stream for one plot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandEmitter {
    feed_rate: u32,
    bed_shake: bool,
}

impl CommandEmitter {
    pub fn new(profile: &MachineProfile, bed_shake: bool) -> Self {
        Self {
            feed_rate: profile.initial_feed_rate,
            bed_shake,
        }
    }

    /// Commands emitted before any motion: the shake burst (if enabled),
    /// then the feed-rate line (if the rate is non-zero).
    pub fn preamble(&self) -> Vec<DeviceCommand> {
        let mut commands = Vec::new();
        if self.bed_shake {
            commands.extend(bed_shake_sequence());
        }
        if self.feed_rate != 0 {
            commands.push(DeviceCommand::FeedRate(self.feed_rate));
        }
        commands
    }

    /// Preamble followed by one move per point, in the given order.
    pub fn emit<I>(&self, points: I) -> Vec<DeviceCommand>
    where
        I: IntoIterator<Item = DevicePoint>,
    {
        let mut commands = self.preamble();
        commands.extend(points.into_iter().map(DeviceCommand::Move));
        debug!(
            bed_shake = self.bed_shake,
            feed_rate = self.feed_rate,
            lines = commands.len(),
            "Emitted command stream"
        );
        commands
    }
}

/// The agitation burst: `BED_SHAKE_COUNT` lines alternating low/high, starting low.
pub fn bed_shake_sequence() -> Vec<DeviceCommand> {
    (0..BED_SHAKE_COUNT)
        .map(|i| {
            let level = if i % 2 == 0 { ShakeLevel::Low } else { ShakeLevel::High };
            DeviceCommand::Shake(level)
        })
        .collect()
}

/// Newline-terminated script text.
pub fn render(commands: &[DeviceCommand]) -> String {
    let mut out = String::with_capacity(commands.len() * 32);
    for cmd in commands {
        out.push_str(&cmd.to_string());
        out.push('\n');
    }
    out
}

/// Line counts of a script, for logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScriptSummary {
    pub shake_lines: usize,
    pub feed_lines: usize,
    pub move_lines: usize,
}

impl ScriptSummary {
    pub fn from_commands(commands: &[DeviceCommand]) -> Self {
        commands.iter().fold(Self::default(), |mut acc, cmd| {
            match cmd {
                DeviceCommand::Shake(_) => acc.shake_lines += 1,
                DeviceCommand::FeedRate(_) => acc.feed_lines += 1,
                DeviceCommand::Move(_) => acc.move_lines += 1,
            }
            acc
        })
    }

    pub fn total(&self) -> usize {
        self.shake_lines + self.feed_lines + self.move_lines
    }
}
