//! Single lines of a motion script.
//!
//! Line formats:
//! - motion:    `G0 X<num> Y<num> Z<num>`
//! - feed rate: `M203 X<rate> Y<rate> Z<rate>`
//! - bed shake: `G0 Z0` / `G0 Z1`

use std::fmt;

use crate::mapper::DevicePoint;

/// Number of lines in the bed-agitation burst.
pub const BED_SHAKE_COUNT: usize = 25;

/// The two Z positions the bed oscillates between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShakeLevel {
    Low,
    High,
}

impl ShakeLevel {
    pub fn z(self) -> u8 {
        match self {
            Self::Low => 0,
            Self::High => 1,
        }
    }
}

/// One line of the output stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DeviceCommand {
    /// Rapid move to a mapped point.
    Move(DevicePoint),
    /// Maximum feed rate on all axes.
    FeedRate(u32),
    /// One step of the bed-agitation burst.
    Shake(ShakeLevel),
}

impl DeviceCommand {
    pub fn is_move(&self) -> bool {
        matches!(self, Self::Move(_))
    }
}

impl fmt::Display for DeviceCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Move(p) => write!(
                f,
                "G0 X{} Y{} Z{}",
                format_decimal(p.x),
                format_decimal(p.y),
                format_decimal(p.z)
            ),
            Self::FeedRate(rate) => write!(f, "M203 X{rate} Y{rate} Z{rate}"),
            Self::Shake(level) => write!(f, "G0 Z{}", level.z()),
        }
    }
}

/// Shortest decimal text for `v`, always with a fractional part (`274.0`).
pub fn format_decimal(v: f64) -> String {
    let text = v.to_string();
    if !v.is_finite() || text.contains('.') {
        text
    } else {
        format!("{text}.0")
    }
}
