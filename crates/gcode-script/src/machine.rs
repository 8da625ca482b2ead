//! Machine geometry and output options.
//!
//! A profile is immutable once built and is handed to the mapper and
//! emitter explicitly.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ScriptError;

/// How the Z coordinate of a motion command is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ZPolicy {
    /// Z repeats the mapped Y value.
    #[default]
    MirrorY,
    /// Z is pinned to `0`.
    Flat,
}

impl fmt::Display for ZPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MirrorY => f.write_str("mirror-y"),
            Self::Flat => f.write_str("flat"),
        }
    }
}

impl FromStr for ZPolicy {
    type Err = ScriptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mirror-y" | "mirror_y" | "mirror" => Ok(Self::MirrorY),
            "flat" | "zero" => Ok(Self::Flat),
            other => Err(ScriptError::UnknownZPolicy(other.to_string())),
        }
    }
}

/// Travel limits, margins and output switches of the target machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineProfile {
    /// Maximum X travel in machine units.
    pub max_x: f64,
    /// Maximum Y travel in machine units.
    pub max_y: f64,
    /// Margin kept clear on both X edges.
    pub border_x: f64,
    /// Margin kept clear on both Y edges.
    pub border_y: f64,
    /// Feed rate for the `M203` preamble line. `0` omits the line.
    pub initial_feed_rate: u32,
    /// Debug mode: Z is always flat.
    pub debug: bool,
    /// Z derivation outside debug mode.
    pub z_policy: ZPolicy,
}

impl Default for MachineProfile {
    fn default() -> Self {
        Self {
            max_x: 613.0,
            max_y: 548.0,
            border_x: 50.0,
            border_y: 50.0,
            initial_feed_rate: 5000,
            debug: false,
            z_policy: ZPolicy::MirrorY,
        }
    }
}

impl MachineProfile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: set travel limits.
    pub fn with_travel(mut self, max_x: f64, max_y: f64) -> Self {
        self.max_x = max_x;
        self.max_y = max_y;
        self
    }

    /// Builder: set margins.
    pub fn with_borders(mut self, border_x: f64, border_y: f64) -> Self {
        self.border_x = border_x;
        self.border_y = border_y;
        self
    }

    /// Builder: set the preamble feed rate.
    pub fn with_feed_rate(mut self, val: u32) -> Self {
        self.initial_feed_rate = val;
        self
    }

    /// Builder: set debug mode.
    pub fn with_debug(mut self, val: bool) -> Self {
        self.debug = val;
        self
    }

    /// Builder: set the Z policy.
    pub fn with_z_policy(mut self, val: ZPolicy) -> Self {
        self.z_policy = val;
        self
    }

    /// The policy actually applied: debug mode always flattens Z.
    pub fn effective_z_policy(&self) -> ZPolicy {
        if self.debug { ZPolicy::Flat } else { self.z_policy }
    }

    /// Margins that leave no drawable span on their axis.
    ///
    /// Mapping does not clamp, so these are reported rather than rejected.
    pub fn margin_warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.border_x * 2.0 >= self.max_x {
            warnings.push(format!(
                "border_x {} is not less than half of max_x {}",
                self.border_x, self.max_x
            ));
        }
        if self.border_y * 2.0 >= self.max_y {
            warnings.push(format!(
                "border_y {} is not less than half of max_y {}",
                self.border_y, self.max_y
            ));
        }
        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_profile() {
        let profile = MachineProfile::default();
        assert_eq!(profile.max_x, 613.0);
        assert_eq!(profile.max_y, 548.0);
        assert_eq!(profile.border_x, 50.0);
        assert_eq!(profile.border_y, 50.0);
        assert_eq!(profile.initial_feed_rate, 5000);
        assert!(!profile.debug);
        assert_eq!(profile.z_policy, ZPolicy::MirrorY);
    }

    #[test]
    fn test_builder_chain() {
        let profile = MachineProfile::new()
            .with_travel(300.0, 200.0)
            .with_borders(10.0, 20.0)
            .with_feed_rate(0)
            .with_debug(true)
            .with_z_policy(ZPolicy::Flat);

        assert_eq!((profile.max_x, profile.max_y), (300.0, 200.0));
        assert_eq!((profile.border_x, profile.border_y), (10.0, 20.0));
        assert_eq!(profile.initial_feed_rate, 0);
        assert!(profile.debug);
        assert_eq!(profile.z_policy, ZPolicy::Flat);
    }

    #[test]
    fn test_debug_forces_flat() {
        let profile = MachineProfile::new().with_z_policy(ZPolicy::MirrorY);
        assert_eq!(profile.effective_z_policy(), ZPolicy::MirrorY);
        assert_eq!(profile.with_debug(true).effective_z_policy(), ZPolicy::Flat);
    }

    #[test]
    fn test_margin_warnings() {
        assert!(MachineProfile::default().margin_warnings().is_empty());
        let bad = MachineProfile::new().with_borders(400.0, 274.0);
        assert_eq!(bad.margin_warnings().len(), 2);
    }

    #[test]
    fn test_z_policy_parse() {
        assert_eq!("flat".parse::<ZPolicy>().unwrap(), ZPolicy::Flat);
        assert_eq!("Mirror-Y".parse::<ZPolicy>().unwrap(), ZPolicy::MirrorY);
        assert!("tilt".parse::<ZPolicy>().is_err());
    }

    #[test]
    fn test_partial_json_profile_uses_defaults() {
        let profile: MachineProfile =
            serde_json::from_str(r#"{"max_x": 400, "z_policy": "flat"}"#).unwrap();
        assert_eq!(profile.max_x, 400.0);
        assert_eq!(profile.max_y, 548.0);
        assert_eq!(profile.z_policy, ZPolicy::Flat);
    }
}
