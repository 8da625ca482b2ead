//! Canvas-space to machine-space coordinate mapping.
//!
//! Per axis: `device = ((max - 2 * border) / CANVAS_EXTENT) * canvas + border`,
//! rounded half away from zero to 3 decimals. No clamping is applied.

use crate::CANVAS_EXTENT;
use crate::machine::{MachineProfile, ZPolicy};

/// A mapped point in machine units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DevicePoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

/// Round half away from zero to 3 decimal places.
pub fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}

/// Linear canvas-to-machine transform for one profile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateMapper {
    scale_x: f64,
    scale_y: f64,
    border_x: f64,
    border_y: f64,
    z_policy: ZPolicy,
}

impl CoordinateMapper {
    pub fn new(profile: &MachineProfile) -> Self {
        Self {
            scale_x: (profile.max_x - 2.0 * profile.border_x) / CANVAS_EXTENT,
            scale_y: (profile.max_y - 2.0 * profile.border_y) / CANVAS_EXTENT,
            border_x: profile.border_x,
            border_y: profile.border_y,
            z_policy: profile.effective_z_policy(),
        }
    }

    fn axis_params(&self, axis: Axis) -> (f64, f64) {
        match axis {
            Axis::X => (self.scale_x, self.border_x),
            Axis::Y => (self.scale_y, self.border_y),
        }
    }

    /// Map one canvas coordinate, rounded.
    pub fn map_axis(&self, axis: Axis, canvas: f64) -> f64 {
        let (scale, border) = self.axis_params(axis);
        round3(scale * canvas + border)
    }

    /// Map a canvas point, deriving Z from the profile's effective policy.
    pub fn map_point(&self, x: f64, y: f64) -> DevicePoint {
        let x = self.map_axis(Axis::X, x);
        let y = self.map_axis(Axis::Y, y);
        let z = match self.z_policy {
            ZPolicy::Flat => 0.0,
            ZPolicy::MirrorY => y,
        };
        DevicePoint { x, y, z }
    }

    /// Inverse of [`map_axis`](Self::map_axis), before rounding.
    ///
    /// `None` when the axis has no drawable span.
    pub fn to_canvas(&self, axis: Axis, device: f64) -> Option<f64> {
        let (scale, border) = self.axis_params(axis);
        if scale == 0.0 {
            return None;
        }
        Some((device - border) / scale)
    }
}
