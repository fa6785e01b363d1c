//! `rovermap-types` – shared vocabulary of the rover mapping stack.
//!
//! Holds the plain-data types that cross crate boundaries: the rover's
//! [`RoverPose`], the named configuration structures consumed by the
//! perception pipeline, and the workspace-wide [`PerceptionError`].
//!
//! Every configuration field documents its unit (degrees, pixels, map
//! cells).  All configuration types are `serde`-serializable so a host
//! application can load them from a file, and each carries a `validate()`
//! that fails fast on programmer/configuration errors instead of letting
//! undefined numeric behaviour propagate into the per-frame pipeline.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ────────────────────────────────────────────────────────────────────────────
// Errors
// ────────────────────────────────────────────────────────────────────────────

/// Workspace-wide error type.  These are configuration/programmer errors,
/// reported synchronously; there is no recoverable failure path inside the
/// per-frame pipeline itself.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PerceptionError {
    /// The input (or an internal buffer) is zero-sized, or its dimensions do
    /// not match what the pipeline was configured for.
    #[error("invalid image shape: {width}x{height}")]
    InvalidImageShape { width: usize, height: usize },

    /// The calibration quadrilateral is degenerate (duplicate or collinear
    /// points), so no homography can be estimated from it.
    #[error("invalid calibration points: {reason}")]
    InvalidCalibrationPoints { reason: String },

    /// Scale or world size would cause a division by zero or an empty map.
    #[error("invalid scale parameters: scale={scale}, world_size={world_size}")]
    InvalidScale { scale: f32, world_size: usize },

    /// Pitch or roll outside `[0, 360)`; the attitude gate assumes
    /// non-negative wrap-around degrees.
    #[error("invalid attitude: {axis} = {value}\u{b0} (expected [0, 360))")]
    InvalidAttitude { axis: &'static str, value: f32 },
}

// ────────────────────────────────────────────────────────────────────────────
// RoverPose
// ────────────────────────────────────────────────────────────────────────────

/// The rover's pose at the instant a camera frame was captured.
///
/// The caller must supply the pose matching the same instant as the image;
/// a stale or out-of-order pose silently corrupts the world map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoverPose {
    /// X position in world map units (cells).
    pub x: f32,
    /// Y position in world map units (cells).
    pub y: f32,
    /// Heading, degrees counter-clockwise in `[0, 360)`.
    pub yaw_deg: f32,
    /// Tilt forward/backward, degrees in `[0, 360)` (0 = level).
    pub pitch_deg: f32,
    /// Tilt sideways, degrees in `[0, 360)` (0 = level).
    pub roll_deg: f32,
}

impl RoverPose {
    /// Check that pitch and roll use the non-negative wrap-around degree
    /// representation the attitude gate relies on.
    pub fn validate(&self) -> Result<(), PerceptionError> {
        for (axis, value) in [("pitch", self.pitch_deg), ("roll", self.roll_deg)] {
            if !(0.0..360.0).contains(&value) {
                return Err(PerceptionError::InvalidAttitude { axis, value });
            }
        }
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Configuration
// ────────────────────────────────────────────────────────────────────────────

/// Calibration for the perspective rectifier.
///
/// `source` is the camera-frame quadrilateral (pixels) that corresponds to a
/// known square patch of ground directly in front of the rover.  The matching
/// destination quadrilateral is derived from the image dimensions: a
/// `2*dst_size` wide square footprint centred at the image's horizontal
/// midpoint, `bottom_offset` pixels above the bottom edge.
///
/// Point order is bottom-left, bottom-right, top-right, top-left.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerspectiveConfig {
    /// Camera-frame calibration quadrilateral, pixels.
    pub source: [[f32; 2]; 4],
    /// Half-width of the rendered top-down footprint, pixels.
    pub dst_size: f32,
    /// Gap between the footprint and the bottom image edge, pixels.
    pub bottom_offset: f32,
}

impl Default for PerspectiveConfig {
    fn default() -> Self {
        Self {
            source: [[14.0, 140.0], [301.0, 140.0], [200.0, 96.0], [118.0, 96.0]],
            dst_size: 5.0,
            bottom_offset: 6.0,
        }
    }
}

impl PerspectiveConfig {
    /// Reject degenerate calibration: a quadrilateral with duplicate or
    /// collinear points cannot define a homography.
    pub fn validate(&self) -> Result<(), PerceptionError> {
        if self.dst_size <= 0.0 || !self.dst_size.is_finite() {
            return Err(PerceptionError::InvalidCalibrationPoints {
                reason: format!("dst_size must be positive, got {}", self.dst_size),
            });
        }
        if !self.bottom_offset.is_finite() {
            return Err(PerceptionError::InvalidCalibrationPoints {
                reason: "bottom_offset is not finite".to_string(),
            });
        }
        // Every triple of quadrilateral corners must span a non-zero area.
        for skip in 0..4 {
            let tri: Vec<[f32; 2]> = (0..4)
                .filter(|&i| i != skip)
                .map(|i| self.source[i])
                .collect();
            let area = (tri[1][0] - tri[0][0]) * (tri[2][1] - tri[0][1])
                - (tri[2][0] - tri[0][0]) * (tri[1][1] - tri[0][1]);
            if area.abs() < 1e-6 {
                return Err(PerceptionError::InvalidCalibrationPoints {
                    reason: format!(
                        "source corners {:?} are collinear or coincident",
                        tri
                    ),
                });
            }
        }
        Ok(())
    }
}

/// Per-channel colour thresholds for one terrain class.
///
/// A pixel belongs to the class iff, on every channel,
/// `value > lower && value <= upper`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdProfile {
    /// Exclusive lower bound per channel, intensity `[0, 255]`.
    pub lower: [u8; 3],
    /// Inclusive upper bound per channel, intensity `[0, 255]`.
    pub upper: [u8; 3],
}

impl ThresholdProfile {
    /// Navigable terrain: bright, roughly neutral ground.
    pub fn navigable() -> Self {
        Self {
            lower: [170, 160, 150],
            upper: [255, 255, 255],
        }
    }

    /// Rock sample: strong red/green with very little blue.
    pub fn rock() -> Self {
        Self {
            lower: [120, 120, 0],
            upper: [255, 255, 50],
        }
    }

    /// Per-pixel class predicate, `> lower` / `<= upper` on every channel.
    #[inline]
    pub fn matches(&self, px: [u8; 3]) -> bool {
        (0..3).all(|c| px[c] > self.lower[c] && px[c] <= self.upper[c])
    }
}

/// Geometry of the persistent world map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapConfig {
    /// Side length of the square world grid, cells.
    pub world_size: usize,
    /// Rover-frame pixels per world map cell.
    pub scale: f32,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            world_size: 200,
            scale: 10.0,
        }
    }
}

impl MapConfig {
    /// `scale == 0` would divide by zero in the rover-to-world translation;
    /// `world_size == 0` leaves nothing to clip into.
    pub fn validate(&self) -> Result<(), PerceptionError> {
        if self.world_size == 0 || self.scale == 0.0 || !self.scale.is_finite() {
            return Err(PerceptionError::InvalidScale {
                scale: self.scale,
                world_size: self.world_size,
            });
        }
        Ok(())
    }
}

/// How far from level the rover may tilt before map accumulation is skipped.
///
/// Both are half-window widths around 0°/360°: pitch passes when
/// `pitch < pitch_deg || pitch > 360 - pitch_deg` (angles are represented as
/// non-negative wrap-around degrees), and likewise for roll.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttitudeTolerances {
    /// Pitch tolerance, degrees.
    pub pitch_deg: f32,
    /// Roll tolerance, degrees.
    pub roll_deg: f32,
}

impl Default for AttitudeTolerances {
    fn default() -> Self {
        Self {
            pitch_deg: 1.0,
            roll_deg: 1.5,
        }
    }
}

/// Complete configuration of the perception pipeline, fixed for a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerceptionConfig {
    pub perspective: PerspectiveConfig,
    /// Threshold profile for navigable terrain.
    pub navigable: ThresholdProfile,
    /// Threshold profile for rock samples.
    pub rock: ThresholdProfile,
    pub map: MapConfig,
    pub attitude: AttitudeTolerances,
}

impl Default for PerceptionConfig {
    fn default() -> Self {
        Self {
            perspective: PerspectiveConfig::default(),
            navigable: ThresholdProfile::navigable(),
            rock: ThresholdProfile::rock(),
            map: MapConfig::default(),
            attitude: AttitudeTolerances::default(),
        }
    }
}

impl PerceptionConfig {
    /// Validate every sub-configuration, failing on the first problem.
    pub fn validate(&self) -> Result<(), PerceptionError> {
        self.perspective.validate()?;
        self.map.validate()?;
        Ok(())
    }
}
