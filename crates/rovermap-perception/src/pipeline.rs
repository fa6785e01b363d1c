//! Per-frame perception step.
//!
//! [`PerceptionPipeline`] composes the rectifier, classifier, coordinate
//! transforms, and attitude gate into one synchronous function from
//! `{frame, pose}` to [`PerceptionOutput`].  The pipeline itself holds no
//! mutable state: the persistent [`WorldMap`][crate::mapping::WorldMap] is
//! caller-owned, and each frame's increments are returned as a
//! [`MapDelta`] for the caller to merge.
//!
//! Frames must be processed in capture order with the pose sampled at the
//! same instant as the image; a stale pose silently corrupts the map.

use tracing::debug;

use rovermap_types::{PerceptionConfig, PerceptionError, RoverPose};

use crate::classify::color_threshold;
use crate::image::RgbImage;
use crate::mapping::{MapChannel, MapDelta, attitude_within_tolerance};
use crate::rectify::PerspectiveRectifier;
use crate::transform::{PolarSet, pix_to_world, rover_coords, to_polar};

// ────────────────────────────────────────────────────────────────────────────
// Output
// ────────────────────────────────────────────────────────────────────────────

/// Everything one frame produces.
#[derive(Debug, Clone)]
pub struct PerceptionOutput {
    /// Diagnostic overlay, same resolution as the input frame: obstacle mask
    /// on channel 0, rock on channel 1, navigable terrain on channel 2, each
    /// scaled to full intensity.  Rebuilt every frame.
    pub overlay: RgbImage,
    /// World map increments for this frame.  Empty when the attitude gate
    /// rejected the frame; merge via
    /// [`WorldMap::apply`][crate::mapping::WorldMap::apply] otherwise.
    pub map_delta: MapDelta,
    /// Polar coordinates of this frame's navigable terrain, for the steering
    /// collaborator.  Frame-local; never accumulated.
    pub nav: PolarSet,
}

// ────────────────────────────────────────────────────────────────────────────
// PerceptionPipeline
// ────────────────────────────────────────────────────────────────────────────

/// The per-frame perception step: rectify, classify, project, gate.
///
/// Built once for a run from a validated [`PerceptionConfig`] and the fixed
/// camera resolution; [`process`][Self::process] is then called once per
/// frame.
#[derive(Debug, Clone)]
pub struct PerceptionPipeline {
    config: PerceptionConfig,
    rectifier: PerspectiveRectifier,
}

impl PerceptionPipeline {
    /// Validate `config` and build the rectifier for `frame_width` ×
    /// `frame_height` camera frames.
    pub fn new(
        config: PerceptionConfig,
        frame_width: usize,
        frame_height: usize,
    ) -> Result<Self, PerceptionError> {
        config.validate()?;
        let rectifier =
            PerspectiveRectifier::new(&config.perspective, frame_width, frame_height)?;
        Ok(Self { config, rectifier })
    }

    pub fn config(&self) -> &PerceptionConfig {
        &self.config
    }

    /// Process one camera frame.
    ///
    /// Always produces a fresh overlay and navigation polar output; the map
    /// delta is non-empty only when the rover was near-level at capture
    /// time.
    pub fn process(
        &self,
        image: &RgbImage,
        pose: &RoverPose,
    ) -> Result<PerceptionOutput, PerceptionError> {
        image.validate_shape()?;
        pose.validate()?;

        let rectified = self.rectifier.rectify(image)?;

        let navigable = color_threshold(&rectified, &self.config.navigable);
        let obstacle = navigable.complement();
        let rock = color_threshold(&rectified, &self.config.rock);

        let mut overlay = RgbImage::new(image.width(), image.height());
        overlay.fill_channel_from_mask(MapChannel::Obstacle.index(), &obstacle);
        overlay.fill_channel_from_mask(MapChannel::Rock.index(), &rock);
        overlay.fill_channel_from_mask(MapChannel::Navigable.index(), &navigable);

        let navigable_px = rover_coords(&navigable);

        let map_delta = if attitude_within_tolerance(pose, &self.config.attitude) {
            let map = &self.config.map;
            let to_world = |px| {
                pix_to_world(px, pose.x, pose.y, pose.yaw_deg, map.world_size, map.scale)
            };
            let delta = MapDelta {
                obstacle: to_world(&rover_coords(&obstacle)),
                rock: to_world(&rover_coords(&rock)),
                navigable: to_world(&navigable_px),
            };
            debug!(
                increments = delta.len(),
                "attitude within tolerance, accumulating map delta"
            );
            delta
        } else {
            debug!(
                pitch_deg = pose.pitch_deg,
                roll_deg = pose.roll_deg,
                "attitude outside tolerance, skipping map accumulation"
            );
            MapDelta::default()
        };

        let nav = to_polar(&navigable_px);

        Ok(PerceptionOutput {
            overlay,
            map_delta,
            nav,
        })
    }
}
