//! `rovermap-perception` – camera-to-map perception pipeline.
//!
//! Turns a single camera frame plus the rover's pose into a diagnostic
//! overlay image, an incremental update for the caller's persistent
//! world-frame occupancy map, and a polar summary of navigable terrain for
//! downstream steering.
//!
//! # Modules
//!
//! - [`image`] – [`RgbImage`][image::RgbImage] and
//!   [`BinaryMask`][image::BinaryMask] pixel buffers.
//! - [`rectify`] – [`PerspectiveRectifier`][rectify::PerspectiveRectifier]:
//!   warps the raw camera frame into a top-down view through a fixed
//!   calibration homography.
//! - [`classify`] – colour thresholding of the rectified frame into
//!   navigable/obstacle/rock masks.
//! - [`transform`] – rover-centric and world-frame coordinate conversions.
//! - [`mapping`] – [`WorldMap`][mapping::WorldMap] accumulator channels and
//!   the attitude gate.
//! - [`pipeline`] – [`PerceptionPipeline`][pipeline::PerceptionPipeline]:
//!   the per-frame entry point composing the stages above.

pub mod classify;
pub mod image;
pub mod mapping;
pub mod pipeline;
pub mod rectify;
pub mod transform;
