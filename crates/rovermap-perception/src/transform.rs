//! Coordinate conversions between image, rover-centric, and world frames.
//!
//! Rover-centric coordinates put the origin at the rover (bottom-centre of
//! the rectified view), x pointing forward and y positive to the left.
//! World coordinates index the caller's fixed square occupancy grid.
//!
//! The world conversion applies, in this exact order: rotation by yaw,
//! scaling plus translation to the rover's position, rounding to the nearest
//! cell, and clipping into the grid.

use crate::image::BinaryMask;

// ────────────────────────────────────────────────────────────────────────────
// Point set types
// ────────────────────────────────────────────────────────────────────────────

/// Rover-centric coordinates of a mask's set pixels: two equal-length,
/// index-aligned sequences.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PixelSet {
    /// Forward distance from the rover, rectified-view pixels.
    pub x: Vec<f32>,
    /// Leftward distance from the rover, rectified-view pixels.
    pub y: Vec<f32>,
}

impl PixelSet {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

/// Polar form of a [`PixelSet`], one entry per point.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolarSet {
    /// Distance from the rover, rectified-view pixels.
    pub distances: Vec<f32>,
    /// Angle from the rover's forward axis, radians (left positive).
    pub angles: Vec<f32>,
}

impl PolarSet {
    pub fn len(&self) -> usize {
        self.distances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.distances.is_empty()
    }
}

/// World-grid cell coordinates, clipped into `[0, world_size - 1]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CellSet {
    pub x: Vec<usize>,
    pub y: Vec<usize>,
}

impl CellSet {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Conversions
// ────────────────────────────────────────────────────────────────────────────

/// Rover-centric coordinates of every set pixel in `mask`.
///
/// A set pixel at (row, col) becomes `x = |row - height|`,
/// `y = -(col - height)`.  Note that **both** axes are offset by the mask
/// height: the calibration footprint is a square region at the bottom-centre
/// of the view and the whole stack is calibrated with this convention, so it
/// is reproduced as-is.  A non-square mask therefore yields a laterally
/// shifted rover frame.
pub fn rover_coords(mask: &BinaryMask) -> PixelSet {
    let h = mask.height() as f32;
    let mut set = PixelSet::default();
    for (row, col) in mask.set_pixels() {
        set.x.push((row as f32 - h).abs());
        set.y.push(-(col as f32 - h));
    }
    set
}

/// Convert rover-centric points to (distance, angle) pairs.
pub fn to_polar(pixels: &PixelSet) -> PolarSet {
    let mut polar = PolarSet::default();
    for (&x, &y) in pixels.x.iter().zip(&pixels.y) {
        polar.distances.push((x * x + y * y).sqrt());
        polar.angles.push(y.atan2(x));
    }
    polar
}

/// Counter-clockwise 2D rotation by `yaw_deg` degrees.
#[inline]
pub fn rotate(x: f32, y: f32, yaw_deg: f32) -> (f32, f32) {
    let yaw = yaw_deg.to_radians();
    let (sin, cos) = yaw.sin_cos();
    (x * cos - y * sin, x * sin + y * cos)
}

/// Scale a rover-centric offset into map units and translate it to the
/// rover's position.
#[inline]
pub fn translate(x: f32, y: f32, pos_x: f32, pos_y: f32, scale: f32) -> (f32, f32) {
    (pos_x + x / scale, pos_y + y / scale)
}

/// Map rover-centric points into world-grid cells: rotate by yaw, scale and
/// translate to the rover's position, round to the nearest cell, clip into
/// `[0, world_size - 1]`.
pub fn pix_to_world(
    pixels: &PixelSet,
    pos_x: f32,
    pos_y: f32,
    yaw_deg: f32,
    world_size: usize,
    scale: f32,
) -> CellSet {
    let max = world_size as i64 - 1;
    let mut cells = CellSet::default();
    for (&x, &y) in pixels.x.iter().zip(&pixels.y) {
        let (xr, yr) = rotate(x, y, yaw_deg);
        let (xt, yt) = translate(xr, yr, pos_x, pos_y, scale);
        cells.x.push((xt.round() as i64).clamp(0, max) as usize);
        cells.y.push((yt.round() as i64).clamp(0, max) as usize);
    }
    cells
}
