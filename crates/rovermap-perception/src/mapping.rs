//! World-frame occupancy accumulation.
//!
//! The [`WorldMap`] is the one piece of state that outlives a frame: a
//! caller-owned square grid with three independent per-cell counters
//! (obstacle, rock, navigable).  The pipeline never mutates it directly;
//! each frame produces a [`MapDelta`] that the caller merges via
//! [`WorldMap::apply`].  Counters only ever grow — unbounded growth over a
//! long run is an accepted characteristic of the accumulator.
//!
//! Accumulation is gated on attitude: a frame captured while the rover is
//! tilted projects distorted geometry, so its delta is discarded (the
//! diagnostic overlay and steering output are still produced).

use rovermap_types::{AttitudeTolerances, RoverPose};

use crate::transform::CellSet;

// ────────────────────────────────────────────────────────────────────────────
// Channels
// ────────────────────────────────────────────────────────────────────────────

/// The three accumulator channels of the world map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapChannel {
    Obstacle,
    Rock,
    Navigable,
}

impl MapChannel {
    /// Channel index, matching the overlay image channel assignment.
    #[inline]
    pub fn index(self) -> usize {
        match self {
            MapChannel::Obstacle => 0,
            MapChannel::Rock => 1,
            MapChannel::Navigable => 2,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// MapDelta
// ────────────────────────────────────────────────────────────────────────────

/// One frame's worth of map increments: per-channel lists of world cells to
/// bump by 1.  A cell appearing twice is incremented twice.  An empty delta
/// means the attitude gate rejected the frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MapDelta {
    pub obstacle: CellSet,
    pub rock: CellSet,
    pub navigable: CellSet,
}

impl MapDelta {
    pub fn is_empty(&self) -> bool {
        self.obstacle.is_empty() && self.rock.is_empty() && self.navigable.is_empty()
    }

    /// Total number of cell increments across all channels.
    pub fn len(&self) -> usize {
        self.obstacle.len() + self.rock.len() + self.navigable.len()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// WorldMap
// ────────────────────────────────────────────────────────────────────────────

/// Square world-frame occupancy grid with three `u32` counter channels.
///
/// Allocated once by the caller before the processing loop begins and
/// mutated in place by [`apply`][WorldMap::apply]; the perception core never
/// reallocates, resets, or decays it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorldMap {
    size: usize,
    channels: [Vec<u32>; 3],
}

impl WorldMap {
    /// Create an all-zero map of `world_size` × `world_size` cells.
    pub fn new(world_size: usize) -> Self {
        let cells = world_size * world_size;
        Self {
            size: world_size,
            channels: [vec![0; cells], vec![0; cells], vec![0; cells]],
        }
    }

    /// Side length of the grid, cells.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Read one channel's counter at world cell (x, y).
    #[inline]
    pub fn get(&self, channel: MapChannel, x: usize, y: usize) -> u32 {
        debug_assert!(x < self.size && y < self.size);
        self.channels[channel.index()][y * self.size + x]
    }

    /// Merge one frame's delta into the map, incrementing each listed cell
    /// by 1 on its channel.
    ///
    /// # Panics
    /// Panics if a cell lies outside the grid; deltas produced by the
    /// pipeline are always clipped into bounds.
    pub fn apply(&mut self, delta: &MapDelta) {
        for (channel, cells) in [
            (MapChannel::Obstacle, &delta.obstacle),
            (MapChannel::Rock, &delta.rock),
            (MapChannel::Navigable, &delta.navigable),
        ] {
            let grid = &mut self.channels[channel.index()];
            for (&x, &y) in cells.x.iter().zip(&cells.y) {
                grid[y * self.size + x] += 1;
            }
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Attitude gate
// ────────────────────────────────────────────────────────────────────────────

/// True when the rover is close enough to level for its projected geometry
/// to be trusted.
///
/// Pose angles are non-negative wrap-around degrees, so "near zero" is the
/// union of a window just above 0° and one just below 360°:
/// `pitch < tol || pitch > 360 − tol`, and likewise for roll.  Both axes
/// must pass.
pub fn attitude_within_tolerance(pose: &RoverPose, tol: &AttitudeTolerances) -> bool {
    let pitch_level = pose.pitch_deg < tol.pitch_deg || pose.pitch_deg > 360.0 - tol.pitch_deg;
    let roll_level = pose.roll_deg < tol.roll_deg || pose.roll_deg > 360.0 - tol.roll_deg;
    pitch_level && roll_level
}
