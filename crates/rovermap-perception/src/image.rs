//! Pixel buffers used throughout the pipeline.
//!
//! [`RgbImage`] is a row-major interleaved 3-channel `u8` buffer; it covers
//! both the camera frames the pipeline consumes and the diagnostic overlay it
//! produces.  [`BinaryMask`] is a single-channel grid constrained to {0, 1},
//! produced by the colour classifier and consumed by the coordinate
//! transforms.

use rovermap_types::PerceptionError;

/// Number of colour channels in every image this crate handles.
pub const CHANNELS: usize = 3;

// ────────────────────────────────────────────────────────────────────────────
// RgbImage
// ────────────────────────────────────────────────────────────────────────────

/// A 3-channel colour image, row-major with interleaved channels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbImage {
    data: Vec<u8>,
    width: usize,
    height: usize,
}

impl RgbImage {
    /// Create a zero-filled (black) image.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            data: vec![0; width * height * CHANNELS],
            width,
            height,
        }
    }

    /// Wrap an existing interleaved buffer.
    ///
    /// # Panics
    /// Panics if `data.len() != width * height * 3`.
    pub fn from_vec(width: usize, height: usize, data: Vec<u8>) -> Self {
        assert_eq!(
            data.len(),
            width * height * CHANNELS,
            "buffer length {} does not match {}x{}x{}",
            data.len(),
            width,
            height,
            CHANNELS,
        );
        Self {
            data,
            width,
            height,
        }
    }

    /// Create an image with every pixel set to `px`.
    pub fn filled(width: usize, height: usize, px: [u8; 3]) -> Self {
        let mut img = Self::new(width, height);
        for y in 0..height {
            for x in 0..width {
                img.set_pixel(x, y, px);
            }
        }
        img
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// True when the image holds no pixels at all.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Fail fast on a zero-sized frame; the rest of the pipeline assumes a
    /// non-empty image.
    pub fn validate_shape(&self) -> Result<(), PerceptionError> {
        if self.is_empty() {
            return Err(PerceptionError::InvalidImageShape {
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }

    #[inline]
    fn index(&self, x: usize, y: usize) -> usize {
        debug_assert!(x < self.width && y < self.height);
        (y * self.width + x) * CHANNELS
    }

    /// Read one channel of the pixel at (x, y).
    #[inline]
    pub fn get(&self, x: usize, y: usize, channel: usize) -> u8 {
        self.data[self.index(x, y) + channel]
    }

    /// Write one channel of the pixel at (x, y).
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, channel: usize, value: u8) {
        let idx = self.index(x, y) + channel;
        self.data[idx] = value;
    }

    /// Read the full pixel triple at (x, y).
    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> [u8; 3] {
        let idx = self.index(x, y);
        [self.data[idx], self.data[idx + 1], self.data[idx + 2]]
    }

    /// Write the full pixel triple at (x, y).
    #[inline]
    pub fn set_pixel(&mut self, x: usize, y: usize, px: [u8; 3]) {
        let idx = self.index(x, y);
        self.data[idx..idx + CHANNELS].copy_from_slice(&px);
    }

    /// Rewrite one channel from a binary mask scaled to full intensity
    /// (`1 → 255`, `0 → 0`).  Used to refresh the diagnostic overlay.
    ///
    /// # Panics
    /// Panics if the mask dimensions differ from the image's.
    pub fn fill_channel_from_mask(&mut self, channel: usize, mask: &BinaryMask) {
        assert_eq!(
            (mask.width(), mask.height()),
            (self.width, self.height),
            "mask dimensions must match image dimensions",
        );
        for y in 0..self.height {
            for x in 0..self.width {
                self.set(x, y, channel, mask.get(x, y) * 255);
            }
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// BinaryMask
// ────────────────────────────────────────────────────────────────────────────

/// A single-channel grid whose values are constrained to {0, 1}.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryMask {
    data: Vec<u8>,
    width: usize,
    height: usize,
}

impl BinaryMask {
    /// Create an all-zero mask.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            data: vec![0; width * height],
            width,
            height,
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        debug_assert!(x < self.width && y < self.height);
        self.data[y * self.width + x]
    }

    /// Set the pixel at (x, y) to 1 (`true`) or 0 (`false`).
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: bool) {
        debug_assert!(x < self.width && y < self.height);
        self.data[y * self.width + x] = value as u8;
    }

    /// Exact pixel-wise complement: `1 − v` everywhere.
    pub fn complement(&self) -> BinaryMask {
        BinaryMask {
            data: self.data.iter().map(|&v| 1 - v).collect(),
            width: self.width,
            height: self.height,
        }
    }

    /// Number of set pixels.
    pub fn count_set(&self) -> usize {
        self.data.iter().filter(|&&v| v == 1).count()
    }

    /// Iterate over the set pixels as `(row, col)`, row-major order.
    pub fn set_pixels(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..self.height).flat_map(move |row| {
            (0..self.width)
                .filter(move |&col| self.data[row * self.width + col] == 1)
                .map(move |col| (row, col))
        })
    }
}
