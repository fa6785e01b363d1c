//! Perspective rectification: raw camera frame → top-down ground view.
//!
//! A fixed calibration maps a known quadrilateral of ground in the camera
//! frame onto a small square footprint near the bottom-centre of the output.
//! The homography between the two quadrilaterals is estimated once per image
//! resolution; every frame is then warped through it.
//!
//! Output pixels whose pre-image falls outside the source frame become zero
//! (black background).

use nalgebra::{Matrix3, SMatrix, SVector, Vector3};
use rovermap_types::{PerceptionError, PerspectiveConfig};

use crate::image::{CHANNELS, RgbImage};

// ────────────────────────────────────────────────────────────────────────────
// Homography estimation
// ────────────────────────────────────────────────────────────────────────────

/// Project a 2D point through a 3×3 homography: `H * [x, y, 1]^T → [u, v]`.
pub fn project(h: &Matrix3<f64>, x: f64, y: f64) -> [f64; 2] {
    let p = h * Vector3::new(x, y, 1.0);
    if p[2].abs() < 1e-15 {
        return [f64::NAN, f64::NAN];
    }
    [p[0] / p[2], p[1] / p[2]]
}

/// Estimate the homography mapping one quadrilateral exactly onto another.
///
/// With exactly four correspondences the system is fully determined: fixing
/// `h33 = 1` leaves eight unknowns and eight equations, solved by LU
/// decomposition.  A degenerate (collinear/duplicate-point) quadrilateral
/// makes the system singular and is reported as
/// [`PerceptionError::InvalidCalibrationPoints`].
pub fn homography_from_quads(
    src: &[[f64; 2]; 4],
    dst: &[[f64; 2]; 4],
) -> Result<Matrix3<f64>, PerceptionError> {
    let mut a = SMatrix::<f64, 8, 8>::zeros();
    let mut b = SVector::<f64, 8>::zeros();

    for i in 0..4 {
        let [x, y] = src[i];
        let [u, v] = dst[i];

        // Row 2i:   [ x  y  1  0  0  0  -u*x  -u*y ] · h = u
        a[(2 * i, 0)] = x;
        a[(2 * i, 1)] = y;
        a[(2 * i, 2)] = 1.0;
        a[(2 * i, 6)] = -u * x;
        a[(2 * i, 7)] = -u * y;
        b[2 * i] = u;

        // Row 2i+1: [ 0  0  0  x  y  1  -v*x  -v*y ] · h = v
        a[(2 * i + 1, 3)] = x;
        a[(2 * i + 1, 4)] = y;
        a[(2 * i + 1, 5)] = 1.0;
        a[(2 * i + 1, 6)] = -v * x;
        a[(2 * i + 1, 7)] = -v * y;
        b[2 * i + 1] = v;
    }

    let h = a
        .lu()
        .solve(&b)
        .ok_or_else(|| PerceptionError::InvalidCalibrationPoints {
            reason: "quadrilaterals do not define a homography".to_string(),
        })?;

    Ok(Matrix3::new(
        h[0], h[1], h[2], //
        h[3], h[4], h[5], //
        h[6], h[7], 1.0,
    ))
}

// ────────────────────────────────────────────────────────────────────────────
// Warp
// ────────────────────────────────────────────────────────────────────────────

/// Bilinear sample of one channel at floating-point coordinates.  Neighbours
/// outside the image contribute zero, so regions with no pre-image fade to
/// black rather than clamping to the border.
fn sample_bilinear(img: &RgbImage, x: f64, y: f64, channel: usize) -> f64 {
    if !x.is_finite() || !y.is_finite() {
        return 0.0;
    }

    let x0 = x.floor();
    let y0 = y.floor();
    let fx = x - x0;
    let fy = y - y0;
    let (x0, y0) = (x0 as i64, y0 as i64);

    let fetch = |xi: i64, yi: i64| -> f64 {
        if xi < 0 || yi < 0 || xi >= img.width() as i64 || yi >= img.height() as i64 {
            0.0
        } else {
            img.get(xi as usize, yi as usize, channel) as f64
        }
    };

    let p00 = fetch(x0, y0);
    let p10 = fetch(x0 + 1, y0);
    let p01 = fetch(x0, y0 + 1);
    let p11 = fetch(x0 + 1, y0 + 1);

    (1.0 - fx) * (1.0 - fy) * p00
        + fx * (1.0 - fy) * p10
        + (1.0 - fx) * fy * p01
        + fx * fy * p11
}

fn warp_with_inverse(img: &RgbImage, h_inv: &Matrix3<f64>) -> RgbImage {
    let mut out = RgbImage::new(img.width(), img.height());
    for y in 0..img.height() {
        for x in 0..img.width() {
            let [sx, sy] = project(h_inv, x as f64, y as f64);
            for c in 0..CHANNELS {
                let v = sample_bilinear(img, sx, sy, c);
                out.set(x, y, c, v.round().clamp(0.0, 255.0) as u8);
            }
        }
    }
    out
}

/// Warp `img` through the homography `h` (source → destination), keeping the
/// input resolution.  Each output pixel is inverse-mapped into the source
/// frame and bilinearly sampled; pixels with no pre-image are zero.
pub fn warp_perspective(
    img: &RgbImage,
    h: &Matrix3<f64>,
) -> Result<RgbImage, PerceptionError> {
    let h_inv = h
        .try_inverse()
        .ok_or_else(|| PerceptionError::InvalidCalibrationPoints {
            reason: "homography is not invertible".to_string(),
        })?;
    Ok(warp_with_inverse(img, &h_inv))
}

// ────────────────────────────────────────────────────────────────────────────
// PerspectiveRectifier
// ────────────────────────────────────────────────────────────────────────────

/// Warps raw camera frames into the top-down ground view.
///
/// Built once per image resolution from a [`PerspectiveConfig`]; the
/// homography and its inverse are cached so per-frame work is the warp only.
#[derive(Debug, Clone)]
pub struct PerspectiveRectifier {
    h: Matrix3<f64>,
    h_inv: Matrix3<f64>,
    width: usize,
    height: usize,
}

impl PerspectiveRectifier {
    /// Destination quadrilateral for the given image dimensions: a
    /// `2*dst_size` square footprint centred at the horizontal midpoint,
    /// `bottom_offset` pixels above the bottom edge.  Corner order matches
    /// the calibration source (bottom-left, bottom-right, top-right,
    /// top-left).
    pub fn destination_quad(
        config: &PerspectiveConfig,
        width: usize,
        height: usize,
    ) -> [[f64; 2]; 4] {
        let (w, h) = (width as f64, height as f64);
        let d = config.dst_size as f64;
        let off = config.bottom_offset as f64;
        [
            [w / 2.0 - d, h - off],
            [w / 2.0 + d, h - off],
            [w / 2.0 + d, h - 2.0 * d - off],
            [w / 2.0 - d, h - 2.0 * d - off],
        ]
    }

    /// Build the rectifier for frames of `width`×`height` pixels.
    pub fn new(
        config: &PerspectiveConfig,
        width: usize,
        height: usize,
    ) -> Result<Self, PerceptionError> {
        config.validate()?;
        if width == 0 || height == 0 {
            return Err(PerceptionError::InvalidImageShape { width, height });
        }

        let src = config.source.map(|p| [p[0] as f64, p[1] as f64]);
        let dst = Self::destination_quad(config, width, height);

        let h = homography_from_quads(&src, &dst)?;
        let h_inv = h
            .try_inverse()
            .ok_or_else(|| PerceptionError::InvalidCalibrationPoints {
                reason: "homography is not invertible".to_string(),
            })?;

        Ok(Self {
            h,
            h_inv,
            width,
            height,
        })
    }

    /// The frame dimensions this rectifier was built for.
    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// The cached source → destination homography.
    pub fn homography(&self) -> &Matrix3<f64> {
        &self.h
    }

    /// Warp one camera frame into the top-down view.  The frame must match
    /// the dimensions the rectifier was built for.
    pub fn rectify(&self, img: &RgbImage) -> Result<RgbImage, PerceptionError> {
        if (img.width(), img.height()) != (self.width, self.height) {
            return Err(PerceptionError::InvalidImageShape {
                width: img.width(),
                height: img.height(),
            });
        }
        Ok(warp_with_inverse(img, &self.h_inv))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNIT_QUAD: [[f64; 2]; 4] = [[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0]];

    #[test]
    fn identical_quads_give_identity_homography() {
        let h = homography_from_quads(&UNIT_QUAD, &UNIT_QUAD).unwrap();
        for [x, y] in [[3.0, 7.0], [0.0, 0.0], [9.5, 1.5]] {
            let [u, v] = project(&h, x, y);
            assert!((u - x).abs() < 1e-9, "x: {u} vs {x}");
            assert!((v - y).abs() < 1e-9, "y: {v} vs {y}");
        }
    }

    #[test]
    fn homography_maps_corners_exactly() {
        let src = [[14.0, 140.0], [301.0, 140.0], [200.0, 96.0], [118.0, 96.0]];
        let dst = [[155.0, 154.0], [165.0, 154.0], [165.0, 144.0], [155.0, 144.0]];
        let h = homography_from_quads(&src, &dst).unwrap();
        for (s, d) in src.iter().zip(&dst) {
            let p = project(&h, s[0], s[1]);
            assert!((p[0] - d[0]).abs() < 1e-6, "{:?} -> {:?} vs {:?}", s, p, d);
            assert!((p[1] - d[1]).abs() < 1e-6);
        }
    }

    #[test]
    fn collinear_quad_is_rejected() {
        let degenerate = [[0.0, 0.0], [1.0, 0.0], [2.0, 0.0], [3.0, 0.0]];
        assert!(matches!(
            homography_from_quads(&degenerate, &UNIT_QUAD),
            Err(PerceptionError::InvalidCalibrationPoints { .. })
        ));
    }

    #[test]
    fn identity_warp_preserves_image() {
        let mut img = RgbImage::new(8, 6);
        for y in 0..6 {
            for x in 0..8 {
                img.set_pixel(x, y, [(x * 20) as u8, (y * 30) as u8, 7]);
            }
        }
        let warped = warp_perspective(&img, &Matrix3::identity()).unwrap();
        assert_eq!(warped, img);
    }

    #[test]
    fn translation_warp_shifts_and_zero_fills() {
        // H translates source +2 in x, so output(x, y) = input(x - 2, y).
        let h = Matrix3::new(
            1.0, 0.0, 2.0, //
            0.0, 1.0, 0.0, //
            0.0, 0.0, 1.0,
        );
        let img = RgbImage::filled(6, 4, [50, 60, 70]);
        let warped = warp_perspective(&img, &h).unwrap();

        for y in 0..4 {
            // Vacated columns have no pre-image.
            assert_eq!(warped.pixel(0, y), [0, 0, 0]);
            assert_eq!(warped.pixel(1, y), [0, 0, 0]);
            for x in 2..6 {
                assert_eq!(warped.pixel(x, y), [50, 60, 70]);
            }
        }
    }

    #[test]
    fn destination_quad_matches_footprint_geometry() {
        let config = PerspectiveConfig::default();
        let quad = PerspectiveRectifier::destination_quad(&config, 320, 160);
        assert_eq!(quad[0], [155.0, 154.0]); // bottom-left
        assert_eq!(quad[1], [165.0, 154.0]); // bottom-right
        assert_eq!(quad[2], [165.0, 144.0]); // top-right
        assert_eq!(quad[3], [155.0, 144.0]); // top-left
    }

    #[test]
    fn rectifier_maps_calibration_quad_onto_footprint() {
        let config = PerspectiveConfig::default();
        let rect = PerspectiveRectifier::new(&config, 320, 160).unwrap();
        let dst = PerspectiveRectifier::destination_quad(&config, 320, 160);
        for (s, d) in config.source.iter().zip(&dst) {
            let p = project(rect.homography(), s[0] as f64, s[1] as f64);
            assert!((p[0] - d[0]).abs() < 1e-6);
            assert!((p[1] - d[1]).abs() < 1e-6);
        }
    }

    #[test]
    fn rectifier_with_matching_quads_is_identity() {
        // Pick a source quad equal to the computed destination quad so the
        // homography collapses to the identity.
        let mut config = PerspectiveConfig {
            dst_size: 2.0,
            bottom_offset: 1.0,
            ..PerspectiveConfig::default()
        };
        let dst = PerspectiveRectifier::destination_quad(&config, 10, 10);
        config.source = dst.map(|p| [p[0] as f32, p[1] as f32]);

        let rect = PerspectiveRectifier::new(&config, 10, 10).unwrap();
        let img = RgbImage::filled(10, 10, [200, 180, 160]);
        let out = rect.rectify(&img).unwrap();
        assert_eq!(out, img);
    }

    #[test]
    fn rectifier_rejects_zero_sized_frames() {
        let config = PerspectiveConfig::default();
        assert!(matches!(
            PerspectiveRectifier::new(&config, 0, 160),
            Err(PerceptionError::InvalidImageShape { .. })
        ));
    }

    #[test]
    fn rectify_rejects_mismatched_frame() {
        let config = PerspectiveConfig::default();
        let rect = PerspectiveRectifier::new(&config, 320, 160).unwrap();
        let wrong = RgbImage::new(100, 100);
        assert!(matches!(
            rect.rectify(&wrong),
            Err(PerceptionError::InvalidImageShape {
                width: 100,
                height: 100,
            })
        ));
    }

    #[test]
    fn rectifier_rejects_degenerate_calibration() {
        let config = PerspectiveConfig {
            source: [[0.0, 0.0], [1.0, 1.0], [2.0, 2.0], [3.0, 3.0]],
            ..PerspectiveConfig::default()
        };
        assert!(matches!(
            PerspectiveRectifier::new(&config, 320, 160),
            Err(PerceptionError::InvalidCalibrationPoints { .. })
        ));
    }
}
