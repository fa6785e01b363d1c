//! Colour classification of the rectified top-down view.
//!
//! Each terrain class is a per-channel threshold window evaluated uniformly
//! over every pixel: the pixel belongs to the class iff, on all three
//! channels, `value > lower && value <= upper`.  The obstacle mask is not a
//! threshold of its own; it is defined as the exact complement of the
//! navigable mask over the same rectified frame.

use rovermap_types::ThresholdProfile;

use crate::image::{BinaryMask, RgbImage};

/// Threshold `img` into a binary mask using `profile`'s per-channel window.
pub fn color_threshold(img: &RgbImage, profile: &ThresholdProfile) -> BinaryMask {
    let mut mask = BinaryMask::new(img.width(), img.height());
    for y in 0..img.height() {
        for x in 0..img.width() {
            mask.set(x, y, profile.matches(img.pixel(x, y)));
        }
    }
    mask
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_pixel(px: [u8; 3]) -> RgbImage {
        RgbImage::filled(1, 1, px)
    }

    #[test]
    fn navigable_terrain_scenarios() {
        let profile = ThresholdProfile::navigable();
        let bright = color_threshold(&single_pixel([200, 200, 200]), &profile);
        assert_eq!(bright.get(0, 0), 1);

        let dark = color_threshold(&single_pixel([100, 100, 100]), &profile);
        assert_eq!(dark.get(0, 0), 0);
    }

    #[test]
    fn rock_sample_scenarios() {
        let profile = ThresholdProfile::rock();
        let rock = color_threshold(&single_pixel([200, 200, 30]), &profile);
        assert_eq!(rock.get(0, 0), 1);

        // Blue channel exceeds the 50 upper bound.
        let not_rock = color_threshold(&single_pixel([200, 200, 100]), &profile);
        assert_eq!(not_rock.get(0, 0), 0);
    }

    #[test]
    fn boundary_semantics_per_channel() {
        let profile = ThresholdProfile {
            lower: [100, 110, 120],
            upper: [200, 210, 220],
        };
        // Exhaustive check one channel at a time, the other two mid-window.
        for c in 0..3 {
            let mut at_lower = [150, 160, 170];
            at_lower[c] = profile.lower[c];
            let mut above_lower = at_lower;
            above_lower[c] = profile.lower[c] + 1;
            let mut at_upper = at_lower;
            at_upper[c] = profile.upper[c];
            let mut above_upper = at_lower;
            above_upper[c] = profile.upper[c] + 1;

            let classify =
                |px| color_threshold(&single_pixel(px), &profile).get(0, 0);
            assert_eq!(classify(at_lower), 0, "channel {c}: lower is exclusive");
            assert_eq!(classify(above_lower), 1, "channel {c}: lower + 1 passes");
            assert_eq!(classify(at_upper), 1, "channel {c}: upper is inclusive");
            assert_eq!(classify(above_upper), 0, "channel {c}: upper + 1 fails");
        }
    }

    #[test]
    fn all_channels_must_pass() {
        let profile = ThresholdProfile::navigable();
        // Two channels pass, the third sits at its (exclusive) lower bound.
        let mask = color_threshold(&single_pixel([200, 200, 150]), &profile);
        assert_eq!(mask.get(0, 0), 0);
    }

    #[test]
    fn obstacle_mask_is_complement_of_navigable() {
        let mut img = RgbImage::new(3, 2);
        img.set_pixel(0, 0, [200, 200, 200]); // navigable
        img.set_pixel(1, 0, [90, 90, 90]); // dark ground
        img.set_pixel(2, 0, [255, 255, 255]); // navigable
        img.set_pixel(0, 1, [0, 0, 0]); // shadow
        img.set_pixel(1, 1, [171, 161, 151]); // just over the threshold
        img.set_pixel(2, 1, [170, 160, 150]); // exactly at it → obstacle

        let navigable = color_threshold(&img, &ThresholdProfile::navigable());
        let obstacle = navigable.complement();
        for y in 0..2 {
            for x in 0..3 {
                assert_eq!(obstacle.get(x, y), 1 - navigable.get(x, y));
            }
        }
        assert_eq!(navigable.count_set(), 3);
        assert_eq!(obstacle.count_set(), 3);
    }
}
