//! Tissue-vs-background segmentation.
//!
//! Stained tissue is saturated (pinks and purples) while the glass
//! background scans as near-white, so the HSV saturation channel separates
//! the two cleanly. A global Otsu threshold over that channel picks the cut
//! point that minimizes intra-class variance: no per-slide tuning needed.

use image::{GrayImage, Luma, RgbImage};
use imageproc::contrast::{otsu_level, threshold};
use palette::{FromColor, Hsv, Srgb};
use tracing::debug;

use crate::mask::Mask;

/// Segment tissue from background in a slide thumbnail.
///
/// Pixels strictly above the Otsu level are tissue ("on"). A constant-valued
/// input has no variance to split, and yields an all-off mask.
pub fn segment_tissue(thumbnail: &RgbImage) -> Mask {
    let saturation = saturation_channel(thumbnail);

    let (min, max) = saturation
        .iter()
        .fold((u8::MAX, u8::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    if min == max {
        return Mask::blank(saturation.width(), saturation.height());
    }

    let level = otsu_level(&saturation);
    debug!("otsu saturation threshold: {level}");
    Mask::from_gray(threshold(&saturation, level))
}

/// Extract the HSV saturation channel as an 8-bit grayscale image.
pub fn saturation_channel(rgb: &RgbImage) -> GrayImage {
    GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
        let p = rgb.get_pixel(x, y);
        let hsv: Hsv = Hsv::from_color(Srgb::new(p.0[0], p.0[1], p.0[2]).into_format::<f32>());
        Luma([(hsv.saturation * 255.0).round() as u8])
    })
}
