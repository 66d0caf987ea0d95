//! The sliding-window patch grid classifier.
//!
//! The slide is partitioned, at the extraction level, into a regular grid of
//! `patch_size` squares; trailing partial tiles at the right and bottom
//! edges are dropped. Every grid cell corresponds to a `step x step` block
//! of the (coarser) masks, and the fraction of that block that is "on"
//! decides the cell's fate:
//!
//! - necrosis ratio strictly above the necrosis threshold: **necrosis** patch
//! - else negative ratio strictly above the negative threshold *and* a
//!   necrosis ratio of exactly zero: **negative** patch
//! - else: discarded, nothing extracted, nothing marked
//!
//! The exact-zero guard is deliberate: a negative training example must
//! contain no necrotic tissue at all, or labels get contaminated near tumor
//! boundaries. The ratio is a sum of 8-bit pixels over `255 * step^2`, so it
//! is exactly 0.0 iff every necrosis pixel in the block is 0.

use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use tracing::debug;

use masking::Mask;
use slide::{SlideId, SlidePyramid};

use crate::config::PatchParams;
use crate::{PatchError, Result};

/// Marker color for necrosis cells on the overlay map.
pub const NECROSIS_MARKER: Rgb<u8> = Rgb([255, 0, 0]);

/// Marker color for negative cells on the overlay map.
pub const NEGATIVE_MARKER: Rgb<u8> = Rgb([255, 225, 0]);

/// Classification of a non-discarded grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatchClass {
    Necrosis,
    Negative,
}

impl PatchClass {
    pub fn marker_color(&self) -> Rgb<u8> {
        match self {
            Self::Necrosis => NECROSIS_MARKER,
            Self::Negative => NEGATIVE_MARKER,
        }
    }

    pub fn file_prefix(&self) -> &'static str {
        match self {
            Self::Necrosis => "nec",
            Self::Negative => "nega",
        }
    }
}

/// One extracted patch: grid coordinates, class, and the pixels read at the
/// extraction level.
#[derive(Debug, Clone)]
pub struct ExtractedPatch {
    pub class: PatchClass,
    /// Grid column, in units of `patch_size` at the extraction level.
    pub i: u32,
    /// Grid row.
    pub j: u32,
    pub image: RgbImage,
}

impl ExtractedPatch {
    /// Deterministic file name encoding role, slide, level and grid cell,
    /// e.g. `nec_TS-0042_1_w_14_h_9.png`.
    pub fn file_name(&self, id: &SlideId, level: u32) -> String {
        format!(
            "{}_{}_{}_w_{}_h_{}.png",
            self.class.file_prefix(),
            id,
            level,
            self.i,
            self.j
        )
    }
}

/// Scan the whole grid, extract every non-discarded cell's pixels and mark
/// its mask-space footprint on the overlay map.
///
/// Classification depends only on the masks and thresholds, so two runs over
/// identical inputs produce identical decisions and an identical overlay.
pub fn classify_grid<S: SlidePyramid>(
    slide: &S,
    necrosis: &Mask,
    negative: &Mask,
    overlay: &mut RgbImage,
    params: &PatchParams,
) -> Result<Vec<ExtractedPatch>> {
    params.validate()?;

    let mask_dims = necrosis.dimensions();
    if negative.dimensions() != mask_dims {
        return Err(PatchError::Masking(
            masking::MaskingError::DimensionMismatch {
                left: mask_dims,
                right: negative.dimensions(),
            },
        ));
    }

    let p = params.patch_size;
    let step = params.step();
    let scale = params.scale_to_level0();
    let (level_w, level_h) = slide.level_dimensions(params.level)?;

    // Trailing partial tiles are dropped. Level dimensions round down
    // independently per level, so the masks can run a pixel short of
    // level_w / downsample; bound the grid by both.
    let grid_w = (level_w / p).min(mask_dims.0 / step);
    let grid_h = (level_h / p).min(mask_dims.1 / step);

    let mut patches = Vec::new();
    for i in 0..grid_w {
        for j in 0..grid_h {
            let (mx, my) = (step * i, step * j);
            let necrosis_ratio = necrosis.block_ratio(mx, my, step);
            let negative_ratio = negative.block_ratio(mx, my, step);

            let class = if necrosis_ratio > params.necrosis_threshold {
                PatchClass::Necrosis
            } else if negative_ratio > params.negative_threshold && necrosis_ratio == 0.0 {
                PatchClass::Negative
            } else {
                continue;
            };

            let image = slide.read_region((p * i * scale, p * j * scale), params.level, (p, p))?;
            draw_hollow_rect_mut(
                overlay,
                Rect::at(mx as i32, my as i32).of_size(step, step),
                class.marker_color(),
            );
            patches.push(ExtractedPatch { class, i, j, image });
        }
    }

    debug!(
        "classified {}x{} grid: {} necrosis, {} negative",
        grid_w,
        grid_h,
        patches.iter().filter(|p| p.class == PatchClass::Necrosis).count(),
        patches.iter().filter(|p| p.class == PatchClass::Negative).count(),
    );
    Ok(patches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};
    use slide::ImagePyramid;

    // Test geometry: 64x64 base, extraction level 1 (32x32), mask level 3
    // (8x8). downsample 2^2 = 4, patch 16 -> step 4, grid 2x2.
    fn test_params() -> PatchParams {
        PatchParams {
            patch_size: 16,
            level: 1,
            mask_level: 3,
            necrosis_threshold: 0.8,
            negative_threshold: 0.3,
        }
    }

    fn test_pyramid(base_size: (u32, u32)) -> ImagePyramid {
        let base = RgbImage::from_fn(base_size.0, base_size.1, |x, y| {
            // distinct quadrant colors so patch pixels identify their cell
            match (x < base_size.0 / 2, y < base_size.1 / 2) {
                (true, true) => Rgb([250, 20, 20]),
                (false, true) => Rgb([20, 250, 20]),
                (true, false) => Rgb([20, 20, 250]),
                (false, false) => Rgb([250, 250, 20]),
            }
        });
        ImagePyramid::from_image(base, 4)
    }

    /// Mask with one step-aligned block filled to the given value.
    fn mask_with_block(cell: (u32, u32), step: u32, dims: (u32, u32), value: u8) -> Mask {
        let mut img = GrayImage::new(dims.0, dims.1);
        for y in step * cell.1..step * (cell.1 + 1) {
            for x in step * cell.0..step * (cell.0 + 1) {
                img.put_pixel(x, y, Luma([value]));
            }
        }
        Mask::from_gray(img)
    }

    /// Mask where `count` pixels of one block are 255.
    fn mask_with_partial_block(cell: (u32, u32), step: u32, dims: (u32, u32), count: u32) -> Mask {
        let mut img = GrayImage::new(dims.0, dims.1);
        let mut remaining = count;
        'fill: for y in step * cell.1..step * (cell.1 + 1) {
            for x in step * cell.0..step * (cell.0 + 1) {
                if remaining == 0 {
                    break 'fill;
                }
                img.put_pixel(x, y, Luma([255]));
                remaining -= 1;
            }
        }
        Mask::from_gray(img)
    }

    fn decisions(patches: &[ExtractedPatch]) -> Vec<(u32, u32, PatchClass)> {
        patches.iter().map(|p| (p.i, p.j, p.class)).collect()
    }

    #[test]
    fn test_full_necrosis_block_is_necrosis() {
        let pyramid = test_pyramid((64, 64));
        let necrosis = mask_with_block((0, 0), 4, (8, 8), 255);
        let negative = Mask::blank(8, 8);
        let mut overlay = RgbImage::new(8, 8);

        let patches =
            classify_grid(&pyramid, &necrosis, &negative, &mut overlay, &test_params()).unwrap();
        assert_eq!(decisions(&patches), vec![(0, 0, PatchClass::Necrosis)]);
        assert_eq!(patches[0].image.dimensions(), (16, 16));
        // cell (0,0) reads from the red quadrant
        assert_eq!(*patches[0].image.get_pixel(4, 4), Rgb([250, 20, 20]));
    }

    #[test]
    fn test_blank_necrosis_half_negative_is_negative() {
        let pyramid = test_pyramid((64, 64));
        let necrosis = Mask::blank(8, 8);
        // ratio 8/16 = 0.5 > 0.3
        let negative = mask_with_partial_block((1, 1), 4, (8, 8), 8);
        let mut overlay = RgbImage::new(8, 8);

        let patches =
            classify_grid(&pyramid, &necrosis, &negative, &mut overlay, &test_params()).unwrap();
        assert_eq!(decisions(&patches), vec![(1, 1, PatchClass::Negative)]);
    }

    #[test]
    fn test_trace_necrosis_blocks_negative_branch() {
        let pyramid = test_pyramid((64, 64));
        // necrosis ratio 2/16 = 0.125: below 0.8 but nonzero
        let necrosis = mask_with_partial_block((0, 0), 4, (8, 8), 2);
        // negative ratio 0.5: above 0.3
        let negative = mask_with_partial_block((0, 0), 4, (8, 8), 8);
        let mut overlay = RgbImage::new(8, 8);

        let patches =
            classify_grid(&pyramid, &necrosis, &negative, &mut overlay, &test_params()).unwrap();
        assert!(patches.is_empty(), "cell must be discarded, got {patches:?}");
    }

    #[test]
    fn test_threshold_equality_is_not_enough() {
        let pyramid = test_pyramid((64, 64));
        let mut params = test_params();
        params.necrosis_threshold = 0.5;
        params.negative_threshold = 0.5;
        // both ratios land exactly on their thresholds
        let necrosis = mask_with_partial_block((0, 0), 4, (8, 8), 8);
        let negative = mask_with_partial_block((1, 0), 4, (8, 8), 8);
        let mut overlay = RgbImage::new(8, 8);

        let patches =
            classify_grid(&pyramid, &necrosis, &negative, &mut overlay, &params).unwrap();
        assert!(patches.is_empty(), "strict > must reject equality");
    }

    #[test]
    fn test_necrosis_wins_over_negative() {
        let pyramid = test_pyramid((64, 64));
        let necrosis = mask_with_block((0, 0), 4, (8, 8), 255);
        let negative = mask_with_block((0, 0), 4, (8, 8), 255);
        let mut overlay = RgbImage::new(8, 8);

        let patches =
            classify_grid(&pyramid, &necrosis, &negative, &mut overlay, &test_params()).unwrap();
        assert_eq!(decisions(&patches), vec![(0, 0, PatchClass::Necrosis)]);
    }

    #[test]
    fn test_trailing_partial_tiles_dropped() {
        // 72x64 base -> level 1 is 36x32: one 16px column and the 4px
        // remainder dropped per axis rule (36/16 = 2, 32/16 = 2)
        let pyramid = test_pyramid((72, 64));
        let necrosis = Mask::blank(9, 8);
        let negative = Mask::from_gray(GrayImage::from_pixel(9, 8, Luma([255])));
        let mut overlay = RgbImage::new(9, 8);

        let patches =
            classify_grid(&pyramid, &necrosis, &negative, &mut overlay, &test_params()).unwrap();
        assert_eq!(patches.len(), 4);
        assert!(patches.iter().all(|p| p.i < 2 && p.j < 2));
    }

    #[test]
    fn test_classification_is_deterministic() {
        let pyramid = test_pyramid((64, 64));
        let necrosis = mask_with_block((1, 0), 4, (8, 8), 255);
        let negative = mask_with_block((0, 1), 4, (8, 8), 255);

        let mut overlay_a = RgbImage::new(8, 8);
        let a = classify_grid(&pyramid, &necrosis, &negative, &mut overlay_a, &test_params())
            .unwrap();
        let mut overlay_b = RgbImage::new(8, 8);
        let b = classify_grid(&pyramid, &necrosis, &negative, &mut overlay_b, &test_params())
            .unwrap();

        assert_eq!(decisions(&a), decisions(&b));
        assert_eq!(overlay_a, overlay_b);
    }

    #[test]
    fn test_overlay_markers_use_class_colors() {
        let pyramid = test_pyramid((64, 64));
        let necrosis = mask_with_block((0, 0), 4, (8, 8), 255);
        let negative = mask_with_block((1, 1), 4, (8, 8), 255);
        let mut overlay = RgbImage::new(8, 8);

        classify_grid(&pyramid, &necrosis, &negative, &mut overlay, &test_params()).unwrap();
        assert_eq!(*overlay.get_pixel(0, 0), NECROSIS_MARKER);
        assert_eq!(*overlay.get_pixel(4, 4), NEGATIVE_MARKER);
    }

    #[test]
    fn test_mask_dimension_mismatch_rejected() {
        let pyramid = test_pyramid((64, 64));
        let necrosis = Mask::blank(8, 8);
        let negative = Mask::blank(8, 9);
        let mut overlay = RgbImage::new(8, 8);

        assert!(matches!(
            classify_grid(&pyramid, &necrosis, &negative, &mut overlay, &test_params()),
            Err(PatchError::Masking(
                masking::MaskingError::DimensionMismatch { .. }
            ))
        ));
    }

    #[test]
    fn test_discarded_cells_leave_overlay_untouched() {
        let pyramid = test_pyramid((64, 64));
        let necrosis = Mask::blank(8, 8);
        let negative = Mask::blank(8, 8);
        let mut overlay = RgbImage::from_pixel(8, 8, Rgb([9, 9, 9]));
        let before = overlay.clone();

        let patches =
            classify_grid(&pyramid, &necrosis, &negative, &mut overlay, &test_params()).unwrap();
        assert!(patches.is_empty());
        assert_eq!(overlay, before);
    }

    #[test]
    fn test_file_names_encode_role_level_and_cell() {
        let patch = ExtractedPatch {
            class: PatchClass::Necrosis,
            i: 14,
            j: 9,
            image: RgbImage::new(1, 1),
        };
        let id = SlideId::new("TS-0042");
        assert_eq!(patch.file_name(&id, 1), "nec_TS-0042_1_w_14_h_9.png");

        let patch = ExtractedPatch {
            class: PatchClass::Negative,
            image: RgbImage::new(1, 1),
            ..patch
        };
        assert_eq!(patch.file_name(&id, 2), "nega_TS-0042_2_w_14_h_9.png");
    }
}
