//! Binary raster masks.

use std::path::Path;

use image::{GenericImageView, GrayImage, Luma, imageops::crop_imm};

use crate::Result;

/// Pixel value of an "on" mask pixel.
pub const ON: u8 = 255;

/// Pixel value of an "off" mask pixel.
pub const OFF: u8 = 0;

/// Everything strictly above the binary midpoint counts as "on", so masks
/// round-tripped through lossy storage still classify correctly.
pub const ON_MIN: u8 = 128;

/// A single-channel binary raster at one resolution level of a slide.
///
/// Values are nominally 0 or 255; masks loaded back from disk may carry
/// intermediate values, hence the [`ON_MIN`] tolerance in [`Mask::is_on`].
/// A mask is created once per slide per run and not mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Mask(GrayImage);

impl Mask {
    /// All-off mask of the given dimensions.
    pub fn blank(width: u32, height: u32) -> Self {
        Self(GrayImage::new(width, height))
    }

    pub fn from_gray(image: GrayImage) -> Self {
        Self(image)
    }

    /// Load a stored mask as 8-bit grayscale.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self(image::open(path)?.into_luma8()))
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        self.0.save(path)?;
        Ok(())
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.0.dimensions()
    }

    pub fn width(&self) -> u32 {
        self.0.width()
    }

    pub fn height(&self) -> u32 {
        self.0.height()
    }

    pub fn is_on(&self, x: u32, y: u32) -> bool {
        self.0.get_pixel(x, y).0[0] >= ON_MIN
    }

    /// Number of "on" pixels in the whole mask.
    pub fn on_pixels(&self) -> u64 {
        self.0.iter().filter(|&&v| v >= ON_MIN).count() as u64
    }

    /// Sum of raw pixel values over a `size` x `size` block with top-left
    /// corner `(x, y)`.
    pub fn block_sum(&self, x: u32, y: u32, size: u32) -> u64 {
        crop_imm(&self.0, x, y, size, size)
            .pixels()
            .map(|(_, _, Luma([v]))| u64::from(v))
            .sum()
    }

    /// Fraction of a block that is "on": `block_sum / (size * size * 255)`.
    /// Exactly 0.0 iff every pixel in the block is 0, and exactly 1.0 iff
    /// every pixel is 255.
    pub fn block_ratio(&self, x: u32, y: u32, size: u32) -> f64 {
        self.block_sum(x, y, size) as f64 / (f64::from(size) * f64::from(size) * f64::from(ON))
    }

    pub fn as_gray(&self) -> &GrayImage {
        &self.0
    }

    pub fn into_gray(self) -> GrayImage {
        self.0
    }
}
