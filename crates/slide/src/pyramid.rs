//! Multi-resolution pyramid access.
//!
//! [`SlidePyramid`] is the read-only capability the rest of the workspace
//! programs against. Region reads follow the whole-slide convention: the
//! origin is given in *level-0* pixel coordinates while the size is given in
//! pixels of the requested level.

use std::path::Path;

use image::RgbImage;

use crate::{Result, SlideError};

/// Read-only access to a pyramidal slide image.
pub trait SlidePyramid {
    /// Number of resolution levels, level 0 being full resolution.
    fn level_count(&self) -> u32;

    /// Pixel dimensions `(width, height)` of the given level.
    fn level_dimensions(&self, level: u32) -> Result<(u32, u32)>;

    /// Read a `size` pixel region of `level`, addressed by its top-left
    /// corner in level-0 coordinates.
    fn read_region(&self, origin: (u32, u32), level: u32, size: (u32, u32)) -> Result<RgbImage>;

    /// Downsample factor of a level relative to level 0.
    fn downsample(&self, level: u32) -> u32 {
        1 << level
    }

    /// Full image of one level; the usual way to get a working thumbnail.
    fn thumbnail(&self, level: u32) -> Result<RgbImage> {
        let dims = self.level_dimensions(level)?;
        self.read_region((0, 0), level, dims)
    }
}

/// In-memory pyramid built from a single base raster by iterated 2x box
/// reduction. Level dimensions halve (flooring) per level, mirroring what
/// slide scanners store.
#[derive(Debug, Clone)]
pub struct ImagePyramid {
    levels: Vec<RgbImage>,
}

impl ImagePyramid {
    /// Build `level_count` levels from a full-resolution base image.
    pub fn from_image(base: RgbImage, level_count: u32) -> Self {
        let mut levels = Vec::with_capacity(level_count as usize);
        levels.push(base);
        for _ in 1..level_count {
            let next = half_reduce(levels.last().unwrap_or_else(|| unreachable!()));
            levels.push(next);
        }
        Self { levels }
    }

    /// Open a plain raster image (png/jpeg/tiff) and pyramidalize it.
    pub fn open(path: impl AsRef<Path>, level_count: u32) -> Result<Self> {
        let base = image::open(path)?.to_rgb8();
        Ok(Self::from_image(base, level_count))
    }

    fn level(&self, level: u32) -> Result<&RgbImage> {
        self.levels
            .get(level as usize)
            .ok_or(SlideError::UnknownLevel {
                level,
                count: self.level_count(),
            })
    }
}

impl SlidePyramid for ImagePyramid {
    fn level_count(&self) -> u32 {
        self.levels.len() as u32
    }

    fn level_dimensions(&self, level: u32) -> Result<(u32, u32)> {
        Ok(self.level(level)?.dimensions())
    }

    fn read_region(&self, origin: (u32, u32), level: u32, size: (u32, u32)) -> Result<RgbImage> {
        let img = self.level(level)?;
        let (x, y) = (origin.0 >> level, origin.1 >> level);
        let (w, h) = size;
        let bounds = img.dimensions();
        if x.checked_add(w).is_none_or(|r| r > bounds.0) || y.checked_add(h).is_none_or(|b| b > bounds.1)
        {
            return Err(SlideError::RegionOutOfBounds {
                origin,
                size,
                level,
                bounds,
            });
        }
        Ok(image::imageops::crop_imm(img, x, y, w, h).to_image())
    }
}

/// One 2x reduction step: each output pixel is the average of a 2x2 source
/// block, clamped at odd right/bottom edges.
fn half_reduce(src: &RgbImage) -> RgbImage {
    let (w, h) = src.dimensions();
    let (nw, nh) = ((w / 2).max(1), (h / 2).max(1));
    RgbImage::from_fn(nw, nh, |x, y| {
        let mut acc = [0u32; 3];
        for dy in 0..2 {
            for dx in 0..2 {
                let sx = (2 * x + dx).min(w - 1);
                let sy = (2 * y + dy).min(h - 1);
                let p = src.get_pixel(sx, sy);
                for (a, c) in acc.iter_mut().zip(p.0) {
                    *a += u32::from(c);
                }
            }
        }
        image::Rgb(acc.map(|a| (a / 4) as u8))
    })
}
