//! # Slide - Shared Whole-Slide Image Types
//!
//! Foundational types for the slide-kit ecosystem: a stable slide identifier
//! and a multi-resolution image pyramid abstraction.
//!
//! Whole-slide scanners store one physical slide as a pyramid of progressively
//! halved raster levels; level 0 is full resolution and level `L` is
//! downsampled by `2^L`. The rest of the workspace only ever *reads* from a
//! pyramid, so the capability is expressed as the [`SlidePyramid`] trait and
//! any backing store (vendor format reader, tile server, plain raster) can be
//! plugged in behind it. [`ImagePyramid`] is the bundled implementation that
//! builds the levels in memory from a single base raster.
//!
//! ## Example
//!
//! ```rust,no_run
//! use slide::{ImagePyramid, SlideId, SlidePyramid};
//!
//! let id = SlideId::from_path("WSI/TS-0042.png".as_ref());
//! let pyramid = ImagePyramid::open("WSI/TS-0042.png", 7)?;
//! let (w, h) = pyramid.level_dimensions(6)?;
//! println!("{id}: level 6 is {w}x{h}");
//! # Ok::<(), slide::SlideError>(())
//! ```

pub mod pyramid;

use std::fmt;
use std::path::Path;

use thiserror::Error;

pub use pyramid::{ImagePyramid, SlidePyramid};

/// Result type for slide operations
pub type Result<T> = std::result::Result<T, SlideError>;

/// Standard error type for slide operations
#[derive(Error, Debug)]
pub enum SlideError {
    #[error("level {level} out of range: pyramid has {count} levels")]
    UnknownLevel { level: u32, count: u32 },

    #[error(
        "region {size:?} at level-0 origin {origin:?}, level {level}, exceeds level bounds {bounds:?}"
    )]
    RegionOutOfBounds {
        origin: (u32, u32),
        size: (u32, u32),
        level: u32,
        bounds: (u32, u32),
    },

    #[error("failed to read slide image: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Identifier of one physical slide, shared by its image file, its annotation
/// file and every artifact generated from it.
///
/// Derived exactly once from the image path's file stem at ingestion and
/// threaded through the pipeline from there; no other component re-derives
/// identity from paths.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SlideId(String);

impl SlideId {
    /// Derive the identifier from a slide image path (`WSI/TS-0042.ndpi`
    /// becomes `TS-0042`).
    pub fn from_path(path: &Path) -> Self {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "slide".to_owned());
        Self(stem)
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SlideId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
