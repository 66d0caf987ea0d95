//! # Masking - Whole-Slide Annotation Masks
//!
//! Turns hand-drawn polygon annotations and slide thumbnails into the three
//! binary masks the patch extractor consumes, plus the visual overlay map:
//!
//! - **Necrosis mask**: annotated polygons, interiors filled
//! - **Tissue mask**: stained tissue vs. background, Otsu over HSV saturation
//! - **Negative mask**: tissue minus necrosis (mutually exclusive with it)
//! - **Overlay map**: the thumbnail with annotation boundaries outlined
//!
//! All four live at one mask resolution level and share that level's pixel
//! dimensions.
//!
//! ## Example
//!
//! ```rust,no_run
//! use masking::{annotations, negative, rasterize, tissue};
//!
//! let polygons = annotations::read_annotation("XML/TS-0042.xml".as_ref(), 6)?;
//! let thumbnail = image::open("TS-0042_thumb.png")?.to_rgb8();
//!
//! let necrosis = rasterize::rasterize_polygons(thumbnail.dimensions(), &polygons);
//! let overlay = rasterize::draw_outlines(&thumbnail, &polygons);
//! let tissue = tissue::segment_tissue(&thumbnail);
//! let negative = negative::derive_negative(&tissue, &necrosis)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod annotations;
pub mod error;
pub mod mask;
pub mod negative;
pub mod rasterize;
pub mod tissue;

pub use annotations::{Polygon, parse_annotation, read_annotation};
pub use error::{MaskingError, Result};
pub use mask::Mask;
pub use negative::derive_negative;
pub use rasterize::{draw_outlines, rasterize_polygons};
pub use tissue::segment_tissue;
