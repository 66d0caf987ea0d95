//! # Patching - Labeled Patch Extraction
//!
//! The grid classifier that turns one slide plus its masks into labeled
//! training patches. Cells of a regular extraction-level grid are scored by
//! how much of their mask-space footprint is necrotic or negative tissue,
//! then extracted as `necrosis` / `negative` patches or discarded.
//!
//! ## Example
//!
//! ```rust,no_run
//! use patching::{PatchParams, classify_grid};
//! use masking::Mask;
//! use slide::ImagePyramid;
//!
//! let params = PatchParams::default();
//! params.validate()?;
//!
//! let pyramid = ImagePyramid::open("WSI/TS-0042.png", params.mask_level + 1)?;
//! let necrosis = Mask::open("NECROSIS_MASK/TS-0042_necrosis_mask.png")?;
//! let negative = Mask::open("NEGATIVE_MASK/TS-0042_negative_mask.png")?;
//! let mut overlay = image::open("PATCHMAPS/TS-0042_map.png")?.to_rgb8();
//!
//! let patches = classify_grid(&pyramid, &necrosis, &negative, &mut overlay, &params)?;
//! println!("{} patches extracted", patches.len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod error;
pub mod grid;

pub use config::PatchParams;
pub use error::{PatchError, Result};
pub use grid::{ExtractedPatch, PatchClass, classify_grid};
