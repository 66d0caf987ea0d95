//! Batch configuration and drivers for the slide-kit command line.

pub mod runner;

use std::fs;
use std::path::{Path, PathBuf};

use patching::PatchParams;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SlideKitError {
    #[error(transparent)]
    Masking(#[from] masking::MaskingError),
    #[error(transparent)]
    Patch(#[from] patching::PatchError),
    #[error(transparent)]
    Slide(#[from] slide::SlideError),
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    #[error(transparent)]
    SerdeError(#[from] serde_json::Error),
    #[error(transparent)]
    TomlDeError(#[from] toml::de::Error),
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error("Unsupported file format. Please use .toml or .json files")]
    UnsupportedFileFormat,
}

/// Everything one batch run needs: where slides and annotations live, where
/// each artifact category goes, and the extraction parameters.
///
/// Defaults reproduce the conventional directory layout
/// (`WSI/`, `XML/`, `MAPS/`, ...); any subset can be overridden.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BatchConfig {
    /// Directory containing the whole-slide images (searched recursively).
    pub slide_dir: PathBuf,
    /// Directory containing `<slide>.xml` polygon annotations.
    pub annotation_dir: PathBuf,
    /// Output directory for pristine overlay maps.
    pub map_dir: PathBuf,
    /// Output directory for the overlay maps patch extraction annotates.
    pub patchmap_dir: PathBuf,
    /// Output directory for tissue masks.
    pub tissue_mask_dir: PathBuf,
    /// Output directory for necrosis masks.
    pub necrosis_mask_dir: PathBuf,
    /// Output directory for negative masks.
    pub negative_mask_dir: PathBuf,
    /// Output directory for necrosis patches (one subdirectory per slide).
    pub necrosis_patches_dir: PathBuf,
    /// Output directory for negative patches (one subdirectory per slide).
    pub negative_patches_dir: PathBuf,
    /// Mask and extraction parameters.
    pub params: PatchParams,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            slide_dir: "WSI".into(),
            annotation_dir: "XML".into(),
            map_dir: "MAPS".into(),
            patchmap_dir: "PATCHMAPS".into(),
            tissue_mask_dir: "TISSUE_MASK".into(),
            necrosis_mask_dir: "NECROSIS_MASK".into(),
            negative_mask_dir: "NEGATIVE_MASK".into(),
            necrosis_patches_dir: "NECROSIS_PATCHES".into(),
            negative_patches_dir: "NEGATIVE_PATCHES".into(),
            params: PatchParams::default(),
        }
    }
}

impl BatchConfig {
    /// Load configuration from a TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, SlideKitError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self, SlideKitError> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, SlideKitError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Load configuration from JSON string
    pub fn from_json(content: &str) -> Result<Self, SlideKitError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Load configuration from a file, dispatching on its extension
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SlideKitError> {
        match path.as_ref().extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml_file(path),
            Some("json") => Self::from_json_file(path),
            _ => Err(SlideKitError::UnsupportedFileFormat),
        }
    }
}
