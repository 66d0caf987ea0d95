//! Batch drivers: walk the slide directory and run the pipeline per slide.
//!
//! Per-slide failures are isolated: a slide without an annotation is skipped
//! with a warning, any other failure is reported and the batch moves on.
//! Only configuration errors abort a run, and those are rejected before the
//! first slide is touched.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{error, info, warn};
use walkdir::WalkDir;

use masking::{MaskingError, annotations, derive_negative, draw_outlines, rasterize_polygons,
    segment_tissue, Mask};
use patching::{PatchClass, classify_grid};
use slide::{ImagePyramid, SlideId, SlidePyramid};

use crate::{BatchConfig, SlideKitError};

/// Raster formats accepted as slide images.
const SLIDE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "tif", "tiff", "bmp"];

/// Generate necrosis, tissue and negative masks plus overlay maps for every
/// slide under `slide_dir`.
pub fn create_masks(cfg: &BatchConfig) -> Result<(), SlideKitError> {
    for dir in [
        &cfg.map_dir,
        &cfg.patchmap_dir,
        &cfg.tissue_mask_dir,
        &cfg.necrosis_mask_dir,
        &cfg.negative_mask_dir,
    ] {
        fs::create_dir_all(dir)?;
    }

    for path in slide_files(&cfg.slide_dir) {
        let id = SlideId::from_path(&path);
        info!("Generating masks for '{id}'");
        match build_slide_masks(&path, &id, cfg) {
            Ok(()) => {}
            Err(SlideKitError::Masking(MaskingError::AnnotationNotFound(missing))) => {
                warn!("No annotation for '{id}' at {}; skipping", missing.display());
            }
            Err(e) => {
                error!("Mask generation for '{id}' failed: {e}");
            }
        }
    }
    Ok(())
}

/// Run both stages back to back: mask generation, then patch extraction.
///
/// The extraction parameters are validated before the first slide is
/// touched, so an invalid configuration aborts the run before any mask
/// generation happens.
pub fn run(cfg: &BatchConfig) -> Result<(), SlideKitError> {
    cfg.params.validate()?;
    create_masks(cfg)?;
    extract_patches(cfg)
}

/// Extract labeled patches for every slide, using the masks a previous
/// `create_masks` run stored.
pub fn extract_patches(cfg: &BatchConfig) -> Result<(), SlideKitError> {
    // configuration problems are fatal to the whole run, checked up front
    cfg.params.validate()?;

    fs::create_dir_all(&cfg.necrosis_patches_dir)?;
    fs::create_dir_all(&cfg.negative_patches_dir)?;

    for path in slide_files(&cfg.slide_dir) {
        let id = SlideId::from_path(&path);
        info!("Extracting patches for '{id}'");
        if let Err(e) = extract_slide_patches(&path, &id, cfg) {
            error!("Patch extraction for '{id}' failed: {e}");
        }
    }
    Ok(())
}

/// Slide image files under `dir`, in a fixed enumeration order.
pub fn slide_files(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|ext| SLIDE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        })
        .collect()
}

fn build_slide_masks(path: &Path, id: &SlideId, cfg: &BatchConfig) -> Result<(), SlideKitError> {
    let mask_level = cfg.params.mask_level;

    // parse the annotation first so a missing one skips the slide before any
    // pixel work happens
    let annotation_path = cfg.annotation_dir.join(format!("{id}.xml"));
    let polygons = annotations::read_annotation(&annotation_path, mask_level)?;

    let pyramid = ImagePyramid::open(path, mask_level + 1)?;
    let thumbnail = pyramid.thumbnail(mask_level)?;

    let necrosis = rasterize_polygons(thumbnail.dimensions(), &polygons);
    let tissue = segment_tissue(&thumbnail);
    let negative = derive_negative(&tissue, &necrosis)?;
    let overlay = draw_outlines(&thumbnail, &polygons);

    necrosis.save(cfg.necrosis_mask_dir.join(format!("{id}_necrosis_mask.png")))?;
    tissue.save(cfg.tissue_mask_dir.join(format!("{id}_tissue_mask.png")))?;
    negative.save(cfg.negative_mask_dir.join(format!("{id}_negative_mask.png")))?;
    overlay.save(cfg.map_dir.join(format!("{id}_map.png")))?;
    // a second copy the patch extractor will annotate with its decisions
    overlay.save(cfg.patchmap_dir.join(format!("{id}_map.png")))?;

    info!(
        "'{id}': {} polygon(s), {} necrosis px, {} negative px at level {mask_level}",
        polygons.len(),
        necrosis.on_pixels(),
        negative.on_pixels()
    );
    Ok(())
}

fn extract_slide_patches(path: &Path, id: &SlideId, cfg: &BatchConfig) -> Result<(), SlideKitError> {
    let params = &cfg.params;

    let necrosis = Mask::open(cfg.necrosis_mask_dir.join(format!("{id}_necrosis_mask.png")))?;
    let negative = Mask::open(cfg.negative_mask_dir.join(format!("{id}_negative_mask.png")))?;
    let patchmap_path = cfg.patchmap_dir.join(format!("{id}_map.png"));
    let mut overlay = image::open(&patchmap_path)?.to_rgb8();

    let pyramid = ImagePyramid::open(path, params.mask_level + 1)?;
    let patches = classify_grid(&pyramid, &necrosis, &negative, &mut overlay, params)?;

    let necrosis_dir = cfg.necrosis_patches_dir.join(id.as_str());
    let negative_dir = cfg.negative_patches_dir.join(id.as_str());
    fs::create_dir_all(&necrosis_dir)?;
    fs::create_dir_all(&negative_dir)?;

    let mut counts = (0usize, 0usize);
    for patch in &patches {
        let dir = match patch.class {
            PatchClass::Necrosis => {
                counts.0 += 1;
                &necrosis_dir
            }
            PatchClass::Negative => {
                counts.1 += 1;
                &negative_dir
            }
        };
        patch.image.save(dir.join(patch.file_name(id, params.level)))?;
    }

    // finalize the patchmap with the extraction markers
    overlay.save(&patchmap_path)?;

    info!(
        "'{id}': {} necrosis and {} negative patches at level {}",
        counts.0, counts.1, params.level
    );
    Ok(())
}
