//! Extraction parameters and their eager validation.

use serde::{Deserialize, Serialize};

use crate::{PatchError, Result};

/// Parameters of one patch-extraction run.
///
/// `mask_level` is the (coarse) level the masks were generated at and
/// `level` the (fine) level patches are read at; the two are tied together
/// by `downsample = 2^(mask_level - level)`, the number of mask pixels per
/// patch-size unit. Call [`PatchParams::validate`] before any slide is
/// touched; the derived accessors assume a validated configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PatchParams {
    /// Patch edge length in pixels at the extraction level.
    pub patch_size: u32,
    /// Resolution level patches are read at (0 is full magnification).
    pub level: u32,
    /// Resolution level the masks live at; must not be finer than `level`.
    pub mask_level: u32,
    /// Necrosis mask inclusion ratio above which a cell becomes a necrosis
    /// patch. Fraction in [0, 1].
    pub necrosis_threshold: f64,
    /// Negative mask inclusion ratio above which a necrosis-free cell
    /// becomes a negative patch. Fraction in [0, 1].
    pub negative_threshold: f64,
}

impl Default for PatchParams {
    fn default() -> Self {
        Self {
            patch_size: 256,
            level: 1,
            mask_level: 6,
            necrosis_threshold: 0.8,
            negative_threshold: 0.3,
        }
    }
}

impl PatchParams {
    /// Mask pixels per patch-size unit, per axis: `2^(mask_level - level)`.
    pub fn downsample(&self) -> u32 {
        1 << (self.mask_level - self.level)
    }

    /// Side length, in mask pixels, of the block one grid cell covers.
    pub fn step(&self) -> u32 {
        self.patch_size / self.downsample()
    }

    /// Factor converting extraction-level coordinates to level-0 pixel
    /// coordinates for region reads.
    pub fn scale_to_level0(&self) -> u32 {
        1 << self.level
    }

    /// Reject invalid configurations before processing begins.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("necrosis_threshold", self.necrosis_threshold),
            ("negative_threshold", self.negative_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(PatchError::invalid(format!(
                    "{name} must be a fraction in [0, 1], got {value}"
                )));
            }
        }
        if self.patch_size == 0 {
            return Err(PatchError::invalid("patch_size must be positive"));
        }
        if self.mask_level < self.level {
            return Err(PatchError::invalid(format!(
                "mask_level ({}) must be coarser than or equal to level ({})",
                self.mask_level, self.level
            )));
        }
        let diff = self.mask_level - self.level;
        if diff >= 32 || self.patch_size >> diff == 0 {
            return Err(PatchError::invalid(format!(
                "mask_level is {diff} levels above level: the {}px patch maps to zero mask pixels",
                self.patch_size
            )));
        }
        if self.patch_size % self.downsample() != 0 {
            return Err(PatchError::invalid(format!(
                "patch_size ({}) must be a multiple of the level downsample factor ({})",
                self.patch_size,
                self.downsample()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let params = PatchParams::default();
        params.validate().unwrap();
        assert_eq!(params.patch_size, 256);
        assert_eq!(params.level, 1);
        assert_eq!(params.mask_level, 6);
    }

    #[test]
    fn test_step_arithmetic() {
        // patch_size=256, mask_level=6, level=2: downsample 2^4, step 16
        let params = PatchParams {
            level: 2,
            ..PatchParams::default()
        };
        params.validate().unwrap();
        assert_eq!(params.downsample(), 16);
        assert_eq!(params.step(), 16);
        assert_eq!(params.scale_to_level0(), 4);
    }

    #[test]
    fn test_threshold_out_of_range_rejected() {
        for bad in [-0.1, 1.5] {
            let params = PatchParams {
                necrosis_threshold: bad,
                ..PatchParams::default()
            };
            assert!(matches!(
                params.validate(),
                Err(PatchError::InvalidConfiguration { .. })
            ));
        }
    }

    #[test]
    fn test_mask_level_finer_than_level_rejected() {
        let params = PatchParams {
            level: 7,
            mask_level: 6,
            ..PatchParams::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_zero_step_rejected() {
        // 2^9 = 512 mask-to-level downsample swallows a 256px patch entirely
        let params = PatchParams {
            level: 0,
            mask_level: 9,
            ..PatchParams::default()
        };
        assert!(matches!(
            params.validate(),
            Err(PatchError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_indivisible_patch_size_rejected() {
        let params = PatchParams {
            patch_size: 250,
            ..PatchParams::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_equal_levels_are_allowed() {
        let params = PatchParams {
            level: 3,
            mask_level: 3,
            patch_size: 64,
            ..PatchParams::default()
        };
        params.validate().unwrap();
        assert_eq!(params.step(), 64);
    }
}
