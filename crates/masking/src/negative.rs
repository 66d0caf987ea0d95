//! Negative (non-necrotic tissue) mask derivation.

use crate::mask::{Mask, ON_MIN};
use crate::{MaskingError, Result};

/// Subtract the necrosis regions from the tissue mask.
///
/// The result is the tissue mask with every pixel forced off where the
/// necrosis mask is on (value >= [`ON_MIN`], tolerating lossy-stored masks).
/// This is what makes necrosis and negative masks pixel-wise mutually
/// exclusive. Masks of differing dimensions cannot be combined.
pub fn derive_negative(tissue: &Mask, necrosis: &Mask) -> Result<Mask> {
    if tissue.dimensions() != necrosis.dimensions() {
        return Err(MaskingError::DimensionMismatch {
            left: tissue.dimensions(),
            right: necrosis.dimensions(),
        });
    }

    let mut out = tissue.as_gray().clone();
    for (dst, &nec) in out.iter_mut().zip(necrosis.as_gray().iter()) {
        if nec >= ON_MIN {
            *dst = 0;
        }
    }
    Ok(Mask::from_gray(out))
}
