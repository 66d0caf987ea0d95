use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MaskingError {
    #[error("no annotation found at {0}")]
    AnnotationNotFound(PathBuf),

    #[error("malformed annotation: {0}")]
    MalformedAnnotation(String),

    #[error("mask dimensions differ: {left:?} vs {right:?}")]
    DimensionMismatch {
        left: (u32, u32),
        right: (u32, u32),
    },

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, MaskingError>;
