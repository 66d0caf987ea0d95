use thiserror::Error;

#[derive(Error, Debug)]
pub enum PatchError {
    #[error("configuration validation failed: {details}")]
    InvalidConfiguration { details: String },

    #[error(transparent)]
    Slide(#[from] slide::SlideError),

    #[error(transparent)]
    Masking(#[from] masking::MaskingError),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PatchError {
    pub(crate) fn invalid(details: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            details: details.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PatchError>;
