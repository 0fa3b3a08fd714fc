use std::path::PathBuf;

use crate::condition::CLASS_COUNT;

#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("failed to load model from {}: {source:#}", .path.display())]
    ModelLoad {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("unsupported image format, only JPEG and PNG are accepted")]
    UnsupportedFormat,

    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("failed to preprocess image: {0}")]
    Preprocess(String),

    #[error("inference failed: {0}")]
    Inference(#[source] anyhow::Error),

    #[error("model returned {0} scores, expected {CLASS_COUNT}")]
    OutputShape(usize),

    #[error("model returned a non-finite score")]
    NonFiniteOutput,
}

impl ScanError {
    /// Errors caused by the uploaded file rather than by the service.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::UnsupportedFormat | Self::Decode(_))
    }
}
