use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use image::DynamicImage;
use tracing::{debug, info};

use crate::classifier::{LoadOptions, Vgg16Classifier};
use crate::condition::{present, PredictionResult};
use crate::error::ScanError;
use crate::preprocess::{decode_upload, Preprocessor};
use crate::task::ConditionModel;

/// Preprocess, infer and present, sharing one read-only model.
///
/// Cloning is cheap; every clone uses the same loaded model.
#[derive(Clone)]
pub struct NailScanner {
    model: Arc<dyn ConditionModel>,
    preprocessor: Arc<Preprocessor>,
}

impl NailScanner {
    pub fn new(model: Arc<dyn ConditionModel>) -> Self {
        Self {
            model,
            preprocessor: Arc::new(Preprocessor::default()),
        }
    }

    /// Loads the ONNX model. Called once at startup; a failure here must stop the process.
    pub fn load(path: &Path, options: &LoadOptions) -> Result<Self, ScanError> {
        let start = Instant::now();
        let model = Vgg16Classifier::load(path, options).map_err(|source| ScanError::ModelLoad {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(elapsed = ?start.elapsed(), "model ready");
        Ok(Self::new(Arc::new(model)))
    }

    pub fn scan_bytes(&self, bytes: &[u8]) -> Result<PredictionResult, ScanError> {
        let image = decode_upload(bytes)?;
        self.scan_image(&image)
    }

    pub fn scan_image(&self, image: &DynamicImage) -> Result<PredictionResult, ScanError> {
        let start = Instant::now();
        let input = self.preprocessor.preprocess(image)?;
        let scores = self.model.infer(input.view()).map_err(ScanError::Inference)?;
        debug!(?scores, "inference finished");

        let result = present(&scores)?;
        info!(
            label = result.label,
            confidence = result.confidence,
            width = image.width(),
            height = image.height(),
            elapsed = ?start.elapsed(),
            "nail scanned"
        );
        Ok(result)
    }
}

impl std::fmt::Debug for NailScanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NailScanner").finish_non_exhaustive()
    }
}
