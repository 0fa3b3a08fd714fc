use std::path::Path;

use anyhow::{bail, Context};
use ndarray::ArrayView4;
use ort::{inputs, GraphOptimizationLevel, Session, ValueType};
use tracing::{debug, info};

use crate::preprocess::INPUT_SIZE;
use crate::task::ConditionModel;

#[derive(Debug, Clone, Copy, Default)]
pub struct LoadOptions {
    /// Size of the intra-op thread pool; `None` lets ONNX Runtime use every core.
    pub intra_threads: Option<usize>,
}

/// VGG16 nail classifier exported from Keras to ONNX (NHWC input, softmax output).
#[derive(Debug)]
pub struct Vgg16Classifier {
    model: Session,
    input_name: String,
    output_name: String,
}

impl Vgg16Classifier {
    pub fn load(path: &Path, options: &LoadOptions) -> anyhow::Result<Self> {
        if !path.is_file() {
            bail!("model file {} does not exist", path.display());
        }

        let mut builder =
            Session::builder()?.with_optimization_level(GraphOptimizationLevel::Level3)?;
        if let Some(threads) = options.intra_threads {
            builder = builder.with_intra_threads(threads)?;
        }
        let model = builder
            .commit_from_file(path)
            .with_context(|| format!("{} is not a loadable ONNX model", path.display()))?;

        let input = model.inputs.first().context("model has no inputs")?;
        Self::check_input(&input.input_type)?;
        let input_name = input.name.clone();
        let output_name = model
            .outputs
            .first()
            .context("model has no outputs")?
            .name
            .clone();
        debug!(input = %input_name, output = %output_name, "model graph");

        info!(path = %path.display(), "model loaded");
        Ok(Self {
            model,
            input_name,
            output_name,
        })
    }

    // Dynamic dimensions are reported as -1
    fn check_input(input_type: &ValueType) -> anyhow::Result<()> {
        let ValueType::Tensor { dimensions, .. } = input_type else {
            bail!("model input is not a tensor");
        };
        let size = INPUT_SIZE as i64;
        let expected = [1, size, size, 3];
        let compatible = dimensions.len() == expected.len()
            && dimensions
                .iter()
                .zip(expected)
                .all(|(&actual, expected)| actual == -1 || actual == expected);
        if !compatible {
            bail!("model expects input shape {dimensions:?}, not [batch, {size}, {size}, 3]");
        }
        Ok(())
    }
}

impl ConditionModel for Vgg16Classifier {
    fn infer(&self, input: ArrayView4<'_, f32>) -> anyhow::Result<Vec<f32>> {
        let outputs = self
            .model
            .run(inputs![self.input_name.as_str() => input]?)?;
        // [1, 3] softmax scores, flattened
        let scores = outputs[self.output_name.as_str()]
            .try_extract_tensor::<f32>()?
            .iter()
            .copied()
            .collect();
        Ok(scores)
    }
}

#[cfg(test)]
mod tests {
    use ort::TensorElementType;

    use super::*;

    fn tensor(dimensions: &[i64]) -> ValueType {
        ValueType::Tensor {
            ty: TensorElementType::Float32,
            dimensions: dimensions.to_vec(),
        }
    }

    #[test]
    fn accepts_nhwc_input() {
        Vgg16Classifier::check_input(&tensor(&[1, 224, 224, 3])).unwrap();
        Vgg16Classifier::check_input(&tensor(&[-1, 224, 224, 3])).unwrap();
        Vgg16Classifier::check_input(&tensor(&[-1, -1, -1, 3])).unwrap();
    }

    #[test]
    fn rejects_incompatible_input() {
        // NCHW export
        let err = Vgg16Classifier::check_input(&tensor(&[1, 3, 224, 224])).unwrap_err();
        assert!(err.to_string().contains("[1, 3, 224, 224]"));
        assert!(Vgg16Classifier::check_input(&tensor(&[224, 224, 3])).is_err());
        assert!(Vgg16Classifier::check_input(&tensor(&[1, 299, 299, 3])).is_err());
        assert!(Vgg16Classifier::check_input(&tensor(&[2, 224, 224, 3])).is_err());
    }

    #[test]
    fn missing_model_file_fails_to_load() {
        let err = Vgg16Classifier::load(
            Path::new("models/does-not-exist.onnx"),
            &LoadOptions::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("does-not-exist.onnx"));
    }

    #[test]
    fn directory_is_not_a_model() {
        let err = Vgg16Classifier::load(Path::new("src"), &LoadOptions::default()).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }
}
