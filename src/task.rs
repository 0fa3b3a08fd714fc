use ndarray::ArrayView4;

/// A loaded classifier that maps one preprocessed image to class scores.
///
/// Implementations must be pure: the same tensor always yields the same scores.
pub trait ConditionModel: Send + Sync {
    fn infer(&self, input: ArrayView4<'_, f32>) -> anyhow::Result<Vec<f32>>;
}
