//! Inference backend interface.
//!
//! The quantized-model interpreter is an external collaborator: it owns
//! the model, its operators, and its tensor bookkeeping. The pipeline
//! only needs a narrow surface from it — fill the input tensor, invoke,
//! read the quantized per-category outputs and their quantization
//! parameters. Anything that can run a gesture model implements
//! [`InferenceBackend`]; the rest of the pipeline never sees what is
//! behind the trait.

use mudra_core::{CategorySet, Error, QuantizationParams, Result};

/// Narrow interface to the external quantized-model interpreter
pub trait InferenceBackend: Send {
    /// Number of categories in the model's output tensor
    fn category_count(&self) -> usize;

    /// Byte length of the model's input tensor
    fn input_len(&self) -> usize;

    /// Copy one captured frame into the input tensor
    fn fill_input(&mut self, frame: &[u8]) -> Result<()>;

    /// Run the model on the current input tensor.
    ///
    /// Synchronous and blocking; dominates loop latency.
    fn invoke(&mut self) -> Result<()>;

    /// Quantized score for one output category
    fn output(&self, index: usize) -> Result<u8>;

    /// Quantization parameters of the output tensor, constant for a
    /// loaded model
    fn quantization_params(&self) -> QuantizationParams;

    /// Collect the full raw score vector in category order
    fn raw_scores(&self) -> Result<Vec<u8>> {
        (0..self.category_count()).map(|i| self.output(i)).collect()
    }
}

/// Startup sanity checks against a loaded backend.
///
/// Failures here are fatal: they indicate static misconfiguration
/// (wrong model for this category set, or a model without a usable
/// input tensor) that cannot heal at runtime.
pub fn validate_backend(backend: &dyn InferenceBackend, categories: &CategorySet) -> Result<()> {
    if backend.category_count() != categories.len() {
        return Err(Error::ModelMismatch {
            expected: categories.len(),
            actual: backend.category_count(),
        });
    }

    if backend.input_len() == 0 {
        return Err(Error::MissingTensor("input".into()));
    }

    backend.quantization_params().validate()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scripted::ScriptedBackend;

    #[test]
    fn test_validate_matching_backend() {
        let categories = CategorySet::hand_digits();
        let backend = ScriptedBackend::uniform(categories.len(), 36);
        assert!(validate_backend(&backend, &categories).is_ok());
    }

    #[test]
    fn test_validate_category_mismatch() {
        let categories = CategorySet::hand_digits();
        let backend = ScriptedBackend::uniform(2, 128);

        match validate_backend(&backend, &categories) {
            Err(Error::ModelMismatch { expected, actual }) => {
                assert_eq!(expected, 7);
                assert_eq!(actual, 2);
            }
            other => panic!("expected ModelMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_bad_params() {
        let categories = CategorySet::hand_digits();
        let backend = ScriptedBackend::uniform(categories.len(), 36)
            .with_params(QuantizationParams::new(0.0, 0));
        assert!(validate_backend(&backend, &categories).is_err());
    }
}
