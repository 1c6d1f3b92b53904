//! Scripted inference backend for tests and bring-up.
//!
//! Plays back canned raw score vectors, one per invoke, cycling when the
//! script runs out. Invoke failures can be injected; a failed invoke
//! leaves the previous outputs in place, which is exactly what a real
//! interpreter's output tensor does when an invocation aborts mid-loop.

use mudra_core::{Error, QuantizationParams, Result};

use crate::backend::InferenceBackend;

/// Backend that replays a fixed script of raw score vectors
pub struct ScriptedBackend {
    category_count: usize,
    input: Vec<u8>,
    script: Vec<Vec<u8>>,
    cursor: usize,
    current: Vec<u8>,
    params: QuantizationParams,
    fail_invokes: usize,
    invocations: u64,
}

impl ScriptedBackend {
    /// Default input tensor size matching the 96x96 grayscale model
    pub const DEFAULT_INPUT_LEN: usize = 96 * 96;

    /// Backend whose every inference scores all categories equally
    pub fn uniform(category_count: usize, raw: u8) -> Self {
        Self::from_scores(category_count, vec![vec![raw; category_count]])
    }

    /// Backend that replays `script` in order, cycling at the end.
    ///
    /// Every vector must have `category_count` entries.
    pub fn from_scores(category_count: usize, script: Vec<Vec<u8>>) -> Self {
        debug_assert!(!script.is_empty());
        debug_assert!(script.iter().all(|s| s.len() == category_count));

        Self {
            category_count,
            input: vec![0; Self::DEFAULT_INPUT_LEN],
            script,
            cursor: 0,
            current: vec![0; category_count],
            params: QuantizationParams::new(1.0 / 256.0, 0),
            fail_invokes: 0,
            invocations: 0,
        }
    }

    pub fn with_params(mut self, params: QuantizationParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_input_len(mut self, len: usize) -> Self {
        self.input = vec![0; len];
        self
    }

    /// Make the next `n` invocations fail with an inference error
    pub fn fail_next_invokes(mut self, n: usize) -> Self {
        self.fail_invokes = n;
        self
    }

    /// Number of successful invocations so far
    pub fn invocations(&self) -> u64 {
        self.invocations
    }

    /// Bytes currently sitting in the input tensor
    pub fn input(&self) -> &[u8] {
        &self.input
    }
}

impl InferenceBackend for ScriptedBackend {
    fn category_count(&self) -> usize {
        self.category_count
    }

    fn input_len(&self) -> usize {
        self.input.len()
    }

    fn fill_input(&mut self, frame: &[u8]) -> Result<()> {
        if frame.len() != self.input.len() {
            return Err(Error::InvalidInput(format!(
                "frame is {} bytes, input tensor expects {}",
                frame.len(),
                self.input.len()
            )));
        }
        self.input.copy_from_slice(frame);
        Ok(())
    }

    fn invoke(&mut self) -> Result<()> {
        if self.fail_invokes > 0 {
            self.fail_invokes -= 1;
            return Err(Error::Inference("scripted invoke failure".into()));
        }

        self.current = self.script[self.cursor % self.script.len()].clone();
        self.cursor += 1;
        self.invocations += 1;
        Ok(())
    }

    fn output(&self, index: usize) -> Result<u8> {
        self.current
            .get(index)
            .copied()
            .ok_or_else(|| Error::MissingTensor(format!("output index {}", index)))
    }

    fn quantization_params(&self) -> QuantizationParams {
        self.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_playback_cycles() {
        let mut backend =
            ScriptedBackend::from_scores(3, vec![vec![10, 20, 30], vec![30, 20, 10]]);

        backend.invoke().unwrap();
        assert_eq!(backend.raw_scores().unwrap(), vec![10, 20, 30]);

        backend.invoke().unwrap();
        assert_eq!(backend.raw_scores().unwrap(), vec![30, 20, 10]);

        // Wraps back to the first vector
        backend.invoke().unwrap();
        assert_eq!(backend.raw_scores().unwrap(), vec![10, 20, 30]);
        assert_eq!(backend.invocations(), 3);
    }

    #[test]
    fn test_failed_invoke_keeps_stale_outputs() {
        let mut backend = ScriptedBackend::from_scores(2, vec![vec![200, 1], vec![1, 200]])
            .fail_next_invokes(1);

        backend.invoke().unwrap_err();

        // Outputs are whatever was there before the failure
        assert_eq!(backend.raw_scores().unwrap(), vec![0, 0]);

        backend.invoke().unwrap();
        assert_eq!(backend.raw_scores().unwrap(), vec![200, 1]);
        assert_eq!(backend.invocations(), 1);
    }

    #[test]
    fn test_fill_input_length_check() {
        let mut backend = ScriptedBackend::uniform(7, 36).with_input_len(16);
        assert!(backend.fill_input(&[0u8; 16]).is_ok());
        assert!(backend.fill_input(&[0u8; 8]).is_err());
    }
}
