//! Affine dequantization of raw classifier outputs.
//!
//! The model emits one unsigned 8-bit score per category. With the output
//! tensor's quantization parameters, each score maps back to a real value:
//!
//! ```text
//! real = (raw - zero_point) * scale
//! ```
//!
//! For display the real scores are also folded to integer percentages;
//! the winner selection compares those integers, which keeps ties exact
//! instead of depending on float comparison.

use mudra_core::QuantizationParams;

/// Dequantize a single raw score
pub fn dequantize_one(raw: u8, params: &QuantizationParams) -> f32 {
    (raw as i32 - params.zero_point) as f32 * params.scale
}

/// Dequantize a raw score vector, preserving order
pub fn dequantize(raw: &[u8], params: &QuantizationParams) -> Vec<f32> {
    raw.iter().map(|&r| dequantize_one(r, params)).collect()
}

/// Fold dequantized scores to integer percentages.
///
/// Computes `(score * 100 + 0.5) as i32`: round-half-up for positive
/// scores, truncation toward zero for the negative values a zero point
/// above the raw range can produce.
pub fn to_percentages(scores: &[f32]) -> Vec<i32> {
    scores.iter().map(|&s| (s * 100.0 + 0.5) as i32).collect()
}
