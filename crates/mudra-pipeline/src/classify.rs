//! Per-inference winner selection.
//!
//! One inference produces one score per category; the classifier picks
//! the winner by scanning the integer percentages with a
//! strictly-greater comparison, so equal scores always resolve to the
//! lowest category index. The vote aggregator breaks its ties the same
//! way, which keeps a decision reproducible end to end.

use mudra_core::{CategorySet, ClassificationResult, Error, QuantizationParams, Result, Timestamp};

use crate::decode::{dequantize, to_percentages};

/// Index and percentage of the winning category.
///
/// The candidate starts at index 0 and is replaced only by a strictly
/// greater percentage. Returns `None` for an empty slice.
pub fn argmax_percent(percentages: &[i32]) -> Option<(usize, i32)> {
    let mut best = (0, *percentages.first()?);
    for (index, &percent) in percentages.iter().enumerate().skip(1) {
        if percent > best.1 {
            best = (index, percent);
        }
    }
    Some(best)
}

/// One fully decoded inference: the winner plus the score vectors it
/// was selected from
#[derive(Debug, Clone)]
pub struct ScoredInference {
    pub result: ClassificationResult,
    pub scores: Vec<f32>,
    pub percentages: Vec<i32>,
}

/// Classifier over a fixed category set
#[derive(Debug, Clone)]
pub struct Classifier {
    categories: CategorySet,
}

impl Classifier {
    pub fn new(categories: CategorySet) -> Self {
        Self { categories }
    }

    pub fn categories(&self) -> &CategorySet {
        &self.categories
    }

    /// Decode one raw score vector and select the winning category,
    /// keeping the full score vectors for diagnostics
    pub fn evaluate(&self, raw: &[u8], params: &QuantizationParams) -> Result<ScoredInference> {
        if raw.len() != self.categories.len() {
            return Err(Error::InvalidInput(format!(
                "got {} raw scores for {} categories",
                raw.len(),
                self.categories.len()
            )));
        }

        let scores = dequantize(raw, params);
        let percentages = to_percentages(&scores);

        // Non-empty by construction: the category set rejects empty labels
        let (index, percent) = argmax_percent(&percentages).expect("category set is non-empty");

        let result = ClassificationResult {
            index,
            label: self
                .categories
                .label(index)
                .unwrap_or("Unknown")
                .to_string(),
            percent,
            score: scores[index],
            timestamp: Timestamp::now(),
        };

        Ok(ScoredInference {
            result,
            scores,
            percentages,
        })
    }

    /// Decode one raw score vector and select the winning category
    pub fn classify(
        &self,
        raw: &[u8],
        params: &QuantizationParams,
    ) -> Result<ClassificationResult> {
        self.evaluate(raw, params).map(|scored| scored.result)
    }
}
