//! Fundamental types for the Mudra gesture pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Timestamp wrapper with nanosecond precision
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn now() -> Self {
        Self(Utc::now().timestamp_nanos_opt().unwrap_or(0))
    }

    pub fn from_nanos(nanos: i64) -> Self {
        Self(nanos)
    }

    pub fn as_nanos(&self) -> i64 {
        self.0
    }

    pub fn as_secs_f64(&self) -> f64 {
        self.0 as f64 / 1_000_000_000.0
    }

    pub fn to_datetime(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_nanos(self.0)
    }
}

/// Affine quantization parameters for one model output tensor
///
/// Maps the quantized sample space back to real values:
/// `real = (raw - zero_point) * scale`. Constant per loaded model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuantizationParams {
    /// Multiplicative scale, strictly positive
    pub scale: f32,

    /// Quantized value that maps to real zero
    pub zero_point: i32,
}

impl QuantizationParams {
    pub fn new(scale: f32, zero_point: i32) -> Self {
        Self { scale, zero_point }
    }

    /// Identity mapping, useful for unquantized test fixtures
    pub fn identity() -> Self {
        Self {
            scale: 1.0,
            zero_point: 0,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(Error::InvalidInput(format!(
                "quantization scale must be finite and positive, got {}",
                self.scale
            )));
        }
        Ok(())
    }
}

/// Ordered, fixed set of category labels the classifier can report
///
/// The set is immutable for the process lifetime. One label may be
/// designated as the blank (no-gesture) class; it participates in
/// classification and voting like any other category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySet {
    labels: Vec<String>,
    blank_index: Option<usize>,
}

impl CategorySet {
    pub fn new(labels: Vec<String>, blank_index: Option<usize>) -> Result<Self> {
        if labels.is_empty() {
            return Err(Error::Config("category set must not be empty".into()));
        }
        if let Some(idx) = blank_index {
            if idx >= labels.len() {
                return Err(Error::Config(format!(
                    "blank index {} out of range for {} categories",
                    idx,
                    labels.len()
                )));
            }
        }
        Ok(Self {
            labels,
            blank_index,
        })
    }

    /// Seven-class hand digit model: 1, 10, 2, 3, 4, 5 and a blank class
    pub fn hand_digits() -> Self {
        Self {
            labels: ["1", "10", "2", "3", "4", "5", "Blank"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            blank_index: Some(6),
        }
    }

    /// Compact six-class hand digit model without a blank class
    pub fn hand_digits_compact() -> Self {
        Self {
            labels: ["5", "0", "1", "2", "3", "4"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            blank_index: None,
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn label(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(|s| s.as_str())
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn blank_index(&self) -> Option<usize> {
        self.blank_index
    }

    pub fn is_blank(&self, index: usize) -> bool {
        self.blank_index == Some(index)
    }
}

impl Default for CategorySet {
    fn default() -> Self {
        Self::hand_digits()
    }
}

/// Argmax outcome of a single inference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Winning category index
    pub index: usize,

    /// Winning category label
    pub label: String,

    /// Integer confidence percentage used for the comparison
    pub percent: i32,

    /// Dequantized confidence score
    pub score: f32,

    pub timestamp: Timestamp,
}

/// Majority outcome of one completed vote window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MajorityVote {
    /// Winning category index
    pub index: usize,

    /// Number of votes the winner received
    pub votes: usize,

    /// Window capacity the votes were counted over
    pub window: usize,
}

/// Stable gesture decision emitted after a vote window completes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GestureDecision {
    /// Decided category index
    pub index: usize,

    /// Decided category label
    pub label: String,

    /// Votes the category received within the window
    pub votes: usize,

    /// Window capacity
    pub window: usize,

    pub timestamp: Timestamp,
}

impl GestureDecision {
    pub fn from_vote(vote: MajorityVote, categories: &CategorySet) -> Self {
        let label = categories
            .label(vote.index)
            .unwrap_or("Unknown")
            .to_string();
        Self {
            index: vote.index,
            label,
            votes: vote.votes,
            window: vote.window,
            timestamp: Timestamp::now(),
        }
    }

    /// Whether this decision names the blank (no-gesture) class
    pub fn is_blank(&self, categories: &CategorySet) -> bool {
        categories.is_blank(self.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_set_presets() {
        let digits = CategorySet::hand_digits();
        assert_eq!(digits.len(), 7);
        assert_eq!(digits.label(0), Some("1"));
        assert_eq!(digits.label(1), Some("10"));
        assert_eq!(digits.label(6), Some("Blank"));
        assert!(digits.is_blank(6));
        assert!(!digits.is_blank(0));

        let compact = CategorySet::hand_digits_compact();
        assert_eq!(compact.len(), 6);
        assert_eq!(compact.blank_index(), None);
    }

    #[test]
    fn test_category_set_validation() {
        assert!(CategorySet::new(vec![], None).is_err());
        assert!(CategorySet::new(vec!["a".into()], Some(1)).is_err());
        assert!(CategorySet::new(vec!["a".into(), "b".into()], Some(1)).is_ok());
    }

    #[test]
    fn test_quantization_params_validation() {
        assert!(QuantizationParams::new(0.00390625, 0).validate().is_ok());
        assert!(QuantizationParams::new(0.0, 0).validate().is_err());
        assert!(QuantizationParams::new(-1.0, 0).validate().is_err());
        assert!(QuantizationParams::new(f32::NAN, 0).validate().is_err());
    }

    #[test]
    fn test_decision_from_vote() {
        let categories = CategorySet::hand_digits();
        let vote = MajorityVote {
            index: 1,
            votes: 3,
            window: 5,
        };
        let decision = GestureDecision::from_vote(vote, &categories);
        assert_eq!(decision.label, "10");
        assert_eq!(decision.votes, 3);
        assert!(!decision.is_blank(&categories));
    }
}
