//! # Mudra-Pipeline
//!
//! Gesture classification post-processing for quantized on-device models.
//!
//! A small camera-driven model emits one unsigned 8-bit score per gesture
//! category, every frame. This crate turns that stream into one stable
//! decision at a time:
//!
//! 1. **Capture**: a frame source fills the input buffer
//! 2. **Decode**: affine dequantization of the raw output vector
//! 3. **Classify**: deterministic argmax over integer percentages
//! 4. **Vote**: majority over a fixed window of consecutive inferences
//! 5. **Report**: score tables to the diagnostic sink, decision tokens
//!    to a byte-oriented transport
//!
//! The camera, the model interpreter, and the wire are external
//! collaborators behind the [`FrameSource`], `InferenceBackend`, and
//! [`DecisionTransport`] seams, so the whole pipeline runs against
//! scripted doubles in tests.

pub mod capture;
pub mod classify;
pub mod decode;
pub mod pipeline;
pub mod report;
pub mod vote;

pub use capture::{FrameFormat, FrameSource, TestPatternSource};
pub use classify::{argmax_percent, Classifier, ScoredInference};
pub use decode::{dequantize, dequantize_one, to_percentages};
pub use pipeline::{FrameOutcome, GesturePipeline, GestureRuntime, PipelineConfig};
pub use report::{
    ChannelTransport, DecisionReporter, DecisionTransport, NullTransport, ScoreEntry, ScoreTable,
};
pub use vote::VoteWindow;
