//! Error types for the Mudra gesture pipeline.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("frame capture error: {0}")]
    Capture(String),

    #[error("inference error: {0}")]
    Inference(String),

    #[error("model mismatch: pipeline expects {expected} categories, model reports {actual}")]
    ModelMismatch { expected: usize, actual: usize },

    #[error("arena allocation failed: {requested} bytes unavailable")]
    ArenaAllocation { requested: usize },

    #[error("missing tensor: {0}")]
    MissingTensor(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Whether this error indicates static misconfiguration that the
    /// pipeline cannot recover from at runtime.
    ///
    /// Fatal errors stop startup; everything else is logged and the
    /// classification loop carries on with the data it has.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::ModelMismatch { .. }
                | Error::ArenaAllocation { .. }
                | Error::MissingTensor(_)
                | Error::Config(_)
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(Error::ModelMismatch {
            expected: 7,
            actual: 2
        }
        .is_fatal());
        assert!(Error::ArenaAllocation { requested: 1024 }.is_fatal());
        assert!(Error::MissingTensor("output".into()).is_fatal());

        assert!(!Error::Capture("sensor timeout".into()).is_fatal());
        assert!(!Error::Inference("invoke failed".into()).is_fatal());
        assert!(!Error::Transport("tx queue full".into()).is_fatal());
    }
}
