//! # Mudra-Engine
//!
//! Working-memory management and the inference-backend seam for the
//! Mudra gesture pipeline.
//!
//! The model interpreter itself lives outside this workspace; this crate
//! provides the scratch arena it computes in ([`TensorArena`]), the
//! narrow trait the pipeline drives it through ([`InferenceBackend`]),
//! and a scripted implementation for tests and bring-up.

pub mod arena;
pub mod backend;
pub mod scripted;

pub use arena::TensorArena;
pub use backend::{validate_backend, InferenceBackend};
pub use scripted::ScriptedBackend;
