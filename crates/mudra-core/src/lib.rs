//! # Mudra-Core
//!
//! Core types and utilities for the Mudra embedded gesture
//! classification pipeline.

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::*;
