//! Subprocess adapter for the external evaluation engine.
//!
//! Implements the `EvaluationEngine` port from `evalhub-core` by
//! spawning the configured engine process once per run request.

#![deny(unsafe_code)]

pub mod subprocess;

pub use subprocess::{EngineConfig, SubprocessEngine};
