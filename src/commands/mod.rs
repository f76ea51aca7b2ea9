//! Command implementations for the CLI
//!
//! - predict: Score one patient
//! - batch: Score JSON-lines input
//! - check: Load and cross-check the artifacts
//! - config: Configuration display and validation

pub mod batch;
pub mod check;
pub mod config;
pub mod predict;
