//! # Sales Math
//!
//! Numeric building blocks for the sales forecasting crates.
//! This crate provides descriptive statistics over plain value slices and
//! a deterministic simplex optimiser used to fit the forecasting model.

use thiserror::Error;

pub mod optimization;
pub mod stats;

/// Errors that can occur in numeric calculations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

/// Result type for numeric operations
pub type Result<T> = std::result::Result<T, MathError>;
