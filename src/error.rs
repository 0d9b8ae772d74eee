use thiserror::Error;

use crate::types::{ImprovementFactor, MetricKey};

/// Failures caused by the numbers themselves: a ratio with nothing to divide
/// by, a factor or metric that should be present but is not, or a result that
/// breaks the model's invariants.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataError {
    #[error("Improvement factor '{factor}' is missing")]
    MissingFactor { factor: ImprovementFactor },

    #[error("Metric '{metric}' is missing from the {set} metric set")]
    MissingMetric { metric: MetricKey, set: &'static str },

    #[error("Cannot compute {ratio}: denominator is zero")]
    ZeroDenominator { ratio: &'static str },

    #[error("Metric '{metric}' has invalid value {value}")]
    InvalidMetric { metric: MetricKey, value: f64 },

    #[error("Savings category '{category}' is negative ({amount}); check the improvement factors")]
    NegativeSavings { category: &'static str, amount: f64 },

    #[error("'{quantity}' is not a finite number ({value}); check the system constants")]
    NonFinite { quantity: &'static str, value: f64 },
}

/// Invalid parameters, caught before any computation starts.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error(
        "Invalid analysis horizon: {years} years (must be between 1 and {})",
        crate::config::MAX_HORIZON_YEARS
    )]
    InvalidHorizon { years: u32 },

    #[error("Constant '{name}' must be non-negative, got {value}")]
    NegativeConstant { name: &'static str, value: f64 },

    #[error("Fraction '{name}' must lie in [0, 1], got {value}")]
    FractionOutOfRange { name: &'static str, value: f64 },

    #[error("Improvement factor '{factor}' is out of range: {value}")]
    FactorOutOfRange {
        factor: ImprovementFactor,
        value: f64,
    },

    #[error("Invalid sweep range for '{name}': {reason}")]
    InvalidRange { name: &'static str, reason: String },
}

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Data error: {0}")]
    Data(#[from] DataError),

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type AnalysisResult<T> = Result<T, AnalysisError>;
