//! Projected economic impact of automating administrative work in a national
//! healthcare system.
//!
//! Input tables are reduced to baseline metrics, improved by a set of
//! improvement factors, turned into annual savings per category and projected
//! over a multi-year horizon with payback detection. See
//! [`report::ImpactAnalyzer::generate_report`] for the full pipeline.

pub mod baseline;
pub mod config;
pub mod error;
pub mod loader;
pub mod output;
pub mod report;
pub mod roi;
pub mod savings;
pub mod scenario;
pub mod sweep;
pub mod types;
pub mod util;

pub use error::{AnalysisError, AnalysisResult, ConfigurationError, DataError};
pub use report::{AnalysisReport, ImpactAnalyzer};
pub use types::{ImprovementFactor, ImprovementFactors, InputTables, MetricKey, MetricSet};
