use crate::error::{ConfigurationError, DataError};
use crate::types::{ImprovementFactor, ImprovementFactors, MetricKey, MetricSet};

/// The factor that moves each metric, and whether it lowers or raises it.
fn factor_for(metric: MetricKey) -> (ImprovementFactor, bool) {
    match metric {
        MetricKey::AdminHoursPerUnit => (ImprovementFactor::AdminEfficiencyGain, false),
        MetricKey::ProcessingTimeHours => (ImprovementFactor::ProcessingSpeedGain, false),
        MetricKey::ErrorRate => (ImprovementFactor::ErrorReduction, false),
        MetricKey::UnitsPerWorker => (ImprovementFactor::ThroughputIncrease, true),
        MetricKey::CostPerUnit => (ImprovementFactor::CostReduction, false),
    }
}

/// Derive the improved metric set from `baseline`.
///
/// Reductions scale a metric by `1 - factor`, throughput scales by
/// `1 + factor`. Only metrics present in `baseline` appear in the result;
/// a factor needed by one of them must be present.
pub fn apply_improvements(
    baseline: &MetricSet,
    factors: &ImprovementFactors,
) -> Result<MetricSet, DataError> {
    baseline
        .iter()
        .map(|(metric, value)| -> Result<(MetricKey, f64), DataError> {
            let (factor, increases) = factor_for(metric);
            let ratio = factors.get(factor)?;
            let scale = if increases { 1.0 + ratio } else { 1.0 - ratio };
            Ok((metric, value * scale))
        })
        .collect()
}

/// Reductions must lie in `[0, 1)`, the throughput increase in `[0, ∞)`.
/// Missing factors are not checked here; they only fail when a metric needs
/// them.
pub fn validate_factors(factors: &ImprovementFactors) -> Result<(), ConfigurationError> {
    for (factor, value) in factors.iter() {
        let ok = if factor.is_increase() {
            value.is_finite() && value >= 0.0
        } else {
            (0.0..1.0).contains(&value)
        };
        if !ok {
            return Err(ConfigurationError::FactorOutOfRange { factor, value });
        }
    }
    Ok(())
}
