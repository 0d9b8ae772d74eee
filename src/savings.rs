//! Annual savings by category for a baseline/improved metric pair.

use crate::config::SystemConstants;
use crate::error::DataError;
use crate::types::{MetricKey, MetricSet};
use crate::util::ensure_finite;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavingsBreakdown {
    pub admin_labor_savings: f64,
    pub error_cost_savings: f64,
    pub additional_revenue: f64,
    pub processing_efficiency_savings: f64,
    pub total: f64,
}

impl SavingsBreakdown {
    /// Builds a breakdown whose `total` is the category sum, rejecting any
    /// non-finite or negative category and a total that overflows.
    pub fn from_categories(
        admin_labor_savings: f64,
        error_cost_savings: f64,
        additional_revenue: f64,
        processing_efficiency_savings: f64,
    ) -> Result<Self, DataError> {
        let breakdown = Self {
            admin_labor_savings,
            error_cost_savings,
            additional_revenue,
            processing_efficiency_savings,
            total: admin_labor_savings
                + error_cost_savings
                + additional_revenue
                + processing_efficiency_savings,
        };
        for (category, amount) in breakdown.categories() {
            ensure_finite(category, amount)?;
        }
        ensure_finite("total", breakdown.total)?;
        for (category, amount) in breakdown.categories() {
            if amount < 0.0 {
                return Err(DataError::NegativeSavings { category, amount });
            }
        }
        Ok(breakdown)
    }

    pub fn categories(&self) -> [(&'static str, f64); 4] {
        [
            ("admin_labor_savings", self.admin_labor_savings),
            ("error_cost_savings", self.error_cost_savings),
            ("additional_revenue", self.additional_revenue),
            ("processing_efficiency_savings", self.processing_efficiency_savings),
        ]
    }
}

pub fn decompose_savings(
    baseline: &MetricSet,
    improved: &MetricSet,
    constants: &SystemConstants,
) -> Result<SavingsBreakdown, DataError> {
    let units = constants.annual_units_served;
    let wage = constants.average_hourly_wage;

    let base = |key| baseline.require(key, "baseline");
    let imp = |key| improved.require(key, "improved");

    let admin_hours_saved =
        (base(MetricKey::AdminHoursPerUnit)? - imp(MetricKey::AdminHoursPerUnit)?) * units;
    let admin_labor_savings = admin_hours_saved * wage;

    let base_error_rate = base(MetricKey::ErrorRate)?;
    let base_cost = base(MetricKey::CostPerUnit)?;
    let error_rate_drop = base_error_rate - imp(MetricKey::ErrorRate)?;
    let baseline_error_cost = base_cost * base_error_rate * constants.error_cost_multiplier;
    let error_cost_savings = error_rate_drop * baseline_error_cost * units;

    let base_throughput = base(MetricKey::UnitsPerWorker)?;
    if base_throughput == 0.0 {
        return Err(DataError::ZeroDenominator {
            ratio: "throughput growth (improved / baseline units_per_worker)",
        });
    }
    let additional_units = units * (imp(MetricKey::UnitsPerWorker)? / base_throughput - 1.0);
    let additional_revenue =
        additional_units * (base_cost * constants.recoverable_revenue_fraction);

    let processing_hours_saved = (base(MetricKey::ProcessingTimeHours)?
        - imp(MetricKey::ProcessingTimeHours)?)
        * units
        * constants.paid_staff_time_fraction;
    let processing_efficiency_savings = processing_hours_saved * wage;

    let breakdown = SavingsBreakdown::from_categories(
        admin_labor_savings,
        error_cost_savings,
        additional_revenue,
        processing_efficiency_savings,
    )?;
    log::debug!("savings breakdown: {:?}", breakdown);
    Ok(breakdown)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair() -> (MetricSet, MetricSet) {
        let baseline = [
            (MetricKey::AdminHoursPerUnit, 2.0),
            (MetricKey::ProcessingTimeHours, 4.0),
            (MetricKey::ErrorRate, 0.025),
            (MetricKey::UnitsPerWorker, 20.0),
            (MetricKey::CostPerUnit, 250_000.0),
        ]
        .into_iter()
        .collect();
        let improved = [
            (MetricKey::AdminHoursPerUnit, 1.0),
            (MetricKey::ProcessingTimeHours, 1.0),
            (MetricKey::ErrorRate, 0.006),
            (MetricKey::UnitsPerWorker, 24.4),
            (MetricKey::CostPerUnit, 232_250.0),
        ]
        .into_iter()
        .collect();
        (baseline, improved)
    }

    #[test]
    fn every_category_is_positive_for_a_real_improvement() {
        let (b, i) = pair();
        let s = decompose_savings(&b, &i, &SystemConstants::default()).unwrap();
        for (name, amount) in s.categories() {
            assert!(amount > 0.0, "{} should be positive", name);
        }
    }

    #[test]
    fn admin_and_processing_savings_follow_hours_times_wage() {
        let (b, i) = pair();
        let s = decompose_savings(&b, &i, &SystemConstants::default()).unwrap();
        assert_eq!(s.admin_labor_savings, 1.0 * 47_000_000.0 * 3_000.0);
        assert!((s.processing_efficiency_savings - 3.0 * 47_000_000.0 * 0.1 * 3_000.0).abs() < 1.0);
    }

    #[test]
    fn total_is_exact_sum_of_categories() {
        let (b, i) = pair();
        let s = decompose_savings(&b, &i, &SystemConstants::default()).unwrap();
        assert_eq!(
            s.total,
            s.admin_labor_savings
                + s.error_cost_savings
                + s.additional_revenue
                + s.processing_efficiency_savings
        );
    }

    #[test]
    fn zero_baseline_throughput_is_a_data_error() {
        let (mut b, i) = pair();
        b.insert(MetricKey::UnitsPerWorker, 0.0);
        assert!(matches!(
            decompose_savings(&b, &i, &SystemConstants::default()),
            Err(DataError::ZeroDenominator { .. })
        ));
    }

    #[test]
    fn inverted_improvement_surfaces_negative_category() {
        let (b, mut i) = pair();
        i.insert(MetricKey::AdminHoursPerUnit, 3.0);
        assert!(matches!(
            decompose_savings(&b, &i, &SystemConstants::default()),
            Err(DataError::NegativeSavings {
                category: "admin_labor_savings",
                ..
            })
        ));
    }

    #[test]
    fn overflowing_category_is_a_data_error() {
        let (b, i) = pair();
        let constants = SystemConstants {
            average_hourly_wage: 1e305,
            ..SystemConstants::default()
        };
        assert!(constants.validate().is_ok());
        assert!(matches!(
            decompose_savings(&b, &i, &constants),
            Err(DataError::NonFinite {
                quantity: "admin_labor_savings",
                ..
            })
        ));
    }

    #[test]
    fn finite_categories_with_infinite_total_are_rejected() {
        let err = SavingsBreakdown::from_categories(f64::MAX, f64::MAX, 0.0, 0.0).unwrap_err();
        assert!(matches!(err, DataError::NonFinite { quantity: "total", .. }));
    }

    #[test]
    fn missing_metric_is_reported_with_its_set() {
        let (b, _) = pair();
        let i: MetricSet = [(MetricKey::AdminHoursPerUnit, 1.0)].into_iter().collect();
        assert_eq!(
            decompose_savings(&b, &i, &SystemConstants::default()),
            Err(DataError::MissingMetric {
                metric: MetricKey::ErrorRate,
                set: "improved"
            })
        );
    }
}
