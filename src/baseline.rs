//! Baseline metrics: reduces the input tables to five scalar metrics.
//!
//! Each metric comes from table data when the table has rows and from a
//! documented constant otherwise. The constant is never an error; it is
//! logged and tagged `Provenance::Fallback` so callers can see which numbers
//! were measured.

use crate::config::SystemConstants;
use crate::error::DataError;
use crate::types::{Derived, InputTables, MetricKey, MetricSet, Provenance};
use crate::util::{mean, safe_ratio};
use std::collections::BTreeMap;

pub const FALLBACK_ADMIN_HOURS_PER_UNIT: f64 = 2.0;
pub const FALLBACK_PROCESSING_TIME_HOURS: f64 = 4.0;
pub const FALLBACK_ERROR_RATE: f64 = 0.025;

#[derive(Debug, Clone, PartialEq)]
pub struct BaselineMetrics {
    pub metrics: MetricSet,
    pub provenance: BTreeMap<MetricKey, Provenance>,
}

impl BaselineMetrics {
    pub fn fallback_count(&self) -> usize {
        self.provenance
            .values()
            .filter(|p| **p == Provenance::Fallback)
            .count()
    }
}

pub fn calculate_baseline(
    tables: &InputTables,
    constants: &SystemConstants,
) -> Result<BaselineMetrics, DataError> {
    let admin = &tables.administrative_costs;
    let derived = [
        (
            MetricKey::AdminHoursPerUnit,
            column_mean(
                admin.iter().map(|r| r.hours_per_unit),
                FALLBACK_ADMIN_HOURS_PER_UNIT,
            ),
        ),
        (
            MetricKey::ProcessingTimeHours,
            column_mean(
                admin.iter().map(|r| r.processing_time_hours),
                FALLBACK_PROCESSING_TIME_HOURS,
            ),
        ),
        (
            MetricKey::ErrorRate,
            column_mean(admin.iter().map(|r| r.error_rate), FALLBACK_ERROR_RATE),
        ),
        (MetricKey::UnitsPerWorker, units_per_worker(tables, constants)),
        (MetricKey::CostPerUnit, cost_per_unit(tables, constants)?),
    ];

    let mut metrics = MetricSet::new();
    let mut provenance = BTreeMap::new();
    for (key, value) in derived {
        if value.is_fallback() {
            log::warn!(
                "baseline {}: input data unavailable, using fallback {}",
                key,
                value.value()
            );
        }
        metrics.insert(key, value.value());
        provenance.insert(key, value.provenance());
    }
    metrics.validate()?;
    log::debug!("baseline metrics: {:?}", metrics);
    Ok(BaselineMetrics {
        metrics,
        provenance,
    })
}

fn column_mean(values: impl Iterator<Item = f64>, fallback: f64) -> Derived {
    let values: Vec<f64> = values.collect();
    match mean(&values) {
        Some(m) => Derived::Computed(m),
        None => Derived::Fallback(fallback),
    }
}

/// Served units per worker across all regions. A zero worker total falls
/// back instead of dividing.
pub fn units_per_worker(tables: &InputTables, constants: &SystemConstants) -> Derived {
    if tables.workforce.is_empty() || tables.patient_volume.is_empty() {
        return Derived::Fallback(constants.units_per_worker_baseline);
    }
    let workers: f64 = tables.workforce.iter().map(|r| r.total_workers).sum();
    let units: f64 = tables.patient_volume.iter().map(|r| r.units_served).sum();
    if workers <= 0.0 {
        return Derived::Fallback(constants.units_per_worker_baseline);
    }
    match safe_ratio(units, workers) {
        Some(v) => Derived::Computed(v),
        None => Derived::Fallback(constants.units_per_worker_baseline),
    }
}

/// First-row expenditure over total served units, or system cost over
/// annual units when either table is empty or no units were served.
///
/// The fallback divides two configured constants, so a zero
/// `annual_units_served` there has nothing further to fall back on and is a
/// `DataError`.
pub fn cost_per_unit(
    tables: &InputTables,
    constants: &SystemConstants,
) -> Result<Derived, DataError> {
    if let Some(first) = tables.medical_expenditure.first() {
        if !tables.patient_volume.is_empty() {
            let units: f64 = tables.patient_volume.iter().map(|r| r.units_served).sum();
            if units > 0.0 {
                if let Some(v) = safe_ratio(first.total_expenditure, units) {
                    return Ok(Derived::Computed(v));
                }
            }
        }
    }
    safe_ratio(constants.total_system_cost, constants.annual_units_served)
        .map(Derived::Fallback)
        .ok_or(DataError::ZeroDenominator {
            ratio: "fallback cost_per_unit (total_system_cost / annual_units_served)",
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AdminCostRecord, ExpenditureRecord, PatientVolumeRecord, WorkforceRecord};

    fn admin_row(hours: f64, processing: f64, error_rate: f64) -> AdminCostRecord {
        AdminCostRecord {
            facility_id: None,
            admin_percentage: None,
            hours_per_unit: hours,
            processing_time_hours: processing,
            error_rate,
        }
    }

    fn workforce_row(workers: f64) -> WorkforceRecord {
        WorkforceRecord {
            region_id: None,
            total_workers: workers,
            administrative_workers: None,
            clinical_workers: None,
        }
    }

    fn volume_row(units: f64) -> PatientVolumeRecord {
        PatientVolumeRecord {
            year: Some(2023),
            region_id: None,
            units_served: units,
            outpatient_visits: None,
        }
    }

    fn sample_tables() -> InputTables {
        InputTables {
            medical_expenditure: vec![ExpenditureRecord {
                year: Some(2023),
                total_expenditure: 45e12,
                admin_expenditure: None,
                clinical_expenditure: None,
                error_related_costs: None,
            }],
            workforce: vec![workforce_row(10000.0), workforce_row(8000.0), workforce_row(12000.0)],
            administrative_costs: vec![
                admin_row(2.0, 4.0, 0.025),
                admin_row(2.5, 4.5, 0.020),
                admin_row(1.8, 3.5, 0.030),
            ],
            patient_volume: vec![volume_row(1_000_000.0), volume_row(800_000.0), volume_row(1_200_000.0)],
            intervention_costs: vec![],
        }
    }

    #[test]
    fn computes_every_metric_from_tables() {
        let baseline = calculate_baseline(&sample_tables(), &SystemConstants::default()).unwrap();
        let m = &baseline.metrics;
        assert!((m.get(MetricKey::AdminHoursPerUnit).unwrap() - 2.1).abs() < 1e-12);
        assert!((m.get(MetricKey::ProcessingTimeHours).unwrap() - 4.0).abs() < 1e-12);
        assert!((m.get(MetricKey::ErrorRate).unwrap() - 0.025).abs() < 1e-12);
        assert_eq!(m.get(MetricKey::UnitsPerWorker), Some(100.0));
        assert_eq!(m.get(MetricKey::CostPerUnit), Some(15_000_000.0));
        assert_eq!(baseline.fallback_count(), 0);
    }

    #[test]
    fn empty_tables_use_fallback_constants() {
        let constants = SystemConstants::default();
        let baseline = calculate_baseline(&InputTables::default(), &constants).unwrap();
        let m = &baseline.metrics;
        assert_eq!(m.get(MetricKey::AdminHoursPerUnit), Some(2.0));
        assert_eq!(m.get(MetricKey::ProcessingTimeHours), Some(4.0));
        assert_eq!(m.get(MetricKey::ErrorRate), Some(0.025));
        assert_eq!(m.get(MetricKey::UnitsPerWorker), Some(20.0));
        assert_eq!(m.get(MetricKey::CostPerUnit), Some(45e12 / 47_000_000.0));
        assert_eq!(baseline.fallback_count(), 5);
    }

    #[test]
    fn zero_workers_fall_back_instead_of_dividing() {
        let mut tables = sample_tables();
        tables.workforce = vec![workforce_row(0.0)];
        let derived = units_per_worker(&tables, &SystemConstants::default());
        assert_eq!(derived, Derived::Fallback(20.0));
    }

    #[test]
    fn expenditure_without_volume_uses_ratio_fallback() {
        let mut tables = sample_tables();
        tables.patient_volume.clear();
        let derived = cost_per_unit(&tables, &SystemConstants::default()).unwrap();
        assert!(derived.is_fallback());
        assert_eq!(derived.value(), 45e12 / 47_000_000.0);
    }

    #[test]
    fn zero_annual_units_in_fallback_is_a_data_error() {
        let constants = SystemConstants {
            annual_units_served: 0.0,
            ..SystemConstants::default()
        };
        assert!(matches!(
            cost_per_unit(&InputTables::default(), &constants),
            Err(DataError::ZeroDenominator { .. })
        ));
    }

    #[test]
    fn out_of_range_error_rate_is_rejected() {
        let mut tables = sample_tables();
        tables.administrative_costs = vec![admin_row(2.0, 4.0, 1.5)];
        assert!(matches!(
            calculate_baseline(&tables, &SystemConstants::default()),
            Err(DataError::InvalidMetric {
                metric: MetricKey::ErrorRate,
                ..
            })
        ));
    }
}
