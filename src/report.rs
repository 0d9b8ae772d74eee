//! Analysis pipeline and the report it produces.
//!
//! `ImpactAnalyzer::generate_report` runs baseline → improved → savings →
//! ROI → report in that order. Any failure aborts the run; there is no
//! partial report.

use crate::baseline::{calculate_baseline, BaselineMetrics};
use crate::config::{AnalysisConfig, AnalysisParams, OutputConfig, SystemConstants};
use crate::error::{AnalysisResult, ConfigurationError, DataError};
use crate::roi::{project_roi, InvestmentCosts, RoiProjection};
use crate::savings::{decompose_savings, SavingsBreakdown};
use crate::scenario::{apply_improvements, validate_factors};
use crate::types::{
    ImprovementFactor, ImprovementFactors, InputTables, MetricComparisonRow, MetricKey, MetricSet,
    Provenance, RoiYearRow,
};
use crate::util::format_number;
use serde::Serialize;
use std::collections::BTreeMap;

/// Headline figures for presentation: factor percentages and monetary
/// totals divided by the configured currency scale.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSummary {
    pub currency_unit: String,
    pub total_annual_savings_scaled: f64,
    pub horizon_years: u32,
    pub total_roi_percentage: f64,
    pub payback_period_years: Option<u32>,
    pub net_benefit_scaled: f64,
    pub total_investment_scaled: f64,
    pub net_present_value_scaled: f64,
    pub admin_time_reduction_percentage: f64,
    pub processing_time_reduction_percentage: f64,
    pub error_reduction_percentage: f64,
    pub throughput_increase_percentage: f64,
    pub cost_reduction_percentage: f64,
}

/// Result of one analysis run. Read-only once assembled.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    baseline_metrics: MetricSet,
    baseline_provenance: BTreeMap<MetricKey, Provenance>,
    improved_metrics: MetricSet,
    improvement_factors: ImprovementFactors,
    investment: InvestmentCosts,
    annual_savings: SavingsBreakdown,
    roi_analysis: RoiProjection,
    summary: ReportSummary,
}

impl AnalysisReport {
    pub fn baseline(&self) -> &MetricSet {
        &self.baseline_metrics
    }

    pub fn baseline_provenance(&self) -> &BTreeMap<MetricKey, Provenance> {
        &self.baseline_provenance
    }

    pub fn improved(&self) -> &MetricSet {
        &self.improved_metrics
    }

    pub fn improvement_factors(&self) -> &ImprovementFactors {
        &self.improvement_factors
    }

    pub fn investment(&self) -> &InvestmentCosts {
        &self.investment
    }

    pub fn savings(&self) -> &SavingsBreakdown {
        &self.annual_savings
    }

    pub fn roi(&self) -> &RoiProjection {
        &self.roi_analysis
    }

    pub fn summary(&self) -> &ReportSummary {
        &self.summary
    }

    pub fn comparison_rows(&self) -> Vec<MetricComparisonRow> {
        MetricKey::ALL
            .iter()
            .filter_map(|key| {
                let baseline = self.baseline_metrics.get(*key)?;
                let improved = self.improved_metrics.get(*key)?;
                let decimals = if *key == MetricKey::ErrorRate { 4 } else { 2 };
                let source = match self.baseline_provenance.get(key) {
                    Some(Provenance::Computed) => "data",
                    Some(Provenance::Fallback) => "fallback",
                    None => "-",
                };
                Some(MetricComparisonRow {
                    metric: key.to_string(),
                    baseline: format_number(baseline, decimals),
                    improved: format_number(improved, decimals),
                    source: source.to_string(),
                })
            })
            .collect()
    }

    pub fn roi_rows(&self) -> Vec<RoiYearRow> {
        self.roi_analysis
            .yearly
            .iter()
            .map(|y| RoiYearRow {
                year: y.year,
                savings: format_number(y.savings, 0),
                costs: format_number(y.costs, 0),
                net_benefit: format_number(y.net_benefit, 0),
                cumulative_net: format_number(y.cumulative_net, 0),
                roi_percentage: format_number(y.roi_percentage, 1),
            })
            .collect()
    }
}

/// Packages the stage outputs into a report and derives the summary view.
/// Every factor must be present; the summary never invents a 0% factor.
pub fn assemble_report(
    baseline: BaselineMetrics,
    improved: MetricSet,
    factors: ImprovementFactors,
    investment: InvestmentCosts,
    savings: SavingsBreakdown,
    roi: RoiProjection,
    output: &OutputConfig,
) -> Result<AnalysisReport, DataError> {
    let scale = output.currency_scale;
    let pct = |factor| factors.get(factor).map(|v| v * 100.0);
    let summary = ReportSummary {
        currency_unit: output.currency_unit.clone(),
        total_annual_savings_scaled: savings.total / scale,
        horizon_years: roi.horizon_years(),
        total_roi_percentage: roi.total_roi_percentage,
        payback_period_years: roi.payback_period_years,
        net_benefit_scaled: roi.net_benefit / scale,
        total_investment_scaled: roi.total_investment / scale,
        net_present_value_scaled: roi.net_present_value / scale,
        admin_time_reduction_percentage: pct(ImprovementFactor::AdminEfficiencyGain)?,
        processing_time_reduction_percentage: pct(ImprovementFactor::ProcessingSpeedGain)?,
        error_reduction_percentage: pct(ImprovementFactor::ErrorReduction)?,
        throughput_increase_percentage: pct(ImprovementFactor::ThroughputIncrease)?,
        cost_reduction_percentage: pct(ImprovementFactor::CostReduction)?,
    };
    Ok(AnalysisReport {
        baseline_metrics: baseline.metrics,
        baseline_provenance: baseline.provenance,
        improved_metrics: improved,
        improvement_factors: factors,
        investment,
        annual_savings: savings,
        roi_analysis: roi,
        summary,
    })
}

/// Holds the constants and parameters shared by every run. Improvement
/// factors are passed to each run by value.
#[derive(Debug, Clone, PartialEq)]
pub struct ImpactAnalyzer {
    constants: SystemConstants,
    params: AnalysisParams,
    output: OutputConfig,
}

impl ImpactAnalyzer {
    pub fn new(
        constants: SystemConstants,
        params: AnalysisParams,
        output: OutputConfig,
    ) -> Result<Self, ConfigurationError> {
        constants.validate()?;
        params.validate()?;
        output.validate()?;
        Ok(Self {
            constants,
            params,
            output,
        })
    }

    pub fn from_config(config: &AnalysisConfig) -> Result<Self, ConfigurationError> {
        Self::new(
            config.system_constants.clone(),
            config.analysis_params.clone(),
            config.output.clone(),
        )
    }

    pub fn constants(&self) -> &SystemConstants {
        &self.constants
    }

    pub fn params(&self) -> &AnalysisParams {
        &self.params
    }

    pub fn output(&self) -> &OutputConfig {
        &self.output
    }

    /// A copy of this analyzer with different system constants.
    pub fn with_constants(&self, constants: SystemConstants) -> Result<Self, ConfigurationError> {
        Self::new(constants, self.params.clone(), self.output.clone())
    }

    pub fn generate_report(
        &self,
        tables: &InputTables,
        factors: ImprovementFactors,
    ) -> AnalysisResult<AnalysisReport> {
        validate_factors(&factors)?;
        let investment = InvestmentCosts::from_tables(tables);
        investment.validate()?;

        let baseline = calculate_baseline(tables, &self.constants)?;
        if baseline.fallback_count() > 0 {
            log::info!(
                "{} of {} baseline metrics use fallback values",
                baseline.fallback_count(),
                baseline.metrics.iter().count()
            );
        }
        let improved = apply_improvements(&baseline.metrics, &factors)?;
        let savings = decompose_savings(&baseline.metrics, &improved, &self.constants)?;
        let roi = project_roi(savings.total, &investment, &self.params)?;

        log::info!(
            "analysis complete: annual savings {}, {}-year ROI {:.1}%, payback {:?}",
            format_number(savings.total, 0),
            roi.horizon_years(),
            roi.total_roi_percentage,
            roi.payback_period_years
        );
        let report = assemble_report(
            baseline,
            improved,
            factors,
            investment,
            savings,
            roi,
            &self.output,
        )?;
        Ok(report)
    }
}

impl Default for ImpactAnalyzer {
    fn default() -> Self {
        Self {
            constants: SystemConstants::default(),
            params: AnalysisParams::default(),
            output: OutputConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalysisError;

    #[test]
    fn summary_uses_percentages_and_scaled_totals() {
        let report = ImpactAnalyzer::default()
            .generate_report(&InputTables::default(), ImprovementFactors::default())
            .unwrap();
        let summary = report.summary();
        assert_eq!(summary.admin_time_reduction_percentage, 0.52 * 100.0);
        assert_eq!(summary.error_reduction_percentage, 0.76 * 100.0);
        assert_eq!(summary.throughput_increase_percentage, 0.24 * 100.0);
        assert_eq!(
            summary.total_annual_savings_scaled,
            report.savings().total / 1e12
        );
        assert_eq!(summary.horizon_years, 5);
        assert_eq!(summary.currency_unit, "trillion yen");
    }

    #[test]
    fn fallback_provenance_is_visible_in_report() {
        let report = ImpactAnalyzer::default()
            .generate_report(&InputTables::default(), ImprovementFactors::default())
            .unwrap();
        assert!(report
            .baseline_provenance()
            .values()
            .all(|p| *p == Provenance::Fallback));
        assert_eq!(report.investment().provenance, Provenance::Fallback);
        assert!(report.comparison_rows().iter().all(|r| r.source == "fallback"));
        assert_eq!(report.roi_rows().len(), 5);
    }

    #[test]
    fn missing_factor_aborts_the_run() {
        let factors = ImprovementFactors::default().without(ImprovementFactor::ErrorReduction);
        let err = ImpactAnalyzer::default()
            .generate_report(&InputTables::default(), factors)
            .unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::Data(DataError::MissingFactor {
                factor: ImprovementFactor::ErrorReduction
            })
        ));
    }

    #[test]
    fn assembling_without_a_factor_is_an_error() {
        let tables = InputTables::default();
        let constants = SystemConstants::default();
        let factors = ImprovementFactors::default();
        let baseline = calculate_baseline(&tables, &constants).unwrap();
        let improved = apply_improvements(&baseline.metrics, &factors).unwrap();
        let savings = decompose_savings(&baseline.metrics, &improved, &constants).unwrap();
        let investment = InvestmentCosts::from_tables(&tables);
        let roi = project_roi(savings.total, &investment, &AnalysisParams::default()).unwrap();

        let result = assemble_report(
            baseline,
            improved,
            factors.without(ImprovementFactor::CostReduction),
            investment,
            savings,
            roi,
            &OutputConfig::default(),
        );
        assert_eq!(
            result.unwrap_err(),
            DataError::MissingFactor {
                factor: ImprovementFactor::CostReduction
            }
        );
    }

    #[test]
    fn invalid_constants_are_rejected_at_construction() {
        let constants = SystemConstants {
            error_cost_multiplier: -1.5,
            ..SystemConstants::default()
        };
        assert!(ImpactAnalyzer::new(
            constants,
            AnalysisParams::default(),
            OutputConfig::default()
        )
        .is_err());
    }

    #[test]
    fn out_of_range_factor_is_a_configuration_error() {
        let factors = ImprovementFactors::default().with(ImprovementFactor::AdminEfficiencyGain, 1.2);
        let err = ImpactAnalyzer::default()
            .generate_report(&InputTables::default(), factors)
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Configuration(_)));
    }

    #[test]
    fn report_serializes_with_documented_keys() {
        let report = ImpactAnalyzer::default()
            .generate_report(&InputTables::default(), ImprovementFactors::default())
            .unwrap();
        let value = serde_json::to_value(&report).unwrap();
        assert!(value["baseline_metrics"]["admin_hours_per_unit"].is_number());
        assert!(value["improved_metrics"]["error_rate"].is_number());
        assert!(value["annual_savings"]["total"].is_number());
        assert!(value["roi_analysis"]["yearly"].is_array());
        assert!(value["summary"]["total_roi_percentage"].is_number());
    }
}
