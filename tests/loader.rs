//! CSV data provider tests.

use healthcare_roi::loader::{
    CsvDirectory, DataProvider, ADMINISTRATIVE_COSTS_FILE, INTERVENTION_COSTS_FILE,
    MEDICAL_EXPENDITURE_FILE, PATIENT_VOLUME_FILE, WORKFORCE_FILE,
};
use healthcare_roi::types::Provenance;
use healthcare_roi::{ImpactAnalyzer, ImprovementFactors, InputTables, MetricKey};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(dir: &Path, file: &str, contents: &str) {
    fs::write(dir.join(file), contents).unwrap();
}

fn full_data_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    let p = dir.path();
    write(
        p,
        MEDICAL_EXPENDITURE_FILE,
        "year,total_expenditure,admin_expenditure,clinical_expenditure,error_related_costs\n\
         2023,45000000000000,700000000000,35200000000000,2100000000000\n",
    );
    write(
        p,
        WORKFORCE_FILE,
        "region_id,total_workers,administrative_workers,clinical_workers\n\
         1,\"10,000\",2000,8000\n\
         2,8000,1500,6500\n\
         3,12000,2500,9500\n",
    );
    write(
        p,
        ADMINISTRATIVE_COSTS_FILE,
        "hospital_id,admin_percentage,hours_per_patient,avg_processing_time,error_rate\n\
         1,0.016,2.0,4.0,0.025\n\
         2,0.018,2.5,4.5,0.020\n\
         3,0.015,1.8,3.5,0.030\n\
         4,0.017,not-a-number,4.0,0.02\n",
    );
    write(
        p,
        PATIENT_VOLUME_FILE,
        "year,prefecture_id,total_patients,outpatient_visits\n\
         2023,1,1000000,5000000\n\
         2023,2,800000,4000000\n\
         2023,3,1200000,6000000\n",
    );
    write(
        p,
        INTERVENTION_COSTS_FILE,
        "implementation_phase,upfront_cost,annual_maintenance,training_cost\n\
         Phase 1,1e12,0.2e12,0.1e12\n\
         Phase 2,1.5e12,0.3e12,0.15e12\n\
         Phase 3,0.5e12,0.1e12,0.05e12\n",
    );
    dir
}

#[test]
fn loads_all_tables_and_counts_bad_rows() {
    let dir = full_data_dir();
    let (tables, report) = CsvDirectory::new(dir.path()).load().unwrap();

    assert_eq!(tables.medical_expenditure.len(), 1);
    assert_eq!(tables.workforce.len(), 3);
    assert_eq!(tables.workforce[0].total_workers, 10_000.0);
    assert_eq!(tables.administrative_costs.len(), 3);
    assert_eq!(tables.patient_volume.len(), 3);
    assert_eq!(tables.intervention_costs.len(), 3);
    assert_eq!(tables.intervention_costs[1].phase, "Phase 2");

    assert_eq!(report.parse_errors(), 1);
    assert!(report.missing_tables().is_empty());
    let admin = report
        .tables
        .iter()
        .find(|t| t.table == ADMINISTRATIVE_COSTS_FILE)
        .unwrap();
    assert_eq!(admin.total_rows, 4);
    assert_eq!(admin.kept_rows, 3);
}

#[test]
fn missing_files_become_empty_tables() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        WORKFORCE_FILE,
        "region_id,total_workers,administrative_workers,clinical_workers\n1,100,10,90\n",
    );
    let (tables, report) = CsvDirectory::new(dir.path()).load().unwrap();
    assert_eq!(tables.workforce.len(), 1);
    assert!(tables.administrative_costs.is_empty());
    assert_eq!(report.missing_tables().len(), 4);
    assert!(!report.missing_tables().contains(&WORKFORCE_FILE));
}

#[test]
fn loaded_tables_drive_a_computed_report() {
    let dir = full_data_dir();
    let tables = CsvDirectory::new(dir.path()).provide().unwrap();
    let report = ImpactAnalyzer::default()
        .generate_report(&tables, ImprovementFactors::default())
        .unwrap();

    assert_eq!(report.baseline().get(MetricKey::UnitsPerWorker), Some(100.0));
    assert_eq!(report.baseline().get(MetricKey::CostPerUnit), Some(15_000_000.0));
    assert_eq!(report.investment().provenance, Provenance::Computed);
    assert_eq!(report.investment().upfront_cost, 3e12);
}

#[test]
fn in_memory_tables_are_their_own_provider() {
    let tables = InputTables::default();
    assert_eq!(tables.provide().unwrap(), tables);
}
