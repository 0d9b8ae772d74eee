use crate::error::AnalysisResult;
use crate::types::{
    AdminCostRecord, ExpenditureRecord, InputTables, InterventionCostRecord, PatientVolumeRecord,
    RawAdminCostRow, RawExpenditureRow, RawInterventionCostRow, RawPatientVolumeRow,
    RawWorkforceRow, WorkforceRecord,
};
use crate::util::{parse_f64_safe, parse_i32_safe};
use csv::ReaderBuilder;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

pub const MEDICAL_EXPENDITURE_FILE: &str = "medical_expenditure.csv";
pub const WORKFORCE_FILE: &str = "workforce.csv";
pub const ADMINISTRATIVE_COSTS_FILE: &str = "administrative_costs.csv";
pub const PATIENT_VOLUME_FILE: &str = "patient_volume.csv";
pub const INTERVENTION_COSTS_FILE: &str = "ai_implementation_costs.csv";

/// Source of the five input tables.
pub trait DataProvider {
    fn provide(&self) -> AnalysisResult<InputTables>;
}

/// Tables that are already in memory.
impl DataProvider for InputTables {
    fn provide(&self) -> AnalysisResult<InputTables> {
        Ok(self.clone())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableLoadReport {
    pub table: &'static str,
    pub missing: bool,
    pub total_rows: usize,
    pub kept_rows: usize,
    pub parse_errors: usize,
}

#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub tables: Vec<TableLoadReport>,
}

impl LoadReport {
    pub fn kept_rows(&self) -> usize {
        self.tables.iter().map(|t| t.kept_rows).sum()
    }

    pub fn parse_errors(&self) -> usize {
        self.tables.iter().map(|t| t.parse_errors).sum()
    }

    pub fn missing_tables(&self) -> Vec<&'static str> {
        self.tables
            .iter()
            .filter(|t| t.missing)
            .map(|t| t.table)
            .collect()
    }
}

/// Reads the input tables from CSV files in one directory.
#[derive(Debug, Clone)]
pub struct CsvDirectory {
    dir: PathBuf,
}

impl CsvDirectory {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Load every table, reporting per-table row counts. A missing file
    /// becomes an empty table; any other read failure is returned.
    pub fn load(&self) -> AnalysisResult<(InputTables, LoadReport)> {
        let mut report = LoadReport::default();

        let (medical_expenditure, r) =
            self.load_table(MEDICAL_EXPENDITURE_FILE, clean_expenditure)?;
        report.tables.push(r);
        let (workforce, r) = self.load_table(WORKFORCE_FILE, clean_workforce)?;
        report.tables.push(r);
        let (administrative_costs, r) =
            self.load_table(ADMINISTRATIVE_COSTS_FILE, clean_admin_cost)?;
        report.tables.push(r);
        let (patient_volume, r) = self.load_table(PATIENT_VOLUME_FILE, clean_patient_volume)?;
        report.tables.push(r);
        let (intervention_costs, r) =
            self.load_table(INTERVENTION_COSTS_FILE, clean_intervention_cost)?;
        report.tables.push(r);

        let tables = InputTables {
            medical_expenditure,
            workforce,
            administrative_costs,
            patient_volume,
            intervention_costs,
        };
        Ok((tables, report))
    }

    fn load_table<R, T>(
        &self,
        file: &'static str,
        clean: fn(R) -> Option<T>,
    ) -> AnalysisResult<(Vec<T>, TableLoadReport)>
    where
        R: DeserializeOwned,
    {
        let path = self.dir.join(file);
        if !path.exists() {
            log::warn!("{} not found, table treated as empty", path.display());
            let report = TableLoadReport {
                table: file,
                missing: true,
                total_rows: 0,
                kept_rows: 0,
                parse_errors: 0,
            };
            return Ok((Vec::new(), report));
        }
        let mut rdr = ReaderBuilder::new().flexible(true).from_path(&path)?;
        let (rows, report) = read_rows(file, rdr.deserialize::<R>(), clean);
        if report.parse_errors > 0 {
            log::warn!(
                "{}: skipped {} of {} rows that failed to parse",
                file,
                report.parse_errors,
                report.total_rows
            );
        }
        log::debug!("{}: loaded {} rows", file, report.kept_rows);
        Ok((rows, report))
    }
}

impl DataProvider for CsvDirectory {
    fn provide(&self) -> AnalysisResult<InputTables> {
        self.load().map(|(tables, _)| tables)
    }
}

fn read_rows<R, T, I>(
    table: &'static str,
    rows: I,
    clean: fn(R) -> Option<T>,
) -> (Vec<T>, TableLoadReport)
where
    I: Iterator<Item = Result<R, csv::Error>>,
{
    let mut total_rows = 0usize;
    let mut parse_errors = 0usize;
    let mut kept = Vec::new();
    for result in rows {
        total_rows += 1;
        match result.ok().and_then(clean) {
            Some(record) => kept.push(record),
            None => parse_errors += 1,
        }
    }
    let report = TableLoadReport {
        table,
        missing: false,
        total_rows,
        kept_rows: kept.len(),
        parse_errors,
    };
    (kept, report)
}

// Each cleaner requires the columns the calculators read and keeps the rest
// as optional context.

fn clean_expenditure(row: RawExpenditureRow) -> Option<ExpenditureRecord> {
    Some(ExpenditureRecord {
        year: parse_i32_safe(row.year.as_deref()),
        total_expenditure: parse_f64_safe(row.total_expenditure.as_deref())?,
        admin_expenditure: parse_f64_safe(row.admin_expenditure.as_deref()),
        clinical_expenditure: parse_f64_safe(row.clinical_expenditure.as_deref()),
        error_related_costs: parse_f64_safe(row.error_related_costs.as_deref()),
    })
}

fn clean_workforce(row: RawWorkforceRow) -> Option<WorkforceRecord> {
    Some(WorkforceRecord {
        region_id: parse_i32_safe(row.region_id.as_deref()),
        total_workers: parse_f64_safe(row.total_workers.as_deref())?,
        administrative_workers: parse_f64_safe(row.administrative_workers.as_deref()),
        clinical_workers: parse_f64_safe(row.clinical_workers.as_deref()),
    })
}

fn clean_admin_cost(row: RawAdminCostRow) -> Option<AdminCostRecord> {
    Some(AdminCostRecord {
        facility_id: parse_i32_safe(row.hospital_id.as_deref()),
        admin_percentage: parse_f64_safe(row.admin_percentage.as_deref()),
        hours_per_unit: parse_f64_safe(row.hours_per_patient.as_deref())?,
        processing_time_hours: parse_f64_safe(row.avg_processing_time.as_deref())?,
        error_rate: parse_f64_safe(row.error_rate.as_deref())?,
    })
}

fn clean_patient_volume(row: RawPatientVolumeRow) -> Option<PatientVolumeRecord> {
    Some(PatientVolumeRecord {
        year: parse_i32_safe(row.year.as_deref()),
        region_id: parse_i32_safe(row.prefecture_id.as_deref()),
        units_served: parse_f64_safe(row.total_patients.as_deref())?,
        outpatient_visits: parse_f64_safe(row.outpatient_visits.as_deref()),
    })
}

fn clean_intervention_cost(row: RawInterventionCostRow) -> Option<InterventionCostRecord> {
    Some(InterventionCostRecord {
        phase: row
            .implementation_phase
            .unwrap_or_else(|| "Unspecified".to_string())
            .trim()
            .to_string(),
        upfront_cost: parse_f64_safe(row.upfront_cost.as_deref())?,
        annual_maintenance: parse_f64_safe(row.annual_maintenance.as_deref())?,
        training_cost: parse_f64_safe(row.training_cost.as_deref()).unwrap_or(0.0),
    })
}
