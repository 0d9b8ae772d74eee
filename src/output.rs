use crate::error::AnalysisResult;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;
use tabled::{settings::Style, Table, Tabled};

/// Wraps an exported value with the time it was written. The timestamp lives
/// only in the file, never in the report itself.
#[derive(Debug, Serialize)]
pub struct Export<'a, T: Serialize> {
    pub generated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub body: &'a T,
}

impl<'a, T: Serialize> Export<'a, T> {
    pub fn now(body: &'a T) -> Self {
        Self {
            generated_at: Utc::now(),
            body,
        }
    }
}

fn ensure_parent(path: &Path) -> AnalysisResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> AnalysisResult<()> {
    ensure_parent(path)?;
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    log::debug!("wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> AnalysisResult<()> {
    ensure_parent(path)?;
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    log::debug!("wrote {}", path.display());
    Ok(())
}

pub fn render_table<T>(rows: &[T], max_rows: usize) -> Option<String>
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().take(max_rows).cloned().collect();
    if slice.is_empty() {
        return None;
    }
    Some(Table::new(slice).with(Style::markdown()).to_string())
}

pub fn preview_table_rows<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    match render_table(rows, max_rows) {
        Some(table_str) => println!("{}\n", table_str),
        None => println!("(no rows)\n"),
    }
}
