//! Spreadsheet extraction via calamine.
//!
//! Scans worksheets for the first one whose header row contains the mapped
//! columns, then reads data rows below it. Cell values are normalized to
//! field strings; Excel serial dates become ISO date strings.

use std::collections::HashMap;
use std::path::Path;

use calamine::{open_workbook_auto, Data, Range, Reader};
use chrono::{Duration, NaiveDate};
use spendlens_core::{PipelineError, Result};

use crate::types::{ColumnMap, RawRow, ResolvedColumns};

pub fn parse_path(path: &Path, columns: &ColumnMap) -> Result<Vec<RawRow>> {
    let mut workbook =
        open_workbook_auto(path).map_err(|e| PipelineError::Spreadsheet(e.to_string()))?;

    let sheet_names = workbook.sheet_names().to_vec();
    for sheet_name in &sheet_names {
        let range = match workbook.worksheet_range(sheet_name) {
            Ok(r) => r,
            Err(_) => continue,
        };

        let Some((header_idx, cols)) = find_header_row(&range, columns) else {
            continue;
        };
        tracing::debug!(sheet = %sheet_name, header_row = header_idx, "found transaction table");

        let mut rows = Vec::new();
        for (row_idx, row) in range.rows().enumerate().skip(header_idx + 1) {
            let date = date_cell_string(row.get(cols.date));
            let amount = cell_string(row.get(cols.amount));
            // Sheets often end with blank rows after the data; skip quietly.
            if date.trim().is_empty() && amount.trim().is_empty() {
                continue;
            }

            rows.push(RawRow {
                line: row_idx + 1,
                date,
                description: cell_string(row.get(cols.description)),
                amount,
                kind: cols.kind.map(|i| cell_string(row.get(i))),
            });
        }
        return Ok(rows);
    }

    Err(PipelineError::Spreadsheet(format!(
        "no worksheet contains the columns {}, {}, {}",
        columns.date, columns.description, columns.amount
    )))
}

/// Find the first row containing all required headers, returning its index
/// and the resolved column positions.
fn find_header_row(range: &Range<Data>, columns: &ColumnMap) -> Option<(usize, ResolvedColumns)> {
    for (r_idx, row) in range.rows().enumerate() {
        let mut map: HashMap<String, usize> = HashMap::new();
        for (c_idx, cell) in row.iter().enumerate() {
            let name = cell_string(Some(cell)).trim().to_lowercase();
            if !name.is_empty() {
                map.entry(name).or_insert(c_idx);
            }
        }

        let find = |name: &str| map.get(&name.trim().to_lowercase()).copied();
        if let (Some(date), Some(description), Some(amount)) = (
            find(&columns.date),
            find(&columns.description),
            find(&columns.amount),
        ) {
            return Some((
                r_idx,
                ResolvedColumns {
                    date,
                    description,
                    amount,
                    kind: find(&columns.kind),
                },
            ));
        }
    }
    None
}

fn cell_string(cell: Option<&Data>) -> String {
    match cell {
        None | Some(Data::Empty) => String::new(),
        Some(Data::String(s)) => s.trim().to_string(),
        Some(Data::Float(f)) => f.to_string(),
        Some(Data::Int(i)) => i.to_string(),
        Some(Data::Bool(b)) => b.to_string(),
        Some(other) => other.to_string().trim().to_string(),
    }
}

/// Date cells may hold strings, ISO datetimes, or Excel serial numbers.
fn date_cell_string(cell: Option<&Data>) -> String {
    match cell {
        Some(Data::Float(f)) => excel_serial_to_date(*f)
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| f.to_string()),
        Some(Data::Int(i)) => excel_serial_to_date(*i as f64)
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| i.to_string()),
        Some(Data::DateTime(dt)) => excel_serial_to_date(dt.as_f64())
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
        other => cell_string(other),
    }
}

/// Excel serial date conversion using the 1899-12-30 base.
fn excel_serial_to_date(v: f64) -> Option<NaiveDate> {
    if !v.is_finite() || v <= 0.0 {
        return None;
    }
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    base.checked_add_signed(Duration::days(v.floor() as i64))
}
