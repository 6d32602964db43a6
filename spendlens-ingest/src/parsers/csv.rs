//! Delimited-table extraction.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use spendlens_core::{PipelineError, Result};

use crate::types::{ColumnMap, RawRow};

/// Extract raw rows from delimited data. The header row is located by the
/// column map (case-insensitive); records the csv reader cannot decode are
/// logged and dropped.
pub fn parse_reader<R: Read>(reader: R, columns: &ColumnMap) -> Result<Vec<RawRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(true)
        .from_reader(reader);

    let headers: Vec<String> = rdr
        .headers()
        .map_err(|e| PipelineError::Csv(e.to_string()))?
        .iter()
        .map(|h| h.to_string())
        .collect();
    let cols = columns.resolve(&headers)?;

    let mut rows = Vec::new();
    for (idx, record) in rdr.records().enumerate() {
        // 1-based line number, counting the header as line 1
        let line = idx + 2;
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!(row = line, error = %e, "unreadable csv record");
                continue;
            }
        };

        rows.push(RawRow {
            line,
            date: record.get(cols.date).unwrap_or("").to_string(),
            description: record.get(cols.description).unwrap_or("").to_string(),
            amount: record.get(cols.amount).unwrap_or("").to_string(),
            kind: cols.kind.map(|i| record.get(i).unwrap_or("").to_string()),
        });
    }

    Ok(rows)
}

pub fn parse_path(path: &Path, columns: &ColumnMap) -> Result<Vec<RawRow>> {
    let file = File::open(path)?;
    parse_reader(file, columns)
}
