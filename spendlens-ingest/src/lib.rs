//! spendlens-ingest: upload ingestion — format sniffing, CSV/XLSX/PDF table
//! extraction, and row normalization into the canonical ledger.

pub mod normalize;
pub mod parsers;
pub mod types;

use std::io::Read;
use std::path::Path;

use spendlens_core::Result;

pub use normalize::normalize_rows;
pub use types::{ColumnMap, FileFormat, Ingested, RawRow, SkipReason, SkippedRow};

/// Ingest an uploaded file into a validated ledger.
///
/// Sniffs the format from the extension, extracts raw rows with the matching
/// parser, and validates each row. Malformed rows are skipped and reported in
/// the diagnostics; only an unsupported format or a fully-empty ledger is
/// fatal.
pub fn ingest_file(path: impl AsRef<Path>, columns: &ColumnMap) -> Result<Ingested> {
    let path = path.as_ref();
    let format = FileFormat::from_path(path)?;
    tracing::info!(file = %path.display(), ?format, "ingesting upload");

    let rows = match format {
        FileFormat::Csv => parsers::csv::parse_path(path, columns)?,
        FileFormat::Excel => parsers::xlsx::parse_path(path, columns)?,
        FileFormat::Pdf => parsers::pdf::parse_path(path)?,
    };

    normalize_rows(rows)
}

/// Ingest delimited data from an in-memory reader, bypassing format
/// sniffing. Useful for embedding and tests.
pub fn ingest_csv_reader<R: Read>(reader: R, columns: &ColumnMap) -> Result<Ingested> {
    let rows = parsers::csv::parse_reader(reader, columns)?;
    normalize_rows(rows)
}
