//! Ingestion types: format sniffing, column mapping, raw rows, and skip
//! diagnostics.

use std::path::Path;

use serde::Serialize;
use spendlens_core::{PipelineError, Transaction, TxnKind};
use thiserror::Error;

/// Supported upload formats, sniffed from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Excel,
    Pdf,
}

impl FileFormat {
    pub fn from_path(path: &Path) -> Result<Self, PipelineError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "csv" => Ok(FileFormat::Csv),
            "xlsx" | "xls" => Ok(FileFormat::Excel),
            "pdf" => Ok(FileFormat::Pdf),
            _ => Err(PipelineError::UnsupportedFormat),
        }
    }
}

/// Declared header names for the required columns. Matching is
/// case-insensitive and whitespace-trimmed.
#[derive(Debug, Clone)]
pub struct ColumnMap {
    pub date: String,
    pub description: String,
    pub amount: String,
    /// Optional Type column; when the header is absent the kind is derived
    /// from the amount sign.
    pub kind: String,
}

impl Default for ColumnMap {
    fn default() -> Self {
        Self {
            date: "Date".to_string(),
            description: "Description".to_string(),
            amount: "Amount".to_string(),
            kind: "Type".to_string(),
        }
    }
}

/// Column indices resolved against an actual header row.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedColumns {
    pub date: usize,
    pub description: usize,
    pub amount: usize,
    pub kind: Option<usize>,
}

impl ColumnMap {
    /// Locate the mapped columns within a header row. Date, Description and
    /// Amount are required; Type is optional.
    pub fn resolve(&self, headers: &[String]) -> Result<ResolvedColumns, PipelineError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };

        let date = find(&self.date).ok_or_else(|| PipelineError::MissingColumn(self.date.clone()))?;
        let description = find(&self.description)
            .ok_or_else(|| PipelineError::MissingColumn(self.description.clone()))?;
        let amount =
            find(&self.amount).ok_or_else(|| PipelineError::MissingColumn(self.amount.clone()))?;
        let kind = find(&self.kind);

        Ok(ResolvedColumns {
            date,
            description,
            amount,
            kind,
        })
    }
}

/// Raw field strings extracted from one source row, before validation.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    /// 1-based row number in the source file, for diagnostics
    pub line: usize,
    pub date: String,
    pub description: String,
    pub amount: String,
    pub kind: Option<String>,
}

/// Why a row was rejected during normalization.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SkipReason {
    #[error("unparseable date '{0}'")]
    BadDate(String),

    #[error("non-numeric amount '{0}'")]
    BadAmount(String),

    #[error("unknown transaction type '{0}'")]
    BadKind(String),

    #[error("type {kind:?} disagrees with amount {amount}")]
    KindMismatch { kind: TxnKind, amount: f64 },

    #[error("empty description")]
    EmptyDescription,
}

/// A rejected row together with its source location.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedRow {
    pub row: usize,
    #[serde(serialize_with = "serialize_reason")]
    pub reason: SkipReason,
}

fn serialize_reason<S: serde::Serializer>(r: &SkipReason, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&r.to_string())
}

/// The accepted ledger plus per-row skip diagnostics.
#[derive(Debug, Clone)]
pub struct Ingested {
    /// Validated transactions in original row order
    pub transactions: Vec<Transaction>,
    pub skipped: Vec<SkippedRow>,
}
