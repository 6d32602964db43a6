//! Pipeline error taxonomy.
//!
//! Only ingestion can fail the pipeline: an unrecognized upload type or a
//! ledger that empties out after validation. Everything downstream of
//! ingestion is total. Per-row parse failures are not errors at this level;
//! they are skip diagnostics carried alongside the accepted ledger.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    /// Unrecognized upload type. The message is shown to the caller verbatim.
    #[error("Please upload a CSV, Excel, or PDF file")]
    UnsupportedFormat,

    /// No rows survived validation; analysis is impossible.
    #[error("No valid transactions found in file")]
    EmptyLedger,

    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(String),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(String),

    #[error("PDF error: {0}")]
    Pdf(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_facing_messages() {
        assert_eq!(
            PipelineError::UnsupportedFormat.to_string(),
            "Please upload a CSV, Excel, or PDF file"
        );
        assert_eq!(
            PipelineError::EmptyLedger.to_string(),
            "No valid transactions found in file"
        );
        assert_eq!(
            PipelineError::MissingColumn("Amount".into()).to_string(),
            "Missing required column: Amount"
        );
    }
}
