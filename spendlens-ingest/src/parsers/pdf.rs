//! Table extraction from PDF statements.
//!
//! Extracts the document text, then matches transaction-shaped lines:
//!
//!   2024-01-15  STARBUCKS COFFEE #1234         -4.50   Debit
//!   01/16/2024  GROCERY STORE                 (85.32)
//!
//! The trailing type column is optional; amounts keep their currency
//! formatting for normalization to deal with.

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use spendlens_core::{PipelineError, Result};

use crate::types::RawRow;

fn txn_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(concat!(
            r"^\s*(?P<date>\d{4}-\d{2}-\d{2}|\d{2}/\d{2}/\d{4})\s+",
            r"(?P<desc>.+?)\s+",
            r"(?P<amount>\(?-?\s?\$?[\d,]+\.\d{2}\)?)",
            r"(?:\s+(?P<kind>(?i:debit|credit)))?\s*$"
        ))
        .expect("transaction line regex")
    })
}

pub fn parse_path(path: &Path) -> Result<Vec<RawRow>> {
    let text = pdf_extract::extract_text(path).map_err(|e| PipelineError::Pdf(e.to_string()))?;
    tracing::debug!(chars = text.len(), "extracted pdf text");
    Ok(parse_text(&text))
}

/// Match transaction rows in extracted statement text. Lines that do not
/// look like transactions (headers, footers, balances) are ignored.
pub fn parse_text(text: &str) -> Vec<RawRow> {
    let re = txn_re();
    let mut rows = Vec::new();

    for (idx, line) in text.lines().enumerate() {
        let Some(caps) = re.captures(line) else {
            continue;
        };
        rows.push(RawRow {
            line: idx + 1,
            date: caps["date"].to_string(),
            description: caps["desc"].trim().to_string(),
            amount: caps["amount"].to_string(),
            kind: caps.name("kind").map(|m| m.as_str().to_string()),
        });
    }

    rows
}
