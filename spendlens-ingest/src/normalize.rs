//! Row-level validation: raw field strings into canonical transactions.
//!
//! Skip-and-count recovery: a malformed row never fails ingestion on its
//! own; it lands in the diagnostics list. Ingestion fails only when nothing
//! survives.

use chrono::{NaiveDate, NaiveDateTime};
use spendlens_core::{PipelineError, Result, Transaction, TxnKind};

use crate::types::{Ingested, RawRow, SkipReason, SkippedRow};

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%m/%d/%Y", "%d/%m/%Y", "%Y/%m/%d"];

/// Parse a calendar date from the formats seen in bank exports. Datetime
/// strings ("2024-01-15 00:00:00") resolve to their date part.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.date());
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    None
}

/// Parse a signed amount, tolerating currency formatting: "$1,234.56",
/// "(85.32)" (parenthesized negative), "- $14.05".
pub fn parse_amount(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    let (s, paren_negative) = if s.starts_with('(') && s.ends_with(')') {
        (&s[1..s.len() - 1], true)
    } else {
        (s, false)
    };

    let cleaned: String = s.chars().filter(|c| *c != '$' && *c != ',' && !c.is_whitespace()).collect();
    let value: f64 = cleaned.parse().ok()?;
    Some(if paren_negative { -value } else { value })
}

fn parse_kind(s: &str) -> Option<TxnKind> {
    match s.trim().to_ascii_lowercase().as_str() {
        "credit" => Some(TxnKind::Credit),
        "debit" => Some(TxnKind::Debit),
        _ => None,
    }
}

fn normalize_row(row: &RawRow) -> std::result::Result<Transaction, SkipReason> {
    let date = parse_date(&row.date).ok_or_else(|| SkipReason::BadDate(row.date.trim().to_string()))?;

    let description = row.description.trim();
    if description.is_empty() {
        return Err(SkipReason::EmptyDescription);
    }

    let amount =
        parse_amount(&row.amount).ok_or_else(|| SkipReason::BadAmount(row.amount.trim().to_string()))?;

    let kind = match row.kind.as_deref().map(str::trim) {
        Some(k) if !k.is_empty() => parse_kind(k).ok_or_else(|| SkipReason::BadKind(k.to_string()))?,
        _ => TxnKind::from_amount(amount),
    };

    if !kind.agrees_with(amount) {
        return Err(SkipReason::KindMismatch { kind, amount });
    }

    Ok(Transaction::new(date, description, amount, kind))
}

/// Validate raw rows in order, splitting them into the accepted ledger and
/// skip diagnostics. Fails with [`PipelineError::EmptyLedger`] when no row
/// survives.
pub fn normalize_rows(rows: Vec<RawRow>) -> Result<Ingested> {
    let mut transactions = Vec::with_capacity(rows.len());
    let mut skipped = Vec::new();

    for row in &rows {
        match normalize_row(row) {
            Ok(txn) => transactions.push(txn),
            Err(reason) => {
                tracing::debug!(row = row.line, %reason, "skipping malformed row");
                skipped.push(SkippedRow {
                    row: row.line,
                    reason,
                });
            }
        }
    }

    if transactions.is_empty() {
        return Err(PipelineError::EmptyLedger);
    }

    tracing::info!(
        parsed = transactions.len(),
        skipped = skipped.len(),
        "normalized ledger"
    );

    Ok(Ingested {
        transactions,
        skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(line: usize, date: &str, desc: &str, amount: &str, kind: Option<&str>) -> RawRow {
        RawRow {
            line,
            date: date.to_string(),
            description: desc.to_string(),
            amount: amount.to_string(),
            kind: kind.map(|k| k.to_string()),
        }
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        assert_eq!(parse_date("2024-01-15"), Some(expected));
        assert_eq!(parse_date("01/15/2024"), Some(expected));
        assert_eq!(parse_date("2024/01/15"), Some(expected));
        assert_eq!(parse_date("2024-01-15 00:00:00"), Some(expected));
        assert_eq!(parse_date("not a date"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn test_parse_amount_formats() {
        assert_eq!(parse_amount("-4.50"), Some(-4.50));
        assert_eq!(parse_amount("$1,234.56"), Some(1234.56));
        assert_eq!(parse_amount("(85.32)"), Some(-85.32));
        assert_eq!(parse_amount("- $14.05"), Some(-14.05));
        assert_eq!(parse_amount("abc"), None);
        assert_eq!(parse_amount(""), None);
    }

    #[test]
    fn test_normalize_accepts_valid_rows_in_order() {
        let rows = vec![
            raw(2, "2024-01-15", "Starbucks Coffee", "-4.50", Some("Debit")),
            raw(3, "2024-01-15", "Salary Deposit", "3000.00", Some("Credit")),
            raw(4, "2024-01-16", "Grocery Store", "-85.32", Some("Debit")),
        ];
        let ingested = normalize_rows(rows).unwrap();
        assert_eq!(ingested.transactions.len(), 3);
        assert!(ingested.skipped.is_empty());
        assert_eq!(ingested.transactions[0].description, "Starbucks Coffee");
        assert_eq!(ingested.transactions[1].amount, 3000.00);
        assert_eq!(ingested.transactions[2].kind, TxnKind::Debit);
    }

    #[test]
    fn test_kind_derived_when_column_absent() {
        let rows = vec![
            raw(2, "2024-01-15", "Refund", "20.00", None),
            raw(3, "2024-01-16", "Lunch", "-12.00", None),
        ];
        let ingested = normalize_rows(rows).unwrap();
        assert_eq!(ingested.transactions[0].kind, TxnKind::Credit);
        assert_eq!(ingested.transactions[1].kind, TxnKind::Debit);
    }

    #[test]
    fn test_kind_sign_mismatch_is_skipped() {
        let rows = vec![
            raw(2, "2024-01-15", "Bad row", "-10.00", Some("Credit")),
            raw(3, "2024-01-15", "Good row", "-10.00", Some("Debit")),
        ];
        let ingested = normalize_rows(rows).unwrap();
        assert_eq!(ingested.transactions.len(), 1);
        assert_eq!(ingested.skipped.len(), 1);
        assert_eq!(ingested.skipped[0].row, 2);
        assert!(matches!(
            ingested.skipped[0].reason,
            SkipReason::KindMismatch { .. }
        ));
    }

    #[test]
    fn test_malformed_rows_reduce_but_never_crash() {
        let rows = vec![
            raw(2, "garbage", "Bad date", "-1.00", None),
            raw(3, "2024-01-15", "Bad amount", "oops", None),
            raw(4, "2024-01-15", "", "-1.00", None),
            raw(5, "2024-01-15", "Survivor", "-1.00", None),
        ];
        let ingested = normalize_rows(rows).unwrap();
        assert_eq!(ingested.transactions.len(), 1);
        assert_eq!(ingested.skipped.len(), 3);
        assert_eq!(
            ingested.skipped[0].reason,
            SkipReason::BadDate("garbage".to_string())
        );
        assert_eq!(
            ingested.skipped[1].reason,
            SkipReason::BadAmount("oops".to_string())
        );
        assert_eq!(ingested.skipped[2].reason, SkipReason::EmptyDescription);
    }

    #[test]
    fn test_all_rows_malformed_is_empty_ledger() {
        let rows = vec![
            raw(2, "garbage", "x", "-1.00", None),
            raw(3, "2024-01-15", "y", "oops", None),
        ];
        let err = normalize_rows(rows).unwrap_err();
        assert!(matches!(err, PipelineError::EmptyLedger));
    }

    #[test]
    fn test_zero_amount_agrees_with_either_kind() {
        let rows = vec![
            raw(2, "2024-01-15", "Zero credit", "0.00", Some("Credit")),
            raw(3, "2024-01-15", "Zero debit", "0.00", Some("Debit")),
        ];
        let ingested = normalize_rows(rows).unwrap();
        assert_eq!(ingested.transactions.len(), 2);
    }
}
