//! Canonical transaction record produced by ingestion.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::rules::FALLBACK_CATEGORY;

/// Direction of a ledger entry as declared by the source export.
///
/// Must agree with the sign of the amount: Credit carries a non-negative
/// amount, Debit a non-positive one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxnKind {
    Credit,
    Debit,
}

impl TxnKind {
    /// Derive the kind from the amount sign (used when the export has no
    /// Type column). Zero is treated as a credit.
    pub fn from_amount(amount: f64) -> Self {
        if amount >= 0.0 {
            TxnKind::Credit
        } else {
            TxnKind::Debit
        }
    }

    /// Whether this kind is consistent with the given signed amount.
    pub fn agrees_with(&self, amount: f64) -> bool {
        match self {
            TxnKind::Credit => amount >= 0.0,
            TxnKind::Debit => amount <= 0.0,
        }
    }
}

/// A single normalized ledger entry.
///
/// Created once during ingestion; `category` is set exactly once by the
/// categorizer and the record is immutable after that.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub date: NaiveDate,
    pub description: String,
    /// Positive = income, negative = expense
    pub amount: f64,
    #[serde(rename = "type")]
    pub kind: TxnKind,
    pub category: String,
}

impl Transaction {
    /// Create a new transaction with the fallback category; categorization
    /// happens in a later pipeline stage.
    pub fn new(
        date: NaiveDate,
        description: impl Into<String>,
        amount: f64,
        kind: TxnKind,
    ) -> Self {
        Self {
            date,
            description: description.into(),
            amount,
            kind,
            category: FALLBACK_CATEGORY.to_string(),
        }
    }

    /// Returns true if this is an expense (negative amount)
    pub fn is_expense(&self) -> bool {
        self.amount < 0.0
    }

    /// Returns true if this is income (positive amount)
    pub fn is_income(&self) -> bool {
        self.amount > 0.0
    }

    /// Get the absolute amount
    pub fn abs_amount(&self) -> f64 {
        self.amount.abs()
    }

    /// Calendar month key in "YYYY-MM" form
    pub fn month_key(&self) -> String {
        format!("{:04}-{:02}", self.date.year(), self.date.month())
    }

    /// Full English weekday name ("Monday" .. "Sunday")
    pub fn weekday_name(&self) -> &'static str {
        weekday_name(self.date.weekday())
    }
}

/// Full English name for a chrono weekday.
pub fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// The seven weekday names in Monday-first order.
pub const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];
