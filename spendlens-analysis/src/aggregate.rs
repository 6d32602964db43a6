//! Multi-dimensional aggregation over the categorized ledger.
//!
//! Pure and order-independent (except the stable tie-break in top_expenses):
//! re-running on the same ledger reproduces the same output byte for byte.
//! Maps are BTreeMaps so iteration order is part of the contract.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use spendlens_core::transaction::WEEKDAYS;
use spendlens_core::Transaction;

use crate::insights::Insight;

/// Round to cents. All serialized monetary outputs pass through this.
pub(crate) fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Ledger-wide totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total_transactions: usize,
    pub total_income: f64,
    /// Sum of all non-positive amounts, kept signed (<= 0)
    pub total_expenses: f64,
    /// total_income + total_expenses
    pub net_income: f64,
    pub average_transaction: f64,
    pub date_range: DateRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateKind {
    Income,
    Expense,
}

/// Per-category totals. Keyed by category name in [`AnalysisResult`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryAggregate {
    #[serde(rename = "type")]
    pub kind: AggregateKind,
    /// Sum of member amounts, kept signed
    pub total_spent: f64,
    pub transaction_count: usize,
    pub average_per_transaction: f64,
    /// Share of total expense magnitude, percent; 0 for income categories
    pub percentage_of_total: f64,
}

/// Per-month totals, keyed by "YYYY-MM".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthAggregate {
    pub total_income: f64,
    /// Kept signed (<= 0)
    pub total_expenses: f64,
    pub net_income: f64,
    pub transaction_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeVsExpenses {
    pub income_transaction_count: usize,
    pub expense_transaction_count: usize,
    pub average_income_per_transaction: f64,
    pub average_expense_per_transaction: f64,
    pub income_to_expense_ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpendingPatterns {
    /// Expense magnitude per weekday name; all seven keys always present
    pub spending_by_day: BTreeMap<String, f64>,
    pub average_daily_spending: f64,
}

/// Expense magnitude on one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaySpend {
    pub date: NaiveDate,
    pub amount: f64,
}

/// Spending over time: per-active-day and per-ISO-week averages plus the
/// extreme days. Absent when the ledger has no expenses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpendingTrends {
    /// Mean expense magnitude over days that have expenses
    pub daily_average: f64,
    pub highest_spending_day: DaySpend,
    pub lowest_spending_day: DaySpend,
    pub weekly_average: f64,
}

/// Everything derived from one analysis request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub summary: Summary,
    pub by_category: BTreeMap<String, CategoryAggregate>,
    pub by_month: BTreeMap<String, MonthAggregate>,
    /// Every expense, largest absolute amount first. Display truncation is
    /// the consumer's concern.
    pub top_expenses: Vec<Transaction>,
    pub income_vs_expenses: IncomeVsExpenses,
    pub spending_patterns: SpendingPatterns,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spending_trends: Option<SpendingTrends>,
    pub ai_insights: Vec<Insight>,
}

/// Compute all derived statistics for a non-empty categorized ledger.
/// `ai_insights` starts empty; the insight generator fills it in.
pub fn aggregate(ledger: &[Transaction]) -> AnalysisResult {
    AnalysisResult {
        summary: summary(ledger),
        by_category: by_category(ledger),
        by_month: by_month(ledger),
        top_expenses: top_expenses(ledger),
        income_vs_expenses: income_vs_expenses(ledger),
        spending_patterns: spending_patterns(ledger),
        spending_trends: spending_trends(ledger),
        ai_insights: Vec::new(),
    }
}

fn summary(ledger: &[Transaction]) -> Summary {
    let total_income: f64 = ledger.iter().filter(|t| t.amount > 0.0).map(|t| t.amount).sum();
    let total_expenses: f64 = ledger.iter().filter(|t| t.amount <= 0.0).map(|t| t.amount).sum();
    let count = ledger.len();
    let average = if count > 0 {
        ledger.iter().map(|t| t.amount).sum::<f64>() / count as f64
    } else {
        0.0
    };

    let start = ledger.iter().map(|t| t.date).min().unwrap_or_default();
    let end = ledger.iter().map(|t| t.date).max().unwrap_or_default();

    Summary {
        total_transactions: count,
        total_income: round2(total_income),
        total_expenses: round2(total_expenses),
        net_income: round2(total_income + total_expenses),
        average_transaction: round2(average),
        date_range: DateRange { start, end },
    }
}

fn by_category(ledger: &[Transaction]) -> BTreeMap<String, CategoryAggregate> {
    let mut groups: BTreeMap<String, Vec<&Transaction>> = BTreeMap::new();
    for txn in ledger {
        groups.entry(txn.category.clone()).or_default().push(txn);
    }

    let total_expense_magnitude: f64 = ledger
        .iter()
        .filter(|t| t.amount < 0.0)
        .map(|t| t.abs_amount())
        .sum();

    groups
        .into_iter()
        .map(|(category, members)| {
            let total: f64 = members.iter().map(|t| t.amount).sum();
            let count = members.len();
            let kind = if members.iter().all(|t| t.amount >= 0.0) {
                AggregateKind::Income
            } else {
                AggregateKind::Expense
            };
            let percentage = match kind {
                AggregateKind::Expense if total_expense_magnitude > 0.0 => {
                    round1(total.abs() / total_expense_magnitude * 100.0)
                }
                _ => 0.0,
            };

            let agg = CategoryAggregate {
                kind,
                total_spent: round2(total),
                transaction_count: count,
                average_per_transaction: round2(total / count as f64),
                percentage_of_total: percentage,
            };
            (category, agg)
        })
        .collect()
}

fn by_month(ledger: &[Transaction]) -> BTreeMap<String, MonthAggregate> {
    let mut months: BTreeMap<String, Vec<&Transaction>> = BTreeMap::new();
    for txn in ledger {
        months.entry(txn.month_key()).or_default().push(txn);
    }

    months
        .into_iter()
        .map(|(month, members)| {
            let income: f64 = members.iter().filter(|t| t.amount > 0.0).map(|t| t.amount).sum();
            let expenses: f64 = members.iter().filter(|t| t.amount <= 0.0).map(|t| t.amount).sum();
            let agg = MonthAggregate {
                total_income: round2(income),
                total_expenses: round2(expenses),
                net_income: round2(income + expenses),
                transaction_count: members.len(),
            };
            (month, agg)
        })
        .collect()
}

fn top_expenses(ledger: &[Transaction]) -> Vec<Transaction> {
    let mut expenses: Vec<Transaction> = ledger.iter().filter(|t| t.is_expense()).cloned().collect();
    // Stable sort keeps original ledger order for equal magnitudes
    expenses.sort_by(|a, b| {
        b.abs_amount()
            .partial_cmp(&a.abs_amount())
            .unwrap_or(Ordering::Equal)
    });
    expenses
}

fn income_vs_expenses(ledger: &[Transaction]) -> IncomeVsExpenses {
    let income: Vec<&Transaction> = ledger.iter().filter(|t| t.is_income()).collect();
    let expenses: Vec<&Transaction> = ledger.iter().filter(|t| t.is_expense()).collect();

    let income_total: f64 = income.iter().map(|t| t.amount).sum();
    let expense_magnitude: f64 = expenses.iter().map(|t| t.abs_amount()).sum();

    IncomeVsExpenses {
        income_transaction_count: income.len(),
        expense_transaction_count: expenses.len(),
        average_income_per_transaction: if income.is_empty() {
            0.0
        } else {
            round2(income_total / income.len() as f64)
        },
        average_expense_per_transaction: if expenses.is_empty() {
            0.0
        } else {
            round2(expense_magnitude / expenses.len() as f64)
        },
        income_to_expense_ratio: if expense_magnitude > 0.0 {
            round2(income_total / expense_magnitude)
        } else {
            0.0
        },
    }
}

fn spending_patterns(ledger: &[Transaction]) -> SpendingPatterns {
    let mut by_day: BTreeMap<String, f64> = WEEKDAYS
        .iter()
        .map(|d| (d.to_string(), 0.0))
        .collect();

    for txn in ledger.iter().filter(|t| t.is_expense()) {
        if let Some(total) = by_day.get_mut(txn.weekday_name()) {
            *total += txn.abs_amount();
        }
    }
    for total in by_day.values_mut() {
        *total = round2(*total);
    }

    let total_expense_magnitude: f64 = ledger
        .iter()
        .filter(|t| t.is_expense())
        .map(|t| t.abs_amount())
        .sum();
    let start = ledger.iter().map(|t| t.date).min().unwrap_or_default();
    let end = ledger.iter().map(|t| t.date).max().unwrap_or_default();
    let span_days = (end - start).num_days().max(1);

    SpendingPatterns {
        spending_by_day: by_day,
        average_daily_spending: round2(total_expense_magnitude / span_days as f64),
    }
}

fn spending_trends(ledger: &[Transaction]) -> Option<SpendingTrends> {
    let mut daily: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    let mut weekly: BTreeMap<(i32, u32), f64> = BTreeMap::new();
    for txn in ledger.iter().filter(|t| t.is_expense()) {
        *daily.entry(txn.date).or_insert(0.0) += txn.abs_amount();
        let week = txn.date.iso_week();
        *weekly.entry((week.year(), week.week())).or_insert(0.0) += txn.abs_amount();
    }

    let mut days = daily.iter();
    let (&first_date, &first_amount) = days.next()?;
    let mut highest = DaySpend {
        date: first_date,
        amount: first_amount,
    };
    let mut lowest = highest.clone();
    // Strict comparisons over ascending dates: the earliest day wins ties
    for (&date, &amount) in days {
        if amount > highest.amount {
            highest = DaySpend { date, amount };
        }
        if amount < lowest.amount {
            lowest = DaySpend { date, amount };
        }
    }
    highest.amount = round2(highest.amount);
    lowest.amount = round2(lowest.amount);

    Some(SpendingTrends {
        daily_average: round2(daily.values().sum::<f64>() / daily.len() as f64),
        highest_spending_day: highest,
        lowest_spending_day: lowest,
        weekly_average: round2(weekly.values().sum::<f64>() / weekly.len() as f64),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use spendlens_core::TxnKind;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn txn(date_: NaiveDate, desc: &str, amount: f64, category: &str) -> Transaction {
        let mut t = Transaction::new(date_, desc, amount, TxnKind::from_amount(amount));
        t.category = category.to_string();
        t
    }

    fn sample_ledger() -> Vec<Transaction> {
        vec![
            txn(date(2024, 1, 15), "Starbucks Coffee", -4.50, "Food & Dining"),
            txn(date(2024, 1, 15), "Salary Deposit", 3000.00, "Income"),
            txn(date(2024, 1, 16), "Grocery Store", -85.32, "Groceries"),
        ]
    }

    #[test]
    fn test_summary_scenario() {
        let result = aggregate(&sample_ledger());
        assert_eq!(result.summary.total_income, 3000.00);
        assert_eq!(result.summary.total_expenses, -89.82);
        assert_eq!(result.summary.net_income, 2910.18);
        assert_eq!(result.summary.total_transactions, 3);
        assert_eq!(result.summary.date_range.start, date(2024, 1, 15));
        assert_eq!(result.summary.date_range.end, date(2024, 1, 16));
    }

    #[test]
    fn test_net_income_invariant() {
        let result = aggregate(&sample_ledger());
        assert!(
            (result.summary.net_income
                - (result.summary.total_income + result.summary.total_expenses))
                .abs()
                < 1e-9
        );
    }

    #[test]
    fn test_expense_categories_sum_to_total_expenses() {
        let result = aggregate(&sample_ledger());
        let expense_sum: f64 = result
            .by_category
            .values()
            .filter(|c| c.kind == AggregateKind::Expense)
            .map(|c| c.total_spent)
            .sum();
        assert!((expense_sum - result.summary.total_expenses).abs() < 1e-9);
    }

    #[test]
    fn test_by_month_scenario() {
        let result = aggregate(&sample_ledger());
        let jan = &result.by_month["2024-01"];
        assert_eq!(jan.net_income, 2910.18);
        assert_eq!(jan.total_income, 3000.00);
        assert_eq!(jan.total_expenses, -89.82);
        assert_eq!(jan.transaction_count, 3);

        let month_income: f64 = result.by_month.values().map(|m| m.total_income).sum();
        assert!((month_income - result.summary.total_income).abs() < 1e-9);
    }

    #[test]
    fn test_by_category_kind_and_percentage() {
        let result = aggregate(&sample_ledger());
        let income = &result.by_category["Income"];
        assert_eq!(income.kind, AggregateKind::Income);
        assert_eq!(income.percentage_of_total, 0.0);

        let groceries = &result.by_category["Groceries"];
        assert_eq!(groceries.kind, AggregateKind::Expense);
        assert_eq!(groceries.total_spent, -85.32);
        assert_eq!(groceries.transaction_count, 1);
        // 85.32 / 89.82 = 95.0%
        assert_eq!(groceries.percentage_of_total, 95.0);
    }

    #[test]
    fn test_top_expenses_scenario() {
        let result = aggregate(&sample_ledger());
        assert_eq!(result.top_expenses.len(), 2);
        assert_eq!(result.top_expenses[0].description, "Grocery Store");
        assert_eq!(result.top_expenses[1].description, "Starbucks Coffee");
    }

    #[test]
    fn test_top_expenses_stable_tie_break() {
        let ledger = vec![
            txn(date(2024, 1, 1), "First", -10.0, "Other"),
            txn(date(2024, 1, 2), "Second", -10.0, "Other"),
            txn(date(2024, 1, 3), "Third", -20.0, "Other"),
        ];
        let result = aggregate(&ledger);
        assert_eq!(result.top_expenses[0].description, "Third");
        assert_eq!(result.top_expenses[1].description, "First");
        assert_eq!(result.top_expenses[2].description, "Second");
    }

    #[test]
    fn test_spending_by_day_has_all_seven_weekdays() {
        let result = aggregate(&sample_ledger());
        let by_day = &result.spending_patterns.spending_by_day;
        assert_eq!(by_day.len(), 7);
        for day in WEEKDAYS {
            assert!(by_day.contains_key(day), "missing weekday {day}");
        }
        // 2024-01-15 was a Monday, 2024-01-16 a Tuesday
        assert_eq!(by_day["Monday"], 4.50);
        assert_eq!(by_day["Tuesday"], 85.32);
        assert_eq!(by_day["Sunday"], 0.0);
    }

    #[test]
    fn test_spending_trends_scenario() {
        let result = aggregate(&sample_ledger());
        let trends = result.spending_trends.expect("expenses present");
        // Two active spending days: $4.50 on the 15th, $85.32 on the 16th
        assert_eq!(trends.daily_average, 44.91);
        assert_eq!(trends.highest_spending_day.date, date(2024, 1, 16));
        assert_eq!(trends.highest_spending_day.amount, 85.32);
        assert_eq!(trends.lowest_spending_day.date, date(2024, 1, 15));
        assert_eq!(trends.lowest_spending_day.amount, 4.50);
        // Both days fall in the same ISO week
        assert_eq!(trends.weekly_average, 89.82);
    }

    #[test]
    fn test_spending_trends_absent_without_expenses() {
        let ledger = vec![txn(date(2024, 1, 15), "Salary Deposit", 3000.00, "Income")];
        let result = aggregate(&ledger);
        assert!(result.spending_trends.is_none());
        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("spending_trends").is_none());
    }

    #[test]
    fn test_spending_trends_earliest_day_wins_ties() {
        let ledger = vec![
            txn(date(2024, 1, 2), "Coffee", -10.0, "Food & Dining"),
            txn(date(2024, 1, 9), "Coffee", -10.0, "Food & Dining"),
        ];
        let trends = aggregate(&ledger).spending_trends.unwrap();
        assert_eq!(trends.highest_spending_day.date, date(2024, 1, 2));
        assert_eq!(trends.lowest_spending_day.date, date(2024, 1, 2));
        // One expense per ISO week
        assert_eq!(trends.weekly_average, 10.0);
    }

    #[test]
    fn test_income_vs_expenses() {
        let result = aggregate(&sample_ledger());
        let ive = &result.income_vs_expenses;
        assert_eq!(ive.income_transaction_count, 1);
        assert_eq!(ive.expense_transaction_count, 2);
        assert_eq!(ive.average_income_per_transaction, 3000.00);
        assert_eq!(ive.average_expense_per_transaction, 44.91);
        // 3000 / 89.82 = 33.40
        assert_eq!(ive.income_to_expense_ratio, 33.40);
    }

    #[test]
    fn test_aggregation_is_idempotent() {
        let ledger = sample_ledger();
        let a = aggregate(&ledger);
        let b = aggregate(&ledger);
        assert_eq!(a, b);
    }
}
