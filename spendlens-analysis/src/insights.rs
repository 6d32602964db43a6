//! Heuristic insight battery over the aggregated ledger.
//!
//! Deterministic rules, not a model: each heuristic inspects the ledger and
//! the aggregates, emits zero or more findings, and is silently skipped when
//! it lacks the history to compute. Emission follows declaration order so
//! consumers can group by type without re-sorting.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use spendlens_core::transaction::WEEKDAYS;
use spendlens_core::Transaction;

use crate::aggregate::{round2, AggregateKind, AnalysisResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    SpendingSpike,
    SpendingDecrease,
    CategoryDominance,
    BudgetRisk,
    SavingsOpportunity,
    SpendingPattern,
    FinancialHealth,
}

impl InsightKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InsightKind::SpendingSpike => "spending_spike",
            InsightKind::SpendingDecrease => "spending_decrease",
            InsightKind::CategoryDominance => "category_dominance",
            InsightKind::BudgetRisk => "budget_risk",
            InsightKind::SavingsOpportunity => "savings_opportunity",
            InsightKind::SpendingPattern => "spending_pattern",
            InsightKind::FinancialHealth => "financial_health",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    High,
    Medium,
    Positive,
    Info,
}

/// A single heuristic finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    #[serde(rename = "type")]
    pub kind: InsightKind,
    pub severity: Severity,
    pub title: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
}

/// Tunable thresholds for the heuristic battery. These are configuration,
/// not constants baked into the rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightConfig {
    /// Latest-month category spend above trailing average by this factor
    /// triggers a spike
    pub spike_multiplier: f64,
    /// Latest-month category spend below this fraction of the trailing
    /// average triggers a decrease
    pub decrease_fraction: f64,
    /// Share of total expenses above which one category dominates
    pub dominance_share: f64,
    /// Projected month-end spend above trailing monthly average by this
    /// factor flags budget risk
    pub budget_risk_multiplier: f64,
    /// An expense counts as "small" below this magnitude
    pub small_txn_ceiling: f64,
    /// Minimum combined magnitude of small purchases worth flagging
    pub savings_floor: f64,
    /// Minimum number of small purchases worth flagging
    pub savings_min_count: usize,
    /// Categories treated as discretionary spending
    pub discretionary: Vec<String>,
    /// One weekday above this share of weekly spend is a pattern
    pub weekday_share: f64,
    /// Savings rate at or above which finances look healthy
    pub healthy_savings_rate: f64,
    /// Savings rate below which savings look thin
    pub low_savings_rate: f64,
    /// Expense categories needed before spending counts as diversified
    pub min_expense_diversity: usize,
}

impl Default for InsightConfig {
    fn default() -> Self {
        Self {
            spike_multiplier: 1.5,
            decrease_fraction: 0.5,
            dominance_share: 0.40,
            budget_risk_multiplier: 1.2,
            small_txn_ceiling: 20.0,
            savings_floor: 50.0,
            savings_min_count: 5,
            discretionary: vec![
                "Food & Dining".to_string(),
                "Entertainment".to_string(),
                "Shopping".to_string(),
            ],
            weekday_share: 0.40,
            healthy_savings_rate: 0.20,
            low_savings_rate: 0.10,
            min_expense_diversity: 4,
        }
    }
}

/// Run the full battery in declaration order. Never fails; heuristics that
/// cannot compute contribute nothing.
pub fn generate_insights(
    ledger: &[Transaction],
    analysis: &AnalysisResult,
    config: &InsightConfig,
) -> Vec<Insight> {
    let mut insights = Vec::new();

    insights.extend(category_trends(ledger, analysis, config));
    insights.extend(category_dominance(analysis, config));
    insights.extend(budget_risk(ledger, analysis, config));
    insights.extend(savings_opportunities(ledger, config));
    insights.extend(spending_pattern(analysis, config));
    insights.extend(financial_health(analysis, config));

    tracing::debug!(count = insights.len(), "generated insights");
    insights
}

/// Expense magnitude per (category, month key), for trend heuristics.
fn category_month_spend(ledger: &[Transaction]) -> BTreeMap<String, BTreeMap<String, f64>> {
    let mut map: BTreeMap<String, BTreeMap<String, f64>> = BTreeMap::new();
    for txn in ledger.iter().filter(|t| t.is_expense()) {
        *map.entry(txn.category.clone())
            .or_default()
            .entry(txn.month_key())
            .or_insert(0.0) += txn.abs_amount();
    }
    map
}

/// Spending spikes and decreases: latest-month spend per category compared
/// to its trailing-month average. Needs at least two months of data.
fn category_trends(
    ledger: &[Transaction],
    analysis: &AnalysisResult,
    config: &InsightConfig,
) -> Vec<Insight> {
    let months: Vec<&String> = analysis.by_month.keys().collect();
    if months.len() < 2 {
        return Vec::new();
    }
    // "YYYY-MM" keys sort chronologically
    let latest = months[months.len() - 1];
    let prior = &months[..months.len() - 1];

    let mut insights = Vec::new();
    for (category, spend) in category_month_spend(ledger) {
        let latest_spend = spend.get(latest).copied().unwrap_or(0.0);
        let prior_avg: f64 =
            prior.iter().map(|m| spend.get(*m).copied().unwrap_or(0.0)).sum::<f64>()
                / prior.len() as f64;
        if prior_avg <= 0.0 {
            continue;
        }

        if latest_spend > prior_avg * config.spike_multiplier {
            let delta = round2(latest_spend - prior_avg);
            insights.push(Insight {
                kind: InsightKind::SpendingSpike,
                severity: Severity::High,
                title: format!("Unusual {category} Spending"),
                message: format!(
                    "{category} spending hit ${latest_spend:.2} this month, up from a \
                     ${prior_avg:.2} monthly average."
                ),
                amount: Some(delta),
                recommendation: Some(format!(
                    "Review your recent {category} transactions to identify the cause of \
                     increased spending."
                )),
            });
        } else if latest_spend < prior_avg * config.decrease_fraction {
            let delta = round2(prior_avg - latest_spend);
            insights.push(Insight {
                kind: InsightKind::SpendingDecrease,
                severity: Severity::Positive,
                title: format!("Great {category} Spending Control"),
                message: format!(
                    "{category} spending fell to ${latest_spend:.2} this month, down from a \
                     ${prior_avg:.2} monthly average."
                ),
                amount: Some(delta),
                recommendation: None,
            });
        }
    }
    insights
}

/// One category carrying more than the configured share of total expenses.
fn category_dominance(analysis: &AnalysisResult, config: &InsightConfig) -> Vec<Insight> {
    let mut insights = Vec::new();
    for (category, agg) in &analysis.by_category {
        if agg.kind != AggregateKind::Expense {
            continue;
        }
        if agg.percentage_of_total > config.dominance_share * 100.0 {
            insights.push(Insight {
                kind: InsightKind::CategoryDominance,
                severity: Severity::Medium,
                title: format!("High {category} Spending"),
                message: format!(
                    "{category} represents {:.0}% of your total spending.",
                    agg.percentage_of_total
                ),
                amount: Some(agg.total_spent.abs()),
                recommendation: Some(format!(
                    "Consider ways to reduce {category} expenses or create a specific budget \
                     for this category."
                )),
            });
        }
    }
    insights
}

fn days_in_month(year: i32, month: u32) -> i64 {
    let first = NaiveDate::from_ymd_opt(year, month, 1);
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    match (first, next) {
        (Some(a), Some(b)) => (b - a).num_days(),
        _ => 30,
    }
}

/// Extrapolate the latest month's daily burn rate to month-end and compare
/// with the trailing monthly average. The ledger's last date stands in for
/// "today" so the pipeline stays a pure function of its input.
fn budget_risk(
    ledger: &[Transaction],
    analysis: &AnalysisResult,
    config: &InsightConfig,
) -> Vec<Insight> {
    let months: Vec<&String> = analysis.by_month.keys().collect();
    if months.len() < 2 {
        return Vec::new();
    }
    let latest = months[months.len() - 1];
    let prior = &months[..months.len() - 1];

    let Some(reference) = ledger.iter().map(|t| t.date).max() else {
        return Vec::new();
    };
    let days_elapsed = reference.day() as i64;
    let month_days = days_in_month(reference.year(), reference.month());
    if days_elapsed >= month_days {
        // Month already complete; the trend heuristics cover it.
        return Vec::new();
    }

    let current_spend = analysis
        .by_month
        .get(latest)
        .map(|m| m.total_expenses.abs())
        .unwrap_or(0.0);
    if current_spend <= 0.0 {
        return Vec::new();
    }

    let projected = current_spend / days_elapsed as f64 * month_days as f64;
    let prior_avg: f64 = prior
        .iter()
        .filter_map(|m| analysis.by_month.get(*m))
        .map(|m| m.total_expenses.abs())
        .sum::<f64>()
        / prior.len() as f64;
    if prior_avg <= 0.0 {
        return Vec::new();
    }

    if projected > prior_avg * config.budget_risk_multiplier {
        let overrun = round2(projected - prior_avg);
        return vec![Insight {
            kind: InsightKind::BudgetRisk,
            severity: Severity::High,
            title: "Budget Overrun Risk".to_string(),
            message: format!(
                "Based on current spending, you may exceed your average monthly budget by \
                 ${overrun:.2}."
            ),
            amount: Some(overrun),
            recommendation: Some(
                "Consider reducing discretionary spending for the remainder of the month."
                    .to_string(),
            ),
        }];
    }
    Vec::new()
}

/// Recurring small purchases in discretionary categories that add up.
fn savings_opportunities(ledger: &[Transaction], config: &InsightConfig) -> Vec<Insight> {
    let mut insights = Vec::new();
    for category in &config.discretionary {
        let small: Vec<&Transaction> = ledger
            .iter()
            .filter(|t| {
                t.category == *category && t.is_expense() && t.abs_amount() < config.small_txn_ceiling
            })
            .collect();
        let total: f64 = small.iter().map(|t| t.abs_amount()).sum();

        if small.len() >= config.savings_min_count && total >= config.savings_floor {
            insights.push(Insight {
                kind: InsightKind::SavingsOpportunity,
                severity: Severity::Medium,
                title: format!("Small {category} Purchases Add Up"),
                message: format!(
                    "{} small {category} purchases totaled ${total:.2}.",
                    small.len()
                ),
                amount: Some(round2(total)),
                recommendation: Some(format!(
                    "Consider bulk purchasing or setting a weekly limit for {category} expenses."
                )),
            });
        }
    }
    insights
}

/// One weekday carrying a disproportionate share of total spend.
fn spending_pattern(analysis: &AnalysisResult, config: &InsightConfig) -> Vec<Insight> {
    let by_day = &analysis.spending_patterns.spending_by_day;
    let total: f64 = by_day.values().sum();
    if total <= 0.0 {
        return Vec::new();
    }

    // Monday-first iteration makes the tie-break deterministic
    let mut top_day = "";
    let mut top_spend = 0.0;
    for day in WEEKDAYS {
        let spend = by_day.get(day).copied().unwrap_or(0.0);
        if spend > top_spend {
            top_day = day;
            top_spend = spend;
        }
    }

    let share = top_spend / total;
    if share > config.weekday_share {
        return vec![Insight {
            kind: InsightKind::SpendingPattern,
            severity: Severity::Info,
            title: format!("{top_day} Spending Pattern"),
            message: format!(
                "{:.0}% of your spending happens on {top_day}s.",
                share * 100.0
            ),
            amount: None,
            recommendation: None,
        }];
    }
    Vec::new()
}

/// Composite health read: savings rate, net trend, category diversity.
fn financial_health(analysis: &AnalysisResult, config: &InsightConfig) -> Vec<Insight> {
    let income = analysis.summary.total_income;
    if income <= 0.0 {
        return Vec::new();
    }
    let savings_rate = analysis.summary.net_income / income;

    let mut score = 0u8;
    if savings_rate >= config.healthy_savings_rate {
        score += 2;
    } else if savings_rate >= config.low_savings_rate {
        score += 1;
    }

    let nets: Vec<f64> = analysis.by_month.values().map(|m| m.net_income).collect();
    let improving = nets.len() >= 2 && nets[nets.len() - 1] >= nets[nets.len() - 2];
    if improving {
        score += 1;
    }

    let diversity = analysis
        .by_category
        .values()
        .filter(|c| c.kind == AggregateKind::Expense)
        .count();
    if diversity >= config.min_expense_diversity {
        score += 1;
    }

    let insight = if savings_rate < 0.0 {
        Insight {
            kind: InsightKind::FinancialHealth,
            severity: Severity::Info,
            title: "Spending Exceeds Income".to_string(),
            message: format!(
                "You spent ${:.2} more than you earned over this period.",
                analysis.summary.net_income.abs()
            ),
            amount: None,
            recommendation: None,
        }
    } else if score >= 3 {
        Insight {
            kind: InsightKind::FinancialHealth,
            severity: Severity::Positive,
            title: "Excellent Financial Health".to_string(),
            message: format!(
                "You're saving {:.1}% of your income, with spending spread across {diversity} \
                 categories.",
                savings_rate * 100.0
            ),
            amount: None,
            recommendation: None,
        }
    } else {
        Insight {
            kind: InsightKind::FinancialHealth,
            severity: Severity::Info,
            title: "Room to Improve Savings".to_string(),
            message: format!(
                "You're saving {:.1}% of your income. Financial experts recommend {:.0}%.",
                savings_rate * 100.0,
                config.healthy_savings_rate * 100.0
            ),
            amount: None,
            recommendation: None,
        }
    };

    vec![insight]
}
