use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use spendlens_analysis::{analyze_file, Analysis, AnalyzeResponse, InsightConfig, Severity};
use spendlens_core::transaction::WEEKDAYS;
use spendlens_core::{default_rules, RuleSet};
use spendlens_ingest::ColumnMap;

#[derive(Parser, Debug)]
#[command(name = "spendlens", version, about = "Transaction export analyzer")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze a transaction export (CSV, Excel, or PDF)
    Analyze {
        /// Path to the export file
        file: PathBuf,

        /// Print the full JSON response envelope instead of a summary
        #[arg(long)]
        json: bool,

        /// Limit the top-expenses listing (default: 10)
        #[arg(long, default_value_t = 10)]
        limit: usize,

        /// Custom category rules (JSON array of {pattern, category, priority})
        #[arg(long)]
        rules: Option<PathBuf>,

        /// Header name of the date column
        #[arg(long, default_value = "Date")]
        date_col: String,

        /// Header name of the description column
        #[arg(long, default_value = "Description")]
        description_col: String,

        /// Header name of the amount column
        #[arg(long, default_value = "Amount")]
        amount_col: String,

        /// Header name of the type column
        #[arg(long, default_value = "Type")]
        type_col: String,
    },

    /// Print the active category rules in match order
    Rules {
        /// Custom category rules file instead of the built-in set
        #[arg(long)]
        rules: Option<PathBuf>,

        /// Print the rules as JSON (reloadable via --rules)
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Analyze {
            file,
            json,
            limit,
            rules,
            date_col,
            description_col,
            amount_col,
            type_col,
        } => {
            let rules = load_rules(rules.as_deref())?;
            let columns = ColumnMap {
                date: date_col,
                description: description_col,
                amount: amount_col,
                kind: type_col,
            };
            let config = InsightConfig::default();

            let result = analyze_file(&file, &columns, &rules, &config);

            if json {
                let response = AnalyzeResponse::from_result(result);
                println!("{}", serde_json::to_string_pretty(&response)?);
                if !response.is_success() {
                    std::process::exit(1);
                }
            } else {
                match result {
                    Ok(analysis) => print_summary(&analysis, limit),
                    Err(e) => bail!("{e}"),
                }
            }
        }

        Command::Rules { rules, json } => {
            let rules = load_rules(rules.as_deref())?;
            if json {
                println!("{}", serde_json::to_string_pretty(&rules)?);
            } else {
                for rule in rules.rules() {
                    println!("{:>4}  {:<24} -> {}", rule.priority, rule.pattern, rule.category);
                }
            }
        }
    }

    Ok(())
}

fn load_rules(path: Option<&std::path::Path>) -> Result<RuleSet> {
    match path {
        Some(p) => {
            let json = fs::read_to_string(p).with_context(|| format!("reading {}", p.display()))?;
            let rules = RuleSet::from_json(&json)
                .with_context(|| format!("parsing rules from {}", p.display()))?;
            if rules.is_empty() {
                bail!("rules file {} contains no rules", p.display());
            }
            Ok(rules)
        }
        None => Ok(default_rules()),
    }
}

fn print_summary(analysis: &Analysis, limit: usize) {
    let result = &analysis.analysis;
    let summary = &result.summary;

    println!(
        "Parsed {} transactions ({} skipped), {} to {}",
        summary.total_transactions,
        analysis.skipped.len(),
        summary.date_range.start,
        summary.date_range.end
    );
    println!(
        "Income: ${:.2}   Expenses: ${:.2}   Net: ${:.2}\n",
        summary.total_income,
        summary.total_expenses.abs(),
        summary.net_income
    );

    println!("By category:");
    for (category, agg) in &result.by_category {
        println!(
            "  {:<20} ${:>10.2}  ({} txns, {:.1}%)",
            category,
            agg.total_spent.abs(),
            agg.transaction_count,
            agg.percentage_of_total
        );
    }

    println!("\nBy month:");
    for (month, agg) in &result.by_month {
        println!(
            "  {}  income ${:>10.2}  expenses ${:>10.2}  net ${:>10.2}",
            month,
            agg.total_income,
            agg.total_expenses.abs(),
            agg.net_income
        );
    }

    println!("\nSpending by weekday:");
    for day in WEEKDAYS {
        if let Some(total) = result.spending_patterns.spending_by_day.get(day) {
            println!("  {:<10} ${:>10.2}", day, total);
        }
    }

    println!("\nTop expenses:");
    for txn in result.top_expenses.iter().take(limit) {
        println!(
            "  {}  {:<32} ${:>10.2}  [{}]",
            txn.date,
            txn.description,
            txn.abs_amount(),
            txn.category
        );
    }

    if !result.ai_insights.is_empty() {
        println!("\nInsights:");
        for insight in &result.ai_insights {
            let marker = match insight.severity {
                Severity::High => "!",
                Severity::Medium => "*",
                Severity::Positive => "+",
                Severity::Info => "-",
            };
            println!(
                "  [{marker}] {} ({}): {}",
                insight.title,
                insight.kind.as_str(),
                insight.message
            );
            if let Some(rec) = &insight.recommendation {
                println!("      {rec}");
            }
        }
    }
}
