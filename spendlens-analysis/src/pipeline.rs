//! End-to-end analysis pipeline and the response envelope handed to the
//! presentation layer.
//!
//! One synchronous computation per request: file, normalized ledger,
//! categorized ledger, aggregates, insights, envelope. All-or-nothing — a
//! failed request returns an error message and no partial analysis.

use std::io::Read;
use std::path::Path;

use serde::Serialize;
use spendlens_core::{categorize_all, Result, RuleSet, Transaction};
use spendlens_ingest::{ingest_csv_reader, ingest_file, ColumnMap, Ingested, SkippedRow};

use crate::aggregate::{aggregate, AnalysisResult};
use crate::insights::{generate_insights, InsightConfig};

/// A completed analysis: the categorized ledger, every derived statistic,
/// and the rows ingestion had to skip.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub transactions: Vec<Transaction>,
    pub analysis: AnalysisResult,
    pub skipped: Vec<SkippedRow>,
}

fn run(ingested: Ingested, rules: &RuleSet, config: &InsightConfig) -> Analysis {
    let Ingested {
        mut transactions,
        skipped,
    } = ingested;

    categorize_all(&mut transactions, rules);
    let mut analysis = aggregate(&transactions);
    analysis.ai_insights = generate_insights(&transactions, &analysis, config);

    tracing::info!(
        transactions = transactions.len(),
        categories = analysis.by_category.len(),
        insights = analysis.ai_insights.len(),
        "analysis complete"
    );

    Analysis {
        transactions,
        analysis,
        skipped,
    }
}

/// Analyze an uploaded file. The rule set and insight thresholds are
/// read-only configuration, so the result is a pure function of
/// (file, rules, config).
pub fn analyze_file(
    path: impl AsRef<Path>,
    columns: &ColumnMap,
    rules: &RuleSet,
    config: &InsightConfig,
) -> Result<Analysis> {
    let ingested = ingest_file(path, columns)?;
    Ok(run(ingested, rules, config))
}

/// Analyze delimited data from an in-memory reader.
pub fn analyze_csv_reader<R: Read>(
    reader: R,
    columns: &ColumnMap,
    rules: &RuleSet,
    config: &InsightConfig,
) -> Result<Analysis> {
    let ingested = ingest_csv_reader(reader, columns)?;
    Ok(run(ingested, rules, config))
}

/// The boundary contract consumed by the presentation layer.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum AnalyzeResponse {
    Success {
        success: bool,
        count: usize,
        skipped_rows: usize,
        transactions: Vec<Transaction>,
        analysis: AnalysisResult,
    },
    Failure {
        success: bool,
        error: String,
    },
}

impl AnalyzeResponse {
    pub fn from_result(result: Result<Analysis>) -> Self {
        match result {
            Ok(analysis) => AnalyzeResponse::Success {
                success: true,
                count: analysis.transactions.len(),
                skipped_rows: analysis.skipped.len(),
                transactions: analysis.transactions,
                analysis: analysis.analysis,
            },
            Err(err) => AnalyzeResponse::Failure {
                success: false,
                error: err.to_string(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, AnalyzeResponse::Success { .. })
    }
}
