//! spendlens-analysis: multi-dimensional aggregation, heuristic insight
//! generation, and the end-to-end analysis pipeline.

pub mod aggregate;
pub mod insights;
pub mod pipeline;

pub use aggregate::{
    aggregate, AggregateKind, AnalysisResult, CategoryAggregate, DateRange, DaySpend,
    IncomeVsExpenses, MonthAggregate, SpendingPatterns, SpendingTrends, Summary,
};
pub use insights::{generate_insights, Insight, InsightConfig, InsightKind, Severity};
pub use pipeline::{analyze_csv_reader, analyze_file, Analysis, AnalyzeResponse};
