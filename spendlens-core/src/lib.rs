//! spendlens-core: canonical ledger types, category rules, and the pipeline
//! error taxonomy.

pub mod error;
pub mod rules;
pub mod transaction;

pub use error::{PipelineError, Result};
pub use rules::{CategoryRule, RuleSet, categorize_all, default_rules, FALLBACK_CATEGORY};
pub use transaction::{Transaction, TxnKind};
