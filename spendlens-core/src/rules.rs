//! Ordered category rules matched against transaction descriptions.
//!
//! Rules are static configuration: loaded once at process start, never
//! mutated, and passed by reference into the categorizer so the pipeline
//! stays a pure function of (file, rule set). Matching is a case-insensitive
//! substring check; the first rule to match wins, higher priority first,
//! definition order breaking ties.

use serde::{Deserialize, Serialize};

use crate::transaction::Transaction;

/// Category assigned when no rule matches a description.
pub const FALLBACK_CATEGORY: &str = "Other";

/// A single pattern-to-category mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRule {
    /// Case-insensitive substring to look for in the description
    pub pattern: String,
    pub category: String,
    #[serde(default)]
    pub priority: i32,
}

impl CategoryRule {
    pub fn new(pattern: impl Into<String>, category: impl Into<String>, priority: i32) -> Self {
        Self {
            pattern: pattern.into(),
            category: category.into(),
            priority,
        }
    }
}

/// An immutable, priority-ordered collection of category rules. Serializes
/// as the same JSON array [`RuleSet::from_json`] accepts.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct RuleSet {
    rules: Vec<CategoryRule>,
}

impl RuleSet {
    /// Build a rule set. Rules are normalized to lowercase and sorted by
    /// descending priority; the sort is stable so rules defined first win
    /// ties.
    pub fn new(mut rules: Vec<CategoryRule>) -> Self {
        for rule in &mut rules {
            rule.pattern = rule.pattern.to_lowercase();
        }
        rules.sort_by_key(|r| std::cmp::Reverse(r.priority));
        Self { rules }
    }

    /// Load a rule set from a JSON array of `{pattern, category, priority}`.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let rules: Vec<CategoryRule> = serde_json::from_str(json)?;
        Ok(Self::new(rules))
    }

    /// Rules in match order (priority descending).
    pub fn rules(&self) -> &[CategoryRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Deterministically categorize a description. Total: falls back to
    /// [`FALLBACK_CATEGORY`] when nothing matches. Consults nothing but the
    /// description text, so identical descriptions always map to identical
    /// categories.
    pub fn categorize(&self, description: &str) -> &str {
        let desc = description.to_lowercase();
        for rule in &self.rules {
            if desc.contains(&rule.pattern) {
                return &rule.category;
            }
        }
        FALLBACK_CATEGORY
    }
}

/// Assign a category to every ledger entry in place. The only post-creation
/// mutation a transaction ever sees.
pub fn categorize_all(ledger: &mut [Transaction], rules: &RuleSet) {
    for txn in ledger {
        txn.category = rules.categorize(&txn.description).to_string();
    }
}

/// The built-in rule set: income keywords first, then expense groups in
/// decreasing priority so e.g. "grocery" beats the generic "store".
pub fn default_rules() -> RuleSet {
    let mut rules = Vec::new();

    let groups: [(&str, i32, &[&str]); 9] = [
        (
            "Income",
            100,
            &[
                "payroll",
                "salary",
                "deposit",
                "income",
                "wages",
                "transfer received",
                "refund",
            ],
        ),
        (
            "Food & Dining",
            90,
            &[
                "starbucks",
                "mcdonald",
                "subway",
                "tim hortons",
                "pizza",
                "restaurant",
                "cafe",
                "coffee",
                "uber eats",
                "doordash",
                "dining",
                "takeout",
                "delivery",
            ],
        ),
        (
            "Groceries",
            80,
            &[
                "grocery",
                "supermarket",
                "loblaws",
                "sobeys",
                "costco",
                "fresh market",
                "food basics",
            ],
        ),
        (
            "Transportation",
            70,
            &[
                "gas station",
                "shell",
                "esso",
                "petro",
                "uber",
                "taxi",
                "transit",
                "parking",
                "car wash",
                "automotive",
            ],
        ),
        (
            "Entertainment",
            60,
            &[
                "netflix",
                "spotify",
                "amazon prime",
                "disney",
                "hulu",
                "cinema",
                "movie",
                "theatre",
                "gaming",
                "steam",
            ],
        ),
        (
            "Shopping",
            50,
            &[
                "amazon",
                "walmart",
                "target",
                "shopping",
                "store",
                "retail",
                "mall",
                "clothing",
                "electronics",
            ],
        ),
        (
            "Utilities",
            40,
            &[
                "hydro",
                "electric",
                "gas bill",
                "water bill",
                "internet",
                "phone",
                "cable",
                "utility",
                "heating",
            ],
        ),
        (
            "Healthcare",
            30,
            &[
                "pharmacy",
                "doctor",
                "medical",
                "dental",
                "hospital",
                "clinic",
                "medicine",
                "prescription",
            ],
        ),
        (
            "Banking",
            20,
            &[
                "atm",
                "withdrawal",
                "bank fee",
                "service charge",
                "interest charge",
                "overdraft",
            ],
        ),
    ];

    for (category, priority, patterns) in groups {
        for pattern in patterns {
            rules.push(CategoryRule::new(*pattern, category, priority));
        }
    }

    RuleSet::new(rules)
}
