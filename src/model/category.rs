//! The closed set of categories and the income/expense direction of a transaction.

use serde::{Deserialize, Serialize};

/// The category of a transaction. This is a closed set; adding a category means adding a
/// variant here.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    clap::ValueEnum,
)]
pub enum Category {
    #[default]
    General,
    Food,
    Housing,
    Transportation,
    Entertainment,
    Shopping,
    Work,
    Health,
}

serde_plain::derive_display_from_serialize!(Category);
serde_plain::derive_fromstr_from_deserialize!(Category);

impl Category {
    /// Every category, in the order they are offered to users and to the model.
    pub const ALL: [Category; 8] = [
        Category::General,
        Category::Food,
        Category::Housing,
        Category::Transportation,
        Category::Entertainment,
        Category::Shopping,
        Category::Work,
        Category::Health,
    ];

    /// Matches `s` against the category names ignoring case and surrounding whitespace.
    pub fn parse_loose(s: &str) -> Option<Category> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.to_string().eq_ignore_ascii_case(s))
    }

    /// The category names joined with `", "`, as used in prompts and help text.
    pub fn list() -> String {
        Self::ALL
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Whether a transaction brings money in or sends it out.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    #[default]
    Expense,
}

serde_plain::derive_display_from_serialize!(TransactionType);
serde_plain::derive_fromstr_from_deserialize!(TransactionType);

impl TransactionType {
    /// Matches `s` against `income` or `expense` ignoring case and surrounding whitespace.
    pub fn parse_loose(s: &str) -> Option<TransactionType> {
        match s.trim().to_ascii_lowercase().as_str() {
            "income" => Some(TransactionType::Income),
            "expense" => Some(TransactionType::Expense),
            _ => None,
        }
    }
}
