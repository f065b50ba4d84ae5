//! Which transactions are shown and how.

use crate::model::{Transaction, TransactionType};
use serde::{Deserialize, Serialize};

/// Restricts the transaction list to one type.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Filter {
    #[default]
    All,
    Income,
    Expense,
}

serde_plain::derive_display_from_serialize!(Filter);
serde_plain::derive_fromstr_from_deserialize!(Filter);

impl Filter {
    pub fn matches(&self, transaction: &Transaction) -> bool {
        match self {
            Filter::All => true,
            Filter::Income => transaction.r#type() == TransactionType::Income,
            Filter::Expense => transaction.r#type() == TransactionType::Expense,
        }
    }
}

/// Light or dark output.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

serde_plain::derive_display_from_serialize!(Theme);
serde_plain::derive_fromstr_from_deserialize!(Theme);

impl Theme {
    /// Guesses the terminal's preference from `COLORFGBG` (set by many terminals as
    /// `foreground;background`). Falls back to light.
    pub fn detect() -> Self {
        std::env::var("COLORFGBG")
            .ok()
            .and_then(|v| Self::from_colorfgbg(&v))
            .unwrap_or_default()
    }

    fn from_colorfgbg(value: &str) -> Option<Self> {
        let background: u8 = value.rsplit(';').next()?.trim().parse().ok()?;
        // Colours 0-6 and 8 are the dark half of the 16-colour palette.
        Some(if background <= 6 || background == 8 {
            Theme::Dark
        } else {
            Theme::Light
        })
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

/// The active filter and theme. Neither is persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ViewState {
    filter: Filter,
    theme: Theme,
}

impl ViewState {
    pub fn new(theme: Theme) -> Self {
        Self {
            filter: Filter::All,
            theme,
        }
    }

    pub fn filter(&self) -> Filter {
        self.filter
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn set_filter(&mut self, filter: Filter) {
        self.filter = filter;
    }

    pub fn toggle_theme(&mut self) {
        self.theme = self.theme.toggled();
    }

    /// The transactions that pass the current filter, in their original order.
    pub fn project<'a>(&self, transactions: &'a [Transaction]) -> Vec<&'a Transaction> {
        transactions
            .iter()
            .filter(|t| self.filter.matches(t))
            .collect()
    }
}
