//! Amount type for handling monetary values entered as text.
//!
//! This module provides the `Amount` type which wraps a plain `f64` and is the single place
//! where text typed by a user (or returned by a model) becomes a number.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// The currency symbol used when displaying amounts.
pub const CURRENCY_SYMBOL: &str = "₹";

/// Represents a non-negative, finite monetary amount.
///
/// Amounts are stored as plain numbers. Whether money came in or went out is carried by the
/// transaction type, never by the sign of the amount.
///
/// # Examples
///
/// ```
/// # use budget_tracker::model::Amount;
/// # use std::str::FromStr;
/// let amount = Amount::from_str("₹1,250.50").unwrap();
/// assert_eq!(amount.value(), 1250.5);
/// assert!(Amount::from_str("-5").is_err());
/// assert!(Amount::from_str("lots").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Amount(f64);

impl Amount {
    pub const ZERO: Amount = Amount(0.0);

    /// The largest amount a single transaction can carry, one lakh crore. Totals over any
    /// realistic number of transactions stay finite.
    pub const MAX: f64 = 1e12;

    /// Validates `value` and wraps it.
    pub fn new(value: f64) -> Result<Self, AmountError> {
        if !value.is_finite() {
            return Err(AmountError::NotFinite);
        }
        if value < 0.0 {
            return Err(AmountError::Negative);
        }
        if value > Self::MAX {
            return Err(AmountError::TooLarge);
        }
        // Normalize -0.0 so that it displays and serializes as 0.
        Ok(Self(value.abs()))
    }

    /// Returns the underlying numeric value.
    pub fn value(&self) -> f64 {
        self.0
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.0 == 0.0
    }
}

/// An error that can occur when turning text or numbers into an `Amount`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    Empty,
    NotANumber(String),
    NotFinite,
    Negative,
    TooLarge,
}

impl Display for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            AmountError::Empty => write!(f, "an amount is required"),
            AmountError::NotANumber(s) => write!(f, "'{s}' is not a number"),
            AmountError::NotFinite => write!(f, "the amount must be a finite number"),
            AmountError::Negative => write!(f, "the amount cannot be negative"),
            AmountError::TooLarge => write!(
                f,
                "the amount cannot be more than {}",
                format_currency(Amount::MAX)
            ),
        }
    }
}

impl std::error::Error for AmountError {}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(AmountError::Empty);
        }

        // Tolerate a leading currency symbol and thousands separators.
        let without_symbol = trimmed
            .strip_prefix(CURRENCY_SYMBOL)
            .unwrap_or(trimmed)
            .trim_start();
        let without_commas = without_symbol.replace(',', "");

        let value = f64::from_str(&without_commas)
            .map_err(|_| AmountError::NotANumber(trimmed.to_string()))?;
        Amount::new(value)
    }
}

impl Display for Amount {
    /// Formats the raw number without a currency symbol, e.g. `450` or `2450.75`.
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Formats a signed value as currency, e.g. `₹15,000.00` or `-₹5,450.00`.
pub fn format_currency(value: f64) -> String {
    let sign = if value < 0.0 { "-" } else { "" };
    format!(
        "{sign}{CURRENCY_SYMBOL}{}",
        format_num::format_num!(",.2", value.abs())
    )
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(self.0)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = f64::deserialize(deserializer)?;
        Amount::new(value).map_err(serde::de::Error::custom)
    }
}

impl TryFrom<f64> for Amount {
    type Error = AmountError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Amount::new(value)
    }
}

impl From<Amount> for f64 {
    fn from(amount: Amount) -> Self {
        amount.value()
    }
}
