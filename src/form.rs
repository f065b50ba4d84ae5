//! The transaction form: a draft that is opened, edited field by field, and either committed to
//! the store or discarded.

use crate::model::{Amount, Category, Transaction, TransactionType};
use crate::store::Store;
use crate::Result;
use chrono::NaiveDate;
use serde::Serialize;
use std::str::FromStr;
use tracing::debug;

/// The format dates are entered and stored in.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// An uncommitted transaction. The amount and date are kept exactly as entered until the draft
/// is submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Draft {
    pub description: String,
    pub amount: String,
    #[serde(rename = "type")]
    pub r#type: TransactionType,
    pub category: Category,
    pub date: String,
}

impl Draft {
    /// A blank expense in the General category dated `today`.
    pub fn new(today: NaiveDate) -> Self {
        Self {
            description: String::new(),
            amount: String::new(),
            r#type: TransactionType::Expense,
            category: Category::General,
            date: today.format(DATE_FORMAT).to_string(),
        }
    }

    pub fn set(&mut self, field: DraftField) {
        match field {
            DraftField::Description(v) => self.description = v,
            DraftField::Amount(v) => self.amount = v,
            DraftField::Type(v) => self.r#type = v,
            DraftField::Category(v) => self.category = v,
            DraftField::Date(v) => self.date = v,
        }
    }

    /// Parses the text fields. Returns `None` when the description or amount is empty, or when
    /// the amount or date does not parse.
    fn validate(&self) -> Option<Validated> {
        let description = self.description.trim();
        if description.is_empty() || self.amount.trim().is_empty() {
            return None;
        }
        let amount = match Amount::from_str(&self.amount) {
            Ok(amount) => amount,
            Err(e) => {
                debug!("Rejecting draft amount '{}': {e}", self.amount);
                return None;
            }
        };
        let date = match NaiveDate::parse_from_str(self.date.trim(), DATE_FORMAT) {
            Ok(date) => date,
            Err(e) => {
                debug!("Rejecting draft date '{}': {e}", self.date);
                return None;
            }
        };
        Some(Validated {
            description: description.to_string(),
            amount,
            date,
        })
    }
}

struct Validated {
    description: String,
    amount: Amount,
    date: NaiveDate,
}

/// One field of a `Draft` together with its new value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftField {
    Description(String),
    Amount(String),
    Type(TransactionType),
    Category(Category),
    Date(String),
}

/// Whether the form is showing a draft.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FormState {
    #[default]
    Closed,
    Open(Draft),
}

/// What happened when the form was submitted.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// The draft was valid and is now in the store.
    Committed(Transaction),
    /// The draft is missing a required field or has an unparseable value. The form stays open.
    Rejected,
    /// There was no open form to submit.
    NotOpen,
}

/// Drives the `Closed -> Open(draft) -> Closed` life of the transaction form.
#[derive(Debug, Clone, Default)]
pub struct FormController {
    state: FormState,
}

impl FormController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, FormState::Open(_))
    }

    pub fn draft(&self) -> Option<&Draft> {
        match &self.state {
            FormState::Open(draft) => Some(draft),
            FormState::Closed => None,
        }
    }

    /// Opens the form with `prefill`, or with a blank draft dated `today`. Opening an already
    /// open form replaces its draft.
    pub fn open(&mut self, prefill: Option<Draft>, today: NaiveDate) {
        self.state = FormState::Open(prefill.unwrap_or_else(|| Draft::new(today)));
    }

    /// Changes one field of the open draft. Does nothing when the form is closed.
    pub fn set_field(&mut self, field: DraftField) {
        if let FormState::Open(draft) = &mut self.state {
            draft.set(field);
        }
    }

    /// Closes the form and throws the draft away.
    pub fn cancel(&mut self) {
        self.state = FormState::Closed;
    }

    /// Validates the open draft and, when it is valid, commits it to `store` with a fresh id and
    /// closes the form. Invalid drafts leave everything unchanged.
    ///
    /// # Errors
    /// - Returns an error if the store cannot persist the new transaction. The transaction is
    ///   still in the in-memory store and the form is closed.
    pub async fn submit(&mut self, store: &mut Store) -> Result<SubmitOutcome> {
        let draft = match &self.state {
            FormState::Open(draft) => draft,
            FormState::Closed => return Ok(SubmitOutcome::NotOpen),
        };
        let Some(valid) = draft.validate() else {
            return Ok(SubmitOutcome::Rejected);
        };

        let transaction = Transaction::new(
            store.next_id(),
            valid.description,
            valid.amount,
            draft.r#type,
            draft.category,
            valid.date,
        );
        self.state = FormState::Closed;
        store.add(transaction.clone()).await?;
        Ok(SubmitOutcome::Committed(transaction))
    }
}
