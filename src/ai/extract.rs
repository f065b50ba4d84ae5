//! Turns free text such as "pizza 450 yesterday" into a transaction draft for review.

use crate::ai::{Generator, Prompt};
use crate::form::{Draft, DATE_FORMAT};
use crate::model::{Amount, Category, TransactionType};
use crate::Result;
use anyhow::{bail, Context};
use chrono::NaiveDate;
use serde_json::Value;
use std::str::FromStr;
use tracing::{debug, warn};

/// The notice shown when the model's reply cannot be used.
pub const EXTRACTION_FAILED: &str =
    "Couldn't process the text. Please try again or enter manually.";

/// The free-text entry and the state of its request to the model.
///
/// A successful extraction never touches the store: it yields a `Draft` that the caller opens in
/// the transaction form for review.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    open: bool,
    text: String,
    loading: bool,
    notice: Option<String>,
}

impl Extraction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// The failure notice from the last attempt, if it failed.
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn open(&mut self) {
        self.open = true;
        self.notice = None;
    }

    /// Hides the entry. The text is kept for the next time it is opened.
    pub fn close(&mut self) {
        self.open = false;
        self.notice = None;
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    /// Marks a request as outstanding and returns the prompt to send. Returns `None`, changing
    /// nothing, while another request is outstanding or when the text is blank.
    pub fn begin(&mut self, today: NaiveDate) -> Option<Prompt> {
        if self.loading || self.text.trim().is_empty() {
            return None;
        }
        self.loading = true;
        self.notice = None;
        Some(extraction_prompt(&self.text, today))
    }

    /// Applies the model's `reply` to the request started by `begin`.
    ///
    /// On success the entry is closed, its text is cleared, and the decoded draft is returned. On
    /// failure the entry stays open with its text intact and `notice` is set.
    pub fn finish(&mut self, reply: Result<String>, today: NaiveDate) -> Option<Draft> {
        self.loading = false;
        match reply.and_then(|r| decode_reply(&r, &self.text, today)) {
            Ok(draft) => {
                self.open = false;
                self.text.clear();
                Some(draft)
            }
            Err(e) => {
                warn!("Unable to extract a transaction: {e:#}");
                self.open = true;
                self.notice = Some(EXTRACTION_FAILED.to_string());
                None
            }
        }
    }

    /// Sends the current text to `generator` and decodes the reply. See `begin` and `finish`.
    pub async fn extract(&mut self, generator: &dyn Generator, today: NaiveDate) -> Option<Draft> {
        let prompt = self.begin(today)?;
        let reply = generator.generate(&prompt).await;
        self.finish(reply, today)
    }
}

fn extraction_prompt(text: &str, today: NaiveDate) -> Prompt {
    Prompt::json(format!(
        "Extract transaction details from the text: \"{text}\".\n\
         Current date is {today}.\n\
         Return valid JSON only (no markdown formatting) with keys:\n\
         \"description\" (string),\n\
         \"amount\" (number),\n\
         \"type\" (\"income\" or \"expense\"),\n\
         \"category\" (string from list: {categories}),\n\
         \"date\" (YYYY-MM-DD).",
        text = text.trim(),
        today = today.format(DATE_FORMAT),
        categories = Category::list(),
    ))
}

/// Decodes the model's reply into a draft.
///
/// The reply must be a JSON object, optionally wrapped in a Markdown code fence. Each field is
/// checked on its own; a field that is missing or does not fit falls back to its default:
///
/// - `description`: a non-empty string, else `input`
/// - `amount`: a non-negative number (or numeric string), else empty
/// - `type`: `income` or `expense`, else expense
/// - `category`: one of the known categories, else General
/// - `date`: a `YYYY-MM-DD` string, else `today`
///
/// # Errors
/// - Returns an error if the reply is not JSON or is not a JSON object.
pub fn decode_reply(reply: &str, input: &str, today: NaiveDate) -> Result<Draft> {
    let json = strip_code_fence(reply);
    let value: Value =
        serde_json::from_str(json).context("The model reply is not valid JSON")?;
    let Value::Object(fields) = value else {
        bail!("The model reply is not a JSON object");
    };

    let description = fields
        .get("description")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| input.trim())
        .to_string();

    let amount = match fields.get("amount") {
        Some(Value::Number(n)) => n.as_f64().and_then(|f| Amount::new(f).ok()),
        Some(Value::String(s)) => Amount::from_str(s).ok(),
        _ => None,
    }
    .map(|a| a.to_string())
    .unwrap_or_else(|| {
        debug!("No usable amount in the model reply");
        String::new()
    });

    let r#type = fields
        .get("type")
        .and_then(Value::as_str)
        .and_then(TransactionType::parse_loose)
        .unwrap_or_default();

    let category = fields
        .get("category")
        .and_then(Value::as_str)
        .and_then(Category::parse_loose)
        .unwrap_or_default();

    let date = fields
        .get("date")
        .and_then(Value::as_str)
        .and_then(|s| NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).ok())
        .unwrap_or(today)
        .format(DATE_FORMAT)
        .to_string();

    Ok(Draft {
        description,
        amount,
        r#type,
        category,
        date,
    })
}

/// Removes a surrounding ```` ```json ... ``` ```` fence if there is one.
fn strip_code_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (e.g. `json`) on the opening line.
    let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}
