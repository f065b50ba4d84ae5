//! A short, friendly summary of recent spending with a few tips.

use crate::ai::{Generator, Prompt};
use crate::model::{Transaction, CURRENCY_SYMBOL};
use crate::Result;
use anyhow::{bail, Context};
use tracing::{debug, warn};

/// How many of the most recent transactions are sent to the model.
pub const INSIGHT_SAMPLE: usize = 15;

/// The last summary received from the model and whether a request is outstanding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Insights {
    text: Option<String>,
    loading: bool,
}

impl Insights {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Marks a request as outstanding and returns the prompt for the first `INSIGHT_SAMPLE` of
    /// `recent`. Returns `Ok(None)` while another request is outstanding.
    ///
    /// # Errors
    /// - Returns an error if the transactions cannot be serialized. Nothing changes in that case.
    pub fn begin(&mut self, recent: &[Transaction]) -> Result<Option<Prompt>> {
        if self.loading {
            return Ok(None);
        }
        let sample = &recent[..recent.len().min(INSIGHT_SAMPLE)];
        let data =
            serde_json::to_string(sample).context("Unable to serialize transactions for insights")?;
        self.loading = true;
        Ok(Some(insight_prompt(&data)))
    }

    /// Applies the model's `reply`. On failure the previous summary is kept and the failure is only
    /// logged. Returns whether a new summary was stored.
    pub fn finish(&mut self, reply: Result<String>) -> bool {
        self.loading = false;
        match reply.and_then(usable_text) {
            Ok(text) => {
                debug!("Received {} characters of insights", text.len());
                self.text = Some(text);
                true
            }
            Err(e) => {
                warn!("Unable to generate insights: {e:#}");
                false
            }
        }
    }

    /// Asks `generator` to summarize `recent`. See `begin` and `finish`.
    pub async fn refresh(
        &mut self,
        generator: &dyn Generator,
        recent: &[Transaction],
    ) -> Result<bool> {
        let Some(prompt) = self.begin(recent)? else {
            return Ok(false);
        };
        let reply = generator.generate(&prompt).await;
        Ok(self.finish(reply))
    }
}

/// The reply is kept verbatim unless it is blank.
fn usable_text(reply: String) -> Result<String> {
    if reply.trim().is_empty() {
        bail!("The model returned an empty summary");
    }
    Ok(reply)
}

fn insight_prompt(data: &str) -> Prompt {
    Prompt::text(format!(
        "Analyze these recent financial transactions and give the user a friendly summary \
         followed by 2-3 specific, actionable tips as bullet points. Focus on spending patterns, \
         the biggest expenses, or savings opportunities. Keep it under 100 words. \
         Use Indian Rupees ({CURRENCY_SYMBOL}) for currency.\n\n\
         Transactions: {data}"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::TestGenerator;
    use crate::model::{Amount, Category, TransactionId, TransactionType};
    use chrono::NaiveDate;

    fn transactions(n: u64) -> Vec<Transaction> {
        (1..=n)
            .map(|i| {
                Transaction::new(
                    TransactionId::new(i),
                    format!("Item {i}"),
                    Amount::new(i as f64).unwrap(),
                    TransactionType::Expense,
                    Category::Shopping,
                    NaiveDate::from_ymd_opt(2023, 11, 1).unwrap(),
                )
            })
            .collect()
    }

    #[test]
    fn test_prompt_samples_first_fifteen() {
        let mut insights = Insights::new();
        let prompt = insights.begin(&transactions(20)).unwrap().unwrap();
        assert!(prompt.text.contains("\"Item 15\""));
        assert!(!prompt.text.contains("\"Item 16\""));
        assert!(prompt.text.contains("under 100 words"));
        assert!(prompt.text.contains(CURRENCY_SYMBOL));
        assert!(insights.is_loading());
    }

    #[test]
    fn test_begin_refused_while_loading() {
        let mut insights = Insights::new();
        assert!(insights.begin(&[]).unwrap().is_some());
        assert!(insights.begin(&[]).unwrap().is_none());
        insights.finish(Ok("done".into()));
        assert!(insights.begin(&[]).unwrap().is_some());
    }

    #[tokio::test]
    async fn test_refresh_stores_text() {
        let generator = TestGenerator::replying("Spend less on rent.\n- Cook at home");
        let mut insights = Insights::new();
        assert!(insights
            .refresh(&generator, &transactions(3))
            .await
            .unwrap());
        assert_eq!(insights.text(), Some("Spend less on rent.\n- Cook at home"));
        assert!(!insights.is_loading());
    }

    #[tokio::test]
    async fn test_failure_keeps_previous_text() {
        let generator = TestGenerator::new([
            Ok("First summary.".to_string()),
            Err("quota exceeded".to_string()),
            Ok("   ".to_string()),
        ]);
        let mut insights = Insights::new();
        let data = transactions(2);
        assert!(insights.refresh(&generator, &data).await.unwrap());
        assert!(!insights.refresh(&generator, &data).await.unwrap());
        assert!(!insights.refresh(&generator, &data).await.unwrap());
        assert_eq!(insights.text(), Some("First summary."));
        assert!(!insights.is_loading());
    }
}
