//! Implements the `Generator` trait with canned replies for testing purposes.
//!
//! Note: this is compiled even in the "production" version of this app so that we can run the whole
//! app, top-to-bottom, without calling Gemini.

use crate::ai::{Generator, Prompt, ResponseFormat};
use crate::Result;
use anyhow::anyhow;
use std::collections::VecDeque;
use std::sync::Mutex;

/// The reply used for JSON prompts when no reply has been queued.
pub(crate) const DEFAULT_EXTRACTION: &str = r#"{"description":"Pizza","amount":450,"type":"expense","category":"Food","date":"2023-11-02"}"#;

/// The reply used for text prompts when no reply has been queued.
pub(crate) const DEFAULT_INSIGHT: &str = "Housing is your largest expense by far. \
Consider setting a monthly cap on dining out and moving a fixed share of income to savings.";

/// A `Generator` that answers from a queue of canned replies and remembers every prompt it was
/// given.
#[derive(Debug, Default)]
pub struct TestGenerator {
    replies: Mutex<VecDeque<std::result::Result<String, String>>>,
    prompts: Mutex<Vec<Prompt>>,
}

impl TestGenerator {
    /// Creates a generator that returns `replies` in order. `Err` entries become errors.
    pub fn new(replies: impl IntoIterator<Item = std::result::Result<String, String>>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Creates a generator whose only reply is `reply`.
    pub fn replying(reply: impl Into<String>) -> Self {
        Self::new([Ok(reply.into())])
    }

    /// Creates a generator whose only reply is an error with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self::new([Err(message.into())])
    }

    /// Every prompt received so far.
    pub fn prompts(&self) -> Vec<Prompt> {
        self.prompts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait::async_trait]
impl Generator for TestGenerator {
    async fn generate(&self, prompt: &Prompt) -> Result<String> {
        self.prompts
            .lock()
            .map_err(|_| anyhow!("The test generator lock is poisoned"))?
            .push(prompt.clone());
        let queued = self
            .replies
            .lock()
            .map_err(|_| anyhow!("The test generator lock is poisoned"))?
            .pop_front();
        match queued {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(message)) => Err(anyhow!(message)),
            None => Ok(match prompt.format {
                ResponseFormat::Json => DEFAULT_EXTRACTION.to_string(),
                ResponseFormat::Text => DEFAULT_INSIGHT.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_queued_then_default_replies() {
        let generator = TestGenerator::new([Ok("first".to_string()), Err("boom".to_string())]);
        assert_eq!(
            generator.generate(&Prompt::text("a")).await.unwrap(),
            "first"
        );
        let err = generator.generate(&Prompt::text("b")).await.unwrap_err();
        assert_eq!(err.to_string(), "boom");
        assert_eq!(
            generator.generate(&Prompt::json("c")).await.unwrap(),
            DEFAULT_EXTRACTION
        );
        assert_eq!(
            generator.generate(&Prompt::text("d")).await.unwrap(),
            DEFAULT_INSIGHT
        );
        assert_eq!(generator.prompts().len(), 4);
        assert_eq!(generator.prompts()[2], Prompt::json("c"));
    }
}
