//! Access to a text-generation model, and the two features built on it: turning free text into
//! a transaction draft (`extract`) and summarizing recent spending (`insight`).
//!
//! The model sits behind the `Generator` trait so that the rest of the program, and its tests,
//! can run against `TestGenerator` instead of the Gemini API.

mod extract;
mod gemini;
mod insight;
mod test_generator;

pub use extract::{decode_reply, Extraction, EXTRACTION_FAILED};
pub use gemini::Gemini;
pub use insight::{Insights, INSIGHT_SAMPLE};
pub use test_generator::TestGenerator;

use crate::{Config, Result};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Formatter};
use std::str::FromStr;

/// Which `Generator` implementation to use.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Call the Gemini API.
    #[default]
    Gemini,
    /// Answer from `TestGenerator` without touching the network.
    Testing,
}

serde_plain::derive_display_from_serialize!(Mode);
serde_plain::derive_fromstr_from_deserialize!(Mode);

/// What kind of reply a prompt asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    /// A bare JSON object, without Markdown formatting.
    Json,
    /// Free text.
    Text,
}

/// A single request to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub text: String,
    pub format: ResponseFormat,
}

impl Prompt {
    pub fn json(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            format: ResponseFormat::Json,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            format: ResponseFormat::Text,
        }
    }
}

/// Something that turns a prompt into model output text.
#[async_trait::async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, prompt: &Prompt) -> Result<String>;
}

/// The credential for the Gemini API. Its `Debug` output never shows the key.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub(crate) fn expose(&self) -> &str {
        &self.0
    }
}

impl Debug for ApiKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "ApiKey(****)")
    }
}

impl FromStr for ApiKey {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(s.trim().to_string()))
    }
}

/// Builds the `Generator` for `mode`.
///
/// # Errors
/// - Returns an error in `Mode::Gemini` when no API key was provided or the HTTP client cannot be
///   built.
pub fn generator(
    config: &Config,
    api_key: Option<&ApiKey>,
    mode: Mode,
) -> Result<Box<dyn Generator>> {
    match mode {
        Mode::Gemini => {
            let key = api_key
                .filter(|k| !k.expose().is_empty())
                .context("No Gemini API key was provided, set GEMINI_API_KEY or pass --api-key")?;
            Ok(Box::new(Gemini::new(
                config.endpoint().clone(),
                config.model(),
                key.clone(),
            )?))
        }
        Mode::Testing => Ok(Box::new(TestGenerator::default())),
    }
}

/// A `Generator` that always fails with the reason the real one could not be built. Lets the
/// interactive shell start without an API key and report the problem through the usual failure
/// paths.
#[derive(Debug, Clone)]
pub struct Unavailable {
    reason: String,
}

impl Unavailable {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait::async_trait]
impl Generator for Unavailable {
    async fn generate(&self, _prompt: &Prompt) -> Result<String> {
        anyhow::bail!("The model is unavailable: {}", self.reason)
    }
}
