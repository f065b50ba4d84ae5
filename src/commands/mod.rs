//! Command handlers for the budget CLI.
//!
//! This module contains implementations for all CLI subcommands.

mod add;
mod delete;
mod init;
mod insights;
mod list;
mod shell;
mod smart_add;

use crate::store::{FileSlot, Store};
use crate::{Config, Result};
use anyhow::Context;
use serde::Serialize;
use std::fmt::Debug;
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::debug;

pub use add::add;
pub use delete::delete;
pub use init::init;
pub use insights::insights;
pub use list::{list, summary};
pub use shell::{shell, ShellCommand};
pub use smart_add::smart_add;

/// The output type for a command. This allows the command to return a consistent message and,
/// optionally, structured data.
#[derive(Debug, Clone, Serialize)]
pub struct Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// A message that can be printed to the user regarding the outcome of the command execution.
    message: String,

    /// Any structured data that needs to be output from the call.
    structure: Option<T>,
}

impl<T, S> From<S> for Out<T>
where
    T: Debug + Clone + Serialize,
    S: Into<String>,
{
    fn from(value: S) -> Self {
        Out::new_message(value)
    }
}

impl<T> Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// Create a new `Out` object that has `Some(structure)`.
    pub fn new<S>(message: S, structure: T) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: Some(structure),
        }
    }

    /// Create a new `Out` object that has `None` for `structure`.
    pub fn new_message<S>(message: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: None,
        }
    }

    /// Get the `message`.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the structured data stored in `structure`.
    pub fn structure(&self) -> Option<&T> {
        self.structure.as_ref()
    }

    /// Print the message to stdout and the structured data (if it exists) as JSON to `debug!`.
    pub fn print(&self) {
        println!("{}", self.message.trim_end());
        if let Some(structure) = self.structure() {
            if let Ok(json) = serde_json::to_string_pretty(structure) {
                debug!("Command output:\n\n{json}\n\n");
            }
        }
    }
}

/// Restores the store from the snapshot file named by `config`.
async fn open_store(config: &Config) -> Store {
    let slot = FileSlot::new(config.snapshot_path(), Some(config.backup()));
    Store::load(Box::new(slot)).await
}

/// Writes `question` to `out` and reads one line of `input`. Only an answer starting with `y`
/// (any case) counts as yes; end of input counts as no.
async fn confirm<R, W>(question: &str, input: &mut R, out: &mut W) -> Result<bool>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    write!(out, "{question} [y/N] ")?;
    out.flush()?;
    let mut answer = String::new();
    input
        .read_line(&mut answer)
        .await
        .context("Unable to read the answer")?;
    Ok(answer.trim().to_ascii_lowercase().starts_with('y'))
}
