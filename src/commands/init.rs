use crate::commands::Out;
use crate::{Config, Result};
use anyhow::Context;
use std::path::Path;

/// Creates the data directory, its backups subdirectory and an initial `config.json` file with
/// default settings.
///
/// The transaction snapshot is not created here. Until the first transaction is added or deleted,
/// the sample transactions are shown.
///
/// # Arguments
/// - `budget_home` - The directory that will be the root of data directory, e.g.
///   `$HOME/.budget-tracker`
///
/// # Errors
/// - Returns an error if the directory is already initialized or any file operations fail.
pub async fn init(budget_home: &Path) -> Result<Out<()>> {
    let config = Config::create(budget_home)
        .await
        .context("Unable to create the data directory and configs")?;
    Ok(format!(
        "Successfully created the budget directory and config at {}",
        config.root().display()
    )
    .into())
}
