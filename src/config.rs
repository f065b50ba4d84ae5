//! Configuration file handling for the budget tracker.
//!
//! The configuration file is stored at `$BUDGET_HOME/config.json` and contains settings for the
//! Gemini model used by the AI features, backup settings, and the location of the transaction
//! snapshot.

use crate::backup::Backup;
use crate::{utils, Result};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

const APP_NAME: &str = "budget-tracker";
const CONFIG_VERSION: u8 = 1;
const BACKUP_COPIES: u32 = 5;
const BACKUPS: &str = ".backups";
const CONFIG_JSON: &str = "config.json";
const TRANSACTIONS_JSON: &str = "transactions.json";
const DEFAULT_MODEL: &str = "gemini-2.5-flash-preview-09-2025";
const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

/// The `Config` object represents the configuration of the app. You instantiate it by providing
/// the path to `$BUDGET_HOME` and from there it loads `$BUDGET_HOME/config.json`. It provides
/// paths to other items that are either configurable or are expected in a certain location within
/// the home directory.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    backups: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
    endpoint: Url,
}

impl Config {
    /// Creates the data directory, its backups subdirectory and an initial `config.json` with
    /// default settings.
    ///
    /// # Errors
    /// - Returns an error if the directory already holds a `config.json`.
    /// - Returns an error if any file operations fail.
    pub async fn create(dir: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = dir.into();
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the budget home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;

        let config_path = root.join(CONFIG_JSON);
        if config_path.is_file() {
            bail!(
                "A config file already exists at '{}'",
                config_path.display()
            )
        }

        let backups = root.join(BACKUPS);
        utils::make_dir(&backups).await?;

        let config_file = ConfigFile::default();
        config_file.save(&config_path).await?;
        let endpoint = parse_endpoint(&config_file.endpoint)?;

        Ok(Self {
            root,
            backups,
            config_path,
            config_file,
            endpoint,
        })
    }

    /// This will
    /// - validate that `budget_home` exists and that the config file exists
    /// - load and validate the config file
    /// - create the backups directory if it has gone missing
    /// - return the loaded configuration object
    pub async fn load(budget_home: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = budget_home.into();
        let root = utils::canonicalize(&maybe_relative).await.with_context(|| {
            format!(
                "The budget home directory is missing, run 'budget init --home {}' first",
                maybe_relative.display()
            )
        })?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!(
                "The config file is missing '{}', run 'budget init' first",
                config_path.display()
            )
        }
        let config_file = ConfigFile::load(&config_path).await?;
        let endpoint = parse_endpoint(&config_file.endpoint)?;

        let backups = root.join(BACKUPS);
        if !backups.is_dir() {
            utils::make_dir(&backups).await?;
        }

        Ok(Self {
            root,
            backups,
            config_path,
            config_file,
            endpoint,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn backups(&self) -> &Path {
        &self.backups
    }

    pub fn backup_copies(&self) -> u32 {
        self.config_file.backup_copies
    }

    /// The Gemini model name, e.g. `gemini-2.5-flash-preview-09-2025`.
    pub fn model(&self) -> &str {
        &self.config_file.model
    }

    /// The base URL of the Gemini API, e.g. `https://generativelanguage.googleapis.com/v1beta`.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Returns the stored `snapshot_path` if it is absolute, otherwise resolves it against the
    /// home directory. Defaults to `$BUDGET_HOME/transactions.json`.
    pub fn snapshot_path(&self) -> PathBuf {
        let p = self.config_file.snapshot_path();
        if p.is_absolute() {
            return p;
        }
        self.root.join(p)
    }

    /// Creates a new `Backup` instance for managing backup files.
    pub fn backup(&self) -> Backup {
        Backup::new(self)
    }
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "budget-tracker",
///   "config_version": 1,
///   "model": "gemini-2.5-flash-preview-09-2025",
///   "endpoint": "https://generativelanguage.googleapis.com/v1beta",
///   "backup_copies": 5,
///   "snapshot_path": "transactions.json"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "budget-tracker"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    /// The Gemini model used for extraction and insights
    #[serde(default = "default_model")]
    model: String,

    /// Base URL of the Gemini API
    #[serde(default = "default_endpoint")]
    endpoint: String,

    /// Number of backup copies to keep
    #[serde(default = "default_backup_copies")]
    backup_copies: u32,

    /// Path to the transaction snapshot (optional, relative to the home directory or absolute)
    /// Defaults to $BUDGET_HOME/transactions.json if not specified
    #[serde(skip_serializing_if = "Option::is_none")]
    snapshot_path: Option<PathBuf>,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_backup_copies() -> u32 {
    BACKUP_COPIES
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            model: default_model(),
            endpoint: default_endpoint(),
            backup_copies: BACKUP_COPIES,
            snapshot_path: None,
        }
    }
}

impl ConfigFile {
    /// Loads a ConfigFile from the specified path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or if it belongs to another app.
    async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config: ConfigFile = utils::deserialize(path).await?;

        anyhow::ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );
        anyhow::ensure!(
            config.config_version == CONFIG_VERSION,
            "Unsupported config_version {} in {}, expected {}",
            config.config_version,
            path.display(),
            CONFIG_VERSION
        );

        Ok(config)
    }

    /// Saves the ConfigFile to the specified path.
    async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let p = path.as_ref();
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(p, data)
            .await
            .context("Unable to write config file")
    }

    fn snapshot_path(&self) -> PathBuf {
        self.snapshot_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(TRANSACTIONS_JSON))
    }
}

/// Parses the configured endpoint. Only `http` and `https` URLs are accepted.
fn parse_endpoint(endpoint: &str) -> Result<Url> {
    let url = Url::parse(endpoint)
        .with_context(|| format!("Invalid endpoint URL in config file: '{endpoint}'"))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => bail!("Unsupported endpoint scheme '{other}' in '{endpoint}'"),
    }
}
