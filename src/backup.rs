//! Backup management for snapshot files that could not be read.

use crate::{utils, Config, Result};
use anyhow::Context;
use std::path::PathBuf;

/// Prefix for copies of transaction snapshots that failed to parse.
pub const UNREADABLE_SNAPSHOT: &str = "transactions-unreadable";

/// Manages backup file creation and rotation.
///
/// The `Backup` struct is immutable and owns copies of the paths and settings it needs.
/// Create a new instance via `Config::backup()` or `Backup::new()`.
#[derive(Debug, Clone)]
pub struct Backup {
    backups_dir: PathBuf,
    backup_copies: u32,
}

impl Backup {
    /// Creates a new `Backup` instance from a `Config`.
    pub fn new(config: &Config) -> Self {
        Self {
            backups_dir: config.backups().to_path_buf(),
            backup_copies: config.backup_copies(),
        }
    }

    /// Saves `contents` verbatim as a backup file.
    ///
    /// The filename format is `{prefix}.YYYY-MM-DD-NNN.json` where NNN is a sequence number.
    /// Automatically rotates old backups, keeping only `backup_copies` files.
    ///
    /// Returns the path to the created backup file.
    pub async fn save_raw(&self, prefix: &str, contents: &str) -> Result<PathBuf> {
        let date = utils::today().format("%Y-%m-%d").to_string();
        let seq = self.next_sequence_number(prefix, &date).await?;
        let filename = format!("{prefix}.{date}-{seq:03}.json");
        let path = self.backups_dir.join(&filename);

        utils::write(&path, contents).await?;
        self.rotate(prefix).await?;

        Ok(path)
    }

    /// Scans the backups directory for existing files with the given prefix and date,
    /// and returns the next sequence number.
    async fn next_sequence_number(&self, prefix: &str, date: &str) -> Result<u32> {
        let mut max_seq: u32 = 0;

        let mut dir = utils::read_dir(&self.backups_dir).await?;
        while let Some(entry) = dir
            .next_entry()
            .await
            .context("Failed to read directory entry")?
        {
            let file_name = entry.file_name();
            let name = file_name.to_string_lossy();
            if let Some(seq) = parse_sequence_number(&name, prefix, date) {
                max_seq = max_seq.max(seq);
            }
        }

        Ok(max_seq + 1)
    }

    /// Rotates old backup files, keeping only `backup_copies` files with the given prefix.
    async fn rotate(&self, prefix: &str) -> Result<()> {
        let mut files: Vec<(PathBuf, String)> = Vec::new();

        let mut dir = utils::read_dir(&self.backups_dir).await?;
        while let Some(entry) = dir
            .next_entry()
            .await
            .context("Failed to read directory entry")?
        {
            let name = entry.file_name().to_string_lossy().to_string();
            if is_backup_file(&name, prefix) {
                files.push((entry.path(), name));
            }
        }

        // The name format makes lexical order chronological.
        files.sort_by(|a, b| a.1.cmp(&b.1));

        let to_delete = files.len().saturating_sub(self.backup_copies as usize);
        for (path, _) in files.into_iter().take(to_delete) {
            utils::remove(&path).await?;
        }

        Ok(())
    }
}

/// Parses the sequence number from a backup filename of the form `{prefix}.{date}-{NNN}.json`.
/// Returns None if the filename doesn't match.
fn parse_sequence_number(filename: &str, prefix: &str, date: &str) -> Option<u32> {
    let expected_start = format!("{prefix}.{date}-");
    filename
        .strip_prefix(&expected_start)?
        .strip_suffix(".json")?
        .parse()
        .ok()
}

fn is_backup_file(filename: &str, prefix: &str) -> bool {
    filename.starts_with(&format!("{prefix}.")) && filename.ends_with(".json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_sequence_number() {
        assert_eq!(
            parse_sequence_number(
                "transactions-unreadable.2025-12-14-001.json",
                UNREADABLE_SNAPSHOT,
                "2025-12-14"
            ),
            Some(1)
        );
        assert_eq!(
            parse_sequence_number(
                "transactions-unreadable.2025-12-14-042.json",
                UNREADABLE_SNAPSHOT,
                "2025-12-14"
            ),
            Some(42)
        );
        // Wrong date
        assert_eq!(
            parse_sequence_number(
                "transactions-unreadable.2025-12-13-001.json",
                UNREADABLE_SNAPSHOT,
                "2025-12-14"
            ),
            None
        );
        // Wrong prefix
        assert_eq!(
            parse_sequence_number("other.2025-12-14-001.json", UNREADABLE_SNAPSHOT, "2025-12-14"),
            None
        );
    }

    #[test]
    fn test_is_backup_file() {
        assert!(is_backup_file(
            "transactions-unreadable.2025-12-14-001.json",
            UNREADABLE_SNAPSHOT
        ));
        assert!(!is_backup_file(
            "transactions-unreadable.2025-12-14-001.txt",
            UNREADABLE_SNAPSHOT
        ));
        assert!(!is_backup_file("config.json", UNREADABLE_SNAPSHOT));
    }

    #[tokio::test]
    async fn test_save_raw_rotates() {
        let dir = TempDir::new().unwrap();
        let config = Config::create(dir.path()).await.unwrap();
        let backup = config.backup();

        let mut paths = Vec::new();
        for i in 0..7 {
            paths.push(
                backup
                    .save_raw(UNREADABLE_SNAPSHOT, &format!("garbage {i}"))
                    .await
                    .unwrap(),
            );
        }

        let mut remaining = Vec::new();
        let mut entries = utils::read_dir(config.backups()).await.unwrap();
        while let Some(entry) = entries.next_entry().await.unwrap() {
            remaining.push(entry.path());
        }
        assert_eq!(remaining.len(), 5);
        assert!(!paths[0].exists());
        assert!(!paths[1].exists());
        assert_eq!(utils::read(&paths[6]).await.unwrap(), "garbage 6");
    }
}
