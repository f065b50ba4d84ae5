//! The transaction store: an ordered, newest-first collection of transactions that is written in
//! full to a `Slot` after every mutation.

use crate::backup::{Backup, UNREADABLE_SNAPSHOT};
use crate::model::{Amount, Category, Transaction, TransactionId, TransactionType};
use crate::{utils, Result};
use anyhow::{anyhow, Context};
use chrono::{NaiveDate, Utc};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// A durable key-value slot that holds the serialized transaction collection.
#[async_trait::async_trait]
pub trait Slot: Send + Sync {
    /// Returns the stored contents, or `None` if nothing has been stored yet.
    async fn read(&self) -> Result<Option<String>>;

    /// Replaces the stored contents.
    async fn write(&self, contents: &str) -> Result<()>;

    /// Called with contents that could not be parsed, before anything can overwrite them.
    async fn preserve_unreadable(&self, _contents: &str) -> Result<()> {
        Ok(())
    }
}

/// A `Slot` backed by a JSON file on disk.
#[derive(Debug, Clone)]
pub struct FileSlot {
    path: PathBuf,
    backup: Option<Backup>,
}

impl FileSlot {
    /// Creates a slot at `path`. When `backup` is given, unreadable snapshots are copied into the
    /// backups directory.
    pub fn new(path: impl Into<PathBuf>, backup: Option<Backup>) -> Self {
        Self {
            path: path.into(),
            backup,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait::async_trait]
impl Slot for FileSlot {
    async fn read(&self) -> Result<Option<String>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e)
                .with_context(|| format!("Failed to read snapshot at {}", self.path.display())),
        }
    }

    async fn write(&self, contents: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            utils::make_dir(parent).await?;
        }
        utils::write_replace(&self.path, contents).await
    }

    async fn preserve_unreadable(&self, contents: &str) -> Result<()> {
        if let Some(backup) = &self.backup {
            let path = backup.save_raw(UNREADABLE_SNAPSHOT, contents).await?;
            info!("Saved a copy of the unreadable snapshot to {}", path.display());
        }
        Ok(())
    }
}

/// An in-memory `Slot`. Clones share the same contents, which makes it possible to simulate a
/// restart by loading a second `Store` from a clone.
#[derive(Debug, Clone, Default)]
pub struct MemorySlot {
    contents: Arc<Mutex<Option<String>>>,
}

impl MemorySlot {
    pub fn new(contents: Option<String>) -> Self {
        Self {
            contents: Arc::new(Mutex::new(contents)),
        }
    }

    /// The currently stored contents.
    pub fn contents(&self) -> Option<String> {
        self.contents
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait::async_trait]
impl Slot for MemorySlot {
    async fn read(&self) -> Result<Option<String>> {
        let guard = self
            .contents
            .lock()
            .map_err(|_| anyhow!("The in-memory slot lock is poisoned"))?;
        Ok(guard.clone())
    }

    async fn write(&self, contents: &str) -> Result<()> {
        let mut guard = self
            .contents
            .lock()
            .map_err(|_| anyhow!("The in-memory slot lock is poisoned"))?;
        *guard = Some(contents.to_string());
        Ok(())
    }
}

/// The ordered collection of transactions, newest first by insertion.
pub struct Store {
    slot: Box<dyn Slot>,
    transactions: Vec<Transaction>,
    /// The largest id this store has seen or handed out.
    last_id: u64,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("transactions", &self.transactions)
            .field("last_id", &self.last_id)
            .finish()
    }
}

impl Store {
    /// Restores the store from `slot`. When the slot is empty, unreadable, or holds something
    /// that is not a transaction list, the seed transactions are used instead. This never fails.
    pub async fn load(slot: Box<dyn Slot>) -> Self {
        let transactions = match slot.read().await {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<Transaction>>(&raw) {
                Ok(transactions) => {
                    debug!("Loaded {} transactions", transactions.len());
                    transactions
                }
                Err(e) => {
                    warn!("Failed to parse the saved transactions, using sample data: {e}");
                    if let Err(e) = slot.preserve_unreadable(&raw).await {
                        warn!("Unable to keep a copy of the unreadable snapshot: {e:#}");
                    }
                    seed()
                }
            },
            Ok(None) => {
                debug!("No saved transactions found, using sample data");
                seed()
            }
            Err(e) => {
                warn!("Failed to read the saved transactions, using sample data: {e:#}");
                seed()
            }
        };
        let last_id = transactions
            .iter()
            .map(|t| t.id().value())
            .max()
            .unwrap_or(0);
        Self {
            slot,
            transactions,
            last_id,
        }
    }

    /// The transactions in store order.
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// An owned copy of the transactions in store order.
    pub fn snapshot(&self) -> Vec<Transaction> {
        self.transactions.clone()
    }

    /// The `n` most recently added transactions.
    pub fn recent(&self, n: usize) -> &[Transaction] {
        &self.transactions[..n.min(self.transactions.len())]
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn get(&self, id: TransactionId) -> Option<&Transaction> {
        self.transactions.iter().find(|t| t.id() == id)
    }

    /// Hands out an id that is larger than any id this store has seen. Ids track the clock in
    /// milliseconds but never repeat, even when called many times within one millisecond.
    pub fn next_id(&mut self) -> TransactionId {
        let now = u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0);
        let id = now.max(self.last_id.saturating_add(1));
        self.last_id = id;
        TransactionId::new(id)
    }

    /// Puts `transaction` at the front of the collection and persists.
    pub async fn add(&mut self, transaction: Transaction) -> Result<()> {
        self.last_id = self.last_id.max(transaction.id().value());
        debug!("Adding transaction {}", transaction.id());
        self.transactions.insert(0, transaction);
        self.persist().await
    }

    /// Removes the transaction with `id` and persists. Returns `false` if there was no such
    /// transaction, which is not an error.
    pub async fn remove(&mut self, id: TransactionId) -> Result<bool> {
        let before = self.transactions.len();
        self.transactions.retain(|t| t.id() != id);
        let removed = self.transactions.len() != before;
        if removed {
            debug!("Removed transaction {id}");
        } else {
            debug!("No transaction with id {id} to remove");
        }
        self.persist().await?;
        Ok(removed)
    }

    /// Writes the full collection to the slot.
    async fn persist(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.transactions)
            .context("Unable to serialize transactions")?;
        self.slot
            .write(&json)
            .await
            .context("Unable to save transactions")
    }
}

/// The sample transactions shown to first-time users.
pub fn seed() -> Vec<Transaction> {
    vec![
        seed_transaction(
            1,
            "Freelance Project",
            15000.0,
            TransactionType::Income,
            Category::Work,
            (2023, 10, 25),
        ),
        seed_transaction(
            2,
            "Grocery Run",
            2450.0,
            TransactionType::Expense,
            Category::Food,
            (2023, 10, 26),
        ),
        seed_transaction(
            3,
            "House Rent",
            18000.0,
            TransactionType::Expense,
            Category::Housing,
            (2023, 11, 1),
        ),
    ]
}

fn seed_transaction(
    id: u64,
    description: &str,
    amount: f64,
    r#type: TransactionType,
    category: Category,
    (y, m, d): (i32, u32, u32),
) -> Transaction {
    Transaction::new(
        TransactionId::new(id),
        description,
        Amount::new(amount).unwrap_or(Amount::ZERO),
        r#type,
        category,
        NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn coffee(id: u64) -> Transaction {
        Transaction::new(
            TransactionId::new(id),
            "Coffee",
            Amount::new(120.0).unwrap(),
            TransactionType::Expense,
            Category::Food,
            NaiveDate::from_ymd_opt(2023, 11, 3).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_load_empty_slot_uses_seed() {
        let store = Store::load(Box::new(MemorySlot::default())).await;
        assert_eq!(store.transactions(), seed().as_slice());
        assert_eq!(store.len(), 3);
    }

    #[tokio::test]
    async fn test_load_garbage_uses_seed() {
        let slot = MemorySlot::new(Some("{ definitely not a list".to_string()));
        let store = Store::load(Box::new(slot.clone())).await;
        assert_eq!(store.transactions(), seed().as_slice());
        // Nothing is written until the first mutation.
        assert_eq!(slot.contents().unwrap(), "{ definitely not a list");
    }

    #[tokio::test]
    async fn test_load_empty_list_is_respected() {
        let slot = MemorySlot::new(Some("[]".to_string()));
        let store = Store::load(Box::new(slot)).await;
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_add_prepends_and_persists() {
        let slot = MemorySlot::default();
        let mut store = Store::load(Box::new(slot.clone())).await;
        store.add(coffee(10)).await.unwrap();
        assert_eq!(store.transactions()[0].id(), TransactionId::new(10));
        assert_eq!(store.len(), 4);

        let saved: Vec<Transaction> = serde_json::from_str(&slot.contents().unwrap()).unwrap();
        assert_eq!(saved, store.snapshot());
    }

    #[tokio::test]
    async fn test_add_then_remove_restores_content() {
        let mut store = Store::load(Box::new(MemorySlot::default())).await;
        let before = store.snapshot();
        let id = store.next_id();
        let mut t = coffee(0);
        t.id = id;
        store.add(t).await.unwrap();
        assert!(store.remove(id).await.unwrap());
        assert_eq!(store.snapshot(), before);
    }

    #[tokio::test]
    async fn test_remove_missing_is_noop() {
        let slot = MemorySlot::default();
        let mut store = Store::load(Box::new(slot.clone())).await;
        let removed = store.remove(TransactionId::new(999)).await.unwrap();
        assert!(!removed);
        assert_eq!(store.len(), 3);
        // Remove still rewrites the snapshot.
        assert!(slot.contents().is_some());
    }

    #[tokio::test]
    async fn test_reload_round_trip() {
        let slot = MemorySlot::default();
        let mut store = Store::load(Box::new(slot.clone())).await;
        store.add(coffee(100)).await.unwrap();
        store.add(coffee(101)).await.unwrap();
        store.remove(TransactionId::new(2)).await.unwrap();

        let restarted = Store::load(Box::new(slot)).await;
        assert_eq!(restarted.snapshot(), store.snapshot());
    }

    #[tokio::test]
    async fn test_next_id_is_unique_and_increasing() {
        let mut store = Store::load(Box::new(MemorySlot::default())).await;
        let mut previous = store.next_id();
        for _ in 0..1000 {
            let id = store.next_id();
            assert!(id > previous);
            previous = id;
        }
    }

    #[tokio::test]
    async fn test_next_id_exceeds_loaded_ids() {
        let far_future = u64::MAX / 2;
        let json = serde_json::to_string(&vec![coffee(far_future)]).unwrap();
        let mut store = Store::load(Box::new(MemorySlot::new(Some(json)))).await;
        assert_eq!(store.next_id(), TransactionId::new(far_future + 1));
    }

    #[tokio::test]
    async fn test_recent() {
        let mut store = Store::load(Box::new(MemorySlot::new(Some("[]".into())))).await;
        for id in 1..=20 {
            store.add(coffee(id)).await.unwrap();
        }
        let recent = store.recent(15);
        assert_eq!(recent.len(), 15);
        assert_eq!(recent[0].id(), TransactionId::new(20));
        assert_eq!(store.recent(50).len(), 20);
    }

    #[tokio::test]
    async fn test_file_slot_missing_file_reads_none() {
        let dir = TempDir::new().unwrap();
        let slot = FileSlot::new(dir.path().join("transactions.json"), None);
        assert!(slot.read().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_file_slot_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("transactions.json");
        let mut store = Store::load(Box::new(FileSlot::new(&path, None))).await;
        store.add(coffee(50)).await.unwrap();
        assert!(path.is_file());

        let restarted = Store::load(Box::new(FileSlot::new(&path, None))).await;
        assert_eq!(restarted.snapshot(), store.snapshot());
        assert_eq!(restarted.get(TransactionId::new(50)), Some(&coffee(50)));
    }

    #[tokio::test]
    async fn test_file_slot_preserves_unreadable_snapshot() {
        let dir = TempDir::new().unwrap();
        let config = crate::Config::create(dir.path()).await.unwrap();
        let path = config.snapshot_path();
        utils::write(&path, "oops").await.unwrap();

        let store = Store::load(Box::new(FileSlot::new(&path, Some(config.backup())))).await;
        assert_eq!(store.len(), 3);

        let mut entries = utils::read_dir(config.backups()).await.unwrap();
        let entry = entries.next_entry().await.unwrap().unwrap();
        assert!(entry
            .file_name()
            .to_string_lossy()
            .starts_with(UNREADABLE_SNAPSHOT));
        assert_eq!(utils::read(&entry.path()).await.unwrap(), "oops");
    }
}
