use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use contracts::address::addresses_match;
use contracts::ProductRecord;
use rusqlite::{params, Connection};

#[derive(Debug)]
pub enum CacheError {
    Sqlite(rusqlite::Error),
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "pending cache sqlite error: {err}"),
        }
    }
}

impl std::error::Error for CacheError {}

impl From<rusqlite::Error> for CacheError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

#[derive(Debug)]
pub struct SqlitePendingStore {
    conn: Connection,
}

impl SqlitePendingStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CacheError> {
        let conn = Connection::open(path)?;
        let mut store = Self { conn };
        store.configure()?;
        store.migrate()?;
        Ok(store)
    }

    fn configure(&mut self) -> Result<(), CacheError> {
        self.conn.pragma_update(None, "journal_mode", "WAL")?;
        Ok(())
    }

    fn migrate(&mut self) -> Result<(), CacheError> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS pending_transfers (
                product_id INTEGER PRIMARY KEY,
                new_owner TEXT NOT NULL,
                recorded_at TEXT NOT NULL
            );
            ",
        )?;
        Ok(())
    }

    fn load_all(&self) -> Result<BTreeMap<u64, String>, CacheError> {
        let mut stmt = self
            .conn
            .prepare("SELECT product_id, new_owner FROM pending_transfers")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut annotations = BTreeMap::new();
        for row in rows {
            let (product_id, new_owner) = row?;
            annotations.insert(product_id as u64, new_owner);
        }
        Ok(annotations)
    }

    fn upsert(&mut self, product_id: u64, new_owner: &str) -> Result<(), CacheError> {
        self.conn.execute(
            "INSERT INTO pending_transfers (product_id, new_owner, recorded_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(product_id) DO UPDATE SET
                new_owner = excluded.new_owner,
                recorded_at = excluded.recorded_at",
            params![
                i64::try_from(product_id).unwrap_or(i64::MAX),
                new_owner,
                unix_stamp(),
            ],
        )?;
        Ok(())
    }

    fn delete(&mut self, product_id: u64) -> Result<(), CacheError> {
        self.conn.execute(
            "DELETE FROM pending_transfers WHERE product_id = ?1",
            params![i64::try_from(product_id).unwrap_or(i64::MAX)],
        )?;
        Ok(())
    }
}

/// Advisory map of product id to proposed new owner. Purely a rendering aid:
/// recorded after a successful transfer receipt, cleared on a successful
/// cancel, and reconciled against a fresh ledger read on each list load.
/// Never authoritative over ledger state.
#[derive(Debug)]
pub struct PendingTransferCache {
    annotations: BTreeMap<u64, String>,
    store: Option<SqlitePendingStore>,
}

impl PendingTransferCache {
    pub fn in_memory() -> Self {
        Self {
            annotations: BTreeMap::new(),
            store: None,
        }
    }

    /// Opens the durable store and loads previously recorded annotations so
    /// the list view renders consistently across restarts.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CacheError> {
        let store = SqlitePendingStore::open(path)?;
        let annotations = store.load_all()?;
        Ok(Self {
            annotations,
            store: Some(store),
        })
    }

    /// Single writer; persisted synchronously on every mutation.
    pub fn record(&mut self, product_id: u64, new_owner: &str) -> Result<(), CacheError> {
        self.annotations.insert(product_id, new_owner.to_string());
        if let Some(store) = self.store.as_mut() {
            store.upsert(product_id, new_owner)?;
        }
        Ok(())
    }

    pub fn clear(&mut self, product_id: u64) -> Result<(), CacheError> {
        self.annotations.remove(&product_id);
        if let Some(store) = self.store.as_mut() {
            store.delete(product_id)?;
        }
        Ok(())
    }

    pub fn is_pending(&self, product_id: u64) -> bool {
        self.annotations.contains_key(&product_id)
    }

    pub fn proposed_owner(&self, product_id: u64) -> Option<&str> {
        self.annotations.get(&product_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    /// Drops annotations the ledger no longer corroborates: the product
    /// vanished, or its on-ledger owner no longer matches the proposed owner
    /// (a cancel or competing transfer happened elsewhere). Returns the
    /// number of dropped entries.
    pub fn reconcile(&mut self, products: &[ProductRecord]) -> Result<usize, CacheError> {
        let stale: Vec<u64> = self
            .annotations
            .iter()
            .filter(|(product_id, proposed)| {
                match products.iter().find(|p| p.product_id == **product_id) {
                    Some(product) => !addresses_match(&product.owner, proposed),
                    None => true,
                }
            })
            .map(|(product_id, _)| *product_id)
            .collect();

        for product_id in &stale {
            self.clear(*product_id)?;
        }
        Ok(stale.len())
    }
}

fn unix_stamp() -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0);
    format!("unix-{secs}")
}
