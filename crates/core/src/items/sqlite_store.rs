//! SQLite-backed item store implementation.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};

use super::types::ItemRecord;
use super::{Description, ItemError, ItemStatus, ItemStore, PodcastItem, StatusSink};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite-backed podcast item store.
pub struct SqliteItemStore {
    conn: Mutex<Connection>,
}

impl SqliteItemStore {
    /// Open the store at `path`, creating the database file and table if needed.
    pub fn new(path: &Path) -> Result<Self, ItemError> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory() -> Result<Self, ItemError> {
        let conn = Connection::open_in_memory()?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), ItemError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS feed_items (
                id TEXT PRIMARY KEY,
                record TEXT NOT NULL
            );
            "#,
        )?;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, ItemError> {
        self.conn
            .lock()
            .map_err(|_| ItemError::Database("connection mutex poisoned".to_string()))
    }

    fn decode(id: &str, record: &str) -> Result<PodcastItem, ItemError> {
        let added_at = DateTime::parse_from_rfc3339(id)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| ItemError::Corrupt {
                id: id.to_string(),
                reason: format!("invalid key: {}", e),
            })?;

        let record: ItemRecord = serde_json::from_str(record).map_err(|e| ItemError::Corrupt {
            id: id.to_string(),
            reason: e.to_string(),
        })?;

        Ok(record.into_item(added_at))
    }

    fn encode(item: &PodcastItem) -> Result<String, ItemError> {
        serde_json::to_string(&ItemRecord::from_item(item))
            .map_err(|e| ItemError::Database(e.to_string()))
    }

    fn load(conn: &Connection, id: &str) -> Result<Option<PodcastItem>, ItemError> {
        let record: Option<String> = conn
            .query_row(
                "SELECT record FROM feed_items WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;

        record.map(|r| Self::decode(id, &r)).transpose()
    }

    /// Read, change and write back one item in a single write transaction.
    fn modify(
        &self,
        item_id: &str,
        change: impl FnOnce(&mut PodcastItem),
    ) -> Result<PodcastItem, ItemError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let mut item =
            Self::load(&tx, item_id)?.ok_or_else(|| ItemError::NotFound(item_id.to_string()))?;
        change(&mut item);

        tx.execute(
            "UPDATE feed_items SET record = ?1 WHERE id = ?2",
            params![Self::encode(&item)?, item_id],
        )?;
        tx.commit()?;

        Ok(item)
    }
}

impl StatusSink for SqliteItemStore {
    fn update_status(&self, item_id: &str, status: ItemStatus) -> Result<PodcastItem, ItemError> {
        self.modify(item_id, |item| item.status = status)
    }

    fn update_content_length(
        &self,
        item_id: &str,
        content_length: u64,
    ) -> Result<PodcastItem, ItemError> {
        self.modify(item_id, |item| item.content_length = content_length)
    }
}

impl ItemStore for SqliteItemStore {
    fn add(&self, item: &PodcastItem) -> Result<(), ItemError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO feed_items (id, record) VALUES (?1, ?2)
             ON CONFLICT(id) DO UPDATE SET record = excluded.record",
            params![item.id(), Self::encode(item)?],
        )?;
        Ok(())
    }

    fn get(&self, item_id: &str) -> Result<Option<PodcastItem>, ItemError> {
        let conn = self.lock()?;
        Self::load(&conn, item_id)
    }

    fn update_description(
        &self,
        item_id: &str,
        description: &Description,
    ) -> Result<PodcastItem, ItemError> {
        self.modify(item_id, |item| {
            item.title = description.title.clone();
            item.description = description.body.clone();
        })
    }

    fn remove(&self, item_id: &str) -> Result<PodcastItem, ItemError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let item =
            Self::load(&tx, item_id)?.ok_or_else(|| ItemError::NotFound(item_id.to_string()))?;
        tx.execute("DELETE FROM feed_items WHERE id = ?1", params![item_id])?;
        tx.commit()?;

        Ok(item)
    }

    fn list(&self) -> Result<Vec<PodcastItem>, ItemError> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare("SELECT id, record FROM feed_items ORDER BY id DESC")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut items = Vec::new();
        for row in rows {
            let (id, record) = row?;
            items.push(Self::decode(&id, &record)?);
        }

        Ok(items)
    }
}
