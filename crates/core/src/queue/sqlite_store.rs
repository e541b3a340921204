//! SQLite-backed job queue implementation.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use tracing::warn;

use super::types::JobRecord;
use super::{Job, JobQueue, QueueError};

/// How long a writer waits for another connection's write lock.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite-backed job queue.
///
/// Several instances may open the same database file; every write runs in an
/// `IMMEDIATE` transaction so SQLite serializes them.
pub struct SqliteJobQueue {
    conn: Mutex<Connection>,
}

impl SqliteJobQueue {
    /// Open the queue at `path`, creating the database file and table if needed.
    pub fn new(path: &Path) -> Result<Self, QueueError> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory queue (useful for testing).
    pub fn in_memory() -> Result<Self, QueueError> {
        let conn = Connection::open_in_memory()?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), QueueError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS download_jobs (
                item_id TEXT PRIMARY KEY,
                record TEXT NOT NULL
            );
            "#,
        )?;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, QueueError> {
        self.conn
            .lock()
            .map_err(|_| QueueError::Database("connection mutex poisoned".to_string()))
    }

    fn decode(item_id: String, record: &str) -> Result<Job, QueueError> {
        match serde_json::from_str::<JobRecord>(record) {
            Ok(record) => Ok(record.into_job(item_id)),
            Err(e) => Err(QueueError::Corrupt {
                item_id,
                reason: e.to_string(),
            }),
        }
    }

    fn put(conn: &Connection, job: &Job) -> Result<(), QueueError> {
        let record = serde_json::to_string(&JobRecord::from_job(job))
            .map_err(|e| QueueError::Database(e.to_string()))?;

        conn.execute(
            "INSERT INTO download_jobs (item_id, record) VALUES (?1, ?2)
             ON CONFLICT(item_id) DO UPDATE SET record = excluded.record",
            params![job.item_id, record],
        )?;
        Ok(())
    }

    fn load(conn: &Connection, item_id: &str) -> Result<Option<Job>, QueueError> {
        let record: Option<String> = conn
            .query_row(
                "SELECT record FROM download_jobs WHERE item_id = ?1",
                params![item_id],
                |row| row.get(0),
            )
            .optional()?;

        record
            .map(|r| Self::decode(item_id.to_string(), &r))
            .transpose()
    }
}

impl JobQueue for SqliteJobQueue {
    fn add(&self, job: &Job) -> Result<(), QueueError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        Self::put(&tx, job)?;
        tx.commit()?;
        Ok(())
    }

    fn next(&self) -> Result<Job, QueueError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        // Undecodable rows are skipped rather than failing the claim
        let claimable = {
            let mut stmt =
                tx.prepare("SELECT item_id, record FROM download_jobs ORDER BY item_id")?;
            let mut rows = stmt.query([])?;
            let mut found = None;
            while let Some(row) = rows.next()? {
                match Self::decode(row.get(0)?, &row.get::<_, String>(1)?) {
                    Ok(job) if !job.active => {
                        found = Some(job);
                        break;
                    }
                    Ok(_) => {}
                    Err(e) => warn!("Skipping unreadable job: {}", e),
                }
            }
            found
        };

        let Some(mut job) = claimable else {
            return Err(QueueError::NoInactiveJobs);
        };

        job.active = true;
        Self::put(&tx, &job)?;
        tx.commit()?;

        Ok(job)
    }

    fn update(&self, job: &Job) -> Result<(), QueueError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        if job.status.is_terminal() {
            tx.execute(
                "DELETE FROM download_jobs WHERE item_id = ?1",
                params![job.item_id],
            )?;
        } else {
            if let Some(stored) = Self::load(&tx, &job.item_id)? {
                if !stored.status.can_transition_to(job.status) {
                    return Err(QueueError::InvalidTransition {
                        item_id: job.item_id.clone(),
                        from: stored.status,
                        to: job.status,
                    });
                }
            }
            Self::put(&tx, job)?;
        }

        tx.commit()?;
        Ok(())
    }

    fn all(&self) -> Result<Vec<Job>, QueueError> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare("SELECT item_id, record FROM download_jobs ORDER BY item_id")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut jobs = Vec::new();
        for row in rows {
            let (item_id, record) = row?;
            match Self::decode(item_id, &record) {
                Ok(job) => jobs.push(job),
                Err(e) => warn!("Skipping unreadable job: {}", e),
            }
        }

        Ok(jobs)
    }

    fn get(&self, item_id: &str) -> Result<Option<Job>, QueueError> {
        let conn = self.lock()?;
        Self::load(&conn, item_id)
    }

    fn remove(&self, item_id: &str) -> Result<bool, QueueError> {
        let conn = self.lock()?;
        let deleted = conn.execute(
            "DELETE FROM download_jobs WHERE item_id = ?1",
            params![item_id],
        )?;
        Ok(deleted > 0)
    }
}
