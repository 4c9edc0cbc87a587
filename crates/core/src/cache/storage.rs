//! Named cache generations.
//!
//! `open`, `has`, `delete` and `keys` follow the browser cache-storage
//! semantics: opening is create-or-reuse, deleting a missing generation
//! reports `false` instead of failing.

use super::connection::CacheDb;
use super::generation::Cache;
use crate::Error;
use tokio_rusqlite::params;

/// All cache generations in one database.
#[derive(Clone, Debug)]
pub struct CacheStorage {
    db: CacheDb,
}

impl CacheStorage {
    pub fn new(db: CacheDb) -> Self {
        Self { db }
    }

    /// Open the generation called `name`, creating it if absent.
    ///
    /// Opening an existing generation returns a handle to the same entries.
    pub async fn open(&self, name: &str) -> Result<Cache, Error> {
        let owned = name.to_string();
        let created = self
            .db
            .conn
            .call(move |conn| -> Result<bool, Error> {
                let inserted = conn.execute(
                    "INSERT OR IGNORE INTO generations (name, created_at) VALUES (?1, ?2)",
                    params![owned, chrono::Utc::now().to_rfc3339()],
                )?;
                Ok(inserted == 1)
            })
            .await
            .map_err(Error::from)?;

        if created {
            tracing::debug!(generation = name, "created cache generation");
        }

        Ok(Cache::new(self.db.clone(), name.to_string()))
    }

    /// Handle to the generation called `name` without creating it.
    ///
    /// Lookups through the handle miss until the generation is opened.
    pub fn cache(&self, name: &str) -> Cache {
        Cache::new(self.db.clone(), name.to_string())
    }

    /// Whether a generation called `name` exists.
    pub async fn has(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.db
            .conn
            .call(move |conn| -> Result<bool, Error> {
                let exists: bool = conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM generations WHERE name = ?1)",
                    params![name],
                    |row| row.get(0),
                )?;
                Ok(exists)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a generation and every entry in it.
    ///
    /// Returns `false` when no generation had that name.
    pub async fn delete(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.db
            .conn
            .call(move |conn| -> Result<bool, Error> {
                let tx = conn.transaction()?;
                tx.execute("DELETE FROM entries WHERE generation = ?1", params![name])?;
                let deleted = tx.execute("DELETE FROM generations WHERE name = ?1", params![name])?;
                tx.commit()?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Names of all generations, oldest first.
    pub async fn keys(&self) -> Result<Vec<String>, Error> {
        self.db
            .conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM generations ORDER BY created_at ASC, rowid ASC")?;
                let names = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }
}
