//! Cache generation operations.
//!
//! A generation is one versioned namespace of entries. Generations are
//! created at install, and deleting one removes all of its entries through
//! the `ON DELETE CASCADE` foreign key.

use super::connection::CacheDb;
use super::entries::{CacheEntry, write_entry};
use crate::Error;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;

/// A generation and how many entries it holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Generation {
    pub name: String,
    pub created_at: String,
    pub entries: u64,
}

impl CacheDb {
    /// Create (or refresh) a generation together with its entries.
    ///
    /// Everything is written in one transaction: either the generation and
    /// all of `entries` become visible, or nothing does.
    pub async fn install_generation(&self, name: &str, entries: Vec<CacheEntry>) -> Result<(), Error> {
        let name = name.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                tx.execute(
                    "INSERT OR IGNORE INTO generations (name, created_at) VALUES (?1, ?2)",
                    params![name, now],
                )?;
                for entry in &entries {
                    write_entry(&tx, &name, entry)?;
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Check whether a generation exists.
    pub async fn generation_exists(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
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

    /// List all generations, oldest first.
    pub async fn list_generations(&self) -> Result<Vec<Generation>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<Generation>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT g.name, g.created_at, COUNT(e.key_hash)
                    FROM generations g
                    LEFT JOIN entries e ON e.generation = g.name
                    GROUP BY g.name, g.created_at
                    ORDER BY g.created_at ASC, g.name ASC",
                )?;
                let generations = stmt
                    .query_map([], |row| {
                        Ok(Generation {
                            name: row.get(0)?,
                            created_at: row.get(1)?,
                            entries: row.get::<_, i64>(2)? as u64,
                        })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(generations)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete every generation except `keep`, in one transaction.
    ///
    /// Returns the names of the deleted generations.
    pub async fn delete_generations_except(&self, keep: &str) -> Result<Vec<String>, Error> {
        let keep = keep.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<String>, Error> {
                let tx = conn.transaction()?;
                let stale = {
                    let mut stmt = tx.prepare("SELECT name FROM generations WHERE name <> ?1 ORDER BY name")?;
                    stmt.query_map(params![keep], |row| row.get::<_, String>(0))?
                        .collect::<Result<Vec<_>, _>>()?
                };
                tx.execute("DELETE FROM generations WHERE name <> ?1", params![keep])?;
                tx.commit()?;
                Ok(stale)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Request, ResponseSnapshot};
    use url::Url;

    fn entry(url: &str) -> CacheEntry {
        let req = Request::get(Url::parse(url).unwrap());
        CacheEntry::new(&req, ResponseSnapshot::new(200, Vec::new(), url.as_bytes())).unwrap()
    }

    #[tokio::test]
    async fn test_empty_install_is_idempotent() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.install_generation("v1", Vec::new()).await.unwrap();
        db.install_generation("v1", Vec::new()).await.unwrap();

        let generations = db.list_generations().await.unwrap();
        assert_eq!(generations.len(), 1);
        assert_eq!(generations[0].name, "v1");
        assert_eq!(generations[0].entries, 0);
    }

    #[tokio::test]
    async fn test_install_generation_writes_all_entries() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let entries = vec![entry("https://example.com/"), entry("https://example.com/offline.html")];

        db.install_generation("v1", entries).await.unwrap();

        assert!(db.generation_exists("v1").await.unwrap());
        assert_eq!(db.list_entry_keys("v1").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_install_generation_refreshes_existing() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.install_generation("v1", vec![entry("https://example.com/")])
            .await
            .unwrap();
        db.install_generation("v1", vec![entry("https://example.com/"), entry("https://example.com/a")])
            .await
            .unwrap();

        assert_eq!(db.list_generations().await.unwrap().len(), 1);
        assert_eq!(db.list_entry_keys("v1").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_eviction_cascades_to_entries() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let e = entry("https://example.com/");
        db.install_generation("v1", vec![e.clone()]).await.unwrap();
        db.install_generation("v2", Vec::new()).await.unwrap();

        assert_eq!(db.delete_generations_except("v2").await.unwrap(), vec!["v1".to_string()]);
        assert!(!db.generation_exists("v1").await.unwrap());
        assert!(db.get_entry("v1", &e.key_hash).await.unwrap().is_none());
        assert_eq!(db.list_entry_keys("v1").await.unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_delete_generations_except() {
        let db = CacheDb::open_in_memory().await.unwrap();
        for name in ["v1", "v2", "v3"] {
            db.install_generation(name, vec![entry("https://example.com/")])
                .await
                .unwrap();
        }

        let evicted = db.delete_generations_except("v3").await.unwrap();
        assert_eq!(evicted, vec!["v1".to_string(), "v2".to_string()]);

        let remaining = db.list_generations().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].name, "v3");
        assert_eq!(remaining[0].entries, 1);
    }
}
