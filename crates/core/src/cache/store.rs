//! Request-level view of a single generation.

use super::connection::CacheDb;
use super::entries::CacheEntry;
use super::hash::compute_cache_key;
use crate::{Error, Request, ResponseSnapshot};

/// Handle to one generation, keyed by request identity.
///
/// This is what the strategies read from and write back to. It is cheap to
/// clone and can be moved into background tasks.
#[derive(Clone, Debug)]
pub struct CacheStore {
    db: CacheDb,
    generation: String,
}

impl CacheStore {
    pub fn new(db: CacheDb, generation: impl Into<String>) -> Self {
        Self { db, generation: generation.into() }
    }

    /// Version tag of the generation this store reads and writes.
    pub fn generation(&self) -> &str {
        &self.generation
    }

    /// Look up the snapshot stored for exactly this request.
    ///
    /// Only `GET` requests can have entries; any other method is a miss.
    pub async fn match_request(&self, request: &Request) -> Result<Option<ResponseSnapshot>, Error> {
        if !request.is_get() {
            return Ok(None);
        }

        let key = compute_cache_key(request.method(), request.url().as_str());
        let entry = self.db.get_entry(&self.generation, &key).await?;
        Ok(entry.map(|e| e.response))
    }

    /// Store a snapshot of `response` for `request`, replacing any previous one.
    ///
    /// # Errors
    ///
    /// `Error::InvalidInput` for non-`GET` requests, or a database error.
    pub async fn put(&self, request: &Request, response: ResponseSnapshot) -> Result<(), Error> {
        let entry = CacheEntry::new(request, response)?;
        self.db.put_entry(&self.generation, &entry).await?;
        tracing::debug!(generation = %self.generation, url = %entry.url, "stored cache entry");
        Ok(())
    }

    /// Full entry (with `stored_at`) for a `GET` of `request`'s URL.
    pub async fn entry(&self, request: &Request) -> Result<Option<CacheEntry>, Error> {
        let key = compute_cache_key("GET", request.url().as_str());
        self.db.get_entry(&self.generation, &key).await
    }

    /// URLs of every entry in this generation.
    pub async fn keys(&self) -> Result<Vec<String>, Error> {
        let keys = self.db.list_entry_keys(&self.generation).await?;
        Ok(keys.into_iter().map(|(_, url)| url).collect())
    }
}
