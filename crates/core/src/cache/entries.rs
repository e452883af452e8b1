//! Cache entry operations.
//!
//! An entry is a response snapshot stored under the hashed identity of the
//! `GET` request that produced it, inside one generation.

use super::connection::CacheDb;
use super::hash::compute_cache_key;
use crate::{Error, Request, ResponseSnapshot};
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// A stored response snapshot with its request identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key_hash: String,
    pub method: String,
    pub url: String,
    pub response: ResponseSnapshot,
    pub stored_at: String,
}

impl CacheEntry {
    /// Capture a snapshot of `response` for `request`.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` for any method other than `GET`;
    /// mutating requests are never cached.
    pub fn new(request: &Request, response: ResponseSnapshot) -> Result<Self, Error> {
        if !request.is_get() {
            return Err(Error::InvalidInput(format!(
                "refusing to cache {} {}",
                request.method(),
                request.url()
            )));
        }

        Ok(Self {
            key_hash: compute_cache_key(request.method(), request.url().as_str()),
            method: request.method().to_string(),
            url: request.url().to_string(),
            response,
            stored_at: chrono::Utc::now().to_rfc3339(),
        })
    }
}

/// Raw row as read from SQLite, before the headers are decoded.
struct EntryRow {
    key_hash: String,
    method: String,
    url: String,
    status: u16,
    headers_json: String,
    body: Vec<u8>,
    stored_at: String,
}

impl EntryRow {
    fn decode(self) -> Result<CacheEntry, Error> {
        let headers = serde_json::from_str(&self.headers_json)
            .map_err(|e| Error::CorruptEntry(format!("{}: {e}", self.url)))?;
        Ok(CacheEntry {
            key_hash: self.key_hash,
            method: self.method,
            url: self.url,
            response: ResponseSnapshot { status: self.status, headers, body: self.body },
            stored_at: self.stored_at,
        })
    }
}

/// Upsert one entry. Shared by single writes and the install transaction.
pub(crate) fn write_entry(conn: &rusqlite::Connection, generation: &str, entry: &CacheEntry) -> Result<(), Error> {
    let headers_json = serde_json::to_string(&entry.response.headers)
        .map_err(|e| Error::InvalidInput(format!("unencodable headers: {e}")))?;

    conn.execute(
        "INSERT INTO entries (generation, key_hash, method, url, status, headers_json, body, stored_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        ON CONFLICT(generation, key_hash) DO UPDATE SET
            method = excluded.method,
            url = excluded.url,
            status = excluded.status,
            headers_json = excluded.headers_json,
            body = excluded.body,
            stored_at = excluded.stored_at",
        params![
            generation,
            &entry.key_hash,
            &entry.method,
            &entry.url,
            entry.response.status,
            headers_json,
            &entry.response.body,
            &entry.stored_at,
        ],
    )?;
    Ok(())
}

impl CacheDb {
    /// Insert or replace an entry in `generation`.
    ///
    /// The replacement happens in a single statement, so readers see either
    /// the old snapshot or the new one. Fails if the generation does not
    /// exist (e.g., it was evicted while the write was in flight).
    pub async fn put_entry(&self, generation: &str, entry: &CacheEntry) -> Result<(), Error> {
        let generation = generation.to_string();
        let entry = entry.clone();
        self.conn
            .call(move |conn| -> Result<(), Error> { write_entry(conn, &generation, &entry) })
            .await
            .map_err(Error::from)
    }

    /// Get an entry by key hash.
    ///
    /// Returns None if the key doesn't exist in the generation.
    pub async fn get_entry(&self, generation: &str, key_hash: &str) -> Result<Option<CacheEntry>, Error> {
        let generation = generation.to_string();
        let key_hash = key_hash.to_string();
        let row = self
            .conn
            .call(move |conn| -> Result<Option<EntryRow>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT key_hash, method, url, status, headers_json, body, stored_at
                    FROM entries WHERE generation = ?1 AND key_hash = ?2",
                )?;

                let result = stmt.query_row(params![generation, key_hash], |row| {
                    Ok(EntryRow {
                        key_hash: row.get(0)?,
                        method: row.get(1)?,
                        url: row.get(2)?,
                        status: row.get(3)?,
                        headers_json: row.get(4)?,
                        body: row.get(5)?,
                        stored_at: row.get(6)?,
                    })
                });

                match result {
                    Ok(row) => Ok(Some(row)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)?;

        row.map(EntryRow::decode).transpose()
    }

    /// List `(method, url)` for every entry of a generation, ordered by URL.
    pub async fn list_entry_keys(&self, generation: &str) -> Result<Vec<(String, String)>, Error> {
        let generation = generation.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<(String, String)>, Error> {
                let mut stmt = conn.prepare("SELECT method, url FROM entries WHERE generation = ?1 ORDER BY url")?;
                let keys = stmt
                    .query_map(params![generation], |row| Ok((row.get(0)?, row.get(1)?)))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(keys)
            })
            .await
            .map_err(Error::from)
    }
}
