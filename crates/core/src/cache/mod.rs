//! SQLite-backed, versioned response cache.
//!
//! This module provides a persistent, content-addressed cache using SQLite
//! with async access via tokio-rusqlite. It supports:
//!
//! - Request identities hashed with SHA-256
//! - Named generations whose entries are removed together
//! - All-or-nothing installation of a generation
//! - Automatic schema migrations and WAL mode

pub mod connection;
pub mod entries;
pub mod generations;
pub mod hash;
pub mod migrations;
pub mod store;

pub use crate::Error;

pub use connection::CacheDb;
pub use entries::CacheEntry;
pub use generations::Generation;
pub use store::CacheStore;
