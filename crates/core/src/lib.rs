//! Core types and shared functionality for swcache.
//!
//! This crate provides:
//! - Versioned cache implementation with SQLite backend
//! - Request and response snapshot types
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod exchange;

pub use cache::{CacheDb, CacheEntry, CacheStore, Generation};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use exchange::{Destination, Request, RequestMode, ResponseSnapshot, ResponseSource, Served};
