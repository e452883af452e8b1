//! Cache inspection tools.
//!
//! Both read the generation of the running version only.

pub mod get;
pub mod keys;

pub use get::{CacheGetParams, get_impl};
pub use keys::keys_impl;
