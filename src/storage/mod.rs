//!
//! clapperboard storage module
//! ---------------------------
//! A small string key/value store standing in for browser local storage. Values
//! are opaque strings; the session layer stores JSON documents under fixed keys
//! (`users`, `currentUser`) through the typed helpers below.
//!
//! Two backends are provided:
//! - `MemoryStore`: process-local map, used for ephemeral sessions and tests.
//! - `FileStore`: a directory holding a single `store.json` snapshot that is
//!   rewritten atomically after every mutation.
//!
//! Every read and write touches a whole value; there are no partial updates.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

pub mod kv;

pub use kv::{FileStore, MemoryStore, StoreSettings};

/// Key holding the JSON array of credential records.
pub const USERS_KEY: &str = "users";
/// Key holding the serialized current identity; absent when anonymous.
pub const CURRENT_USER_KEY: &str = "currentUser";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("value under '{key}' is not valid: {reason}")]
    Corrupt { key: String, reason: String },
    #[error("failed to encode value: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Minimal local-storage contract.
pub trait KeyValueStore: Send + Sync {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError>;
    /// Removing a missing key is not an error.
    fn remove_item(&self, key: &str) -> Result<(), StoreError>;

    fn contains(&self, key: &str) -> bool { self.get_item(key).is_some() }
}

/// Shared handle used by the session layer.
pub type SharedKv = Arc<dyn KeyValueStore>;

/// Read and decode the JSON document stored under `key`.
/// Returns `Ok(None)` when the key is absent and `Corrupt` when it does not decode.
pub fn read_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Result<Option<T>, StoreError> {
    let Some(raw) = store.get_item(key) else { return Ok(None); };
    serde_json::from_str::<T>(&raw)
        .map(Some)
        .map_err(|e| StoreError::Corrupt { key: key.to_string(), reason: e.to_string() })
}

/// Encode `value` as JSON and store it under `key`.
pub fn write_json<T: Serialize + ?Sized>(store: &dyn KeyValueStore, key: &str, value: &T) -> Result<(), StoreError> {
    let raw = serde_json::to_string(value)?;
    store.set_item(key, &raw)
}

#[cfg(test)]
#[path = "storage_tests.rs"]
mod storage_tests;
