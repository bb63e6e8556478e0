/*!
 * Persistence collaborator.
 *
 * Everything the crate persists goes through the [`KeyValueStore`] trait:
 * built WebVTT timelines, subtitle records and provider credentials. Two
 * implementations are provided:
 * - [`Repository`]: SQLite-backed, used by the CLI
 * - [`MemoryStore`]: in-process map, used by tests and embedders
 */

use std::collections::HashMap;
use std::fmt::Debug;

use anyhow::Result;
use async_trait::async_trait;

pub mod connection;
pub mod memory;
pub mod repository;
pub mod schema;

pub use connection::DatabaseConnection;
pub use memory::MemoryStore;
pub use repository::Repository;

/// Opaque get/set-by-key store
#[async_trait]
pub trait KeyValueStore: Send + Sync + Debug {
    /// Fetch the values for the given keys; missing keys are absent from the map
    async fn get(&self, keys: &[&str]) -> Result<HashMap<String, String>>;

    /// Insert or replace a value
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a key, a no-op when absent
    async fn delete(&self, key: &str) -> Result<()>;

    /// Fetch a single value
    async fn get_one(&self, key: &str) -> Result<Option<String>> {
        let mut values = self.get(&[key]).await?;
        Ok(values.remove(key))
    }

    /// Write several entries; implementations may make this atomic
    async fn set_many(&self, entries: Vec<(String, String)>) -> Result<()> {
        for (key, value) in entries {
            self.set(&key, &value).await?;
        }
        Ok(())
    }
}
