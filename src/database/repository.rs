/*!
 * SQLite-backed key/value repository.
 */

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use log::debug;
use rusqlite::{OptionalExtension, params};

use super::KeyValueStore;
use super::connection::DatabaseConnection;

/// Repository for key/value operations
#[derive(Clone, Debug)]
pub struct Repository {
    /// Database connection
    db: DatabaseConnection,
}

impl Repository {
    /// Create a new repository with the given database connection
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Create a repository with the default database location
    pub fn new_default() -> Result<Self> {
        let db = DatabaseConnection::new_default()?;
        Ok(Self::new(db))
    }

    /// Create a repository with an in-memory database (for testing)
    pub fn new_in_memory() -> Result<Self> {
        let db = DatabaseConnection::new_in_memory()?;
        Ok(Self::new(db))
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Keys starting with the given prefix, sorted
    pub async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let pattern = format!("{}%", prefix.replace('%', "\\%").replace('_', "\\_"));

        self.db
            .execute_async(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT key FROM key_value_store WHERE key LIKE ?1 ESCAPE '\\' ORDER BY key",
                )?;
                let keys = stmt
                    .query_map([pattern], |row| row.get::<_, String>(0))?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(keys)
            })
            .await
    }
}

#[async_trait]
impl KeyValueStore for Repository {
    async fn get(&self, keys: &[&str]) -> Result<HashMap<String, String>> {
        let keys: Vec<String> = keys.iter().map(|k| k.to_string()).collect();

        self.db
            .execute_async(move |conn| {
                let mut stmt = conn.prepare("SELECT value FROM key_value_store WHERE key = ?1")?;
                let mut values = HashMap::new();
                for key in keys {
                    let value: Option<String> =
                        stmt.query_row([&key], |row| row.get(0)).optional()?;
                    if let Some(value) = value {
                        values.insert(key, value);
                    }
                }
                Ok(values)
            })
            .await
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let key = key.to_string();
        let value = value.to_string();
        debug!("Storing value for key {}", key);

        self.db
            .execute_async(move |conn| {
                conn.execute(
                    r#"
                    INSERT INTO key_value_store (key, value, updated_at)
                    VALUES (?1, ?2, datetime('now'))
                    ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
                    "#,
                    params![key, value],
                )?;
                Ok(())
            })
            .await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let key = key.to_string();

        self.db
            .execute_async(move |conn| {
                conn.execute("DELETE FROM key_value_store WHERE key = ?1", [key])?;
                Ok(())
            })
            .await
    }

    async fn set_many(&self, entries: Vec<(String, String)>) -> Result<()> {
        self.db
            .transaction_async(move |tx| {
                for (key, value) in &entries {
                    tx.execute(
                        r#"
                        INSERT INTO key_value_store (key, value, updated_at)
                        VALUES (?1, ?2, datetime('now'))
                        ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
                        "#,
                        params![key, value],
                    )?;
                }
                Ok(())
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_thenGet_shouldReturnValue() {
        let repo = Repository::new_in_memory().unwrap();

        repo.set("DEEPL_TRANS_SETTINGS", r#"{"authKey":"k"}"#).await.unwrap();
        let values = repo.get(&["DEEPL_TRANS_SETTINGS", "missing"]).await.unwrap();

        assert_eq!(values.len(), 1);
        assert_eq!(values["DEEPL_TRANS_SETTINGS"], r#"{"authKey":"k"}"#);
    }

    #[tokio::test]
    async fn test_set_twice_shouldOverwrite() {
        let repo = Repository::new_in_memory().unwrap();

        repo.set("k", "1").await.unwrap();
        repo.set("k", "2").await.unwrap();

        assert_eq!(repo.get_one("k").await.unwrap().as_deref(), Some("2"));
        assert_eq!(repo.connection().entry_count().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_setMany_andPrefixLookup_shouldListKeys() {
        let repo = Repository::new_in_memory().unwrap();

        repo.set_many(vec![
            ("subtitles:a:en".to_string(), "x".to_string()),
            ("subtitles:a:fr".to_string(), "y".to_string()),
            ("subtitles:b:en".to_string(), "z".to_string()),
        ])
        .await
        .unwrap();

        let keys = repo.keys_with_prefix("subtitles:a:").await.unwrap();
        assert_eq!(keys, vec!["subtitles:a:en", "subtitles:a:fr"]);
    }

    #[tokio::test]
    async fn test_delete_shouldRemoveKey() {
        let repo = Repository::new_in_memory().unwrap();
        repo.set("k", "v").await.unwrap();

        repo.delete("k").await.unwrap();

        assert!(repo.get_one("k").await.unwrap().is_none());
    }
}
