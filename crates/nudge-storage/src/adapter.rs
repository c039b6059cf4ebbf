// SPDX-FileCopyrightText: 2026 Nudge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the StorageAdapter trait.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use nudge_config::model::StorageConfig;
use nudge_core::{AdapterType, HealthStatus, NudgeError, PluginAdapter, StorageAdapter};

use crate::database::{Database, map_tr_err};
use crate::queries;

/// SQLite-backed document store.
///
/// The database is opened lazily on the first call to
/// [`StorageAdapter::initialize`]; every other operation fails until then.
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// Create a new SqliteStorage with the given configuration.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    fn db(&self) -> Result<&Database, NudgeError> {
        self.db.get().ok_or_else(|| NudgeError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }

    /// Names of every document currently stored.
    pub async fn document_names(&self) -> Result<Vec<String>, NudgeError> {
        queries::documents::list_names(self.db()?).await
    }

    async fn checkpoint(&self, db: &Database) -> Result<(), NudgeError> {
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        debug!("WAL checkpoint complete");
        Ok(())
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, NudgeError> {
        let db = self.db()?;
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), NudgeError> {
        if let Some(db) = self.db.get() {
            self.checkpoint(db).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), NudgeError> {
        let db = Database::open(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| NudgeError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), NudgeError> {
        let db = self.db()?;
        self.checkpoint(db).await
    }

    async fn load_document(&self, name: &str) -> Result<Option<serde_json::Value>, NudgeError> {
        queries::documents::load(self.db()?, name).await
    }

    async fn save_document(
        &self,
        name: &str,
        document: &serde_json::Value,
    ) -> Result<(), NudgeError> {
        queries::documents::save(self.db()?, name, document).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn make_config(path: &str) -> StorageConfig {
        StorageConfig {
            database_path: path.to_string(),
            wal_mode: true,
        }
    }

    #[tokio::test]
    async fn sqlite_storage_implements_plugin_adapter() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));

        assert_eq!(storage.name(), "sqlite");
        assert_eq!(storage.version(), semver::Version::new(0, 1, 0));
        assert_eq!(storage.adapter_type(), AdapterType::Storage);
    }

    #[tokio::test]
    async fn initialize_creates_file_and_parent_dirs() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("nested").join("nudge.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));

        storage.initialize().await.unwrap();
        assert!(db_path.exists(), "database file should be created");
    }

    #[tokio::test]
    async fn initialize_twice_returns_error() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("double_init.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));

        storage.initialize().await.unwrap();
        assert!(storage.initialize().await.is_err());
    }

    #[tokio::test]
    async fn operations_fail_before_initialize() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("no_init.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));

        assert!(storage.health_check().await.is_err());
        assert!(storage.load_document("staff").await.is_err());
        // Nothing to checkpoint yet.
        storage.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn documents_through_adapter() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("docs.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));
        storage.initialize().await.unwrap();
        assert_eq!(storage.health_check().await.unwrap(), HealthStatus::Healthy);

        assert!(storage.load_document("auto_reply_flags").await.unwrap().is_none());

        let flags = serde_json::json!({"user_42": true, "chat_-100": true});
        storage.save_document("auto_reply_flags", &flags).await.unwrap();
        let loaded = storage.load_document("auto_reply_flags").await.unwrap();
        assert_eq!(loaded, Some(flags));
        assert_eq!(
            storage.document_names().await.unwrap(),
            vec!["auto_reply_flags".to_string()]
        );

        storage.close().await.unwrap();
    }

    #[tokio::test]
    async fn works_without_wal() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("nowal.db");
        let storage = SqliteStorage::new(StorageConfig {
            database_path: db_path.to_str().unwrap().to_string(),
            wal_mode: false,
        });
        storage.initialize().await.unwrap();
        storage
            .save_document("staff", &serde_json::json!({"ids": [], "handles": []}))
            .await
            .unwrap();
        storage.shutdown().await.unwrap();
    }
}
