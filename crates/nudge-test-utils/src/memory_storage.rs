// SPDX-FileCopyrightText: 2026 Nudge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory document store.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use nudge_core::{AdapterType, HealthStatus, NudgeError, PluginAdapter, StorageAdapter};

/// A `StorageAdapter` backed by a map, with switchable load/save failures.
#[derive(Default)]
pub struct MemoryStorage {
    documents: Mutex<BTreeMap<String, serde_json::Value>>,
    fail_loads: AtomicBool,
    fail_saves: AtomicBool,
    saves: AtomicUsize,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw stored document.
    pub async fn document(&self, name: &str) -> Option<serde_json::Value> {
        self.documents.lock().await.get(name).cloned()
    }

    /// Store a raw document directly, bypassing failure injection.
    pub async fn put(&self, name: &str, document: serde_json::Value) {
        self.documents.lock().await.insert(name.to_string(), document);
    }

    pub fn fail_loads(&self, fail: bool) {
        self.fail_loads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Number of successful saves.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PluginAdapter for MemoryStorage {
    fn name(&self) -> &str {
        "memory"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, NudgeError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), NudgeError> {
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for MemoryStorage {
    async fn initialize(&self) -> Result<(), NudgeError> {
        Ok(())
    }

    async fn close(&self) -> Result<(), NudgeError> {
        Ok(())
    }

    async fn load_document(&self, name: &str) -> Result<Option<serde_json::Value>, NudgeError> {
        if self.fail_loads.load(Ordering::SeqCst) {
            return Err(NudgeError::Storage {
                source: "injected load failure".into(),
            });
        }
        Ok(self.documents.lock().await.get(name).cloned())
    }

    async fn save_document(
        &self,
        name: &str,
        document: &serde_json::Value,
    ) -> Result<(), NudgeError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(NudgeError::Storage {
                source: "injected save failure".into(),
            });
        }
        self.documents
            .lock()
            .await
            .insert(name.to_string(), document.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn save_then_load() {
        let storage = MemoryStorage::new();
        assert!(storage.load_document("staff").await.unwrap().is_none());
        storage
            .save_document("staff", &serde_json::json!({"ids": [1]}))
            .await
            .unwrap();
        assert_eq!(
            storage.load_document("staff").await.unwrap(),
            Some(serde_json::json!({"ids": [1]}))
        );
        assert_eq!(storage.save_count(), 1);
    }

    #[tokio::test]
    async fn failures_are_injectable() {
        let storage = MemoryStorage::new();
        storage.fail_saves(true);
        assert!(storage.save_document("x", &serde_json::json!(1)).await.is_err());
        storage.fail_loads(true);
        assert!(storage.load_document("x").await.is_err());
        assert_eq!(storage.save_count(), 0);
    }
}
