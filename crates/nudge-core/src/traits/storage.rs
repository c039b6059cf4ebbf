// SPDX-FileCopyrightText: 2026 Nudge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage adapter trait for persistence backends (SQLite, in-memory).

use async_trait::async_trait;

use crate::error::NudgeError;
use crate::traits::adapter::PluginAdapter;

/// Key/value document store addressed by logical name.
///
/// The engine never sees the storage format: every piece of persisted state
/// (funnel thresholds, staff, pending messages, auto-reply flags,
/// notification bookkeeping) is one JSON document under a fixed name.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Initializes the storage backend (migrations, connection, etc.).
    async fn initialize(&self) -> Result<(), NudgeError>;

    /// Closes the storage backend, flushing pending writes.
    async fn close(&self) -> Result<(), NudgeError>;

    /// Loads a document. `Ok(None)` means it was never saved.
    async fn load_document(&self, name: &str) -> Result<Option<serde_json::Value>, NudgeError>;

    /// Saves (replaces) a document.
    async fn save_document(&self, name: &str, document: &serde_json::Value)
        -> Result<(), NudgeError>;
}
