// SPDX-FileCopyrightText: 2026 Nudge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persisted document names and the absent-or-default load boundary.

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use nudge_core::StorageAdapter;

pub const FUNNEL_CONFIG: &str = "funnel_config";
pub const STAFF: &str = "staff";
pub const PENDING_MESSAGES: &str = "pending_messages";
pub const AUTO_REPLY_FLAGS: &str = "auto_reply_flags";
pub const NOTIFICATION_STATE: &str = "notification_state";

/// Every document the engine owns.
pub const ALL: [&str; 5] = [
    FUNNEL_CONFIG,
    STAFF,
    PENDING_MESSAGES,
    AUTO_REPLY_FLAGS,
    NOTIFICATION_STATE,
];

/// What a load found in storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Loaded<T> {
    Found(T),
    /// Never written.
    Absent,
    /// Present but undecodable.
    Malformed,
    /// Storage could not be read; the document may still exist.
    Failed,
}

impl<T> Loaded<T> {
    pub fn found(self) -> Option<T> {
        match self {
            Loaded::Found(value) => Some(value),
            _ => None,
        }
    }

    /// Whether writing a replacement is safe: the stored copy is known to be
    /// missing or unusable.
    pub fn may_overwrite(&self) -> bool {
        matches!(self, Loaded::Absent | Loaded::Malformed)
    }
}

/// Loads and decodes a document, reporting why nothing usable was found.
///
/// Load failures never abort startup.
pub async fn load_state<T: DeserializeOwned>(
    storage: &dyn StorageAdapter,
    name: &str,
) -> Loaded<T> {
    match storage.load_document(name).await {
        Ok(Some(value)) => match serde_json::from_value(value) {
            Ok(decoded) => Loaded::Found(decoded),
            Err(e) => {
                warn!(document = name, error = %e, "malformed document, using default");
                Loaded::Malformed
            }
        },
        Ok(None) => {
            debug!(document = name, "document absent, using default");
            Loaded::Absent
        }
        Err(e) => {
            warn!(document = name, error = %e, "failed to load document, using default");
            Loaded::Failed
        }
    }
}

/// Loads and decodes a document; `None` when there is nothing usable and the
/// caller substitutes its default.
pub async fn load<T: DeserializeOwned>(storage: &dyn StorageAdapter, name: &str) -> Option<T> {
    load_state(storage, name).await.found()
}

/// Encodes and saves a document, logging failures.
///
/// Returns `false` on failure; the in-memory value stays authoritative until
/// the next successful save.
pub async fn save<T: Serialize>(storage: &dyn StorageAdapter, name: &str, value: &T) -> bool {
    let encoded = match serde_json::to_value(value) {
        Ok(v) => v,
        Err(e) => {
            warn!(document = name, error = %e, "failed to encode document");
            return false;
        }
    };
    match storage.save_document(name, &encoded).await {
        Ok(()) => true,
        Err(e) => {
            warn!(document = name, error = %e, "failed to save document, keeping in-memory state");
            metrics::counter!("nudge_persistence_failures_total", "document" => name.to_string())
                .increment(1);
            false
        }
    }
}
