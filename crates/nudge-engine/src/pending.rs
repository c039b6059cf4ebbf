// SPDX-FileCopyrightText: 2026 Nudge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Unanswered inbound messages, keyed per message and grouped by conversation.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stored in place of an empty or missing message body.
pub const PLACEHOLDER_TEXT: &str = "[message without text]";

/// Unique identity of a pending entry.
///
/// `epoch` is the insertion instant in microseconds, bumped when needed so
/// two inserts never share a key even within the same microsecond.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntryKey {
    pub conversation_id: String,
    pub sender_id: String,
    pub message_id: String,
    pub epoch: i64,
}

impl std::fmt::Display for EntryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}_{}_{}_{}",
            self.conversation_id, self.sender_id, self.message_id, self.epoch
        )
    }
}

/// Optional descriptive fields carried along for rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryMeta {
    pub conversation_title: Option<String>,
    pub sender_handle: Option<String>,
    pub display_name: Option<String>,
}

/// One unanswered inbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingEntry {
    pub key: EntryKey,
    #[serde(default)]
    pub conversation_title: Option<String>,
    #[serde(default)]
    pub sender_handle: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    pub text: String,
    pub inserted_at: DateTime<Utc>,
    /// Never decreases while the entry exists.
    #[serde(default)]
    pub current_level: u8,
    #[serde(default)]
    pub escalated_levels: BTreeSet<u8>,
}

impl PendingEntry {
    pub fn conversation_id(&self) -> &str {
        &self.key.conversation_id
    }

    /// Best human label for the sender: display name, then `@handle`, then id.
    pub fn sender_label(&self) -> String {
        if let Some(name) = self.display_name.as_deref().filter(|n| !n.trim().is_empty()) {
            return name.to_string();
        }
        if let Some(handle) = self.sender_handle.as_deref().filter(|h| !h.is_empty()) {
            return format!("@{handle}");
        }
        self.key.sender_id.clone()
    }
}

#[derive(Serialize, Deserialize)]
struct PendingDocument {
    #[serde(default)]
    entries: Vec<PendingEntry>,
}

/// The set of unanswered messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "PendingDocument", into = "PendingDocument")]
pub struct PendingStore {
    entries: BTreeMap<EntryKey, PendingEntry>,
    last_epoch: i64,
}

impl From<PendingDocument> for PendingStore {
    fn from(doc: PendingDocument) -> Self {
        let last_epoch = doc.entries.iter().map(|e| e.key.epoch).max().unwrap_or(0);
        let entries = doc
            .entries
            .into_iter()
            .map(|e| (e.key.clone(), e))
            .collect();
        Self {
            entries,
            last_epoch,
        }
    }
}

impl From<PendingStore> for PendingDocument {
    fn from(store: PendingStore) -> Self {
        Self {
            entries: store.entries.into_values().collect(),
        }
    }
}

impl PendingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a new level-0 entry and returns its key. Never fails.
    pub fn add(
        &mut self,
        conversation_id: &str,
        sender_id: &str,
        text: &str,
        message_id: &str,
        meta: EntryMeta,
        now: DateTime<Utc>,
    ) -> EntryKey {
        let epoch = now.timestamp_micros().max(self.last_epoch + 1);
        self.last_epoch = epoch;

        let key = EntryKey {
            conversation_id: conversation_id.to_string(),
            sender_id: sender_id.to_string(),
            message_id: message_id.to_string(),
            epoch,
        };
        let text = if text.trim().is_empty() {
            PLACEHOLDER_TEXT.to_string()
        } else {
            text.to_string()
        };
        let entry = PendingEntry {
            key: key.clone(),
            conversation_title: meta.conversation_title,
            sender_handle: meta.sender_handle,
            display_name: meta.display_name,
            text,
            inserted_at: now,
            current_level: 0,
            escalated_levels: BTreeSet::new(),
        };
        self.entries.insert(key.clone(), entry);
        key
    }

    pub fn remove_by_key(&mut self, key: &EntryKey) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Removes every entry of a conversation, optionally only those from `sender_id`.
    pub fn remove_all_for_conversation(
        &mut self,
        conversation_id: &str,
        sender_id: Option<&str>,
    ) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| {
            key.conversation_id != conversation_id
                || sender_id.is_some_and(|s| key.sender_id != s)
        });
        before - self.entries.len()
    }

    /// Snapshot of every entry, in key order.
    pub fn all_entries(&self) -> Vec<PendingEntry> {
        self.entries.values().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PendingEntry> {
        self.entries.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut PendingEntry> {
        self.entries.values_mut()
    }

    pub fn clear_all(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        count
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of distinct conversations with at least one entry.
    pub fn conversation_count(&self) -> usize {
        self.entries
            .keys()
            .map(|k| k.conversation_id.as_str())
            .collect::<BTreeSet<_>>()
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 7, 0, 0).unwrap()
    }

    #[test]
    fn add_creates_fresh_entries_with_unique_keys() {
        let mut store = PendingStore::new();
        let a = store.add("-100", "7", "hi", "1", EntryMeta::default(), t0());
        let b = store.add("-100", "7", "hi", "1", EntryMeta::default(), t0());
        assert_ne!(a, b, "same message twice at the same instant still gets two keys");
        assert_eq!(store.len(), 2);
        assert!(store.iter().all(|e| e.current_level == 0));
    }

    #[test]
    fn blank_text_becomes_placeholder() {
        let mut store = PendingStore::new();
        store.add("5", "5", "   ", "9", EntryMeta::default(), t0());
        assert_eq!(store.all_entries()[0].text, PLACEHOLDER_TEXT);
    }

    #[test]
    fn remove_by_key_reports_presence() {
        let mut store = PendingStore::new();
        let key = store.add("5", "5", "x", "9", EntryMeta::default(), t0());
        assert!(store.remove_by_key(&key));
        assert!(!store.remove_by_key(&key));
    }

    #[test]
    fn purge_conversation_optionally_by_sender() {
        let mut store = PendingStore::new();
        store.add("-100", "1", "a", "1", EntryMeta::default(), t0());
        store.add("-100", "2", "b", "2", EntryMeta::default(), t0());
        store.add("-200", "1", "c", "3", EntryMeta::default(), t0());

        assert_eq!(store.remove_all_for_conversation("-100", Some("2")), 1);
        assert_eq!(store.remove_all_for_conversation("-100", None), 1);
        assert_eq!(store.remove_all_for_conversation("-100", None), 0);
        assert!(store.iter().all(|e| e.conversation_id() != "-100"));
        assert_eq!(store.conversation_count(), 1);
    }

    #[test]
    fn clear_all_returns_count() {
        let mut store = PendingStore::new();
        store.add("1", "1", "a", "1", EntryMeta::default(), t0());
        store.add("2", "2", "b", "2", EntryMeta::default(), t0());
        assert_eq!(store.clear_all(), 2);
        assert!(store.is_empty());
    }

    #[test]
    fn reloaded_store_keeps_keys_unique() {
        let mut store = PendingStore::new();
        let first = store.add("1", "1", "a", "1", EntryMeta::default(), t0());
        let json = serde_json::to_value(&store).unwrap();
        assert!(json["entries"].is_array());

        let mut reloaded: PendingStore = serde_json::from_value(json).unwrap();
        assert_eq!(reloaded, store);
        let second = reloaded.add("1", "1", "a", "1", EntryMeta::default(), t0());
        assert!(second.epoch > first.epoch);
    }

    #[test]
    fn sender_label_prefers_display_name() {
        let mut store = PendingStore::new();
        let meta = EntryMeta {
            sender_handle: Some("ivan".into()),
            ..EntryMeta::default()
        };
        store.add("1", "42", "a", "1", meta, t0());
        assert_eq!(store.all_entries()[0].sender_label(), "@ivan");
    }
}
