// SPDX-FileCopyrightText: 2026 Nudge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Coalesces pending entries into one summary, bucketed by funnel level.
//!
//! A conversation lands in exactly one bucket: the one matching the highest
//! level among its entries. Conversations that are still at level 0 are left
//! out entirely.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};

use crate::funnel::LEVEL_COUNT;
use crate::pending::PendingEntry;

/// Derived per-conversation view used for rendering. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationSnapshot {
    pub conversation_id: String,
    pub title: Option<String>,
    /// Distinct sender labels, in first-seen order.
    pub senders: Vec<String>,
    pub count: usize,
    pub oldest: DateTime<Utc>,
    pub max_level: u8,
}

/// Escalated conversations grouped by level.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    buckets: [Vec<ConversationSnapshot>; LEVEL_COUNT],
    /// Messages across all listed conversations.
    pub total_messages: usize,
    /// Conversations listed in any bucket.
    pub total_conversations: usize,
}

impl Summary {
    /// Conversations at `level` (1-based), oldest first.
    pub fn bucket(&self, level: u8) -> &[ConversationSnapshot] {
        level
            .checked_sub(1)
            .and_then(|i| self.buckets.get(usize::from(i)))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.total_conversations == 0
    }
}

struct Accumulator<'a> {
    title: Option<&'a str>,
    senders: Vec<String>,
    seen_senders: BTreeSet<&'a str>,
    count: usize,
    oldest: DateTime<Utc>,
    max_level: u8,
}

/// Builds the summary for a snapshot of the pending store.
pub fn summarize<'a>(entries: impl IntoIterator<Item = &'a PendingEntry>) -> Summary {
    let mut by_conversation: BTreeMap<&'a str, Accumulator<'a>> = BTreeMap::new();

    for entry in entries {
        let acc = by_conversation
            .entry(entry.conversation_id())
            .or_insert_with(|| Accumulator {
                title: None,
                senders: Vec::new(),
                seen_senders: BTreeSet::new(),
                count: 0,
                oldest: entry.inserted_at,
                max_level: 0,
            });
        acc.count += 1;
        acc.oldest = acc.oldest.min(entry.inserted_at);
        acc.max_level = acc.max_level.max(entry.current_level);
        if acc.title.is_none() {
            acc.title = entry.conversation_title.as_deref();
        }
        if acc.seen_senders.insert(entry.key.sender_id.as_str()) {
            acc.senders.push(entry.sender_label());
        }
    }

    let mut summary = Summary::default();
    for (conversation_id, acc) in by_conversation {
        if acc.max_level == 0 {
            continue;
        }
        let index = usize::from(acc.max_level.min(LEVEL_COUNT as u8) - 1);
        summary.total_messages += acc.count;
        summary.total_conversations += 1;
        summary.buckets[index].push(ConversationSnapshot {
            conversation_id: conversation_id.to_string(),
            title: acc.title.map(str::to_string),
            senders: acc.senders,
            count: acc.count,
            oldest: acc.oldest,
            max_level: acc.max_level,
        });
    }
    for bucket in &mut summary.buckets {
        bucket.sort_by(|a, b| {
            a.oldest
                .cmp(&b.oldest)
                .then_with(|| a.conversation_id.cmp(&b.conversation_id))
        });
    }
    summary
}
