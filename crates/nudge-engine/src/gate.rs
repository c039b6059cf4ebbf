// SPDX-FileCopyrightText: 2026 Nudge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Out-of-hours acknowledgment flags.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use nudge_core::{ChatKind, InboundEvent};

/// Per conversation-or-user record of "acknowledgment already sent".
///
/// Groups are keyed `chat_<id>`, private chats `user_<id>`; a private
/// chat's id is the customer's user id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AutoReplyGate {
    flags: BTreeMap<String, bool>,
}

impl AutoReplyGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gate key for the conversation an event arrived in.
    pub fn key_for(event: &InboundEvent) -> String {
        match event.chat_kind {
            ChatKind::Group => format!("chat_{}", event.conversation_id),
            ChatKind::Private => format!("user_{}", event.conversation_id),
        }
    }

    pub fn should_send_ack(&self, key: &str) -> bool {
        !self.flags.get(key).copied().unwrap_or(false)
    }

    pub fn mark_sent(&mut self, key: &str) {
        self.flags.insert(key.to_string(), true);
    }

    /// Clears the flag. Returns `true` if it was set.
    pub fn clear(&mut self, key: &str) -> bool {
        self.flags.remove(key).unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.flags.values().filter(|&&v| v).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(kind: ChatKind) -> InboundEvent {
        let conversation_id = match kind {
            ChatKind::Group => "-100",
            ChatKind::Private => "42",
        };
        InboundEvent {
            conversation_id: conversation_id.into(),
            conversation_title: None,
            chat_kind: kind,
            sender_id: "42".into(),
            sender_handle: None,
            display_name: None,
            message_id: "1".into(),
            text: Some("hi".into()),
            is_command: false,
            is_service_event: false,
            timestamp: chrono::Utc::now(),
        }
    }

    #[test]
    fn keys_depend_on_chat_kind() {
        assert_eq!(AutoReplyGate::key_for(&event(ChatKind::Group)), "chat_-100");
        assert_eq!(AutoReplyGate::key_for(&event(ChatKind::Private)), "user_42");
    }

    #[test]
    fn ack_is_sent_once_until_cleared() {
        let mut gate = AutoReplyGate::new();
        assert!(gate.should_send_ack("user_42"));
        gate.mark_sent("user_42");
        assert!(!gate.should_send_ack("user_42"));
        assert!(gate.clear("user_42"));
        assert!(!gate.clear("user_42"));
        assert!(gate.should_send_ack("user_42"));
    }

    #[test]
    fn persisted_as_flat_map() {
        let mut gate = AutoReplyGate::new();
        gate.mark_sent("chat_-5");
        assert_eq!(
            serde_json::to_value(&gate).unwrap(),
            serde_json::json!({"chat_-5": true})
        );
    }
}
