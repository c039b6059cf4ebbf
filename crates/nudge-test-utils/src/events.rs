// SPDX-FileCopyrightText: 2026 Nudge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Builder for inbound events.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};

use nudge_core::{ChatKind, InboundEvent};

static NEXT_MESSAGE_ID: AtomicU64 = AtomicU64::new(1);

/// Fluent constructor for [`InboundEvent`]s. Message ids are unique per process.
#[derive(Debug, Clone)]
pub struct EventBuilder {
    event: InboundEvent,
}

impl EventBuilder {
    fn new(kind: ChatKind, conversation_id: &str, sender_id: &str) -> Self {
        let message_id = NEXT_MESSAGE_ID.fetch_add(1, Ordering::Relaxed);
        Self {
            event: InboundEvent {
                conversation_id: conversation_id.to_string(),
                conversation_title: None,
                chat_kind: kind,
                sender_id: sender_id.to_string(),
                sender_handle: None,
                display_name: None,
                message_id: message_id.to_string(),
                text: Some("hello".to_string()),
                is_command: false,
                is_service_event: false,
                timestamp: Utc::now(),
            },
        }
    }

    /// A message in a group chat.
    pub fn group(conversation_id: &str, sender_id: &str) -> Self {
        Self::new(ChatKind::Group, conversation_id, sender_id)
    }

    /// A message in the sender's private chat with the bot.
    pub fn private(sender_id: &str) -> Self {
        Self::new(ChatKind::Private, sender_id, sender_id)
    }

    pub fn text(mut self, text: &str) -> Self {
        self.event.text = Some(text.to_string());
        self
    }

    /// Media without caption.
    pub fn no_text(mut self) -> Self {
        self.event.text = None;
        self
    }

    /// A slash command.
    pub fn command(mut self, text: &str) -> Self {
        self.event.text = Some(text.to_string());
        self.event.is_command = true;
        self
    }

    pub fn service(mut self) -> Self {
        self.event.is_service_event = true;
        self.event.text = None;
        self
    }

    pub fn handle(mut self, handle: &str) -> Self {
        self.event.sender_handle = Some(handle.to_string());
        self
    }

    pub fn display_name(mut self, name: &str) -> Self {
        self.event.display_name = Some(name.to_string());
        self
    }

    pub fn title(mut self, title: &str) -> Self {
        self.event.conversation_title = Some(title.to_string());
        self
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.event.timestamp = timestamp;
        self
    }

    pub fn build(self) -> InboundEvent {
        self.event
    }
}
