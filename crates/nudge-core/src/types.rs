// SPDX-FileCopyrightText: 2026 Nudge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across adapter traits and the Nudge engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Transport-assigned identifier for a sent message.
///
/// Returned by [`ChannelAdapter::send`](crate::ChannelAdapter::send) and
/// required to retract that message later.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the type of adapter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Channel,
    Storage,
}

/// Kind of conversation a message arrived in.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ChatKind {
    /// One-to-one chat; the conversation id equals the customer's user id.
    Private,
    /// Group or supergroup chat shared by several participants.
    Group,
}

/// A message received from a channel adapter, normalized for the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    /// Conversation (chat) the message belongs to.
    pub conversation_id: String,
    /// Human-readable conversation title, if the transport has one.
    pub conversation_title: Option<String>,
    /// Whether the conversation is private or a group.
    pub chat_kind: ChatKind,
    /// Numeric sender id as a string.
    pub sender_id: String,
    /// Sender handle without the leading `@`.
    pub sender_handle: Option<String>,
    /// Sender display name (first name on Telegram).
    pub display_name: Option<String>,
    /// Transport message id within the conversation.
    pub message_id: String,
    /// Text or caption. `None` for media without a caption.
    pub text: Option<String>,
    /// The message is a slash command.
    pub is_command: bool,
    /// The message is a service event (member joined, pin, etc.).
    pub is_service_event: bool,
    /// When the transport says the message was sent.
    pub timestamp: DateTime<Utc>,
}

/// An outbound message to be sent via a channel adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    /// Destination conversation id.
    pub chat_id: String,
    /// Plain text body.
    pub content: String,
    /// Message id to reply to, if any.
    pub reply_to: Option<String>,
}

impl OutboundMessage {
    /// Builds a plain message to a chat.
    pub fn text(chat_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            chat_id: chat_id.into(),
            content: content.into(),
            reply_to: None,
        }
    }

    /// Marks the message as a reply to `message_id`.
    pub fn replying_to(mut self, message_id: impl Into<String>) -> Self {
        self.reply_to = Some(message_id.into());
        self
    }
}
