// SPDX-FileCopyrightText: 2026 Nudge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Filtering and normalization of incoming Telegram messages.
//!
//! Decides which updates reach the engine at all, then maps the survivors
//! into a transport-agnostic [`InboundEvent`].

use nudge_core::{ChatKind, InboundEvent};
use teloxide::types::{Message, MessageKind, UserId};

/// Why a message was dropped before reaching the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Skip {
    /// Sent by this bot.
    OwnMessage,
    /// No sender, e.g. a channel post.
    NoSender,
    /// Channel chats are not monitored.
    UnsupportedChat,
}

/// Returns `Some(reason)` if the message must not be forwarded.
pub fn skip_reason(msg: &Message, bot_id: Option<UserId>) -> Option<Skip> {
    let Some(from) = msg.from.as_ref() else {
        return Some(Skip::NoSender);
    };
    if bot_id == Some(from.id) {
        return Some(Skip::OwnMessage);
    }
    if !(msg.chat.is_private() || msg.chat.is_group() || msg.chat.is_supergroup()) {
        return Some(Skip::UnsupportedChat);
    }
    None
}

/// Joins, leaves, pins, title changes and the like.
pub fn is_service_event(msg: &Message) -> bool {
    !matches!(msg.kind, MessageKind::Common(_))
}

/// Text of the message, or the media caption.
pub fn message_text(msg: &Message) -> Option<&str> {
    msg.text().or_else(|| msg.caption())
}

/// Bot commands start with `/`.
pub fn is_command(text: Option<&str>) -> bool {
    text.is_some_and(|t| t.trim_start().starts_with('/'))
}

pub fn chat_kind(msg: &Message) -> ChatKind {
    if msg.chat.is_private() {
        ChatKind::Private
    } else {
        ChatKind::Group
    }
}

/// Converts a Telegram message into an [`InboundEvent`].
pub fn to_inbound_event(msg: &Message) -> InboundEvent {
    let from = msg.from.as_ref();
    let text = message_text(msg).map(str::to_string);

    InboundEvent {
        conversation_id: msg.chat.id.0.to_string(),
        conversation_title: msg.chat.title().map(str::to_string),
        chat_kind: chat_kind(msg),
        sender_id: from
            .map(|u| u.id.0.to_string())
            .unwrap_or_else(|| "unknown".to_string()),
        sender_handle: from.and_then(|u| u.username.clone()),
        display_name: from.map(|u| u.first_name.clone()),
        message_id: msg.id.0.to_string(),
        is_command: is_command(text.as_deref()),
        is_service_event: is_service_event(msg),
        text,
        timestamp: msg.date,
    }
}
