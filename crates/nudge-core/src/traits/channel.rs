// SPDX-FileCopyrightText: 2026 Nudge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Channel adapter trait for messaging platform integrations (Telegram, etc.).

use async_trait::async_trait;

use crate::error::NudgeError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{InboundEvent, MessageId, OutboundMessage};

/// Adapter for the chat transport.
///
/// Delivers inbound customer/staff messages to the engine and carries
/// summaries, acknowledgments and retractions back out. Every call may be
/// slow or fail; callers bound them with a timeout.
#[async_trait]
pub trait ChannelAdapter: PluginAdapter {
    /// Establishes a connection to the messaging platform.
    async fn connect(&mut self) -> Result<(), NudgeError>;

    /// Sends a message and returns the handle needed to retract it.
    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, NudgeError>;

    /// Deletes a previously sent message.
    async fn delete(&self, chat_id: &str, message_id: &MessageId) -> Result<(), NudgeError>;

    /// Receives the next inbound event from the channel.
    async fn receive(&self) -> Result<InboundEvent, NudgeError>;
}
