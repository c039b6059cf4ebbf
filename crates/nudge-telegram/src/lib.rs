// SPDX-FileCopyrightText: 2026 Nudge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telegram channel adapter for Nudge.
//!
//! Implements [`ChannelAdapter`] over the Telegram Bot API via teloxide:
//! long polling for inbound messages, plain-text sends with optional reply
//! threading, and message deletion for summary retraction.

pub mod handler;

use std::sync::Mutex;

use async_trait::async_trait;
use nudge_config::model::TelegramConfig;
use nudge_core::{
    AdapterType, ChannelAdapter, HealthStatus, InboundEvent, MessageId, NudgeError,
    OutboundMessage, PluginAdapter,
};
use teloxide::prelude::*;
use teloxide::types::ReplyParameters;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Telegram channel adapter implementing [`ChannelAdapter`].
pub struct TelegramChannel {
    bot: Bot,
    inbound_rx: tokio::sync::Mutex<mpsc::Receiver<InboundEvent>>,
    inbound_tx: mpsc::Sender<InboundEvent>,
    polling_handle: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl TelegramChannel {
    /// Creates a new Telegram channel adapter.
    ///
    /// Requires `config.bot_token` to be set.
    pub fn new(config: &TelegramConfig) -> Result<Self, NudgeError> {
        let token = config.bot_token.as_deref().ok_or_else(|| {
            NudgeError::Config("telegram.bot_token is required for Telegram adapter".into())
        })?;

        if token.is_empty() {
            return Err(NudgeError::Config(
                "telegram.bot_token cannot be empty".into(),
            ));
        }

        let (inbound_tx, inbound_rx) = mpsc::channel(100);
        Ok(Self {
            bot: Bot::new(token),
            inbound_rx: tokio::sync::Mutex::new(inbound_rx),
            inbound_tx,
            polling_handle: Mutex::new(None),
        })
    }

    pub fn bot(&self) -> &Bot {
        &self.bot
    }
}

#[async_trait]
impl PluginAdapter for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, NudgeError> {
        match self.bot.get_me().await {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(format!(
                "Telegram bot unreachable: {e}"
            ))),
        }
    }

    async fn shutdown(&self) -> Result<(), NudgeError> {
        debug!("Telegram channel shutting down");
        let handle = self
            .polling_handle
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(handle) = handle {
            handle.abort();
        }
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for TelegramChannel {
    async fn connect(&mut self) -> Result<(), NudgeError> {
        if self
            .polling_handle
            .get_mut()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
        {
            return Ok(());
        }

        // Needed to drop our own summaries when they echo back through group updates.
        let me = self.bot.get_me().await.map_err(|e| NudgeError::Channel {
            message: format!("failed to identify bot: {e}"),
            source: Some(Box::new(e)),
        })?;
        let bot_id = Some(me.user.id);
        info!(username = ?me.user.username, "starting Telegram long polling");

        let bot = self.bot.clone();
        let tx = self.inbound_tx.clone();
        let handle = tokio::spawn(async move {
            let handler = Update::filter_message().endpoint(move |msg: Message| {
                let tx = tx.clone();
                async move {
                    if let Some(reason) = handler::skip_reason(&msg, bot_id) {
                        debug!(chat_id = msg.chat.id.0, ?reason, "ignoring message");
                        return respond(());
                    }
                    let event = handler::to_inbound_event(&msg);
                    if tx.send(event).await.is_err() {
                        warn!("inbound channel closed, dropping message");
                    }
                    respond(())
                }
            });

            // Edited messages and other update kinds fall through to the default handler.
            Dispatcher::builder(bot, handler)
                .default_handler(|_| async {})
                .build()
                .dispatch()
                .await;
        });

        *self
            .polling_handle
            .get_mut()
            .unwrap_or_else(|e| e.into_inner()) = Some(handle);
        Ok(())
    }

    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, NudgeError> {
        let chat_id = parse_chat_id(&msg.chat_id)?;
        let mut request = self.bot.send_message(chat_id, &msg.content);
        if let Some(reply_to) = msg.reply_to.as_deref() {
            request = request.reply_parameters(ReplyParameters::new(parse_message_id(reply_to)?));
        }

        let sent = request.await.map_err(|e| NudgeError::Channel {
            message: format!("failed to send message: {e}"),
            source: Some(Box::new(e)),
        })?;
        Ok(MessageId(sent.id.0.to_string()))
    }

    async fn delete(&self, chat_id: &str, message_id: &MessageId) -> Result<(), NudgeError> {
        let chat_id = parse_chat_id(chat_id)?;
        let msg_id = parse_message_id(&message_id.0)?;
        self.bot
            .delete_message(chat_id, msg_id)
            .await
            .map_err(|e| NudgeError::Channel {
                message: format!("failed to delete message: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(())
    }

    async fn receive(&self) -> Result<InboundEvent, NudgeError> {
        let mut rx = self.inbound_rx.lock().await;
        rx.recv()
            .await
            .ok_or_else(|| NudgeError::channel("Telegram inbound channel closed"))
    }
}

fn parse_chat_id(chat_id: &str) -> Result<ChatId, NudgeError> {
    chat_id
        .trim()
        .parse::<i64>()
        .map(ChatId)
        .map_err(|e| NudgeError::channel(format!("invalid chat_id `{chat_id}`: {e}")))
}

fn parse_message_id(message_id: &str) -> Result<teloxide::types::MessageId, NudgeError> {
    message_id
        .trim()
        .parse::<i32>()
        .map(teloxide::types::MessageId)
        .map_err(|e| NudgeError::channel(format!("invalid message_id `{message_id}`: {e}")))
}
