// SPDX-FileCopyrightText: 2026 Nudge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end engine testing.
//!
//! `TestHarness` wires an [`Engine`] to a [`MockChannel`], a
//! [`MemoryStorage`] and a [`ManualClock`] that starts on a Monday at
//! 10:00 Moscow time, inside the default business hours.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};

use nudge_config::model::NudgeConfig;
use nudge_core::{InboundEvent, ManualClock, NudgeError, OutboundMessage};
use nudge_engine::{Engine, InboundOutcome};

use crate::events::EventBuilder;
use crate::memory_storage::MemoryStorage;
use crate::mock_channel::MockChannel;

/// Chat that receives summaries unless the builder says otherwise.
pub const STAFF_CHAT: &str = "-900";

/// Staff member seeded by default.
pub const STAFF_ID: &str = "1000";

/// Monday 2026-03-02 10:00 Europe/Moscow.
pub fn monday_morning() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 7, 0, 0)
        .single()
        .unwrap_or_default()
}

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    config: NudgeConfig,
    start: DateTime<Utc>,
    storage: Option<Arc<MemoryStorage>>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        let mut config = NudgeConfig::default();
        config.notify.chat_id = Some(STAFF_CHAT.to_string());
        config.staff.ids = vec![1000];
        config.staff.usernames = vec!["support_lead".to_string()];
        Self {
            config,
            start: monday_morning(),
            storage: None,
        }
    }

    /// Adjust the configuration.
    pub fn with_config(mut self, edit: impl FnOnce(&mut NudgeConfig)) -> Self {
        edit(&mut self.config);
        self
    }

    /// Start without a summary destination.
    pub fn without_destination(mut self) -> Self {
        self.config.notify.chat_id = None;
        self
    }

    pub fn starting_at(mut self, start: DateTime<Utc>) -> Self {
        self.start = start;
        self
    }

    /// Reuse an existing store, e.g. to simulate a restart.
    pub fn with_storage(mut self, storage: Arc<MemoryStorage>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub async fn build(self) -> Result<TestHarness, NudgeError> {
        let channel = Arc::new(MockChannel::new());
        let storage = self.storage.unwrap_or_default();
        let clock = Arc::new(ManualClock::new(self.start));
        let engine = Engine::load(
            &self.config,
            channel.clone(),
            storage.clone(),
            clock.clone(),
        )
        .await?;

        Ok(TestHarness {
            engine: Arc::new(engine),
            channel,
            storage,
            clock,
            config: self.config,
        })
    }
}

/// A complete engine with mock collaborators.
pub struct TestHarness {
    pub engine: Arc<Engine>,
    pub channel: Arc<MockChannel>,
    pub storage: Arc<MemoryStorage>,
    pub clock: Arc<ManualClock>,
    pub config: NudgeConfig,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Move the manual clock forward.
    pub fn advance_minutes(&self, minutes: i64) {
        self.clock.advance(Duration::minutes(minutes));
    }

    pub async fn deliver(&self, event: InboundEvent) -> Result<InboundOutcome, NudgeError> {
        self.engine.handle_inbound(event).await
    }

    /// A customer message in a group.
    pub async fn customer_says(
        &self,
        conversation_id: &str,
        sender_id: &str,
        text: &str,
    ) -> Result<InboundOutcome, NudgeError> {
        self.deliver(EventBuilder::group(conversation_id, sender_id).text(text).build())
            .await
    }

    /// The default staff member writes in a group.
    pub async fn staff_replies(&self, conversation_id: &str) -> Result<InboundOutcome, NudgeError> {
        self.deliver(
            EventBuilder::group(conversation_id, STAFF_ID)
                .text("on it")
                .build(),
        )
        .await
    }

    /// Summaries sent to the staff chat.
    pub async fn summaries(&self) -> Vec<OutboundMessage> {
        self.channel.sent_to(STAFF_CHAT).await
    }

    /// A fresh engine over the same storage, as after a process restart.
    pub async fn restart(&self) -> Result<TestHarness, NudgeError> {
        let config = self.config.clone();
        TestHarness::builder()
            .with_config(|c| *c = config)
            .with_storage(self.storage.clone())
            .starting_at(nudge_core::Clock::now(self.clock.as_ref()))
            .build()
            .await
    }
}
