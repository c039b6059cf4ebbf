// SPDX-FileCopyrightText: 2026 Nudge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock channel adapter for deterministic testing.
//!
//! `MockChannel` implements `ChannelAdapter` with injectable inbound events,
//! captured sends and deletions, and switchable failures.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};

use nudge_core::{
    AdapterType, ChannelAdapter, HealthStatus, InboundEvent, MessageId, NudgeError,
    OutboundMessage, PluginAdapter,
};

/// A mock messaging channel for testing.
///
/// Sent messages get sequential ids `"1"`, `"2"`, ... in send order.
pub struct MockChannel {
    inbound: Mutex<VecDeque<InboundEvent>>,
    sent: Mutex<Vec<OutboundMessage>>,
    deleted: Mutex<Vec<(String, MessageId)>>,
    notify: Notify,
    next_id: AtomicU64,
    fail_sends: AtomicBool,
    fail_deletes: AtomicBool,
    closed: AtomicBool,
    delay: std::sync::Mutex<Option<Duration>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

/// Marks one send or delete as running until dropped.
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl MockChannel {
    pub fn new() -> Self {
        Self {
            inbound: Mutex::new(VecDeque::new()),
            sent: Mutex::new(Vec::new()),
            deleted: Mutex::new(Vec::new()),
            notify: Notify::new(),
            next_id: AtomicU64::new(0),
            fail_sends: AtomicBool::new(false),
            fail_deletes: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            delay: std::sync::Mutex::new(None),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
        }
    }

    /// Queue an event for `receive()`.
    pub async fn inject(&self, event: InboundEvent) {
        self.inbound.lock().await.push_back(event);
        self.notify.notify_one();
    }

    /// After the queue drains, `receive()` reports a closed channel.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.notify.notify_one();
    }

    pub async fn sent_messages(&self) -> Vec<OutboundMessage> {
        self.sent.lock().await.clone()
    }

    /// Messages sent to one chat.
    pub async fn sent_to(&self, chat_id: &str) -> Vec<OutboundMessage> {
        self.sent
            .lock()
            .await
            .iter()
            .filter(|m| m.chat_id == chat_id)
            .cloned()
            .collect()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    /// Successful deletions, in call order.
    pub async fn deleted(&self) -> Vec<(String, MessageId)> {
        self.deleted.lock().await.clone()
    }

    pub async fn clear_sent(&self) {
        self.sent.lock().await.clear();
    }

    pub fn fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    /// Delay every send and delete by `delay` (tokio time).
    pub fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.lock().unwrap_or_else(|e| e.into_inner()) = delay;
    }

    /// Most sends and deletes ever running at once.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    fn enter(&self) -> InFlight<'_> {
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(running, Ordering::SeqCst);
        InFlight(&self.in_flight)
    }

    async fn simulate_latency(&self) {
        let delay = *self.delay.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

impl Default for MockChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockChannel {
    fn name(&self) -> &str {
        "mock-channel"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, NudgeError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), NudgeError> {
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for MockChannel {
    async fn connect(&mut self) -> Result<(), NudgeError> {
        Ok(())
    }

    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, NudgeError> {
        let _call = self.enter();
        self.simulate_latency().await;
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(NudgeError::channel("mock send failure"));
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.sent.lock().await.push(msg);
        Ok(MessageId(id.to_string()))
    }

    async fn delete(&self, chat_id: &str, message_id: &MessageId) -> Result<(), NudgeError> {
        let _call = self.enter();
        self.simulate_latency().await;
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(NudgeError::channel("mock delete failure: message not found"));
        }
        self.deleted
            .lock()
            .await
            .push((chat_id.to_string(), message_id.clone()));
        Ok(())
    }

    async fn receive(&self) -> Result<InboundEvent, NudgeError> {
        loop {
            {
                let mut queue = self.inbound.lock().await;
                if let Some(event) = queue.pop_front() {
                    return Ok(event);
                }
                if self.closed.load(Ordering::SeqCst) {
                    return Err(NudgeError::channel("mock channel closed"));
                }
            }
            self.notify.notified().await;
        }
    }
}
