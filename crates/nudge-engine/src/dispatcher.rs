// SPDX-FileCopyrightText: 2026 Nudge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Summary dispatch: retract the previous notifications, send a fresh one.
//!
//! A cycle walks `Idle -> Retracting -> Composing -> Sending -> Idle`, or
//! stops at `Skipped` when the cooldown has not elapsed and the cycle was not
//! forced. Every completed cycle sends a summary, even one reporting zero
//! conversations. `last_dispatch` advances only after a successful send, so a
//! failed send never starts the cooldown.

use std::collections::VecDeque;
use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use nudge_config::model::NotifyConfig;
use nudge_core::{ChannelAdapter, MessageId, NudgeError, OutboundMessage};

use crate::recording;

/// A sent summary that can still be retracted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveNotification {
    pub chat_id: String,
    pub message_id: MessageId,
}

/// Dispatcher bookkeeping, persisted between restarts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationState {
    /// Most recent first.
    #[serde(default)]
    pub handles: VecDeque<LiveNotification>,
    #[serde(default)]
    pub last_dispatch: Option<DateTime<Utc>>,
    /// Chat that receives summaries.
    #[serde(default)]
    pub destination: Option<String>,
}

/// Result of [`Dispatcher::request_cycle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// A new summary was sent.
    Sent(MessageId),
    /// Cooldown not elapsed; nothing happened.
    Skipped,
}

impl CycleOutcome {
    pub fn dispatched(&self) -> bool {
        !matches!(self, CycleOutcome::Skipped)
    }

    fn label(&self) -> &'static str {
        match self {
            CycleOutcome::Sent(_) => "sent",
            CycleOutcome::Skipped => "skipped",
        }
    }
}

/// Tunables for the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchSettings {
    pub cooldown: TimeDelta,
    pub max_live: usize,
    pub transport_timeout: Duration,
}

impl DispatchSettings {
    pub fn from_config(config: &NotifyConfig) -> Self {
        let cooldown = i64::try_from(config.cooldown_secs)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .unwrap_or(TimeDelta::MAX);
        Self {
            cooldown,
            max_live: config.max_live_notifications.max(1),
            transport_timeout: Duration::from_secs(config.transport_timeout_secs),
        }
    }
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self::from_config(&NotifyConfig::default())
    }
}

/// Bounds a transport call with a timeout.
pub(crate) async fn bounded<T>(
    timeout: Duration,
    call: impl Future<Output = Result<T, NudgeError>>,
) -> Result<T, NudgeError> {
    tokio::time::timeout(timeout, call)
        .await
        .map_err(|_| NudgeError::Timeout { duration: timeout })?
}

/// Owns [`NotificationState`] and runs refresh cycles against a channel.
#[derive(Debug)]
pub struct Dispatcher {
    state: NotificationState,
    settings: DispatchSettings,
}

impl Dispatcher {
    pub fn new(state: NotificationState, settings: DispatchSettings) -> Self {
        let mut state = state;
        state.handles.truncate(settings.max_live);
        Self { state, settings }
    }

    pub fn state(&self) -> &NotificationState {
        &self.state
    }

    pub fn settings(&self) -> &DispatchSettings {
        &self.settings
    }

    pub fn destination(&self) -> Option<&str> {
        self.state.destination.as_deref()
    }

    /// Routes future summaries to `chat_id`. Live handles keep their own chat.
    pub fn set_destination(&mut self, chat_id: impl Into<String>) {
        self.state.destination = Some(chat_id.into());
    }

    /// Time left until a non-forced cycle may run, if any.
    pub fn cooldown_remaining(&self, now: DateTime<Utc>) -> Option<TimeDelta> {
        let last = self.state.last_dispatch?;
        let remaining = self.settings.cooldown - (now - last);
        (remaining > TimeDelta::zero()).then_some(remaining)
    }

    /// Runs one refresh cycle.
    ///
    /// `compose` is called after retraction and returns the rendered summary.
    /// Retraction failures are logged and the handle is kept for a later
    /// attempt; a failed send aborts the cycle and leaves `last_dispatch`
    /// untouched.
    pub async fn request_cycle<F>(
        &mut self,
        force: bool,
        now: DateTime<Utc>,
        channel: &dyn ChannelAdapter,
        compose: F,
    ) -> Result<CycleOutcome, NudgeError>
    where
        F: FnOnce() -> String,
    {
        let destination = self
            .state
            .destination
            .clone()
            .ok_or_else(|| NudgeError::NotConfigured("notification destination".into()))?;

        if !force && let Some(remaining) = self.cooldown_remaining(now) {
            debug!(
                remaining_secs = remaining.num_seconds(),
                "dispatch skipped: cooldown active"
            );
            recording::record_dispatch(CycleOutcome::Skipped.label());
            return Ok(CycleOutcome::Skipped);
        }

        self.retract_all(channel).await;

        let text = compose();
        let sent = bounded(
            self.settings.transport_timeout,
            channel.send(OutboundMessage::text(destination.clone(), text)),
        )
        .await;
        let message_id = match sent {
            Ok(id) => id,
            Err(e) => {
                warn!(destination = %destination, error = %e, "failed to send summary");
                recording::record_dispatch("failed");
                return Err(e);
            }
        };

        self.mark_dispatched(now);
        self.state.handles.push_front(LiveNotification {
            chat_id: destination.clone(),
            message_id: message_id.clone(),
        });
        self.state.handles.truncate(self.settings.max_live);
        info!(destination = %destination, message_id = %message_id, force, "summary sent");

        let outcome = CycleOutcome::Sent(message_id);
        recording::record_dispatch(outcome.label());
        Ok(outcome)
    }

    async fn retract_all(&mut self, channel: &dyn ChannelAdapter) {
        let handles = std::mem::take(&mut self.state.handles);
        let mut kept = VecDeque::new();
        for live in handles {
            let result = bounded(
                self.settings.transport_timeout,
                channel.delete(&live.chat_id, &live.message_id),
            )
            .await;
            match result {
                Ok(()) => {
                    debug!(chat_id = %live.chat_id, message_id = %live.message_id, "summary retracted");
                }
                Err(e) => {
                    warn!(
                        chat_id = %live.chat_id,
                        message_id = %live.message_id,
                        error = %e,
                        "failed to retract summary, continuing"
                    );
                    recording::record_retraction_failure();
                    kept.push_back(live);
                }
            }
        }
        self.state.handles = kept;
    }

    fn mark_dispatched(&mut self, now: DateTime<Utc>) {
        let next = match self.state.last_dispatch {
            Some(last) => last.max(now),
            None => now,
        };
        self.state.last_dispatch = Some(next);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use nudge_test_utils::MockChannel;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 7, 0, 0).unwrap()
    }

    fn configured() -> Dispatcher {
        let mut dispatcher = Dispatcher::new(NotificationState::default(), DispatchSettings::default());
        dispatcher.set_destination("-900");
        dispatcher
    }

    fn text() -> String {
        "summary".to_string()
    }

    #[tokio::test]
    async fn missing_destination_fails_without_side_effects() {
        let channel = MockChannel::new();
        let mut dispatcher = Dispatcher::new(NotificationState::default(), DispatchSettings::default());
        let err = dispatcher
            .request_cycle(true, t0(), &channel, text)
            .await
            .unwrap_err();
        assert!(matches!(err, NudgeError::NotConfigured(_)));
        assert_eq!(channel.sent_count().await, 0);
        assert_eq!(dispatcher.state(), &NotificationState::default());
    }

    #[tokio::test]
    async fn cooldown_allows_one_dispatch() {
        let channel = MockChannel::new();
        let mut dispatcher = configured();

        let first = dispatcher.request_cycle(false, t0(), &channel, text).await.unwrap();
        let second = dispatcher
            .request_cycle(false, t0() + TimeDelta::seconds(599), &channel, text)
            .await
            .unwrap();
        assert!(first.dispatched());
        assert_eq!(second, CycleOutcome::Skipped);
        assert_eq!(channel.sent_count().await, 1);

        let third = dispatcher
            .request_cycle(false, t0() + TimeDelta::seconds(600), &channel, text)
            .await
            .unwrap();
        assert!(third.dispatched());
    }

    #[tokio::test]
    async fn forced_cycle_bypasses_cooldown_and_retracts_previous() {
        let channel = MockChannel::new();
        let mut dispatcher = configured();

        let CycleOutcome::Sent(first) = dispatcher.request_cycle(false, t0(), &channel, text).await.unwrap() else {
            panic!("expected a send");
        };
        let forced = dispatcher
            .request_cycle(true, t0() + TimeDelta::seconds(1), &channel, text)
            .await
            .unwrap();
        assert!(matches!(forced, CycleOutcome::Sent(_)));
        assert_eq!(channel.deleted().await, vec![("-900".to_string(), first)]);
        assert_eq!(dispatcher.state().handles.len(), 1);
    }

    #[tokio::test]
    async fn every_cycle_replaces_the_live_summary() {
        let channel = MockChannel::new();
        let mut dispatcher = configured();
        dispatcher.request_cycle(true, t0(), &channel, text).await.unwrap();

        let outcome = dispatcher
            .request_cycle(true, t0() + TimeDelta::minutes(1), &channel, || {
                "nothing overdue".to_string()
            })
            .await
            .unwrap();
        assert_eq!(outcome, CycleOutcome::Sent(MessageId("2".into())));
        assert_eq!(channel.sent_count().await, 2);
        assert_eq!(
            channel.deleted().await,
            vec![("-900".to_string(), MessageId("1".into()))]
        );
        assert_eq!(dispatcher.state().handles.len(), 1);
        assert_eq!(
            dispatcher.state().last_dispatch,
            Some(t0() + TimeDelta::minutes(1))
        );
    }

    #[tokio::test]
    async fn quiet_summary_starts_the_cooldown() {
        let channel = MockChannel::new();
        let mut dispatcher = configured();
        let first = dispatcher
            .request_cycle(false, t0(), &channel, || "nothing overdue".to_string())
            .await
            .unwrap();
        assert!(first.dispatched());

        let second = dispatcher
            .request_cycle(false, t0() + TimeDelta::minutes(1), &channel, text)
            .await
            .unwrap();
        assert_eq!(second, CycleOutcome::Skipped);
        assert_eq!(channel.sent_count().await, 1);
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn retraction_failure_does_not_abort() {
        let channel = MockChannel::new();
        let mut dispatcher = configured();
        dispatcher.request_cycle(true, t0(), &channel, text).await.unwrap();

        channel.fail_deletes(true);
        let outcome = dispatcher
            .request_cycle(true, t0() + TimeDelta::minutes(1), &channel, text)
            .await
            .unwrap();
        assert!(matches!(outcome, CycleOutcome::Sent(_)));
        assert_eq!(channel.sent_count().await, 2);
        // The failed handle is kept behind the new one.
        assert_eq!(dispatcher.state().handles.len(), 2);
        assert!(logs_contain("failed to retract summary"));
    }

    #[tokio::test]
    async fn send_failure_keeps_cooldown_open() {
        let channel = MockChannel::new();
        let mut dispatcher = configured();
        channel.fail_sends(true);

        let err = dispatcher.request_cycle(false, t0(), &channel, text).await.unwrap_err();
        assert!(err.is_transport());
        assert!(dispatcher.state().last_dispatch.is_none());

        channel.fail_sends(false);
        let retry = dispatcher
            .request_cycle(false, t0() + TimeDelta::seconds(1), &channel, text)
            .await
            .unwrap();
        assert!(retry.dispatched());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_transport_times_out() {
        let channel = MockChannel::new();
        channel.set_delay(Some(Duration::from_secs(60)));
        let mut dispatcher = configured();

        let err = dispatcher.request_cycle(true, t0(), &channel, text).await.unwrap_err();
        assert!(matches!(err, NudgeError::Timeout { .. }));
        assert!(dispatcher.state().last_dispatch.is_none());
    }

    #[tokio::test]
    async fn handle_list_is_bounded() {
        let channel = MockChannel::new();
        channel.fail_deletes(true);
        let mut dispatcher = configured();
        for i in 0..6 {
            dispatcher
                .request_cycle(true, t0() + TimeDelta::minutes(i), &channel, text)
                .await
                .unwrap();
        }
        assert_eq!(dispatcher.state().handles.len(), 3);
        assert_eq!(
            dispatcher.state().handles[0].message_id,
            MessageId("6".into()),
            "most recent first"
        );
    }

    #[tokio::test]
    async fn last_dispatch_never_moves_backwards() {
        let channel = MockChannel::new();
        let mut dispatcher = configured();
        let later = t0() + TimeDelta::hours(1);
        dispatcher.request_cycle(true, later, &channel, text).await.unwrap();
        dispatcher.request_cycle(true, t0(), &channel, text).await.unwrap();
        assert_eq!(dispatcher.state().last_dispatch, Some(later));
    }
}
