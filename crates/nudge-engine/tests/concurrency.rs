// SPDX-FileCopyrightText: 2026 Nudge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ticks, inbound events and admin changes serialize on the engine state.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use nudge_core::MessageId;
use nudge_engine::{CycleOutcome, EscalationScheduler, InboundOutcome, StaffIdentity};
use nudge_test_utils::TestHarness;
use nudge_test_utils::harness::STAFF_CHAT;

async fn two_overdue_chats() -> TestHarness {
    let h = TestHarness::builder().build().await.unwrap();
    h.customer_says("-100", "7", "hello").await.unwrap();
    h.customer_says("-200", "8", "anyone?").await.unwrap();
    h.advance_minutes(61);
    h
}

#[tokio::test(start_paused = true)]
async fn slow_tick_defers_the_next_one() {
    let h = TestHarness::builder()
        .with_config(|c| {
            c.notify.cooldown_secs = 0;
            c.notify.transport_timeout_secs = 3000;
        })
        .build()
        .await
        .unwrap();
    h.customer_says("-100", "7", "hello").await.unwrap();
    h.advance_minutes(61);
    // Every send and delete outlasts the 900s interval.
    h.channel.set_delay(Some(Duration::from_secs(1000)));

    let cancel = CancellationToken::new();
    let task = EscalationScheduler::new(
        h.engine.clone(),
        Duration::from_secs(900),
        Duration::from_secs(30),
    )
    .spawn(cancel.clone());

    // First tick sends at 1030s; the tick due at 930s waits for it and is
    // still retracting.
    tokio::time::sleep(Duration::from_secs(1500)).await;
    assert_eq!(h.summaries().await.len(), 1);
    assert!(h.channel.deleted().await.is_empty());

    // Second tick: retraction done at 2030s, send at 3030s.
    tokio::time::sleep(Duration::from_secs(1600)).await;
    assert_eq!(h.summaries().await.len(), 2);
    assert_eq!(
        h.channel.deleted().await,
        vec![(STAFF_CHAT.to_string(), MessageId("1".into()))]
    );

    tokio::time::sleep(Duration::from_secs(5000)).await;
    cancel.cancel();
    task.await.unwrap();

    assert_eq!(h.channel.peak_in_flight(), 1);
    let deleted: Vec<String> = h
        .channel
        .deleted()
        .await
        .into_iter()
        .map(|(_, id)| id.0)
        .collect();
    let expected: Vec<String> = (1..=deleted.len()).map(|n| n.to_string()).collect();
    assert_eq!(deleted, expected, "each cycle retracts the one before it");
    let handles = h.engine.notification_state().await.handles;
    assert!(handles.len() <= h.config.notify.max_live_notifications);
    assert_eq!(handles.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn customer_message_waits_for_a_running_cycle() {
    let h = two_overdue_chats().await;
    h.channel.set_delay(Some(Duration::from_secs(10)));

    let (cycle, queued) = tokio::join!(
        h.engine.request_cycle(true),
        h.customer_says("-300", "9", "me too"),
    );
    assert_eq!(cycle.unwrap(), CycleOutcome::Sent(MessageId("1".into())));
    assert!(matches!(queued.unwrap(), InboundOutcome::Queued(_)));

    assert!(h.summaries().await[0].content.contains("in 2 chat(s)"));
    assert_eq!(h.engine.pending_entries().await.len(), 3);

    h.advance_minutes(61);
    h.engine.request_cycle(true).await.unwrap();
    assert!(h.summaries().await[1].content.contains("in 3 chat(s)"));
    assert_eq!(h.channel.peak_in_flight(), 1);
}

#[tokio::test(start_paused = true)]
async fn forced_cycle_then_staff_reply_run_in_arrival_order() {
    let h = two_overdue_chats().await;
    h.channel.set_delay(Some(Duration::from_secs(10)));

    let (cycle, reply) = tokio::join!(h.engine.request_cycle(true), h.staff_replies("-100"));
    assert_eq!(cycle.unwrap(), CycleOutcome::Sent(MessageId("1".into())));
    assert_eq!(reply.unwrap(), InboundOutcome::StaffReply { purged: 1 });

    let summaries = h.summaries().await;
    assert_eq!(summaries.len(), 2);
    assert!(summaries[0].content.contains("-100"));
    assert!(!summaries[1].content.contains("-100"));
    assert!(summaries[1].content.contains("-200"));
    assert_eq!(
        h.channel.deleted().await,
        vec![(STAFF_CHAT.to_string(), MessageId("1".into()))]
    );
    assert_eq!(h.engine.notification_state().await.handles.len(), 1);
    assert_eq!(h.channel.peak_in_flight(), 1);
}

#[tokio::test(start_paused = true)]
async fn staff_reply_then_forced_cycle_never_reports_the_answered_chat() {
    let h = two_overdue_chats().await;
    h.channel.set_delay(Some(Duration::from_secs(10)));

    let (reply, cycle) = tokio::join!(h.staff_replies("-100"), h.engine.request_cycle(true));
    assert_eq!(reply.unwrap(), InboundOutcome::StaffReply { purged: 1 });
    assert_eq!(cycle.unwrap(), CycleOutcome::Sent(MessageId("2".into())));

    let summaries = h.summaries().await;
    assert_eq!(summaries.len(), 2);
    assert!(summaries.iter().all(|s| !s.content.contains("-100")));
    assert_eq!(h.channel.peak_in_flight(), 1);
}

#[tokio::test(start_paused = true)]
async fn staff_status_is_decided_when_the_reply_is_handled() {
    let h = two_overdue_chats().await;
    h.channel.set_delay(Some(Duration::from_secs(10)));

    // The reply queues behind the running cycle, ahead of the removal.
    let (_, reply, removed) = tokio::join!(
        h.engine.request_cycle(true),
        h.staff_replies("-100"),
        h.engine.remove_staff(&StaffIdentity::Id(1000)),
    );
    assert_eq!(reply.unwrap(), InboundOutcome::StaffReply { purged: 1 });
    assert!(removed);

    let remaining = h.engine.pending_entries().await;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].conversation_id(), "-200");

    // Once removed, the same sender is a customer.
    assert!(matches!(
        h.staff_replies("-200").await.unwrap(),
        InboundOutcome::Queued(_)
    ));
}
