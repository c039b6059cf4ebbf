// SPDX-FileCopyrightText: 2026 Nudge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end escalation tests: inbound routing, ticks, summaries, retraction.

use nudge_core::NudgeError;
use nudge_engine::{CycleOutcome, InboundOutcome};
use nudge_test_utils::{EventBuilder, TestHarness};

#[tokio::test]
async fn entry_climbs_the_funnel_and_summary_follows() {
    let h = TestHarness::builder().build().await.unwrap();
    let outcome = h.customer_says("-100", "7", "where is my order?").await.unwrap();
    assert!(matches!(outcome, InboundOutcome::Queued(_)));

    h.advance_minutes(59);
    assert!(matches!(h.engine.tick().await.unwrap(), CycleOutcome::Sent(_)));
    let quiet = h.summaries().await.pop().unwrap();
    assert!(quiet.content.contains("Nothing overdue"), "level 0 is not reported");
    assert!(!quiet.content.contains("Level"));

    // The quiet summary started the cooldown.
    h.advance_minutes(1);
    assert_eq!(h.engine.tick().await.unwrap(), CycleOutcome::Skipped);
    assert!(matches!(h.engine.request_cycle(true).await.unwrap(), CycleOutcome::Sent(_)));
    let summaries = h.summaries().await;
    assert_eq!(summaries.len(), 2);
    assert!(summaries[1].content.contains("Level 1"));

    h.advance_minutes(121); // t0 + 181m
    h.engine.tick().await.unwrap();
    let last = h.summaries().await.pop().unwrap();
    assert!(last.content.contains("Level 2"));
    assert!(!last.content.contains("Level 1"));

    h.advance_minutes(120); // t0 + 301m
    h.engine.tick().await.unwrap();
    let last = h.summaries().await.pop().unwrap();
    assert!(last.content.contains("Level 3"));

    // Each refresh retracted the previous summary.
    assert_eq!(h.channel.deleted().await.len(), 3);
    assert_eq!(h.engine.notification_state().await.handles.len(), 1);
    assert_eq!(h.engine.pending_entries().await[0].current_level, 3);
}

#[tokio::test]
async fn staff_reply_purges_and_refreshes_immediately() {
    let h = TestHarness::builder().build().await.unwrap();
    h.customer_says("-100", "7", "hello?").await.unwrap();
    h.customer_says("-200", "8", "anyone?").await.unwrap();
    h.advance_minutes(61);
    h.engine.tick().await.unwrap();
    assert_eq!(h.summaries().await.len(), 1);

    let outcome = h.staff_replies("-100").await.unwrap();
    assert_eq!(outcome, InboundOutcome::StaffReply { purged: 1 });

    // Forced cycle: old summary retracted, new one without -100.
    let summaries = h.summaries().await;
    assert_eq!(summaries.len(), 2);
    assert!(!summaries[1].content.contains("-100"));
    assert!(summaries[1].content.contains("-200"));
    assert_eq!(h.channel.deleted().await.len(), 1);
    assert!(h
        .engine
        .pending_entries()
        .await
        .iter()
        .all(|e| e.conversation_id() != "-100"));
}

#[tokio::test]
async fn last_staff_reply_leaves_a_zero_conversation_summary() {
    let h = TestHarness::builder().build().await.unwrap();
    h.customer_says("-100", "7", "hello?").await.unwrap();
    h.advance_minutes(61);
    h.engine.tick().await.unwrap();

    h.staff_replies("-100").await.unwrap();
    let summaries = h.summaries().await;
    assert_eq!(summaries.len(), 2);
    assert!(summaries[1].content.contains("0 chat(s)"));
    assert!(summaries[1].content.contains("Nothing overdue"));
    assert_eq!(h.channel.deleted().await.len(), 1);
    assert_eq!(h.engine.notification_state().await.handles.len(), 1);

    assert!(matches!(
        h.engine.request_cycle(true).await.unwrap(),
        CycleOutcome::Sent(_)
    ));
    assert!(h.summaries().await[2].content.contains("0 chat(s)"));
    assert_eq!(h.channel.deleted().await.len(), 2);
    assert_eq!(h.engine.status().await.summary.total_conversations, 0);
}

#[tokio::test]
async fn quiet_ticks_inside_the_cooldown_dispatch_once() {
    let h = TestHarness::builder().build().await.unwrap();
    assert!(h.engine.tick().await.unwrap().dispatched());
    h.advance_minutes(9);
    assert_eq!(h.engine.tick().await.unwrap(), CycleOutcome::Skipped);

    let summaries = h.summaries().await;
    assert_eq!(summaries.len(), 1);
    assert!(summaries[0].content.contains("Nothing overdue"));
    assert_eq!(
        h.engine.notification_state().await.last_dispatch,
        Some(nudge_test_utils::harness::monday_morning())
    );
}

#[tokio::test]
async fn staff_reply_with_nothing_pending_sends_nothing() {
    let h = TestHarness::builder().build().await.unwrap();
    let outcome = h.staff_replies("-100").await.unwrap();
    assert_eq!(outcome, InboundOutcome::StaffReply { purged: 0 });
    assert_eq!(h.channel.sent_count().await, 0);
}

#[tokio::test]
async fn staff_recognized_by_handle() {
    let h = TestHarness::builder().build().await.unwrap();
    h.customer_says("-100", "7", "hi").await.unwrap();
    let outcome = h
        .deliver(EventBuilder::group("-100", "555").handle("Support_Lead").build())
        .await
        .unwrap();
    assert_eq!(outcome, InboundOutcome::StaffReply { purged: 1 });
}

#[tokio::test]
async fn conversation_is_reported_once_at_its_highest_level() {
    let h = TestHarness::builder().build().await.unwrap();
    h.customer_says("A", "7", "first").await.unwrap();
    h.advance_minutes(241);
    h.customer_says("A", "7", "second").await.unwrap();
    h.advance_minutes(60); // first at 301m (level 3), second at 60m (level 1)
    h.engine.tick().await.unwrap();

    let status = h.engine.status().await;
    assert!(status.summary.bucket(1).is_empty());
    assert_eq!(status.summary.bucket(3).len(), 1);
    assert_eq!(status.summary.bucket(3)[0].count, 2);

    let text = &h.summaries().await[0].content;
    assert!(text.contains("Level 3"));
    assert!(!text.contains("Level 1"));
    assert_eq!(text.matches("- A:").count(), 1);
}

#[tokio::test]
async fn cooldown_and_forced_bypass() {
    let h = TestHarness::builder().build().await.unwrap();
    h.customer_says("-100", "7", "hello").await.unwrap();
    h.advance_minutes(61);

    assert!(h.engine.tick().await.unwrap().dispatched());
    h.advance_minutes(5);
    assert_eq!(h.engine.tick().await.unwrap(), CycleOutcome::Skipped);
    assert_eq!(h.summaries().await.len(), 1);

    assert!(h.engine.request_cycle(true).await.unwrap().dispatched());
    assert_eq!(h.summaries().await.len(), 2);
}

#[tokio::test]
async fn missing_destination_is_reported() {
    let h = TestHarness::builder().without_destination().build().await.unwrap();
    h.customer_says("-100", "7", "hello").await.unwrap();
    h.advance_minutes(61);

    let err = h.engine.request_cycle(true).await.unwrap_err();
    assert!(matches!(err, NudgeError::NotConfigured(_)));
    let err = h.engine.tick().await.unwrap_err();
    assert!(matches!(err, NudgeError::NotConfigured(_)));
    assert_eq!(h.channel.sent_count().await, 0);

    // Staff reply still purges even though no summary can be sent.
    assert_eq!(
        h.staff_replies("-100").await.unwrap(),
        InboundOutcome::StaffReply { purged: 1 }
    );
}

#[tokio::test]
async fn failed_send_is_retried_on_next_tick() {
    let h = TestHarness::builder().build().await.unwrap();
    h.customer_says("-100", "7", "hello").await.unwrap();
    h.advance_minutes(61);

    h.channel.fail_sends(true);
    assert!(h.engine.tick().await.unwrap_err().is_transport());

    h.channel.fail_sends(false);
    h.advance_minutes(1);
    assert!(matches!(h.engine.tick().await.unwrap(), CycleOutcome::Sent(_)));
}

#[tokio::test]
async fn retraction_failure_still_sends() {
    let h = TestHarness::builder().build().await.unwrap();
    h.customer_says("-100", "7", "hello").await.unwrap();
    h.advance_minutes(61);
    h.engine.tick().await.unwrap();

    h.channel.fail_deletes(true);
    assert!(h.engine.request_cycle(true).await.unwrap().dispatched());
    assert_eq!(h.summaries().await.len(), 2);
    assert_eq!(h.engine.notification_state().await.handles.len(), 2);
}

#[tokio::test]
async fn ignored_events() {
    let h = TestHarness::builder().build().await.unwrap();
    let service = EventBuilder::group("-100", "7").service().build();
    let blank = EventBuilder::group("-100", "7").text("   ").build();
    let customer_command = EventBuilder::group("-100", "7").command("/funnel 1 5").build();

    for event in [service, blank, customer_command] {
        assert_eq!(h.deliver(event).await.unwrap(), InboundOutcome::Ignored);
    }
    assert!(h.engine.pending_entries().await.is_empty());
    assert_eq!(h.engine.funnel().await.thresholds(), [60, 180, 300]);
    assert_eq!(h.channel.sent_count().await, 0);
}

#[tokio::test]
async fn media_without_caption_gets_placeholder() {
    let h = TestHarness::builder().build().await.unwrap();
    h.deliver(
        EventBuilder::group("-100", "7")
            .no_text()
            .title("Shop")
            .display_name("Ivan")
            .build(),
    )
    .await
    .unwrap();
    let entries = h.engine.pending_entries().await;
    assert_eq!(entries[0].text, "[message without text]");
    assert_eq!(entries[0].conversation_title.as_deref(), Some("Shop"));
    assert_eq!(entries[0].display_name.as_deref(), Some("Ivan"));
}

#[tokio::test]
async fn clear_pending_empties_the_store() {
    let h = TestHarness::builder().build().await.unwrap();
    h.customer_says("-100", "7", "a").await.unwrap();
    h.customer_says("-200", "8", "b").await.unwrap();
    assert_eq!(h.engine.clear_pending().await, 2);
    assert!(h.engine.pending_entries().await.is_empty());
    assert_eq!(
        h.storage.document("pending_messages").await.unwrap()["entries"],
        serde_json::json!([])
    );
}
