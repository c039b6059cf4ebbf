// SPDX-FileCopyrightText: 2026 Nudge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scheduler timing under paused tokio time.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use nudge_engine::EscalationScheduler;
use nudge_test_utils::{EventBuilder, TestHarness};

#[tokio::test(start_paused = true)]
async fn first_tick_waits_for_warmup_then_repeats() {
    let h = TestHarness::builder().build().await.unwrap();
    h.customer_says("-100", "7", "hello").await.unwrap();
    h.advance_minutes(61);

    let cancel = CancellationToken::new();
    let task = EscalationScheduler::new(
        h.engine.clone(),
        Duration::from_secs(900),
        Duration::from_secs(30),
    )
    .spawn(cancel.clone());

    tokio::time::sleep(Duration::from_secs(29)).await;
    assert!(h.summaries().await.is_empty(), "no tick during warm-up");

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(h.summaries().await.len(), 1);

    // Second tick: manual clock has not moved, so the cooldown holds.
    tokio::time::sleep(Duration::from_secs(900)).await;
    assert_eq!(h.summaries().await.len(), 1);

    // Third tick after the cooldown has elapsed on the engine's clock.
    h.advance_minutes(11);
    tokio::time::sleep(Duration::from_secs(900)).await;
    assert_eq!(h.summaries().await.len(), 2);

    cancel.cancel();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn cancellation_during_warmup_stops_cleanly() {
    let h = TestHarness::builder().build().await.unwrap();
    h.customer_says("-100", "7", "hello").await.unwrap();
    h.advance_minutes(61);

    let cancel = CancellationToken::new();
    let task = EscalationScheduler::from_config(h.engine.clone(), &h.config.scheduler)
        .spawn(cancel.clone());
    cancel.cancel();
    task.await.unwrap();

    tokio::time::sleep(Duration::from_secs(3600)).await;
    assert!(h.summaries().await.is_empty());
}

#[tokio::test]
async fn inbound_loop_stops_when_channel_closes() {
    let h = TestHarness::builder().build().await.unwrap();
    h.channel
        .inject(EventBuilder::group("-100", "7").build())
        .await;
    h.channel.close();

    h.engine.run(CancellationToken::new()).await.unwrap();
    assert_eq!(h.engine.pending_entries().await.len(), 1);
}
