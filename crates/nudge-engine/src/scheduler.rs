// SPDX-FileCopyrightText: 2026 Nudge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Periodic escalation tick.
//!
//! One task, one timer. Each tick is awaited to completion before the next
//! timer poll, so ticks never overlap; a tick that overruns the period delays
//! the next one. Cancellation is observed only between ticks.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use nudge_config::model::SchedulerConfig;
use nudge_core::NudgeError;

use crate::engine::Engine;

/// Drives [`Engine::tick`] on a fixed period.
pub struct EscalationScheduler {
    engine: Arc<Engine>,
    interval: Duration,
    warmup: Duration,
}

impl EscalationScheduler {
    pub fn new(engine: Arc<Engine>, interval: Duration, warmup: Duration) -> Self {
        Self {
            engine,
            interval,
            warmup,
        }
    }

    pub fn from_config(engine: Arc<Engine>, config: &SchedulerConfig) -> Self {
        Self::new(
            engine,
            Duration::from_secs(config.interval_secs.max(1)),
            Duration::from_secs(config.warmup_secs),
        )
    }

    /// Spawns [`run`](Self::run) on the current runtime.
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(cancel))
    }

    /// Ticks until `cancel` fires.
    pub async fn run(self, cancel: CancellationToken) {
        info!(
            interval_secs = self.interval.as_secs(),
            warmup_secs = self.warmup.as_secs(),
            "escalation scheduler started"
        );

        let mut ticker = tokio::time::interval_at(Instant::now() + self.warmup, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    match self.engine.tick().await {
                        Ok(outcome) => debug!(?outcome, "escalation tick complete"),
                        Err(NudgeError::NotConfigured(what)) => {
                            debug!(%what, "escalation tick: summary not dispatched");
                        }
                        Err(e) => warn!(error = %e, "escalation tick failed, retrying next period"),
                    }
                }
            }
        }
        info!("escalation scheduler stopped");
    }
}
