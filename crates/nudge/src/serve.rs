// SPDX-FileCopyrightText: 2026 Nudge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `nudge serve` command implementation.
//!
//! Wires SQLite storage, the Telegram channel and the system clock into an
//! [`Engine`], then runs the inbound loop and the escalation scheduler until
//! SIGINT or SIGTERM.

use std::sync::Arc;

use nudge_config::model::NudgeConfig;
use nudge_core::{ChannelAdapter, NudgeError, PluginAdapter, StorageAdapter, SystemClock};
use nudge_engine::{Engine, EscalationScheduler, recording, shutdown};
use nudge_storage::SqliteStorage;
use nudge_telegram::TelegramChannel;
use tracing::{error, info, warn};

/// Runs the `nudge serve` command.
pub async fn run_serve(config: NudgeConfig) -> Result<(), NudgeError> {
    init_tracing(&config.service.log_level);
    info!(service = %config.service.name, "starting nudge serve");
    recording::register_metrics();

    let storage = {
        let storage = SqliteStorage::new(config.storage.clone());
        storage.initialize().await?;
        Arc::new(storage)
    };

    let channel = {
        let mut channel = TelegramChannel::new(&config.telegram).inspect_err(|e| {
            error!(error = %e, "failed to initialize Telegram channel");
            eprintln!("error: set telegram.bot_token in nudge.toml or NUDGE_TELEGRAM_BOT_TOKEN");
        })?;
        channel.connect().await?;
        Arc::new(channel)
    };

    let engine = Arc::new(
        Engine::load(&config, channel.clone(), storage.clone(), Arc::new(SystemClock)).await?,
    );
    if config.notify.chat_id.is_none() && engine.notification_state().await.destination.is_none() {
        warn!("no summary destination yet; send /here in the staff chat");
    }

    let cancel = shutdown::install_signal_handler();
    let scheduler =
        EscalationScheduler::from_config(engine.clone(), &config.scheduler).spawn(cancel.clone());

    let result = engine.run(cancel.clone()).await;

    // The inbound loop may also stop because the channel closed.
    cancel.cancel();
    if let Err(e) = scheduler.await {
        warn!(error = %e, "scheduler task ended abnormally");
    }

    if let Err(e) = channel.shutdown().await {
        warn!(error = %e, "channel shutdown failed");
    }
    engine.shutdown().await?;
    info!("nudge stopped");
    result
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("nudge={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
