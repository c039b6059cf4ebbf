// SPDX-FileCopyrightText: 2026 Nudge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Composition root owning all mutable escalation state.
//!
//! Every mutation (inbound routing, reclassification, dispatch, admin
//! commands) happens under one `tokio::sync::Mutex`, so their intermediate
//! states never interleave. Transport calls made under the lock are bounded
//! by the configured timeout.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use nudge_config::model::NudgeConfig;
use nudge_core::{ChannelAdapter, Clock, InboundEvent, NudgeError, OutboundMessage, StorageAdapter};

use crate::aggregator::{Summary, summarize};
use crate::business_hours::BusinessHours;
use crate::classifier::reclassify;
use crate::commands::{self, AdminCommand};
use crate::dispatcher::{CycleOutcome, DispatchSettings, Dispatcher, NotificationState, bounded};
use crate::documents::{self, Loaded};
use crate::funnel::FunnelConfig;
use crate::gate::AutoReplyGate;
use crate::pending::{EntryKey, EntryMeta, PLACEHOLDER_TEXT, PendingEntry, PendingStore};
use crate::recording;
use crate::render::render_summary;
use crate::staff::{ExclusionSet, StaffIdentity};

/// How an inbound event was routed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundOutcome {
    /// Service event, blank text, or a command from a non-staff sender.
    Ignored,
    /// Customer message stored as pending.
    Queued(EntryKey),
    /// Out-of-hours acknowledgment sent.
    Acknowledged,
    /// Out of hours, but this conversation was already acknowledged.
    AlreadyAcknowledged,
    /// Staff message; `purged` pending entries were removed.
    StaffReply { purged: usize },
    /// Admin command executed and answered.
    Command,
}

/// Point-in-time counters for `/status` and the `status` subcommand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineStatus {
    pub pending_messages: usize,
    pub conversations: usize,
    pub summary: Summary,
    pub funnel: FunnelConfig,
    pub staff_count: usize,
    pub destination: Option<String>,
    pub last_dispatch: Option<DateTime<Utc>>,
    pub live_notifications: usize,
    pub open: bool,
}

impl std::fmt::Display for EngineStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "Business hours: {}",
            if self.open { "open" } else { "closed" }
        )?;
        writeln!(
            f,
            "Pending: {} message(s) in {} chat(s)",
            self.pending_messages, self.conversations
        )?;
        writeln!(
            f,
            "Escalated: level 1: {}, level 2: {}, level 3: {}",
            self.summary.bucket(1).len(),
            self.summary.bucket(2).len(),
            self.summary.bucket(3).len()
        )?;
        let [l1, l2, l3] = self.funnel.thresholds();
        writeln!(f, "Thresholds: {l1}/{l2}/{l3} min")?;
        writeln!(f, "Staff entries: {}", self.staff_count)?;
        writeln!(
            f,
            "Destination: {}",
            self.destination.as_deref().unwrap_or("not set (use /here)")
        )?;
        match self.last_dispatch {
            Some(at) => write!(
                f,
                "Last summary: {} ({} live)",
                at.format("%Y-%m-%d %H:%M UTC"),
                self.live_notifications
            ),
            None => write!(f, "Last summary: never"),
        }
    }
}

struct EngineState {
    pending: PendingStore,
    gate: AutoReplyGate,
    staff: ExclusionSet,
    funnel: FunnelConfig,
    dispatcher: Dispatcher,
}

/// The escalation engine.
pub struct Engine {
    state: Mutex<EngineState>,
    channel: Arc<dyn ChannelAdapter>,
    storage: Arc<dyn StorageAdapter>,
    clock: Arc<dyn Clock>,
    hours: BusinessHours,
    auto_reply: String,
    transport_timeout: Duration,
}

impl Engine {
    /// Builds the engine, restoring persisted state.
    ///
    /// Absent or unreadable documents fall back to the configuration seeds;
    /// only an invalid business-hours section is fatal. Seeds are written back
    /// only when the stored copy is absent or malformed, never after a read
    /// failure.
    pub async fn load(
        config: &NudgeConfig,
        channel: Arc<dyn ChannelAdapter>,
        storage: Arc<dyn StorageAdapter>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, NudgeError> {
        let hours = BusinessHours::from_config(&config.business_hours)?;
        let store = storage.as_ref();

        let loaded = documents::load_state::<FunnelConfig>(store, documents::FUNNEL_CONFIG).await;
        let funnel = match loaded {
            Loaded::Found(funnel) if funnel.is_valid() => funnel,
            loaded => {
                let overwrite = match loaded {
                    Loaded::Found(_) => {
                        warn!("persisted funnel violates ordering, reseeding from config");
                        true
                    }
                    other => other.may_overwrite(),
                };
                let seeded = FunnelConfig::from_seed(&config.funnel).unwrap_or_else(|e| {
                    warn!(error = %e, "invalid funnel seed, using defaults");
                    FunnelConfig::default()
                });
                if overwrite {
                    documents::save(store, documents::FUNNEL_CONFIG, &seeded).await;
                }
                seeded
            }
        };

        let staff = match documents::load_state::<ExclusionSet>(store, documents::STAFF).await {
            Loaded::Found(staff) => staff,
            loaded => {
                let seeded = ExclusionSet::from_seed(&config.staff);
                if loaded.may_overwrite() {
                    documents::save(store, documents::STAFF, &seeded).await;
                }
                seeded
            }
        };

        let pending: PendingStore = documents::load(store, documents::PENDING_MESSAGES)
            .await
            .unwrap_or_default();
        let gate: AutoReplyGate = documents::load(store, documents::AUTO_REPLY_FLAGS)
            .await
            .unwrap_or_default();
        let mut notification: NotificationState =
            documents::load(store, documents::NOTIFICATION_STATE)
                .await
                .unwrap_or_default();
        if notification.destination.is_none() {
            notification.destination = config.notify.chat_id.clone();
        }

        info!(
            pending = pending.len(),
            staff_empty = staff.is_empty(),
            destination = notification.destination.as_deref().unwrap_or("unset"),
            "engine state restored"
        );
        recording::set_pending_messages(pending.len());

        let settings = DispatchSettings::from_config(&config.notify);
        Ok(Self {
            state: Mutex::new(EngineState {
                pending,
                gate,
                staff,
                funnel,
                dispatcher: Dispatcher::new(notification, settings),
            }),
            channel,
            storage,
            clock,
            hours,
            auto_reply: config.auto_reply.message.clone(),
            transport_timeout: settings.transport_timeout,
        })
    }

    /// Routes one inbound event.
    pub async fn handle_inbound(&self, event: InboundEvent) -> Result<InboundOutcome, NudgeError> {
        if event.is_service_event {
            recording::record_inbound("service");
            return Ok(InboundOutcome::Ignored);
        }

        if event.is_command {
            let is_staff = self
                .state
                .lock()
                .await
                .staff
                .is_staff(&event.sender_id, event.sender_handle.as_deref());
            if !is_staff {
                debug!(sender_id = %event.sender_id, "ignoring command from non-staff sender");
                recording::record_inbound("command_ignored");
                return Ok(InboundOutcome::Ignored);
            }
            return self.handle_command(&event).await;
        }

        let now = self.clock.now();
        let mut state = self.state.lock().await;
        // Staff status is read under the same guard that purges or queues.
        if state
            .staff
            .is_staff(&event.sender_id, event.sender_handle.as_deref())
        {
            return self.handle_staff_reply(&mut state, &event).await;
        }
        self.handle_customer_message(&mut state, event, now).await
    }

    async fn handle_command(&self, event: &InboundEvent) -> Result<InboundOutcome, NudgeError> {
        let text = event.text.as_deref().unwrap_or_default();
        let reply = match AdminCommand::parse(text) {
            Ok(Some(command)) => {
                info!(sender_id = %event.sender_id, ?command, "executing admin command");
                commands::execute(self, command, event).await
            }
            Ok(None) => {
                recording::record_inbound("command_ignored");
                return Ok(InboundOutcome::Ignored);
            }
            Err(e) => Err(e),
        };
        let reply = reply.unwrap_or_else(|e| e.to_string());

        recording::record_inbound("command");
        let out = OutboundMessage::text(&event.conversation_id, reply).replying_to(&event.message_id);
        if let Err(e) = bounded(self.transport_timeout, self.channel.send(out)).await {
            warn!(chat_id = %event.conversation_id, error = %e, "failed to answer command");
        }
        Ok(InboundOutcome::Command)
    }

    async fn handle_staff_reply(
        &self,
        state: &mut EngineState,
        event: &InboundEvent,
    ) -> Result<InboundOutcome, NudgeError> {
        recording::record_inbound("staff");

        if state.gate.clear(&AutoReplyGate::key_for(event)) {
            documents::save(self.storage.as_ref(), documents::AUTO_REPLY_FLAGS, &state.gate).await;
        }

        let purged = state
            .pending
            .remove_all_for_conversation(&event.conversation_id, None);
        if purged > 0 {
            info!(
                conversation_id = %event.conversation_id,
                staff_id = %event.sender_id,
                purged,
                "staff replied, pending messages cleared"
            );
            self.persist_pending(state).await;
            match self.cycle_locked(state, true).await {
                Ok(_) => {}
                Err(NudgeError::NotConfigured(what)) => {
                    debug!(%what, "summary refresh skipped after staff reply");
                }
                Err(e) => warn!(error = %e, "summary refresh after staff reply failed"),
            }
        }
        Ok(InboundOutcome::StaffReply { purged })
    }

    async fn handle_customer_message(
        &self,
        state: &mut EngineState,
        event: InboundEvent,
        now: DateTime<Utc>,
    ) -> Result<InboundOutcome, NudgeError> {
        let text = match event.text.as_deref() {
            Some(t) if t.trim().is_empty() => {
                recording::record_inbound("blank");
                return Ok(InboundOutcome::Ignored);
            }
            Some(t) => t.to_string(),
            None => PLACEHOLDER_TEXT.to_string(),
        };

        let gate_key = AutoReplyGate::key_for(&event);

        if !self.hours.is_open(now) {
            if !state.gate.should_send_ack(&gate_key) {
                recording::record_inbound("off_hours_repeat");
                return Ok(InboundOutcome::AlreadyAcknowledged);
            }
            let ack = OutboundMessage::text(&event.conversation_id, &self.auto_reply)
                .replying_to(&event.message_id);
            bounded(self.transport_timeout, self.channel.send(ack))
                .await
                .inspect_err(|e| {
                    warn!(conversation_id = %event.conversation_id, error = %e, "failed to send auto-reply");
                })?;
            state.gate.mark_sent(&gate_key);
            documents::save(self.storage.as_ref(), documents::AUTO_REPLY_FLAGS, &state.gate).await;
            info!(conversation_id = %event.conversation_id, key = %gate_key, "auto-reply sent");
            recording::record_inbound("off_hours_ack");
            return Ok(InboundOutcome::Acknowledged);
        }

        if state.gate.clear(&gate_key) {
            documents::save(self.storage.as_ref(), documents::AUTO_REPLY_FLAGS, &state.gate).await;
        }

        let meta = EntryMeta {
            conversation_title: event.conversation_title.clone(),
            sender_handle: event.sender_handle.clone(),
            display_name: event.display_name.clone(),
        };
        let key = state.pending.add(
            &event.conversation_id,
            &event.sender_id,
            &text,
            &event.message_id,
            meta,
            now,
        );
        self.persist_pending(state).await;
        debug!(entry = %key, "message queued as pending");
        recording::record_inbound("queued");
        Ok(InboundOutcome::Queued(key))
    }

    /// One scheduler tick: a non-forced refresh.
    pub async fn tick(&self) -> Result<CycleOutcome, NudgeError> {
        self.request_cycle(false).await
    }

    /// Reclassifies every entry, then runs a dispatch cycle; `force`
    /// bypasses the cooldown.
    pub async fn request_cycle(&self, force: bool) -> Result<CycleOutcome, NudgeError> {
        let mut state = self.state.lock().await;
        self.cycle_locked(&mut state, force).await
    }

    async fn cycle_locked(
        &self,
        state: &mut EngineState,
        force: bool,
    ) -> Result<CycleOutcome, NudgeError> {
        let now = self.clock.now();
        let tz = self.hours.timezone();

        let updated = reclassify(state.pending.iter_mut(), &state.funnel, now);
        if updated > 0 {
            debug!(updated, "funnel levels advanced");
            self.persist_pending(state).await;
        }

        let EngineState {
            pending,
            funnel,
            dispatcher,
            ..
        } = state;
        let pending = &*pending;
        let funnel = &*funnel;

        let result = dispatcher
            .request_cycle(force, now, self.channel.as_ref(), || {
                render_summary(&summarize(pending.iter()), funnel, now, tz)
            })
            .await;

        let touched = !matches!(
            result,
            Ok(CycleOutcome::Skipped) | Err(NudgeError::NotConfigured(_))
        );
        if touched {
            documents::save(
                self.storage.as_ref(),
                documents::NOTIFICATION_STATE,
                dispatcher.state(),
            )
            .await;
        }
        result
    }

    async fn persist_pending(&self, state: &EngineState) {
        recording::set_pending_messages(state.pending.len());
        documents::save(self.storage.as_ref(), documents::PENDING_MESSAGES, &state.pending).await;
    }

    /// Changes one funnel threshold; invalid values leave the funnel unchanged.
    pub async fn set_threshold(&self, level: u8, minutes: u32) -> Result<FunnelConfig, NudgeError> {
        let mut state = self.state.lock().await;
        state.funnel.set_threshold(level, minutes)?;
        documents::save(self.storage.as_ref(), documents::FUNNEL_CONFIG, &state.funnel).await;
        info!(level, minutes, "funnel threshold changed");
        Ok(state.funnel)
    }

    pub async fn funnel(&self) -> FunnelConfig {
        self.state.lock().await.funnel
    }

    pub async fn staff(&self) -> ExclusionSet {
        self.state.lock().await.staff.clone()
    }

    /// Adds a staff identity. Returns `false` if already present.
    pub async fn add_staff(&self, identity: &StaffIdentity) -> bool {
        let mut state = self.state.lock().await;
        let added = state.staff.add(identity);
        if added {
            documents::save(self.storage.as_ref(), documents::STAFF, &state.staff).await;
            info!(%identity, "staff added");
        }
        added
    }

    /// Removes a staff identity. Returns `false` if it was not present.
    pub async fn remove_staff(&self, identity: &StaffIdentity) -> bool {
        let mut state = self.state.lock().await;
        let removed = state.staff.remove(identity);
        if removed {
            documents::save(self.storage.as_ref(), documents::STAFF, &state.staff).await;
            info!(%identity, "staff removed");
        }
        removed
    }

    /// Drops every pending entry and returns how many there were.
    pub async fn clear_pending(&self) -> usize {
        let mut state = self.state.lock().await;
        let removed = state.pending.clear_all();
        self.persist_pending(&state).await;
        info!(removed, "pending messages cleared");
        removed
    }

    /// Routes summaries to `chat_id` from now on.
    pub async fn set_destination(&self, chat_id: &str) {
        let mut state = self.state.lock().await;
        state.dispatcher.set_destination(chat_id);
        documents::save(
            self.storage.as_ref(),
            documents::NOTIFICATION_STATE,
            state.dispatcher.state(),
        )
        .await;
        info!(chat_id, "notification destination set");
    }

    /// Snapshot of the pending store.
    pub async fn pending_entries(&self) -> Vec<PendingEntry> {
        self.state.lock().await.pending.all_entries()
    }

    pub async fn notification_state(&self) -> NotificationState {
        self.state.lock().await.dispatcher.state().clone()
    }

    pub async fn status(&self) -> EngineStatus {
        let state = self.state.lock().await;
        let notification = state.dispatcher.state();
        EngineStatus {
            pending_messages: state.pending.len(),
            conversations: state.pending.conversation_count(),
            summary: summarize(state.pending.iter()),
            funnel: state.funnel,
            staff_count: state.staff.ids().count() + state.staff.handles().count(),
            destination: notification.destination.clone(),
            last_dispatch: notification.last_dispatch,
            live_notifications: notification.handles.len(),
            open: self.hours.is_open(self.clock.now()),
        }
    }

    /// Consumes inbound events until cancelled or the channel closes.
    pub async fn run(&self, cancel: CancellationToken) -> Result<(), NudgeError> {
        info!("inbound loop running");
        loop {
            tokio::select! {
                received = self.channel.receive() => {
                    match received {
                        Ok(event) => {
                            if let Err(e) = self.handle_inbound(event).await {
                                error!(error = %e, "failed to handle inbound event");
                            }
                        }
                        Err(e) => {
                            error!(error = %e, "channel receive error");
                            if e.to_string().contains("closed") {
                                break;
                            }
                        }
                    }
                }
                _ = cancel.cancelled() => {
                    info!("shutdown signal received, stopping inbound loop");
                    break;
                }
            }
        }
        info!("inbound loop stopped");
        Ok(())
    }

    /// Writes every document one last time and closes storage.
    pub async fn shutdown(&self) -> Result<(), NudgeError> {
        let state = self.state.lock().await;
        let store = self.storage.as_ref();
        documents::save(store, documents::PENDING_MESSAGES, &state.pending).await;
        documents::save(store, documents::AUTO_REPLY_FLAGS, &state.gate).await;
        documents::save(store, documents::NOTIFICATION_STATE, state.dispatcher.state()).await;
        self.storage.close().await
    }
}
