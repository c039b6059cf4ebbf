// SPDX-FileCopyrightText: 2026 Nudge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Escalation engine for the Nudge bot.
//!
//! Tracks unanswered customer messages, classifies them into funnel levels by
//! age, and keeps a single periodically refreshed summary in a staff chat.
//! Staff replies purge a conversation and refresh the summary immediately.
//!
//! The transport and the persistence backend are reached only through
//! [`nudge_core::ChannelAdapter`] and [`nudge_core::StorageAdapter`].

pub mod aggregator;
pub mod business_hours;
pub mod classifier;
pub mod commands;
pub mod dispatcher;
pub mod documents;
pub mod engine;
pub mod funnel;
pub mod gate;
pub mod pending;
pub mod recording;
pub mod render;
pub mod scheduler;
pub mod shutdown;
pub mod staff;

pub use aggregator::{ConversationSnapshot, Summary, summarize};
pub use business_hours::BusinessHours;
pub use classifier::reclassify;
pub use commands::AdminCommand;
pub use dispatcher::{CycleOutcome, DispatchSettings, Dispatcher, NotificationState};
pub use engine::{Engine, EngineStatus, InboundOutcome};
pub use funnel::FunnelConfig;
pub use gate::AutoReplyGate;
pub use pending::{EntryKey, EntryMeta, PendingEntry, PendingStore};
pub use scheduler::EscalationScheduler;
pub use staff::{ExclusionSet, StaffIdentity};
