// SPDX-FileCopyrightText: 2026 Nudge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Nudge escalation bot.
//!
//! This crate provides the trait definitions, error type, and common types
//! shared by the engine and its collaborators. The chat transport and the
//! persistence backend are reached only through the traits defined here.

pub mod clock;
pub mod error;
pub mod traits;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::NudgeError;
pub use types::{
    AdapterType, ChatKind, HealthStatus, InboundEvent, MessageId, OutboundMessage,
};

pub use traits::{ChannelAdapter, PluginAdapter, StorageAdapter};
