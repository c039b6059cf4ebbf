// SPDX-FileCopyrightText: 2026 Nudge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Nudge integration tests.
//!
//! Provides mock adapters and test harness infrastructure for fast,
//! deterministic tests without a chat transport or a database.
//!
//! # Components
//!
//! - [`MockChannel`] - Mock transport with event injection, capture and failure injection
//! - [`MemoryStorage`] - In-memory document store with failure injection
//! - [`TestHarness`] - Engine wired to both mocks and a manual clock

pub mod events;
pub mod harness;
pub mod memory_storage;
pub mod mock_channel;

pub use events::EventBuilder;
pub use harness::TestHarness;
pub use memory_storage::MemoryStorage;
pub use mock_channel::MockChannel;
