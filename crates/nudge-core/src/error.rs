// SPDX-FileCopyrightText: 2026 Nudge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Nudge escalation bot.

use thiserror::Error;

/// The primary error type used across all Nudge adapter traits and engine operations.
#[derive(Debug, Error)]
pub enum NudgeError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// A value was rejected at the configuration boundary; the previous value is retained.
    #[error("invalid value: {0}")]
    Validation(String),

    /// A required runtime setting (e.g. the notification destination) is not set.
    #[error("not configured: {0}")]
    NotConfigured(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Channel adapter errors (send/delete failure, malformed ids, closed stream).
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl NudgeError {
    /// Shorthand for a channel error without an underlying source.
    pub fn channel(message: impl Into<String>) -> Self {
        NudgeError::Channel {
            message: message.into(),
            source: None,
        }
    }

    /// Returns `true` for errors caused by the external transport.
    ///
    /// Transport errors abort a dispatch cycle but are retried on the next tick.
    pub fn is_transport(&self) -> bool {
        matches!(self, NudgeError::Channel { .. } | NudgeError::Timeout { .. })
    }
}

impl From<serde_json::Error> for NudgeError {
    fn from(err: serde_json::Error) -> Self {
        NudgeError::Storage {
            source: Box::new(err),
        }
    }
}
