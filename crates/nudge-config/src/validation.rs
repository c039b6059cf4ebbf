// SPDX-FileCopyrightText: 2026 Nudge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as strictly increasing thresholds, parseable timezones, and a
//! non-empty staffed window.

use crate::diagnostic::ConfigError;
use crate::model::NudgeConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &NudgeConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut invalid = |message: String| errors.push(ConfigError::Validation { message });

    if config.storage.database_path.trim().is_empty() {
        invalid("storage.database_path must not be empty".to_string());
    }

    let thresholds = config.funnel.thresholds();
    if thresholds.contains(&0) {
        invalid(format!(
            "funnel thresholds must be positive, got {thresholds:?}"
        ));
    }
    if !thresholds.windows(2).all(|w| w[0] < w[1]) {
        invalid(format!(
            "funnel thresholds must be strictly increasing (level1 < level2 < level3), got {thresholds:?}"
        ));
    }

    let hours = &config.business_hours;
    if let Err(e) = hours.parse_timezone() {
        invalid(format!("business_hours.timezone: {e}"));
    }
    match hours.parse_days() {
        Ok(days) if days.is_empty() => {
            invalid("business_hours.days must list at least one weekday".to_string())
        }
        Ok(_) => {}
        Err(e) => invalid(format!("business_hours.days: {e}")),
    }
    match (hours.parse_start(), hours.parse_end()) {
        (Ok(start), Ok(end)) if start >= end => invalid(format!(
            "business_hours.start ({}) must be before business_hours.end ({})",
            hours.start, hours.end
        )),
        (Ok(_), Ok(_)) => {}
        (start, end) => {
            if let Err(e) = start {
                invalid(format!("business_hours.start: {e}"));
            }
            if let Err(e) = end {
                invalid(format!("business_hours.end: {e}"));
            }
        }
    }

    if config.notify.max_live_notifications == 0 {
        invalid("notify.max_live_notifications must be at least 1".to_string());
    }
    if config.notify.transport_timeout_secs == 0 {
        invalid("notify.transport_timeout_secs must be positive".to_string());
    }
    if let Some(chat_id) = &config.notify.chat_id
        && chat_id.trim().is_empty()
    {
        invalid("notify.chat_id must not be blank when set".to_string());
    }

    if config.scheduler.interval_secs == 0 {
        invalid("scheduler.interval_secs must be positive".to_string());
    }

    if config.auto_reply.message.trim().is_empty() {
        invalid("auto_reply.message must not be empty".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
