// SPDX-FileCopyrightText: 2026 Nudge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Staffed-window oracle.
//!
//! Maps an instant to "inside business hours" using a weekday set and a
//! `[start, end)` local time range in one fixed timezone. Stateless.

use chrono::{DateTime, Datelike, NaiveTime, Utc, Weekday};
use chrono_tz::Tz;

use nudge_config::model::BusinessHoursConfig;
use nudge_core::NudgeError;

/// Parsed business-hours window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusinessHours {
    timezone: Tz,
    days: Vec<Weekday>,
    start: NaiveTime,
    end: NaiveTime,
}

impl BusinessHours {
    pub fn new(timezone: Tz, days: Vec<Weekday>, start: NaiveTime, end: NaiveTime) -> Self {
        Self {
            timezone,
            days,
            start,
            end,
        }
    }

    /// Builds the window from its configuration section.
    pub fn from_config(config: &BusinessHoursConfig) -> Result<Self, NudgeError> {
        Ok(Self::new(
            config.parse_timezone().map_err(NudgeError::Config)?,
            config.parse_days().map_err(NudgeError::Config)?,
            config.parse_start().map_err(NudgeError::Config)?,
            config.parse_end().map_err(NudgeError::Config)?,
        ))
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Returns `true` when `at` falls on a staffed weekday inside `[start, end)`.
    pub fn is_open(&self, at: DateTime<Utc>) -> bool {
        let local = at.with_timezone(&self.timezone);
        if !self.days.contains(&local.weekday()) {
            return false;
        }
        let time = local.time();
        time >= self.start && time < self.end
    }
}
