// SPDX-FileCopyrightText: 2026 Nudge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Nudge escalation bot.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use chrono::{NaiveTime, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Top-level Nudge configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct NudgeConfig {
    /// Service identity and logging.
    #[serde(default)]
    pub service: ServiceConfig,

    /// Telegram bot integration settings.
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Escalation thresholds used until a persisted funnel exists.
    #[serde(default)]
    pub funnel: FunnelSeedConfig,

    /// Staffed window.
    #[serde(default)]
    pub business_hours: BusinessHoursConfig,

    /// Summary notification settings.
    #[serde(default)]
    pub notify: NotifyConfig,

    /// Escalation tick settings.
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Out-of-hours acknowledgment.
    #[serde(default)]
    pub auto_reply: AutoReplyConfig,

    /// Staff identities used until a persisted exclusion set exists.
    #[serde(default)]
    pub staff: StaffSeedConfig,
}

/// Service identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Display name used in logs.
    #[serde(default = "default_service_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_service_name() -> String {
    "nudge".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Telegram bot integration configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TelegramConfig {
    /// Telegram Bot API token. `None` disables Telegram integration.
    #[serde(default)]
    pub bot_token: Option<String>,
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("nudge").join("nudge.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("nudge.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Initial escalation thresholds, in minutes.
///
/// Only consulted when no funnel has been persisted yet; afterwards the
/// thresholds are changed through the `/funnel` admin command.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FunnelSeedConfig {
    #[serde(default = "default_level1_minutes")]
    pub level1_minutes: u32,

    #[serde(default = "default_level2_minutes")]
    pub level2_minutes: u32,

    #[serde(default = "default_level3_minutes")]
    pub level3_minutes: u32,
}

impl Default for FunnelSeedConfig {
    fn default() -> Self {
        Self {
            level1_minutes: default_level1_minutes(),
            level2_minutes: default_level2_minutes(),
            level3_minutes: default_level3_minutes(),
        }
    }
}

impl FunnelSeedConfig {
    /// Thresholds in level order.
    pub fn thresholds(&self) -> [u32; 3] {
        [self.level1_minutes, self.level2_minutes, self.level3_minutes]
    }
}

fn default_level1_minutes() -> u32 {
    60
}

fn default_level2_minutes() -> u32 {
    180
}

fn default_level3_minutes() -> u32 {
    300
}

/// Staffed-window configuration.
///
/// A message is "in hours" when its local weekday is listed in `days` and its
/// local time is in `[start, end)`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BusinessHoursConfig {
    /// IANA timezone name.
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// Staffed weekdays (`mon`, `tue`, ...).
    #[serde(default = "default_days")]
    pub days: Vec<String>,

    /// Opening time, `HH:MM`.
    #[serde(default = "default_start")]
    pub start: String,

    /// Closing time, `HH:MM`, exclusive.
    #[serde(default = "default_end")]
    pub end: String,
}

impl Default for BusinessHoursConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            days: default_days(),
            start: default_start(),
            end: default_end(),
        }
    }
}

impl BusinessHoursConfig {
    pub fn parse_timezone(&self) -> Result<Tz, String> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| format!("unknown timezone `{}`", self.timezone))
    }

    pub fn parse_days(&self) -> Result<Vec<Weekday>, String> {
        self.days
            .iter()
            .map(|d| {
                d.parse::<Weekday>()
                    .map_err(|_| format!("unknown weekday `{d}`"))
            })
            .collect()
    }

    pub fn parse_start(&self) -> Result<NaiveTime, String> {
        parse_clock_time(&self.start)
    }

    pub fn parse_end(&self) -> Result<NaiveTime, String> {
        parse_clock_time(&self.end)
    }
}

fn parse_clock_time(value: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .map_err(|_| format!("`{value}` is not a HH:MM time"))
}

fn default_timezone() -> String {
    "Europe/Moscow".to_string()
}

fn default_days() -> Vec<String> {
    ["mon", "tue", "wed", "thu", "fri"]
        .iter()
        .map(|d| d.to_string())
        .collect()
}

fn default_start() -> String {
    "09:00".to_string()
}

fn default_end() -> String {
    "18:00".to_string()
}

/// Summary notification configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct NotifyConfig {
    /// Chat that receives the summary. Can also be set at runtime with `/here`.
    #[serde(default)]
    pub chat_id: Option<String>,

    /// Minimum seconds between two non-forced dispatches.
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,

    /// How many sent summaries are remembered for retraction.
    #[serde(default = "default_max_live_notifications")]
    pub max_live_notifications: usize,

    /// Upper bound for a single send or delete call.
    #[serde(default = "default_transport_timeout_secs")]
    pub transport_timeout_secs: u64,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            chat_id: None,
            cooldown_secs: default_cooldown_secs(),
            max_live_notifications: default_max_live_notifications(),
            transport_timeout_secs: default_transport_timeout_secs(),
        }
    }
}

fn default_cooldown_secs() -> u64 {
    600
}

fn default_max_live_notifications() -> usize {
    3
}

fn default_transport_timeout_secs() -> u64 {
    15
}

/// Escalation tick configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SchedulerConfig {
    /// Seconds between ticks.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Delay before the first tick.
    #[serde(default = "default_warmup_secs")]
    pub warmup_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            warmup_secs: default_warmup_secs(),
        }
    }
}

fn default_interval_secs() -> u64 {
    900 // 15 minutes
}

fn default_warmup_secs() -> u64 {
    30
}

/// Out-of-hours acknowledgment configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AutoReplyConfig {
    /// Text sent once per conversation outside business hours.
    #[serde(default = "default_auto_reply_message")]
    pub message: String,
}

impl Default for AutoReplyConfig {
    fn default() -> Self {
        Self {
            message: default_auto_reply_message(),
        }
    }
}

fn default_auto_reply_message() -> String {
    "Thanks for your message! Our team is offline right now and will reply \
     as soon as business hours resume."
        .to_string()
}

/// Staff identities seeded into the exclusion set on first run.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StaffSeedConfig {
    /// Numeric user ids.
    #[serde(default)]
    pub ids: Vec<i64>,

    /// Handles, with or without a leading `@`.
    #[serde(default)]
    pub usernames: Vec<String>,
}
