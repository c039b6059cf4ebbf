// SPDX-FileCopyrightText: 2026 Nudge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./nudge.toml` > `~/.config/nudge/nudge.toml` > `/etc/nudge/nudge.toml`
//! with environment variable overrides via `NUDGE_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::NudgeConfig;

/// Sections that env var names are split on, longest first so that
/// `business_hours_` wins over a hypothetical `business_` prefix.
const ENV_SECTIONS: &[&str] = &[
    "business_hours",
    "auto_reply",
    "scheduler",
    "telegram",
    "service",
    "storage",
    "funnel",
    "notify",
    "staff",
];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/nudge/nudge.toml` (system-wide)
/// 3. `~/.config/nudge/nudge.toml` (user XDG config)
/// 4. `./nudge.toml` (local directory)
/// 5. `NUDGE_*` environment variables
pub fn load_config() -> Result<NudgeConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<NudgeConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(NudgeConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<NudgeConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(NudgeConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading (exposed for diagnostic use).
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(NudgeConfig::default()))
        .merge(Toml::file("/etc/nudge/nudge.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("nudge/nudge.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("nudge.toml"))
        .merge(env_provider())
}

/// Create the environment variable provider with explicit section mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")`: `NUDGE_NOTIFY_COOLDOWN_SECS`
/// must map to `notify.cooldown_secs`, not `notify.cooldown.secs`.
fn env_provider() -> Env {
    Env::prefixed("NUDGE_").map(|key| map_env_key(key.as_str()).into())
}

/// Maps a lowercased, prefix-stripped env var name to a dotted config path.
pub(crate) fn map_env_key(key: &str) -> String {
    for section in ENV_SECTIONS {
        if let Some(rest) = key.strip_prefix(section).and_then(|r| r.strip_prefix('_'))
            && !rest.is_empty()
        {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}
