// SPDX-FileCopyrightText: 2026 Nudge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Staff identities whose messages answer customers instead of escalating.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use nudge_config::model::StaffSeedConfig;
use nudge_core::NudgeError;

/// A staff identity as typed by an operator: numeric id or `@handle`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StaffIdentity {
    Id(i64),
    Handle(String),
}

impl StaffIdentity {
    /// Parses a numeric id, otherwise a handle with an optional leading `@`.
    pub fn parse(input: &str) -> Result<Self, NudgeError> {
        let input = input.trim();
        if let Ok(id) = input.parse::<i64>() {
            return Ok(Self::Id(id));
        }
        let handle = normalize_handle(input);
        let valid = !handle.is_empty()
            && handle
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid {
            return Err(NudgeError::Validation(format!(
                "`{input}` is neither a user id nor a @handle"
            )));
        }
        Ok(Self::Handle(handle))
    }
}

impl std::fmt::Display for StaffIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StaffIdentity::Id(id) => write!(f, "{id}"),
            StaffIdentity::Handle(h) => write!(f, "@{h}"),
        }
    }
}

fn normalize_handle(handle: &str) -> String {
    handle.trim().trim_start_matches('@').to_lowercase()
}

/// Numeric ids and case-insensitive handles of staff members.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExclusionSet {
    #[serde(default)]
    ids: BTreeSet<i64>,
    #[serde(default)]
    handles: BTreeSet<String>,
}

impl ExclusionSet {
    pub fn from_seed(seed: &StaffSeedConfig) -> Self {
        Self {
            ids: seed.ids.iter().copied().collect(),
            handles: seed
                .usernames
                .iter()
                .map(|h| normalize_handle(h))
                .filter(|h| !h.is_empty())
                .collect(),
        }
    }

    /// Membership test by sender id or handle.
    pub fn is_staff(&self, sender_id: &str, handle: Option<&str>) -> bool {
        if sender_id
            .parse::<i64>()
            .is_ok_and(|id| self.ids.contains(&id))
        {
            return true;
        }
        handle.is_some_and(|h| self.handles.contains(&normalize_handle(h)))
    }

    /// Adds an identity. Returns `false` if it was already present.
    pub fn add(&mut self, identity: &StaffIdentity) -> bool {
        match identity {
            StaffIdentity::Id(id) => self.ids.insert(*id),
            StaffIdentity::Handle(h) => self.handles.insert(h.clone()),
        }
    }

    /// Removes an identity. Returns `false` if it was not present.
    pub fn remove(&mut self, identity: &StaffIdentity) -> bool {
        match identity {
            StaffIdentity::Id(id) => self.ids.remove(id),
            StaffIdentity::Handle(h) => self.handles.remove(h),
        }
    }

    pub fn ids(&self) -> impl Iterator<Item = i64> + '_ {
        self.ids.iter().copied()
    }

    pub fn handles(&self) -> impl Iterator<Item = &str> {
        self.handles.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty() && self.handles.is_empty()
    }
}
