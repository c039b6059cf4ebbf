// SPDX-FileCopyrightText: 2026 Nudge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Elapsed-time to funnel-level classification.

use chrono::{DateTime, Utc};

use crate::funnel::FunnelConfig;
use crate::pending::PendingEntry;

/// Recomputes the funnel level of every entry and returns how many changed.
///
/// A level only ever moves up: if the thresholds were raised since the last
/// run, an entry keeps the level it already reached. Running twice with the
/// same `now` changes nothing the second time.
pub fn reclassify<'a>(
    entries: impl IntoIterator<Item = &'a mut PendingEntry>,
    funnel: &FunnelConfig,
    now: DateTime<Utc>,
) -> usize {
    let mut updated = 0;
    for entry in entries {
        let elapsed = (now - entry.inserted_at).num_minutes();
        let level = funnel.level_for(elapsed);
        if level > entry.current_level {
            entry
                .escalated_levels
                .extend(entry.current_level + 1..=level);
            entry.current_level = level;
            updated += 1;
        }
    }
    updated
}
