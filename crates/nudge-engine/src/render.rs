// SPDX-FileCopyrightText: 2026 Nudge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plain-text rendering of summaries.

use std::fmt::Write;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::aggregator::{ConversationSnapshot, Summary};
use crate::funnel::{FunnelConfig, LEVEL_COUNT};

/// Text of the summary line when no conversation is escalated.
pub const NOTHING_OVERDUE: &str = "Nothing overdue.";

/// Renders the summary, most overdue level first.
///
/// An empty summary still renders, with zero counts.
pub fn render_summary(
    summary: &Summary,
    funnel: &FunnelConfig,
    now: DateTime<Utc>,
    tz: Tz,
) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Unanswered: {} message(s) in {} chat(s)",
        summary.total_messages, summary.total_conversations
    );
    if summary.is_empty() {
        out.push_str(NOTHING_OVERDUE);
        return out;
    }

    for level in (1..=LEVEL_COUNT as u8).rev() {
        let bucket = summary.bucket(level);
        if bucket.is_empty() {
            continue;
        }
        let threshold = funnel.threshold(level).unwrap_or_default();
        let _ = writeln!(
            out,
            "\nLevel {level} (over {}):",
            format_minutes(i64::from(threshold))
        );
        for snapshot in bucket {
            let _ = writeln!(out, "{}", render_line(snapshot, now, tz));
        }
    }
    out.trim_end().to_string()
}

fn render_line(snapshot: &ConversationSnapshot, now: DateTime<Utc>, tz: Tz) -> String {
    let name = match &snapshot.title {
        Some(title) => format!("{title} ({})", snapshot.conversation_id),
        None => snapshot.conversation_id.clone(),
    };
    let waiting = (now - snapshot.oldest).num_minutes().max(0);
    let since = snapshot.oldest.with_timezone(&tz).format("%d.%m %H:%M");
    let mut line = format!(
        "- {name}: {} message(s), waiting {} (since {since})",
        snapshot.count,
        format_minutes(waiting)
    );
    if !snapshot.senders.is_empty() {
        let _ = write!(line, ", from {}", snapshot.senders.join(", "));
    }
    line
}

/// `45m`, `3h`, `3h 05m`.
pub fn format_minutes(minutes: i64) -> String {
    let (hours, mins) = (minutes / 60, minutes % 60);
    match (hours, mins) {
        (0, m) => format!("{m}m"),
        (h, 0) => format!("{h}h"),
        (h, m) => format!("{h}h {m:02}m"),
    }
}
