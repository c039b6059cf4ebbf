// SPDX-FileCopyrightText: 2026 Nudge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Staff-only admin commands.
//!
//! Commands are parsed into [`AdminCommand`] and run by a single executor,
//! [`execute`], which calls the engine's public operations.

use std::fmt::Write;

use nudge_core::{InboundEvent, NudgeError};

use crate::dispatcher::CycleOutcome;
use crate::engine::Engine;
use crate::render::format_minutes;
use crate::staff::StaffIdentity;

/// Help text listing every command.
pub const HELP: &str = "\
/funnel - show escalation thresholds
/funnel <level> <minutes> - change a threshold
/staff - list staff
/staff_add <id|@handle> - add a staff member
/staff_remove <id|@handle> - remove a staff member
/notify - refresh the summary now
/clear_pending - drop every unanswered message
/status - show counters
/here - send summaries to this chat";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminCommand {
    Help,
    ShowFunnel,
    SetThreshold { level: u8, minutes: u32 },
    ListStaff,
    AddStaff(StaffIdentity),
    RemoveStaff(StaffIdentity),
    Notify,
    ClearPending,
    Status,
    Here,
}

impl AdminCommand {
    /// Parses a slash command.
    ///
    /// `Ok(None)` means the text is not a command this bot handles. Malformed
    /// arguments are reported as [`NudgeError::Validation`] with usage text.
    pub fn parse(text: &str) -> Result<Option<Self>, NudgeError> {
        let mut words = text.split_whitespace();
        let Some(head) = words.next() else {
            return Ok(None);
        };
        let Some(name) = head.strip_prefix('/') else {
            return Ok(None);
        };
        // `/funnel@my_bot` in groups.
        let name = name.split('@').next().unwrap_or_default().to_lowercase();
        let args: Vec<&str> = words.collect();

        let command = match (name.as_str(), args.as_slice()) {
            ("help" | "start", _) => Self::Help,
            ("funnel", []) => Self::ShowFunnel,
            ("funnel", [level, minutes]) => Self::SetThreshold {
                level: parse_number(level, "/funnel <level 1-3> <minutes>")?,
                minutes: parse_number(minutes, "/funnel <level 1-3> <minutes>")?,
            },
            ("funnel", _) => return Err(usage("/funnel <level 1-3> <minutes>")),
            ("staff", _) => Self::ListStaff,
            ("staff_add", [who]) => Self::AddStaff(StaffIdentity::parse(who)?),
            ("staff_add", _) => return Err(usage("/staff_add <id|@handle>")),
            ("staff_remove", [who]) => Self::RemoveStaff(StaffIdentity::parse(who)?),
            ("staff_remove", _) => return Err(usage("/staff_remove <id|@handle>")),
            ("notify", _) => Self::Notify,
            ("clear_pending", _) => Self::ClearPending,
            ("status", _) => Self::Status,
            ("here", _) => Self::Here,
            _ => return Ok(None),
        };
        Ok(Some(command))
    }
}

fn parse_number<T: std::str::FromStr>(value: &str, usage_text: &str) -> Result<T, NudgeError> {
    value.parse().map_err(|_| usage(usage_text))
}

fn usage(text: &str) -> NudgeError {
    NudgeError::Validation(format!("usage: {text}"))
}

/// Runs a command on behalf of a staff member and returns the reply text.
pub async fn execute(
    engine: &Engine,
    command: AdminCommand,
    event: &InboundEvent,
) -> Result<String, NudgeError> {
    match command {
        AdminCommand::Help => Ok(HELP.to_string()),
        AdminCommand::ShowFunnel => Ok(describe_funnel(&engine.funnel().await.thresholds())),
        AdminCommand::SetThreshold { level, minutes } => {
            let funnel = engine.set_threshold(level, minutes).await?;
            Ok(format!(
                "Level {level} set to {}.\n{}",
                format_minutes(i64::from(minutes)),
                describe_funnel(&funnel.thresholds())
            ))
        }
        AdminCommand::ListStaff => {
            let staff = engine.staff().await;
            if staff.is_empty() {
                return Ok("No staff configured.".to_string());
            }
            let mut out = String::from("Staff:");
            for id in staff.ids() {
                let _ = write!(out, "\n- {id}");
            }
            for handle in staff.handles() {
                let _ = write!(out, "\n- @{handle}");
            }
            Ok(out)
        }
        AdminCommand::AddStaff(identity) => Ok(if engine.add_staff(&identity).await {
            format!("{identity} added to staff.")
        } else {
            format!("{identity} is already staff.")
        }),
        AdminCommand::RemoveStaff(identity) => Ok(if engine.remove_staff(&identity).await {
            format!("{identity} removed from staff.")
        } else {
            format!("{identity} was not staff.")
        }),
        AdminCommand::Notify => Ok(match engine.request_cycle(true).await? {
            CycleOutcome::Sent(_) => "Summary refreshed.".to_string(),
            CycleOutcome::Skipped => "Summary is up to date.".to_string(),
        }),
        AdminCommand::ClearPending => {
            let removed = engine.clear_pending().await;
            Ok(format!("Cleared {removed} unanswered message(s)."))
        }
        AdminCommand::Status => Ok(engine.status().await.to_string()),
        AdminCommand::Here => {
            engine.set_destination(&event.conversation_id).await;
            Ok("Summaries will be sent to this chat.".to_string())
        }
    }
}

fn describe_funnel(thresholds: &[u32]) -> String {
    let mut out = String::from("Escalation thresholds:");
    for (i, minutes) in thresholds.iter().enumerate() {
        let _ = write!(out, "\n- level {}: {}", i + 1, format_minutes(i64::from(*minutes)));
    }
    out
}
