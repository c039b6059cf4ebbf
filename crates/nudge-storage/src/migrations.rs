// SPDX-FileCopyrightText: 2026 Nudge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedded database migrations using refinery.
//!
//! SQL files under `migrations/` are compiled into the binary at build time.

use nudge_core::NudgeError;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Run all pending migrations against the given connection.
pub fn run_migrations(conn: &mut rusqlite::Connection) -> Result<(), NudgeError> {
    embedded::migrations::runner()
        .run(conn)
        .map_err(|e| NudgeError::Storage {
            source: Box::new(e),
        })?;
    Ok(())
}
