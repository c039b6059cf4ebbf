// SPDX-FileCopyrightText: 2026 Nudge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and migrations.
//!
//! Schema setup runs on a short-lived blocking connection; afterwards every
//! read and write goes through the single `tokio-rusqlite` background thread
//! owned by [`Database`]. Do NOT create additional Connection instances for writes.

use std::path::Path;

use nudge_core::NudgeError;
use tracing::debug;

use crate::migrations;

/// Handle to the document database.
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open (creating if needed) the database at `path`, apply PRAGMAs and migrations.
    pub async fn open(path: &str, wal_mode: bool) -> Result<Self, NudgeError> {
        if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| NudgeError::Storage {
                source: Box::new(e),
            })?;
        }

        let setup_path = path.to_string();
        tokio::task::spawn_blocking(move || prepare_schema(&setup_path, wal_mode))
            .await
            .map_err(|e| NudgeError::Internal(format!("schema setup task failed: {e}")))??;

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(map_tr_err)?;
        conn.call(|conn| -> Result<(), rusqlite::Error> {
            conn.execute_batch("PRAGMA busy_timeout = 5000; PRAGMA foreign_keys = ON;")?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        debug!(path, wal_mode, "document database opened");
        Ok(Self { conn })
    }

    /// The serialized async connection.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }
}

fn prepare_schema(path: &str, wal_mode: bool) -> Result<(), NudgeError> {
    let mut conn = rusqlite::Connection::open(path).map_err(map_tr_err)?;
    if wal_mode {
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(map_tr_err)?;
    }
    conn.pragma_update(None, "synchronous", "NORMAL")
        .map_err(map_tr_err)?;
    migrations::run_migrations(&mut conn)
}

/// Wraps any SQLite-layer error as a storage error.
pub(crate) fn map_tr_err<E>(err: E) -> NudgeError
where
    E: std::error::Error + Send + Sync + 'static,
{
    NudgeError::Storage {
        source: Box::new(err),
    }
}
