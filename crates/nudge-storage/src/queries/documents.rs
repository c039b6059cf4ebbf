// SPDX-FileCopyrightText: 2026 Nudge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Load/save of named JSON documents.

use nudge_core::NudgeError;
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, map_tr_err};

/// Fetch a document body by name. `None` if it was never saved.
pub async fn load(db: &Database, name: &str) -> Result<Option<serde_json::Value>, NudgeError> {
    let name = name.to_string();
    let body = db
        .connection()
        .call(move |conn| -> Result<Option<String>, rusqlite::Error> {
            conn.query_row(
                "SELECT body FROM documents WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)?;

    body.map(|b| serde_json::from_str(&b).map_err(NudgeError::from))
        .transpose()
}

/// Insert or replace a document.
pub async fn save(db: &Database, name: &str, document: &serde_json::Value) -> Result<(), NudgeError> {
    let name = name.to_string();
    let body = serde_json::to_string(document)?;
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO documents (name, body) VALUES (?1, ?2)
                 ON CONFLICT(name) DO UPDATE SET
                     body = excluded.body,
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
                params![name, body],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Names of all stored documents, sorted.
pub async fn list_names(db: &Database) -> Result<Vec<String>, NudgeError> {
    db.connection()
        .call(|conn| -> Result<Vec<String>, rusqlite::Error> {
            let mut stmt = conn.prepare("SELECT name FROM documents ORDER BY name")?;
            let names = stmt
                .query_map([], |row| row.get(0))?
                .collect::<Result<Vec<String>, _>>()?;
            Ok(names)
        })
        .await
        .map_err(map_tr_err)
}
