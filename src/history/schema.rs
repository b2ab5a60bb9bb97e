//! # History SQLite Schema
//!
//! Defines the history table and indexes for the durable tier.

use rusqlite::{Connection, OptionalExtension};

use crate::{Error, Result};

const HISTORY_SCHEMA_VERSION: i32 = 1;

const CREATE_HISTORY: &str = r#"
CREATE TABLE IF NOT EXISTS history (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    command    TEXT NOT NULL,
    timestamp  INTEGER NOT NULL,
    session_id TEXT
)
"#;

const CREATE_INDEXES: &str = r#"
CREATE INDEX IF NOT EXISTS history_timestamp
ON history(timestamp DESC);

CREATE INDEX IF NOT EXISTS history_command
ON history(command);
"#;

const CREATE_METADATA: &str = r#"
CREATE TABLE IF NOT EXISTS history_metadata (
    key   TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
"#;

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch("PRAGMA journal_mode = WAL")?;
    conn.execute_batch("PRAGMA synchronous = NORMAL")?;
    conn.execute_batch("PRAGMA temp_store = MEMORY")?;
    conn.execute_batch(CREATE_HISTORY)?;
    conn.execute_batch(CREATE_INDEXES)?;
    conn.execute_batch(CREATE_METADATA)?;

    ensure_schema_version(conn)
}

fn ensure_schema_version(conn: &Connection) -> Result<()> {
    let version: Option<String> = conn
        .query_row(
            "SELECT value FROM history_metadata WHERE key = 'schema_version'",
            [],
            |row| row.get(0),
        )
        .optional()?;

    match version {
        Some(value) => {
            let parsed: i32 = value
                .parse()
                .map_err(|_| Error::Schema("history schema version is invalid".to_string()))?;
            if parsed != HISTORY_SCHEMA_VERSION {
                return Err(Error::Schema(format!(
                    "history schema version mismatch: database has version {parsed}, but this client requires {HISTORY_SCHEMA_VERSION}"
                )));
            }
        }
        None => {
            conn.execute(
                "INSERT INTO history_metadata (key, value) VALUES ('schema_version', ?)",
                [HISTORY_SCHEMA_VERSION.to_string()],
            )?;
        }
    }

    Ok(())
}
