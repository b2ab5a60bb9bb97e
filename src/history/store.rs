//! # History Storage Port
//!
//! [`History`](super::History) talks to persistence through the narrow
//! [`HistoryStore`] trait, so the log logic stays storage-agnostic:
//! [`SqliteStore`] is the real durable adapter, [`MemoryStore`] backs
//! tests and throwaway sessions. Any engine offering append, ordered scan,
//! and substring filter satisfies the contract.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use rusqlite::{params, Connection};
use tracing::warn;

use super::schema::init_schema;
use crate::Result;

/// One durable history row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub text: String,
    /// Submission time, milliseconds since the Unix epoch.
    pub ts_ms: i64,
    /// Session that submitted the command, when the owning log carries one.
    pub session_id: Option<String>,
}

/// Storage contract for the durable history tier.
pub trait HistoryStore {
    /// Appends one command row.
    fn insert(&mut self, text: &str, ts_ms: i64, session_id: Option<&str>) -> Result<()>;

    /// Most recent `limit` command texts, newest first.
    ///
    /// A row whose text cannot be decoded is skipped rather than failing
    /// the whole scan.
    fn recent(&self, limit: usize) -> Result<Vec<String>>;

    /// Distinct command texts containing `pattern` (case-insensitive),
    /// newest first, capped at `limit`.
    fn search_substring(&self, pattern: &str, limit: usize) -> Result<Vec<String>>;
}

/// SQLite-backed adapter.
///
/// The connection is owned for the lifetime of the session and closed on
/// drop.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens (or creates) the history database at `path`, creating parent
    /// directories and the schema if absent. Safe to call on an existing
    /// database; schema creation is idempotent.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        init_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Private in-memory SQLite database. Useful for tests that want real
    /// SQL semantics without touching disk.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        init_schema(&conn)?;
        Ok(Self { conn })
    }
}

impl HistoryStore for SqliteStore {
    fn insert(&mut self, text: &str, ts_ms: i64, session_id: Option<&str>) -> Result<()> {
        self.conn.execute(
            "INSERT INTO history (command, timestamp, session_id) VALUES (?, ?, ?)",
            params![text, ts_ms, session_id],
        )?;
        Ok(())
    }

    fn recent(&self, limit: usize) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT command FROM history ORDER BY timestamp DESC, id DESC LIMIT ?",
        )?;

        let mut rows = stmt.query([limit as i64])?;
        let mut commands = Vec::new();
        while let Some(row) = rows.next()? {
            match row.get::<_, String>(0) {
                Ok(text) => commands.push(text),
                Err(err) => warn!("skipping unreadable history row: {err}"),
            }
        }

        Ok(commands)
    }

    fn search_substring(&self, pattern: &str, limit: usize) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT command FROM history
             WHERE command LIKE ? ESCAPE '\\'
             GROUP BY command
             ORDER BY MAX(timestamp) DESC, MAX(id) DESC
             LIMIT ?",
        )?;

        let needle = format!("%{}%", escape_like(pattern));
        let mut rows = stmt.query(params![needle, limit as i64])?;
        let mut commands = Vec::new();
        while let Some(row) = rows.next()? {
            commands.push(row.get(0)?);
        }

        Ok(commands)
    }
}

/// Vec-backed adapter with the same observable contract as
/// [`SqliteStore`], minus durability.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Vec<HistoryEntry>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything inserted so far, oldest first.
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }
}

impl HistoryStore for MemoryStore {
    fn insert(&mut self, text: &str, ts_ms: i64, session_id: Option<&str>) -> Result<()> {
        self.entries.push(HistoryEntry {
            text: text.to_string(),
            ts_ms,
            session_id: session_id.map(str::to_owned),
        });
        Ok(())
    }

    fn recent(&self, limit: usize) -> Result<Vec<String>> {
        Ok(self
            .entries
            .iter()
            .rev()
            .take(limit)
            .map(|entry| entry.text.clone())
            .collect())
    }

    fn search_substring(&self, pattern: &str, limit: usize) -> Result<Vec<String>> {
        let needle = pattern.to_lowercase();
        let mut seen = std::collections::HashSet::new();
        let mut matches = Vec::new();

        for entry in self.entries.iter().rev() {
            if matches.len() == limit {
                break;
            }
            if entry.text.to_lowercase().contains(&needle) && seen.insert(entry.text.clone()) {
                matches.push(entry.text.clone());
            }
        }

        Ok(matches)
    }
}

/// Default on-disk location for a character's history database:
/// `<platform config dir>/mudline/characters/<character_id>/history.db`.
///
/// `None` when the platform offers no home directory to anchor it.
pub fn character_history_path(character_id: &str) -> Option<PathBuf> {
    let dirs = ProjectDirs::from("com", "mudline", "mudline")?;
    Some(
        dirs.config_dir()
            .join("characters")
            .join(character_id)
            .join("history.db"),
    )
}

/// Escapes `LIKE` metacharacters so user text in a pattern matches
/// literally.
fn escape_like(pattern: &str) -> String {
    let mut escaped = String::with_capacity(pattern.len());
    for ch in pattern.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
