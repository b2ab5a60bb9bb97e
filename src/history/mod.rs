//! # Command History
//!
//! Ordered, deduplicated log of submitted commands with a replay cursor
//! and an optional durable tier for cross-session recall.
//!
//! The in-memory sequence is authoritative for the session; the durable
//! store only extends recall beyond it. Navigation and search never touch
//! storage, and a store failure never reaches the caller.

use std::collections::HashSet;

use chrono::Utc;
use tracing::{debug, warn};

mod schema;
pub mod store;

pub use store::{character_history_path, HistoryEntry, HistoryStore, MemoryStore, SqliteStore};

/// Hydration window loaded from the durable tier at attach time.
pub const DEFAULT_HYDRATE_LIMIT: usize = 1000;

/// Cap for callers that do not pick their own deep-search limit.
pub const DEFAULT_DEEP_SEARCH_LIMIT: usize = 50;

/// Configuration for a history log with an attached durable store.
#[derive(Debug, Clone)]
pub struct HistoryConfig {
    /// How many of the most recent durable rows are loaded into memory at
    /// attach time.
    pub hydrate_limit: usize,
    /// Recorded with every durable insert; distinguishes sessions when
    /// several share one database file over time.
    pub session_id: Option<String>,
}

impl HistoryConfig {
    pub fn new() -> Self {
        Self {
            hydrate_limit: DEFAULT_HYDRATE_LIMIT,
            session_id: None,
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Chronological command log with a replay cursor.
///
/// One instance owns one logical session. Adjacent duplicates are
/// suppressed on [`History::add`]; everything else is kept, including
/// non-adjacent repeats.
pub struct History {
    entries: Vec<String>,
    /// Replay cursor in `[0, entries.len()]`; `entries.len()` means "past
    /// the newest entry" (blank line, nothing selected).
    position: usize,
    store: Option<Box<dyn HistoryStore>>,
    session_id: Option<String>,
    dropped_writes: u64,
}

impl History {
    /// In-memory log with no durable tier.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            position: 0,
            store: None,
            session_id: None,
            dropped_writes: 0,
        }
    }

    /// Attaches `store` with default configuration and hydrates the
    /// in-memory sequence from its most recent rows.
    pub fn with_store(store: Box<dyn HistoryStore>) -> Self {
        Self::with_config(store, HistoryConfig::new())
    }

    /// Attaches `store` and hydrates up to `config.hydrate_limit` of its
    /// most recent rows, oldest first, leaving the cursor past the newest
    /// entry.
    ///
    /// A failing hydration query degrades to an empty log; the store stays
    /// attached so later writes are still attempted.
    pub fn with_config(store: Box<dyn HistoryStore>, config: HistoryConfig) -> Self {
        let entries = match store.recent(config.hydrate_limit) {
            Ok(mut recent) => {
                // Newest-first from the store; restore chronological order.
                recent.reverse();
                recent
            }
            Err(err) => {
                warn!("history hydration failed, starting empty: {err}");
                Vec::new()
            }
        };

        let position = entries.len();
        Self {
            entries,
            position,
            store: Some(store),
            session_id: config.session_id,
            dropped_writes: 0,
        }
    }

    /// Appends a submitted command and resets the cursor past the newest
    /// entry.
    ///
    /// A command equal to the newest entry is suppressed entirely: nothing
    /// is appended and nothing is written to the store. A durable write
    /// failure is counted and logged, never propagated; the in-memory copy
    /// remains authoritative.
    pub fn add(&mut self, command: &str) {
        if self.entries.last().is_some_and(|last| last == command) {
            self.position = self.entries.len();
            return;
        }

        self.entries.push(command.to_string());
        self.position = self.entries.len();

        if let Some(store) = self.store.as_mut() {
            let ts_ms = Utc::now().timestamp_millis();
            if let Err(err) = store.insert(command, ts_ms, self.session_id.as_deref()) {
                self.dropped_writes += 1;
                warn!("dropping history write: {err}");
            }
        }
    }

    /// Steps the cursor toward the oldest entry and returns the entry at
    /// the new position. At the oldest entry this keeps returning it.
    pub fn previous(&mut self) -> Option<&str> {
        if self.entries.is_empty() {
            return None;
        }

        if self.position > 0 {
            self.position -= 1;
        }
        self.entries.get(self.position).map(String::as_str)
    }

    /// Steps the cursor toward the newest entry. Past the newest entry it
    /// returns `None` and parks the cursor there, which is how the editor
    /// detects it has walked back to a blank line.
    pub fn next(&mut self) -> Option<&str> {
        if self.position + 1 < self.entries.len() {
            self.position += 1;
            return self.entries.get(self.position).map(String::as_str);
        }

        self.position = self.entries.len();
        None
    }

    /// Parks the cursor past the newest entry without touching the
    /// sequence.
    pub fn reset(&mut self) {
        self.position = self.entries.len();
    }

    /// Most recent entry. Does not move the cursor.
    pub fn last(&self) -> Option<&str> {
        self.entries.last().map(String::as_str)
    }

    /// 1-based lookup; `None` for 0 or anything past the newest entry.
    pub fn nth(&self, index: usize) -> Option<&str> {
        if index == 0 {
            return None;
        }
        self.entries.get(index - 1).map(String::as_str)
    }

    /// First entry starting with `prefix`, scanning newest to oldest.
    /// Case-sensitive.
    pub fn find_prefix(&self, prefix: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|entry| entry.starts_with(prefix))
            .map(String::as_str)
    }

    /// Case-insensitive substring search over the in-memory sequence,
    /// newest first, deduplicated by exact text (the most recent
    /// occurrence wins).
    pub fn search(&self, pattern: &str) -> Vec<String> {
        let needle = pattern.to_lowercase();
        let mut seen = HashSet::new();
        let mut results = Vec::new();

        for entry in self.entries.iter().rev() {
            if entry.to_lowercase().contains(&needle) && seen.insert(entry.as_str()) {
                results.push(entry.clone());
            }
        }

        results
    }

    /// Substring search against the durable tier, reaching history beyond
    /// the hydrated window: distinct texts, newest first, capped at
    /// `limit`.
    ///
    /// Without a store, or when the store query fails, this degrades to
    /// [`History::search`] over the in-memory sequence.
    pub fn search_deep(&self, pattern: &str, limit: usize) -> Vec<String> {
        if let Some(store) = self.store.as_ref() {
            match store.search_substring(pattern, limit) {
                Ok(results) => return results,
                Err(err) => {
                    debug!("deep history search failed, using in-memory search: {err}");
                }
            }
        }

        self.search(pattern)
    }

    /// Owned copy of the full sequence in chronological order.
    pub fn entries(&self) -> Vec<String> {
        self.entries.clone()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Durable writes swallowed so far. Stays 0 while no store is
    /// attached.
    pub fn dropped_writes(&self) -> u64 {
        self.dropped_writes
    }

    /// Releases the durable store. Idempotent; the log keeps working
    /// in-memory afterwards.
    pub fn close(&mut self) {
        self.store = None;
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}
