//! # mudline
//!
//! Interactive input core for a line-oriented MUD client: command history
//! with an optional durable SQLite tier, and context-sensitive tab
//! completion.
//!
//! Two independent components, composed by the line editor on every
//! keystroke:
//!
//! - [`History`] — ordered, deduplicated log of submitted commands with a
//!   replay cursor, prefix/substring lookup, and optional persistence
//!   across sessions.
//! - [`Completer`] — stateful ranker that returns the best completion for
//!   the current buffer and cycles through alternatives on repeated calls.
//!
//! The crate has no terminal or network surface of its own. The editor
//! calls [`History::add`] when a line is submitted, [`History::previous`]
//! and [`History::next`] on history keys, and [`Completer::complete`] on
//! the completion key; [`Completer::reset`] must be called on any edit
//! that is not itself a repeated completion.

pub mod completion;
mod error;
pub mod history;

pub use completion::Completer;
pub use error::{Error, Result};
pub use history::store::{
    character_history_path, HistoryEntry, HistoryStore, MemoryStore, SqliteStore,
};
pub use history::{History, HistoryConfig};
