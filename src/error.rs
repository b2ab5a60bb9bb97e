//! Crate-wide error type and result alias.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Underlying SQLite failure from the durable tier.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Schema creation or version check failed.
    #[error("schema error: {0}")]
    Schema(String),

    /// Filesystem failure while preparing the store location.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
