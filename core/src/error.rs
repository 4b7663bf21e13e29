//! Error types for the replay database and its serialization layers.

use std::collections::TryReserveError;
use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors reported by the database engine, codec and transforms
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Open/load target path absent, or the backing file vanished
    #[error("no database at {0}")]
    NotFound(PathBuf),

    /// Create target path already present
    #[error("database already exists at {0}")]
    AlreadyExists(PathBuf),

    /// Lookup table has reached its fixed on-disk capacity
    #[error("database is full")]
    DatabaseFull,

    /// Read index past the current entry count
    #[error("entry index {index} out of range ({len} entries)")]
    IndexOutOfRange { index: usize, len: usize },

    /// Decoded data violates a structural invariant
    #[error("corrupt data: {0}")]
    CorruptData(String),

    /// Underlying filesystem/stream failure
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Buffer reservation failed while decoding a corrupt or oversized entry
    #[error("allocation failed while decoding: {0}")]
    Allocation(#[from] TryReserveError),
}
