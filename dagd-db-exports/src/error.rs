use displaydoc::Display;
use thiserror::Error;

#[non_exhaustive]
#[derive(Display, Error, Debug, Clone, PartialEq, Eq)]
pub enum DatabaseError {
    /// key not found: {0}
    NotFound(String),
    /// closed cursor: {0}
    ClosedCursor(String),
    /// closed transaction: {0}
    ClosedTransaction(String),
    /// cursor exhausted: {0}
    CursorExhausted(String),
    /// rocksdb error: {0}
    RocksDBError(String),
    /// invalid database prefix byte: {0}
    InvalidPrefix(u8),
    /// corrupted record: {0}
    CorruptedData(String),
}

impl DatabaseError {
    /// The requested key is absent, which callers usually treat as a
    /// regular outcome rather than a failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, DatabaseError::NotFound(_))
    }
}
