use crate::{Bucket, DatabaseError, DbKey};
use std::fmt::Debug;

/// Read access to the key-value store.
pub trait DbReader {
    /// Value stored at `key`, `DatabaseError::NotFound` if absent
    fn get(&self, key: &DbKey) -> Result<Vec<u8>, DatabaseError>;

    fn has(&self, key: &DbKey) -> Result<bool, DatabaseError>;

    /// Ordered cursor over the keys of `bucket` and its nested buckets
    fn cursor(&self, bucket: &Bucket) -> Result<Box<dyn DbCursor + '_>, DatabaseError>;
}

/// Write access to the key-value store.
pub trait DbWriter {
    fn put(&self, key: &DbKey, value: &[u8]) -> Result<(), DatabaseError>;

    /// Deleting an absent key is not an error
    fn delete(&self, key: &DbKey) -> Result<(), DatabaseError>;
}

/// Forward cursor over the keys of a bucket, in byte order.
///
/// Moving a closed cursor is a programming error and panics; reading from
/// a closed cursor returns `DatabaseError::ClosedCursor`.
pub trait DbCursor {
    /// Move to the first key. Returns false if the bucket is empty
    fn first(&mut self) -> bool;

    /// Move to the next key, or to the first one on a fresh cursor.
    /// Returns false once exhausted
    fn next(&mut self) -> bool;

    /// Move to the first key greater or equal to `key`.
    /// Returns `DatabaseError::NotFound` unless `key` itself exists
    fn seek(&mut self, key: &DbKey) -> Result<(), DatabaseError>;

    /// Key at the current position, rebuilt within the cursor bucket
    fn key(&self) -> Result<DbKey, DatabaseError>;

    fn value(&self) -> Result<Vec<u8>, DatabaseError>;

    /// Closing twice is an error
    fn close(&mut self) -> Result<(), DatabaseError>;
}

/// A batch of writes applied atomically on commit.
///
/// Reads through a transaction observe its own pending writes. A
/// transaction that is dropped without being committed discards them.
pub trait DbTransaction: DbReader + DbWriter {
    fn commit(&self) -> Result<(), DatabaseError>;

    fn rollback(&self) -> Result<(), DatabaseError>;

    /// Roll back if neither committed nor rolled back yet
    fn rollback_unless_closed(&self) -> Result<(), DatabaseError>;
}

/// The database handle shared by every consensus instance.
pub trait Database: DbReader + DbWriter + Send + Sync + Debug {
    fn begin(&self) -> Result<Box<dyn DbTransaction + '_>, DatabaseError>;

    /// Persist memtables to disk
    fn flush(&self) -> Result<(), DatabaseError>;
}
