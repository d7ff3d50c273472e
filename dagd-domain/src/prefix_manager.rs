// Copyright (c) 2022 MASSA LABS <info@massa.net>
//! Persistence of the active and inactive database prefixes.

use dagd_db_exports::{
    Bucket, Database, DatabaseError, DbKey, DbPrefix, DbReader, DbWriter, ACTIVE_PREFIX_KEY,
    INACTIVE_PREFIX_KEY,
};
use tracing::debug;

fn global_key(name: &[u8]) -> DbKey {
    Bucket::make(&[]).key(name)
}

fn read_prefix<R: DbReader + ?Sized>(db: &R, name: &[u8]) -> Result<Option<DbPrefix>, DatabaseError> {
    match db.get(&global_key(name)) {
        Ok(bytes) => DbPrefix::from_bytes(&bytes).map(Some),
        Err(err) if err.is_not_found() => Ok(None),
        Err(err) => Err(err),
    }
}

pub fn active_prefix<R: DbReader + ?Sized>(db: &R) -> Result<Option<DbPrefix>, DatabaseError> {
    read_prefix(db, ACTIVE_PREFIX_KEY)
}

pub fn set_prefix_as_active<W: DbWriter + ?Sized>(
    db: &W,
    prefix: DbPrefix,
) -> Result<(), DatabaseError> {
    db.put(&global_key(ACTIVE_PREFIX_KEY), &[prefix.to_byte()])
}

pub fn inactive_prefix<R: DbReader + ?Sized>(db: &R) -> Result<Option<DbPrefix>, DatabaseError> {
    read_prefix(db, INACTIVE_PREFIX_KEY)
}

pub fn set_prefix_as_inactive<W: DbWriter + ?Sized>(
    db: &W,
    prefix: DbPrefix,
) -> Result<(), DatabaseError> {
    db.put(&global_key(INACTIVE_PREFIX_KEY), &[prefix.to_byte()])
}

/// Keys deleted per transaction when wiping a prefix
pub const DELETE_PREFIX_BATCH_SIZE: usize = 10_000;

/// Delete every key under `prefix`, returns how many were deleted.
///
/// Runs one transaction per batch: an interrupted wipe leaves a partially
/// deleted prefix behind, which the next call finishes.
pub fn delete_prefix_data<D: Database + ?Sized>(
    db: &D,
    prefix: DbPrefix,
) -> Result<usize, DatabaseError> {
    delete_prefix_data_in_batches(db, prefix, DELETE_PREFIX_BATCH_SIZE)
}

fn delete_prefix_data_in_batches<D: Database + ?Sized>(
    db: &D,
    prefix: DbPrefix,
    batch_size: usize,
) -> Result<usize, DatabaseError> {
    let bucket = prefix.bucket();
    let mut deleted = 0;
    loop {
        let mut keys = Vec::with_capacity(batch_size);
        {
            let mut cursor = db.cursor(&bucket)?;
            while keys.len() < batch_size && cursor.next() {
                keys.push(cursor.key()?);
            }
            cursor.close()?;
        }
        if keys.is_empty() {
            return Ok(deleted);
        }
        let tx = db.begin()?;
        for key in &keys {
            tx.delete(key)?;
        }
        tx.commit()?;
        deleted += keys.len();
        debug!("deleted {} keys of prefix {} so far", deleted, prefix);
    }
}

/// Wipe the inactive prefix, data first and then its record.
///
/// Returns the prefix that was deleted, if any.
pub fn delete_inactive_prefix<D: Database + ?Sized>(
    db: &D,
) -> Result<Option<DbPrefix>, DatabaseError> {
    let Some(prefix) = inactive_prefix(db)? else {
        return Ok(None);
    };
    let deleted = delete_prefix_data(db, prefix)?;
    db.delete(&global_key(INACTIVE_PREFIX_KEY))?;
    debug!("deleted {} keys of inactive prefix {}", deleted, prefix);
    Ok(Some(prefix))
}
