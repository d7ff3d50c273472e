use crate::helpers::key_in_bucket;
use dagd_db_exports::{Bucket, DatabaseError, DbCursor, DbKey, CLOSED_CURSOR_ERROR};
use rocksdb::DBRawIterator;

/// Cursor over a bucket of the on-disk database.
///
/// The underlying iterator is bounded to the bucket range, so it never
/// yields keys of another bucket.
pub struct RocksCursor<'a> {
    iterator: Option<DBRawIterator<'a>>,
    bucket: Bucket,
    started: bool,
}

impl<'a> RocksCursor<'a> {
    pub(crate) fn new(iterator: DBRawIterator<'a>, bucket: Bucket) -> Self {
        RocksCursor {
            iterator: Some(iterator),
            bucket,
            started: false,
        }
    }

    fn live_iterator(&self, action: &str) -> Result<&DBRawIterator<'a>, DatabaseError> {
        self.iterator.as_ref().ok_or_else(|| {
            DatabaseError::ClosedCursor(format!("cannot {} on a closed cursor", action))
        })
    }

    fn positioned_iterator(&self, action: &str) -> Result<&DBRawIterator<'a>, DatabaseError> {
        let iterator = self.live_iterator(action)?;
        if !self.started || !iterator.valid() {
            return Err(DatabaseError::CursorExhausted(format!(
                "cannot {} on an exhausted cursor over {}",
                action, self.bucket
            )));
        }
        Ok(iterator)
    }
}

impl<'a> DbCursor for RocksCursor<'a> {
    fn first(&mut self) -> bool {
        let iterator = self.iterator.as_mut().expect(CLOSED_CURSOR_ERROR);
        iterator.seek_to_first();
        self.started = true;
        iterator.valid()
    }

    fn next(&mut self) -> bool {
        if !self.started {
            return self.first();
        }
        let iterator = self.iterator.as_mut().expect(CLOSED_CURSOR_ERROR);
        if !iterator.valid() {
            return false;
        }
        iterator.next();
        iterator.valid()
    }

    fn seek(&mut self, key: &DbKey) -> Result<(), DatabaseError> {
        let target = key.bytes();
        let iterator = self.iterator.as_mut().ok_or_else(|| {
            DatabaseError::ClosedCursor("cannot seek on a closed cursor".to_string())
        })?;
        iterator.seek(&target);
        self.started = true;
        iterator
            .status()
            .map_err(|err| DatabaseError::RocksDBError(err.to_string()))?;
        match iterator.key() {
            Some(found) if found == target.as_slice() => Ok(()),
            _ => Err(DatabaseError::NotFound(key.to_string())),
        }
    }

    fn key(&self) -> Result<DbKey, DatabaseError> {
        let iterator = self.positioned_iterator("read a key")?;
        match iterator.key() {
            Some(raw_key) => key_in_bucket(&self.bucket, raw_key),
            None => Err(DatabaseError::CursorExhausted(self.bucket.to_string())),
        }
    }

    fn value(&self) -> Result<Vec<u8>, DatabaseError> {
        let iterator = self.positioned_iterator("read a value")?;
        match iterator.value() {
            Some(value) => Ok(value.to_vec()),
            None => Err(DatabaseError::CursorExhausted(self.bucket.to_string())),
        }
    }

    fn close(&mut self) -> Result<(), DatabaseError> {
        match self.iterator.take() {
            Some(_) => Ok(()),
            None => Err(DatabaseError::ClosedCursor(
                "cannot close an already closed cursor".to_string(),
            )),
        }
    }
}

/// Cursor over an in-memory, already sorted snapshot of a bucket.
///
/// Transactions use it to expose their pending writes merged over the
/// on-disk content.
pub struct MemoryCursor {
    entries: Vec<(Vec<u8>, Vec<u8>)>,
    bucket: Bucket,
    /// `None` before the first move, `Some(entries.len())` once exhausted
    position: Option<usize>,
    closed: bool,
}

impl MemoryCursor {
    pub fn new(bucket: Bucket, entries: Vec<(Vec<u8>, Vec<u8>)>) -> Self {
        MemoryCursor {
            entries,
            bucket,
            position: None,
            closed: false,
        }
    }

    fn current(&self, action: &str) -> Result<&(Vec<u8>, Vec<u8>), DatabaseError> {
        if self.closed {
            return Err(DatabaseError::ClosedCursor(format!(
                "cannot {} on a closed cursor",
                action
            )));
        }
        self.position
            .and_then(|position| self.entries.get(position))
            .ok_or_else(|| {
                DatabaseError::CursorExhausted(format!(
                    "cannot {} on an exhausted cursor over {}",
                    action, self.bucket
                ))
            })
    }
}

impl DbCursor for MemoryCursor {
    fn first(&mut self) -> bool {
        assert!(!self.closed, "{}", CLOSED_CURSOR_ERROR);
        self.position = Some(0);
        !self.entries.is_empty()
    }

    fn next(&mut self) -> bool {
        assert!(!self.closed, "{}", CLOSED_CURSOR_ERROR);
        let next = match self.position {
            None => 0,
            Some(position) => (position + 1).min(self.entries.len()),
        };
        self.position = Some(next);
        next < self.entries.len()
    }

    fn seek(&mut self, key: &DbKey) -> Result<(), DatabaseError> {
        if self.closed {
            return Err(DatabaseError::ClosedCursor(
                "cannot seek on a closed cursor".to_string(),
            ));
        }
        let target = key.bytes();
        let position = self
            .entries
            .partition_point(|(raw_key, _)| raw_key.as_slice() < target.as_slice());
        self.position = Some(position);
        match self.entries.get(position) {
            Some((raw_key, _)) if *raw_key == target => Ok(()),
            _ => Err(DatabaseError::NotFound(key.to_string())),
        }
    }

    fn key(&self) -> Result<DbKey, DatabaseError> {
        let (raw_key, _) = self.current("read a key")?;
        key_in_bucket(&self.bucket, raw_key)
    }

    fn value(&self) -> Result<Vec<u8>, DatabaseError> {
        let (_, value) = self.current("read a value")?;
        Ok(value.clone())
    }

    fn close(&mut self) -> Result<(), DatabaseError> {
        if self.closed {
            return Err(DatabaseError::ClosedCursor(
                "cannot close an already closed cursor".to_string(),
            ));
        }
        self.closed = true;
        self.entries.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn cursor_with(keys: &[&[u8]]) -> (Bucket, MemoryCursor) {
        let bucket = Bucket::make(b"b");
        let entries = keys
            .iter()
            .map(|suffix| (bucket.key(suffix).bytes(), suffix.to_vec()))
            .collect();
        (bucket.clone(), MemoryCursor::new(bucket, entries))
    }

    #[test]
    fn test_memory_cursor_walk() {
        let (_, mut cursor) = cursor_with(&[b"a", b"c"]);
        assert_matches!(cursor.key(), Err(DatabaseError::CursorExhausted(_)));
        assert!(cursor.next());
        assert_eq!(cursor.key().unwrap().suffix(), b"a");
        assert!(cursor.next());
        assert_eq!(cursor.value().unwrap(), b"c".to_vec());
        assert!(!cursor.next());
        assert!(!cursor.next());
        assert_matches!(cursor.value(), Err(DatabaseError::CursorExhausted(_)));
    }

    #[test]
    fn test_memory_cursor_seek() {
        let (bucket, mut cursor) = cursor_with(&[b"a", b"c"]);
        assert_matches!(cursor.seek(&bucket.key(b"b")), Err(DatabaseError::NotFound(_)));
        // positioned on the next greater key
        assert_eq!(cursor.key().unwrap().suffix(), b"c");
        cursor.seek(&bucket.key(b"a")).unwrap();
        assert_eq!(cursor.key().unwrap().suffix(), b"a");
    }

    #[test]
    fn test_memory_cursor_close() {
        let (_, mut cursor) = cursor_with(&[b"a"]);
        cursor.close().unwrap();
        assert_matches!(cursor.close(), Err(DatabaseError::ClosedCursor(_)));
        assert_matches!(cursor.key(), Err(DatabaseError::ClosedCursor(_)));
    }

    #[test]
    #[should_panic]
    fn test_memory_cursor_next_after_close_panics() {
        let (_, mut cursor) = cursor_with(&[b"a"]);
        cursor.close().unwrap();
        cursor.next();
    }
}
