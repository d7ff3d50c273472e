use crate::cursor::MemoryCursor;
use crate::helpers::end_prefix;
use crate::rocks_db::RocksDatabase;
use dagd_db_exports::{
    Bucket, DatabaseError, DbCursor, DbKey, DbReader, DbTransaction, DbWriter,
};
use parking_lot::Mutex;
use rocksdb::WriteBatch;
use std::collections::BTreeMap;
use std::ops::Bound::{Included, Excluded, Unbounded};

struct TransactionState {
    /// pending writes, `None` marks a deletion
    changes: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
    is_closed: bool,
}

/// Buffered transaction over a `RocksDatabase`.
///
/// Nothing reaches the disk before `commit`, which writes every pending
/// change in one atomic `WriteBatch`.
pub struct RocksTransaction<'a> {
    database: &'a RocksDatabase,
    state: Mutex<TransactionState>,
}

impl<'a> RocksTransaction<'a> {
    pub(crate) fn new(database: &'a RocksDatabase) -> Self {
        RocksTransaction {
            database,
            state: Mutex::new(TransactionState {
                changes: BTreeMap::new(),
                is_closed: false,
            }),
        }
    }

    fn closed_error(action: &str) -> DatabaseError {
        DatabaseError::ClosedTransaction(format!("cannot {} a closed transaction", action))
    }
}

impl<'a> DbReader for RocksTransaction<'a> {
    fn get(&self, key: &DbKey) -> Result<Vec<u8>, DatabaseError> {
        {
            let state = self.state.lock();
            if state.is_closed {
                return Err(Self::closed_error("get from"));
            }
            match state.changes.get(&key.bytes()) {
                Some(Some(value)) => return Ok(value.clone()),
                Some(None) => return Err(DatabaseError::NotFound(key.to_string())),
                None => {}
            }
        }
        self.database.get(key)
    }

    fn has(&self, key: &DbKey) -> Result<bool, DatabaseError> {
        {
            let state = self.state.lock();
            if state.is_closed {
                return Err(Self::closed_error("check"));
            }
            if let Some(change) = state.changes.get(&key.bytes()) {
                return Ok(change.is_some());
            }
        }
        self.database.has(key)
    }

    fn cursor(&self, bucket: &Bucket) -> Result<Box<dyn DbCursor + '_>, DatabaseError> {
        let state = self.state.lock();
        if state.is_closed {
            return Err(Self::closed_error("open a cursor on"));
        }
        let mut merged: BTreeMap<Vec<u8>, Vec<u8>> =
            self.database.bucket_entries(bucket)?.into_iter().collect();
        let start = bucket.path().to_vec();
        let range = match end_prefix(&start) {
            Some(end) => (Included(start), Excluded(end)),
            None => (Included(start), Unbounded),
        };
        for (key, change) in state.changes.range(range) {
            match change {
                Some(value) => {
                    merged.insert(key.clone(), value.clone());
                }
                None => {
                    merged.remove(key);
                }
            }
        }
        Ok(Box::new(MemoryCursor::new(
            bucket.clone(),
            merged.into_iter().collect(),
        )))
    }
}

impl<'a> DbWriter for RocksTransaction<'a> {
    fn put(&self, key: &DbKey, value: &[u8]) -> Result<(), DatabaseError> {
        let mut state = self.state.lock();
        if state.is_closed {
            return Err(Self::closed_error("put in"));
        }
        state.changes.insert(key.bytes(), Some(value.to_vec()));
        Ok(())
    }

    fn delete(&self, key: &DbKey) -> Result<(), DatabaseError> {
        let mut state = self.state.lock();
        if state.is_closed {
            return Err(Self::closed_error("delete from"));
        }
        state.changes.insert(key.bytes(), None);
        Ok(())
    }
}

impl<'a> DbTransaction for RocksTransaction<'a> {
    fn commit(&self) -> Result<(), DatabaseError> {
        let changes = {
            let mut state = self.state.lock();
            if state.is_closed {
                return Err(Self::closed_error("commit"));
            }
            state.is_closed = true;
            std::mem::take(&mut state.changes)
        };
        let mut batch = WriteBatch::default();
        for (key, change) in changes {
            match change {
                Some(value) => batch.put(key, value),
                None => batch.delete(key),
            }
        }
        self.database
            .db
            .write(batch)
            .map_err(|err| DatabaseError::RocksDBError(err.to_string()))
    }

    fn rollback(&self) -> Result<(), DatabaseError> {
        let mut state = self.state.lock();
        if state.is_closed {
            return Err(Self::closed_error("rollback"));
        }
        state.is_closed = true;
        state.changes.clear();
        Ok(())
    }

    fn rollback_unless_closed(&self) -> Result<(), DatabaseError> {
        let mut state = self.state.lock();
        if !state.is_closed {
            state.is_closed = true;
            state.changes.clear();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dagd_db_exports::{Database, DbConfig};
    use assert_matches::assert_matches;
    use tempfile::tempdir;

    fn open(path: &std::path::Path) -> RocksDatabase {
        RocksDatabase::new(DbConfig::new(path.to_path_buf())).expect("failed to open database")
    }

    #[test]
    fn test_reads_own_writes() {
        let temp_dir = tempdir().expect("Unable to create a temp folder");
        let db = open(temp_dir.path());
        let bucket = Bucket::make(b"t");
        db.put(&bucket.key(b"old"), b"1").unwrap();

        let tx = db.begin().unwrap();
        tx.put(&bucket.key(b"new"), b"2").unwrap();
        tx.delete(&bucket.key(b"old")).unwrap();
        assert_eq!(tx.get(&bucket.key(b"new")).unwrap(), b"2".to_vec());
        assert_matches!(tx.get(&bucket.key(b"old")), Err(DatabaseError::NotFound(_)));
        assert!(!tx.has(&bucket.key(b"old")).unwrap());

        // the database itself is untouched until commit
        assert!(db.has(&bucket.key(b"old")).unwrap());
        assert!(!db.has(&bucket.key(b"new")).unwrap());

        let mut cursor = tx.cursor(&bucket).unwrap();
        assert!(cursor.next());
        assert_eq!(cursor.key().unwrap().suffix(), b"new");
        assert!(!cursor.next());
        cursor.close().unwrap();
        drop(cursor);

        tx.commit().unwrap();
        assert!(!db.has(&bucket.key(b"old")).unwrap());
        assert_eq!(db.get(&bucket.key(b"new")).unwrap(), b"2".to_vec());
    }

    #[test]
    fn test_closed_transaction_rejects_everything() {
        let temp_dir = tempdir().expect("Unable to create a temp folder");
        let db = open(temp_dir.path());
        let key = Bucket::make(b"t").key(b"k");
        let tx = db.begin().unwrap();
        tx.commit().unwrap();
        assert_matches!(tx.commit(), Err(DatabaseError::ClosedTransaction(_)));
        assert_matches!(tx.rollback(), Err(DatabaseError::ClosedTransaction(_)));
        assert_matches!(tx.put(&key, b"v"), Err(DatabaseError::ClosedTransaction(_)));
        assert_matches!(tx.get(&key), Err(DatabaseError::ClosedTransaction(_)));
        tx.rollback_unless_closed().unwrap();
    }

    #[test]
    fn test_rollback_and_drop_discard() {
        let temp_dir = tempdir().expect("Unable to create a temp folder");
        let db = open(temp_dir.path());
        let key = Bucket::make(b"t").key(b"k");

        let tx = db.begin().unwrap();
        tx.put(&key, b"v").unwrap();
        tx.rollback().unwrap();
        assert!(!db.has(&key).unwrap());

        {
            let tx = db.begin().unwrap();
            tx.put(&key, b"v").unwrap();
        }
        assert!(!db.has(&key).unwrap());
    }
}
