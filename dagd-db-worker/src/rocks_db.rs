use crate::cursor::RocksCursor;
use crate::helpers::end_prefix;
use crate::transaction::RocksTransaction;
use dagd_db_exports::{
    Bucket, Database, DatabaseError, DbConfig, DbCursor, DbKey, DbReader, DbTransaction,
    DbWriter,
};
use rocksdb::{Options, ReadOptions, DB};
use std::fmt;
use tracing::debug;

/// Wrapped RocksDB database
pub struct RocksDatabase {
    pub(crate) db: DB,
    pub(crate) config: DbConfig,
}

impl fmt::Debug for RocksDatabase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RocksDatabase")
            .field("path", &self.config.path)
            .finish()
    }
}

impl RocksDatabase {
    /// Opens the database at `config.path`
    pub fn new(config: DbConfig) -> Result<Self, DatabaseError> {
        let db_opts = Self::default_db_opts(&config);
        Self::new_with_options(config, db_opts)
    }

    pub fn default_db_opts(config: &DbConfig) -> Options {
        let mut db_opts = Options::default();
        db_opts.set_max_open_files(config.max_open_files);
        db_opts.create_if_missing(config.create_if_missing);
        db_opts
    }

    /// Returns a new `RocksDatabase` instance given a config and RocksDB options
    pub fn new_with_options(config: DbConfig, db_opts: Options) -> Result<Self, DatabaseError> {
        let db = DB::open(&db_opts, &config.path)
            .map_err(|err| DatabaseError::RocksDBError(err.to_string()))?;
        debug!("opened database at {}", config.path.display());
        Ok(RocksDatabase { db, config })
    }

    pub fn config(&self) -> &DbConfig {
        &self.config
    }

    /// Raw `(key, value)` pairs of a bucket, in key order
    pub(crate) fn bucket_entries(
        &self,
        bucket: &Bucket,
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>, DatabaseError> {
        let mut entries = Vec::new();
        let mut iterator = self.db.raw_iterator_opt(bucket_read_options(bucket));
        iterator.seek_to_first();
        while iterator.valid() {
            if let (Some(key), Some(value)) = (iterator.key(), iterator.value()) {
                entries.push((key.to_vec(), value.to_vec()));
            }
            iterator.next();
        }
        iterator
            .status()
            .map_err(|err| DatabaseError::RocksDBError(err.to_string()))?;
        Ok(entries)
    }
}

/// Read options restricting iteration to the range of `bucket`
pub(crate) fn bucket_read_options(bucket: &Bucket) -> ReadOptions {
    let mut opt = ReadOptions::default();
    opt.set_iterate_lower_bound(bucket.path().to_vec());
    if let Some(end) = end_prefix(bucket.path()) {
        opt.set_iterate_upper_bound(end);
    }
    opt
}

impl DbReader for RocksDatabase {
    fn get(&self, key: &DbKey) -> Result<Vec<u8>, DatabaseError> {
        self.db
            .get(key.bytes())
            .map_err(|err| DatabaseError::RocksDBError(err.to_string()))?
            .ok_or_else(|| DatabaseError::NotFound(key.to_string()))
    }

    fn has(&self, key: &DbKey) -> Result<bool, DatabaseError> {
        Ok(self
            .db
            .get_pinned(key.bytes())
            .map_err(|err| DatabaseError::RocksDBError(err.to_string()))?
            .is_some())
    }

    fn cursor(&self, bucket: &Bucket) -> Result<Box<dyn DbCursor + '_>, DatabaseError> {
        let iterator = self.db.raw_iterator_opt(bucket_read_options(bucket));
        Ok(Box::new(RocksCursor::new(iterator, bucket.clone())))
    }
}

impl DbWriter for RocksDatabase {
    fn put(&self, key: &DbKey, value: &[u8]) -> Result<(), DatabaseError> {
        self.db
            .put(key.bytes(), value)
            .map_err(|err| DatabaseError::RocksDBError(err.to_string()))
    }

    fn delete(&self, key: &DbKey) -> Result<(), DatabaseError> {
        self.db
            .delete(key.bytes())
            .map_err(|err| DatabaseError::RocksDBError(err.to_string()))
    }
}

impl Database for RocksDatabase {
    fn begin(&self) -> Result<Box<dyn DbTransaction + '_>, DatabaseError> {
        Ok(Box::new(RocksTransaction::new(self)))
    }

    fn flush(&self) -> Result<(), DatabaseError> {
        self.db
            .flush()
            .map_err(|err| DatabaseError::RocksDBError(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tempfile::tempdir;

    fn open(path: &std::path::Path) -> RocksDatabase {
        RocksDatabase::new(DbConfig::new(path.to_path_buf())).expect("failed to open database")
    }

    #[test]
    fn test_put_get_delete() {
        let temp_dir = tempdir().expect("Unable to create a temp folder");
        let db = open(temp_dir.path());
        let key = Bucket::make(b"a").key(b"k");
        assert_matches!(db.get(&key), Err(DatabaseError::NotFound(_)));
        assert!(!db.has(&key).unwrap());
        db.put(&key, b"v").unwrap();
        assert_eq!(db.get(&key).unwrap(), b"v".to_vec());
        assert!(db.has(&key).unwrap());
        db.delete(&key).unwrap();
        assert!(!db.has(&key).unwrap());
        // deleting an absent key is fine
        db.delete(&key).unwrap();
    }

    #[test]
    fn test_cannot_open_twice() {
        let temp_dir = tempdir().expect("Unable to create a temp folder");
        let _db = open(temp_dir.path());
        assert_matches!(
            RocksDatabase::new(DbConfig::new(temp_dir.path().to_path_buf())),
            Err(DatabaseError::RocksDBError(_))
        );
    }

    #[test]
    fn test_cursor_stays_in_bucket() {
        let temp_dir = tempdir().expect("Unable to create a temp folder");
        let db = open(temp_dir.path());
        let root = Bucket::make(&[0]);
        let a = root.bucket(b"a");
        let ab = root.bucket(b"ab");
        let other_prefix = Bucket::make(&[1]).bucket(b"a");
        for suffix in [b"1", b"2", b"3"] {
            db.put(&a.key(suffix), suffix).unwrap();
            db.put(&ab.key(suffix), b"sibling").unwrap();
            db.put(&other_prefix.key(suffix), b"other").unwrap();
        }

        let mut cursor = db.cursor(&a).unwrap();
        let mut seen = Vec::new();
        while cursor.next() {
            let key = cursor.key().unwrap();
            assert_eq!(key.bucket(), &a);
            seen.push((key.suffix().to_vec(), cursor.value().unwrap()));
        }
        assert_eq!(
            seen,
            vec![
                (b"1".to_vec(), b"1".to_vec()),
                (b"2".to_vec(), b"2".to_vec()),
                (b"3".to_vec(), b"3".to_vec()),
            ]
        );
        assert_matches!(cursor.key(), Err(DatabaseError::CursorExhausted(_)));
        cursor.close().unwrap();
    }

    #[test]
    fn test_cursor_seek_and_close() {
        let temp_dir = tempdir().expect("Unable to create a temp folder");
        let db = open(temp_dir.path());
        let bucket = Bucket::make(b"s");
        db.put(&bucket.key(b"a"), b"1").unwrap();
        db.put(&bucket.key(b"c"), b"3").unwrap();

        let mut cursor = db.cursor(&bucket).unwrap();
        cursor.seek(&bucket.key(b"c")).unwrap();
        assert_eq!(cursor.value().unwrap(), b"3".to_vec());
        assert_matches!(
            cursor.seek(&bucket.key(b"b")),
            Err(DatabaseError::NotFound(_))
        );
        assert_eq!(cursor.key().unwrap().suffix(), b"c");
        assert!(cursor.first());
        assert_eq!(cursor.key().unwrap().suffix(), b"a");

        cursor.close().unwrap();
        assert_matches!(cursor.close(), Err(DatabaseError::ClosedCursor(_)));
        assert_matches!(cursor.key(), Err(DatabaseError::ClosedCursor(_)));
        assert_matches!(cursor.value(), Err(DatabaseError::ClosedCursor(_)));
        assert_matches!(
            cursor.seek(&bucket.key(b"a")),
            Err(DatabaseError::ClosedCursor(_))
        );
    }

    #[test]
    #[should_panic]
    fn test_first_on_closed_cursor_panics() {
        let temp_dir = tempdir().expect("Unable to create a temp folder");
        let db = open(temp_dir.path());
        let mut cursor = db.cursor(&Bucket::make(b"s")).unwrap();
        cursor.close().unwrap();
        cursor.first();
    }

    #[test]
    fn test_data_survives_reopen() {
        let temp_dir = tempdir().expect("Unable to create a temp folder");
        let key = Bucket::make(b"p").key(b"k");
        {
            let db = open(temp_dir.path());
            db.put(&key, b"persisted").unwrap();
            db.flush().unwrap();
        }
        let db = open(temp_dir.path());
        assert_eq!(db.get(&key).unwrap(), b"persisted".to_vec());
    }
}
