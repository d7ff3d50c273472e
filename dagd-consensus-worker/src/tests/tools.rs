// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::Consensus;
use dagd_consensus_exports::ConsensusConfig;
use dagd_db_exports::{
    Bucket, Database, DatabaseError, DbConfig, DbCursor, DbKey, DbPrefix, DbReader,
    DbTransaction, DbWriter,
};
use dagd_db_worker::RocksDatabase;
use dagd_hash::Hash;
use dagd_models::{
    block::Block, block_header::BlockHeader, transaction::Transaction,
};
use parking_lot::Mutex;
use std::sync::Arc;
use tempfile::TempDir;
use tracing::info_span;

pub fn open_db(dir: &TempDir) -> Arc<RocksDatabase> {
    Arc::new(
        RocksDatabase::new(DbConfig::new(dir.path().to_path_buf()))
            .expect("could not open test database"),
    )
}

pub fn start_consensus(db: Arc<dyn Database>, config: ConsensusConfig) -> Consensus {
    Consensus::new(config, db, DbPrefix::ZERO, info_span!("consensus"))
        .expect("could not start consensus")
}

/// Block with a single coinbase whose payload is `tag`, so that blocks
/// sharing parents and work still get distinct hashes
pub fn create_block(parents: Vec<Hash>, blue_work: u128, tag: u64) -> Block {
    let coinbase = Transaction {
        version: 0,
        inputs: Vec::new(),
        outputs: Vec::new(),
        lock_time: 0,
        payload: tag.to_be_bytes().to_vec(),
    };
    let mut header = BlockHeader::new_basic(parents, tag, tag, tag, blue_work);
    header.hash_merkle_root = coinbase.id();
    Block {
        header,
        transactions: vec![coinbase],
    }
}

/// Reader that runs `hook` once, right after its first `get` has read the
/// database and before the value is handed back
pub struct InterleavingReader<'a> {
    inner: &'a dyn DbReader,
    hook: Mutex<Option<Box<dyn FnOnce() + 'a>>>,
}

impl<'a> InterleavingReader<'a> {
    pub fn new(inner: &'a dyn DbReader, hook: impl FnOnce() + 'a) -> Self {
        InterleavingReader {
            inner,
            hook: Mutex::new(Some(Box::new(hook))),
        }
    }

    pub fn hook_ran(&self) -> bool {
        self.hook.lock().is_none()
    }
}

impl<'a> DbReader for InterleavingReader<'a> {
    fn get(&self, key: &DbKey) -> Result<Vec<u8>, DatabaseError> {
        let value = self.inner.get(key);
        let hook = self.hook.lock().take();
        if let Some(hook) = hook {
            hook();
        }
        value
    }

    fn has(&self, key: &DbKey) -> Result<bool, DatabaseError> {
        self.inner.has(key)
    }

    fn cursor(&self, bucket: &Bucket) -> Result<Box<dyn DbCursor + '_>, DatabaseError> {
        self.inner.cursor(bucket)
    }
}

/// Database whose transactions fail on a chosen write
#[derive(Debug)]
pub struct FailingDatabase {
    inner: RocksDatabase,
    /// number of writes still allowed, `None` to never fail
    remaining_puts: Mutex<Option<usize>>,
}

impl FailingDatabase {
    pub fn new(inner: RocksDatabase) -> Self {
        FailingDatabase {
            inner,
            remaining_puts: Mutex::new(None),
        }
    }

    /// Let `count` transactional writes through, then fail the next ones
    pub fn fail_after(&self, count: usize) {
        *self.remaining_puts.lock() = Some(count);
    }

    pub fn stop_failing(&self) {
        *self.remaining_puts.lock() = None;
    }

    fn consume_put(&self) -> Result<(), DatabaseError> {
        let mut remaining = self.remaining_puts.lock();
        match *remaining {
            Some(0) => Err(DatabaseError::RocksDBError("injected write failure".into())),
            Some(count) => {
                *remaining = Some(count - 1);
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl DbReader for FailingDatabase {
    fn get(&self, key: &DbKey) -> Result<Vec<u8>, DatabaseError> {
        self.inner.get(key)
    }

    fn has(&self, key: &DbKey) -> Result<bool, DatabaseError> {
        self.inner.has(key)
    }

    fn cursor(&self, bucket: &Bucket) -> Result<Box<dyn DbCursor + '_>, DatabaseError> {
        self.inner.cursor(bucket)
    }
}

impl DbWriter for FailingDatabase {
    fn put(&self, key: &DbKey, value: &[u8]) -> Result<(), DatabaseError> {
        self.inner.put(key, value)
    }

    fn delete(&self, key: &DbKey) -> Result<(), DatabaseError> {
        self.inner.delete(key)
    }
}

impl Database for FailingDatabase {
    fn begin(&self) -> Result<Box<dyn DbTransaction + '_>, DatabaseError> {
        Ok(Box::new(FailingTransaction {
            inner: self.inner.begin()?,
            database: self,
        }))
    }

    fn flush(&self) -> Result<(), DatabaseError> {
        self.inner.flush()
    }
}

struct FailingTransaction<'a> {
    inner: Box<dyn DbTransaction + 'a>,
    database: &'a FailingDatabase,
}

impl<'a> DbReader for FailingTransaction<'a> {
    fn get(&self, key: &DbKey) -> Result<Vec<u8>, DatabaseError> {
        self.inner.get(key)
    }

    fn has(&self, key: &DbKey) -> Result<bool, DatabaseError> {
        self.inner.has(key)
    }

    fn cursor(&self, bucket: &Bucket) -> Result<Box<dyn DbCursor + '_>, DatabaseError> {
        self.inner.cursor(bucket)
    }
}

impl<'a> DbWriter for FailingTransaction<'a> {
    fn put(&self, key: &DbKey, value: &[u8]) -> Result<(), DatabaseError> {
        self.database.consume_put()?;
        self.inner.put(key, value)
    }

    fn delete(&self, key: &DbKey) -> Result<(), DatabaseError> {
        self.inner.delete(key)
    }
}

impl<'a> DbTransaction for FailingTransaction<'a> {
    fn commit(&self) -> Result<(), DatabaseError> {
        self.inner.commit()
    }

    fn rollback(&self) -> Result<(), DatabaseError> {
        self.inner.rollback()
    }

    fn rollback_unless_closed(&self) -> Result<(), DatabaseError> {
        self.inner.rollback_unless_closed()
    }
}
