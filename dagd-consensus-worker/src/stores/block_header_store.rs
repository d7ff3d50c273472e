// Copyright (c) 2022 MASSA LABS <info@massa.net>

use super::cached_access::{CachedBucketAccess, StoredU64};
use crate::staging_area::{StagingArea, StagingShardOps};
use dagd_consensus_exports::error::ConsensusResult;
use dagd_db_exports::{
    Bucket, DatabaseError, DbReader, DbTransaction, BLOCK_HEADERS_BUCKET, BLOCK_HEADERS_COUNT_KEY,
};
use dagd_hash::Hash;
use dagd_models::block_header::{BlockHeader, BlockHeaderDeserializer, BlockHeaderSerializer};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

struct BlockHeaderStoreInner {
    access: CachedBucketAccess<BlockHeader, BlockHeaderSerializer, BlockHeaderDeserializer>,
    count: StoredU64,
}

/// Block headers by hash, with a persisted count.
///
/// Headers are kept when a block body is pruned, so this store usually
/// holds more entries than the block store.
#[derive(Clone)]
pub struct BlockHeaderStore {
    inner: Arc<BlockHeaderStoreInner>,
}

impl BlockHeaderStore {
    pub fn new<R: DbReader + ?Sized>(
        db: &R,
        prefix_bucket: &Bucket,
        cache_size: u32,
    ) -> ConsensusResult<Self> {
        let count = StoredU64::load(db, prefix_bucket.key(BLOCK_HEADERS_COUNT_KEY))?;
        Ok(BlockHeaderStore {
            inner: Arc::new(BlockHeaderStoreInner {
                access: CachedBucketAccess::new(
                    prefix_bucket.bucket(BLOCK_HEADERS_BUCKET),
                    cache_size,
                    BlockHeaderSerializer::new(),
                    BlockHeaderDeserializer::new(),
                ),
                count,
            }),
        })
    }

    fn shard<'a>(&self, area: &'a mut StagingArea) -> &'a mut BlockHeaderStagingShard {
        area.get_or_create_shard(|| BlockHeaderStagingShard {
            store: self.clone(),
            to_add: HashMap::new(),
            to_delete: HashSet::new(),
            committed_count: None,
        })
    }

    pub fn stage(&self, area: &mut StagingArea, hash: Hash, header: &BlockHeader) {
        let shard = self.shard(area);
        shard.to_delete.remove(&hash);
        shard.to_add.insert(hash, header.clone());
    }

    pub fn is_staged(&self, area: &StagingArea) -> bool {
        area.shard::<BlockHeaderStagingShard>()
            .map_or(false, StagingShardOps::is_staged)
    }

    pub fn get<R: DbReader + ?Sized>(
        &self,
        db: &R,
        area: &StagingArea,
        hash: &Hash,
    ) -> ConsensusResult<BlockHeader> {
        if let Some(shard) = area.shard::<BlockHeaderStagingShard>() {
            if let Some(header) = shard.to_add.get(hash) {
                return Ok(header.clone());
            }
            if shard.to_delete.contains(hash) {
                return Err(DatabaseError::NotFound(format!(
                    "header {} is staged for deletion",
                    hash
                ))
                .into());
            }
        }
        self.inner.access.read(db, hash)
    }

    pub fn get_many<R: DbReader + ?Sized>(
        &self,
        db: &R,
        area: &StagingArea,
        hashes: &[Hash],
    ) -> ConsensusResult<Vec<BlockHeader>> {
        hashes.iter().map(|hash| self.get(db, area, hash)).collect()
    }

    pub fn has<R: DbReader + ?Sized>(
        &self,
        db: &R,
        area: &StagingArea,
        hash: &Hash,
    ) -> ConsensusResult<bool> {
        if let Some(shard) = area.shard::<BlockHeaderStagingShard>() {
            if shard.to_add.contains_key(hash) {
                return Ok(true);
            }
            if shard.to_delete.contains(hash) {
                return Ok(false);
            }
        }
        self.inner.access.contains(db, hash)
    }

    pub fn delete(&self, area: &mut StagingArea, hash: Hash) {
        let shard = self.shard(area);
        if shard.to_add.remove(&hash).is_none() {
            shard.to_delete.insert(hash);
        }
    }

    /// Number of headers once `area` is committed
    pub fn count<R: DbReader + ?Sized>(&self, db: &R, area: &StagingArea) -> ConsensusResult<u64> {
        let mut count = self.inner.count.get().unwrap_or(0);
        if let Some(shard) = area.shard::<BlockHeaderStagingShard>() {
            for hash in shard.to_add.keys() {
                if !self.inner.access.contains(db, hash)? {
                    count += 1;
                }
            }
            for hash in &shard.to_delete {
                if self.inner.access.contains(db, hash)? {
                    count = count.saturating_sub(1);
                }
            }
        }
        Ok(count)
    }

    /// Count the committed headers by scanning the bucket
    pub fn recount<R: DbReader + ?Sized>(&self, db: &R) -> ConsensusResult<u64> {
        Ok(self.inner.access.hashes(db)?.len() as u64)
    }
}

pub(crate) struct BlockHeaderStagingShard {
    store: BlockHeaderStore,
    to_add: HashMap<Hash, BlockHeader>,
    to_delete: HashSet<Hash>,
    committed_count: Option<u64>,
}

impl StagingShardOps for BlockHeaderStagingShard {
    fn commit(&mut self, tx: &dyn DbTransaction) -> ConsensusResult<()> {
        if !self.is_staged() {
            return Ok(());
        }
        let inner = &self.store.inner;
        let mut count = inner.count.get().unwrap_or(0);
        for (hash, header) in &self.to_add {
            if !inner.access.contains(tx, hash)? {
                count += 1;
            }
            inner.access.write(tx, hash, header)?;
        }
        for hash in &self.to_delete {
            if inner.access.contains(tx, hash)? {
                count = count.saturating_sub(1);
            }
            inner.access.erase(tx, hash)?;
        }
        inner.count.write(tx, Some(count))?;
        self.committed_count = Some(count);
        Ok(())
    }

    fn update_caches(self) {
        let inner = &self.store.inner;
        for hash in &self.to_delete {
            inner.access.cache_remove(hash);
        }
        for (hash, header) in self.to_add {
            inner.access.cache_insert(hash, header);
        }
        if let Some(count) = self.committed_count {
            inner.count.set(Some(count));
        }
    }

    fn is_staged(&self) -> bool {
        !self.to_add.is_empty() || !self.to_delete.is_empty()
    }
}
