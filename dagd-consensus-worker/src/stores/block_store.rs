// Copyright (c) 2022 MASSA LABS <info@massa.net>

use super::cached_access::{CachedBucketAccess, StoredU64};
use crate::staging_area::{StagingArea, StagingShardOps};
use dagd_consensus_exports::error::ConsensusResult;
use dagd_db_exports::{
    Bucket, DatabaseError, DbReader, DbTransaction, BLOCKS_BUCKET, BLOCKS_COUNT_KEY,
};
use dagd_hash::Hash;
use dagd_models::block::{Block, BlockDeserializer, BlockSerializer};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

struct BlockStoreInner {
    access: CachedBucketAccess<Block, BlockSerializer, BlockDeserializer>,
    count: StoredU64,
}

/// Block bodies by hash, with a persisted count
#[derive(Clone)]
pub struct BlockStore {
    inner: Arc<BlockStoreInner>,
}

impl BlockStore {
    pub fn new<R: DbReader + ?Sized>(
        db: &R,
        prefix_bucket: &Bucket,
        cache_size: u32,
    ) -> ConsensusResult<Self> {
        let count = StoredU64::load(db, prefix_bucket.key(BLOCKS_COUNT_KEY))?;
        Ok(BlockStore {
            inner: Arc::new(BlockStoreInner {
                access: CachedBucketAccess::new(
                    prefix_bucket.bucket(BLOCKS_BUCKET),
                    cache_size,
                    BlockSerializer::new(),
                    BlockDeserializer::new(),
                ),
                count,
            }),
        })
    }

    fn shard<'a>(&self, area: &'a mut StagingArea) -> &'a mut BlockStagingShard {
        area.get_or_create_shard(|| BlockStagingShard {
            store: self.clone(),
            to_add: HashMap::new(),
            to_delete: HashSet::new(),
            committed_count: None,
        })
    }

    pub fn stage(&self, area: &mut StagingArea, hash: Hash, block: &Block) {
        let shard = self.shard(area);
        shard.to_delete.remove(&hash);
        shard.to_add.insert(hash, block.clone());
    }

    pub fn is_staged(&self, area: &StagingArea) -> bool {
        area.shard::<BlockStagingShard>()
            .map_or(false, StagingShardOps::is_staged)
    }

    pub fn get<R: DbReader + ?Sized>(
        &self,
        db: &R,
        area: &StagingArea,
        hash: &Hash,
    ) -> ConsensusResult<Block> {
        if let Some(shard) = area.shard::<BlockStagingShard>() {
            if let Some(block) = shard.to_add.get(hash) {
                return Ok(block.clone());
            }
            if shard.to_delete.contains(hash) {
                return Err(
                    DatabaseError::NotFound(format!("block {} is staged for deletion", hash)).into(),
                );
            }
        }
        self.inner.access.read(db, hash)
    }

    /// Blocks in the order of `hashes`, failing on the first missing one
    pub fn get_many<R: DbReader + ?Sized>(
        &self,
        db: &R,
        area: &StagingArea,
        hashes: &[Hash],
    ) -> ConsensusResult<Vec<Block>> {
        hashes.iter().map(|hash| self.get(db, area, hash)).collect()
    }

    pub fn has<R: DbReader + ?Sized>(
        &self,
        db: &R,
        area: &StagingArea,
        hash: &Hash,
    ) -> ConsensusResult<bool> {
        if let Some(shard) = area.shard::<BlockStagingShard>() {
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

    /// Number of blocks once `area` is committed
    pub fn count<R: DbReader + ?Sized>(&self, db: &R, area: &StagingArea) -> ConsensusResult<u64> {
        let mut count = self.inner.count.get().unwrap_or(0);
        if let Some(shard) = area.shard::<BlockStagingShard>() {
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

    /// Every block hash once `area` is committed, in byte order
    pub fn all_hashes<R: DbReader + ?Sized>(
        &self,
        db: &R,
        area: &StagingArea,
    ) -> ConsensusResult<Vec<Hash>> {
        let mut hashes: BTreeSet<Hash> = self.inner.access.hashes(db)?.into_iter().collect();
        if let Some(shard) = area.shard::<BlockStagingShard>() {
            hashes.extend(shard.to_add.keys().copied());
            for hash in &shard.to_delete {
                hashes.remove(hash);
            }
        }
        Ok(hashes.into_iter().collect())
    }

    /// Count the committed blocks by scanning the bucket
    pub fn recount<R: DbReader + ?Sized>(&self, db: &R) -> ConsensusResult<u64> {
        Ok(self.inner.access.hashes(db)?.len() as u64)
    }
}

/// Pending block insertions and deletions
pub(crate) struct BlockStagingShard {
    store: BlockStore,
    to_add: HashMap<Hash, Block>,
    to_delete: HashSet<Hash>,
    committed_count: Option<u64>,
}

impl StagingShardOps for BlockStagingShard {
    fn commit(&mut self, tx: &dyn DbTransaction) -> ConsensusResult<()> {
        if !self.is_staged() {
            return Ok(());
        }
        let inner = &self.store.inner;
        let mut count = inner.count.get().unwrap_or(0);
        for (hash, block) in &self.to_add {
            if !inner.access.contains(tx, hash)? {
                count += 1;
            }
            inner.access.write(tx, hash, block)?;
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
        for (hash, block) in self.to_add {
            inner.access.cache_insert(hash, block);
        }
        if let Some(count) = self.committed_count {
            inner.count.set(Some(count));
        }
    }

    fn is_staged(&self) -> bool {
        !self.to_add.is_empty() || !self.to_delete.is_empty()
    }
}
