// Copyright (c) 2022 MASSA LABS <info@massa.net>

use super::cached_access::CachedBucketAccess;
use crate::staging_area::{StagingArea, StagingShardOps};
use dagd_consensus_exports::error::ConsensusResult;
use dagd_db_exports::{
    Bucket, DatabaseError, DbReader, DbTransaction, DAA_ADDED_BLOCKS_BUCKET, DAA_SCORE_BUCKET,
};
use dagd_hash::Hash;
use dagd_models::hash_list::{HashListDeserializer, HashListSerializer};
use dagd_serialization::{U64VarIntDeserializer, U64VarIntSerializer};
use std::collections::{HashMap, HashSet};
use std::ops::Bound::{Included, Unbounded};
use std::sync::Arc;

struct DaaBlocksStoreInner {
    daa_score: CachedBucketAccess<u64, U64VarIntSerializer, U64VarIntDeserializer>,
    daa_added_blocks: CachedBucketAccess<Vec<Hash>, HashListSerializer, HashListDeserializer>,
}

/// DAA score and DAA added blocks of every block
#[derive(Clone)]
pub struct DaaBlocksStore {
    inner: Arc<DaaBlocksStoreInner>,
}

impl DaaBlocksStore {
    pub fn new(prefix_bucket: &Bucket, cache_size: u32) -> Self {
        DaaBlocksStore {
            inner: Arc::new(DaaBlocksStoreInner {
                daa_score: CachedBucketAccess::new(
                    prefix_bucket.bucket(DAA_SCORE_BUCKET),
                    cache_size,
                    U64VarIntSerializer::new(),
                    U64VarIntDeserializer::new(Included(0), Unbounded),
                ),
                daa_added_blocks: CachedBucketAccess::new(
                    prefix_bucket.bucket(DAA_ADDED_BLOCKS_BUCKET),
                    cache_size,
                    HashListSerializer::new(),
                    HashListDeserializer::new(),
                ),
            }),
        }
    }

    fn shard<'a>(&self, area: &'a mut StagingArea) -> &'a mut DaaBlocksStagingShard {
        area.get_or_create_shard(|| DaaBlocksStagingShard {
            store: self.clone(),
            daa_score_to_add: HashMap::new(),
            daa_added_blocks_to_add: HashMap::new(),
            daa_score_to_delete: HashSet::new(),
            daa_added_blocks_to_delete: HashSet::new(),
        })
    }

    pub fn stage_daa_score(&self, area: &mut StagingArea, hash: Hash, daa_score: u64) {
        let shard = self.shard(area);
        shard.daa_score_to_delete.remove(&hash);
        shard.daa_score_to_add.insert(hash, daa_score);
    }

    pub fn stage_daa_added_blocks(&self, area: &mut StagingArea, hash: Hash, added: &[Hash]) {
        let shard = self.shard(area);
        shard.daa_added_blocks_to_delete.remove(&hash);
        shard.daa_added_blocks_to_add.insert(hash, added.to_vec());
    }

    pub fn is_staged(&self, area: &StagingArea) -> bool {
        area.shard::<DaaBlocksStagingShard>()
            .map_or(false, StagingShardOps::is_staged)
    }

    pub fn daa_score<R: DbReader + ?Sized>(
        &self,
        db: &R,
        area: &StagingArea,
        hash: &Hash,
    ) -> ConsensusResult<u64> {
        if let Some(shard) = area.shard::<DaaBlocksStagingShard>() {
            if let Some(daa_score) = shard.daa_score_to_add.get(hash) {
                return Ok(*daa_score);
            }
            if shard.daa_score_to_delete.contains(hash) {
                return Err(staged_deletion(hash));
            }
        }
        self.inner.daa_score.read(db, hash)
    }

    pub fn daa_added_blocks<R: DbReader + ?Sized>(
        &self,
        db: &R,
        area: &StagingArea,
        hash: &Hash,
    ) -> ConsensusResult<Vec<Hash>> {
        if let Some(shard) = area.shard::<DaaBlocksStagingShard>() {
            if let Some(added) = shard.daa_added_blocks_to_add.get(hash) {
                return Ok(added.clone());
            }
            if shard.daa_added_blocks_to_delete.contains(hash) {
                return Err(staged_deletion(hash));
            }
        }
        self.inner.daa_added_blocks.read(db, hash)
    }

    /// Delete both the score and the added blocks of `hash`.
    ///
    /// A record staged in this area is only unstaged, the committed one
    /// is left untouched.
    pub fn delete(&self, area: &mut StagingArea, hash: Hash) {
        let shard = self.shard(area);
        if shard.daa_score_to_add.remove(&hash).is_none() {
            shard.daa_score_to_delete.insert(hash);
        }
        if shard.daa_added_blocks_to_add.remove(&hash).is_none() {
            shard.daa_added_blocks_to_delete.insert(hash);
        }
    }
}

fn staged_deletion(hash: &Hash) -> dagd_consensus_exports::error::ConsensusError {
    DatabaseError::NotFound(format!("DAA data of {} is staged for deletion", hash)).into()
}

pub(crate) struct DaaBlocksStagingShard {
    store: DaaBlocksStore,
    daa_score_to_add: HashMap<Hash, u64>,
    daa_added_blocks_to_add: HashMap<Hash, Vec<Hash>>,
    daa_score_to_delete: HashSet<Hash>,
    daa_added_blocks_to_delete: HashSet<Hash>,
}

impl StagingShardOps for DaaBlocksStagingShard {
    fn commit(&mut self, tx: &dyn DbTransaction) -> ConsensusResult<()> {
        let inner = &self.store.inner;
        for (hash, daa_score) in &self.daa_score_to_add {
            inner.daa_score.write(tx, hash, daa_score)?;
        }
        for (hash, added) in &self.daa_added_blocks_to_add {
            inner.daa_added_blocks.write(tx, hash, added)?;
        }
        for hash in &self.daa_score_to_delete {
            inner.daa_score.erase(tx, hash)?;
        }
        for hash in &self.daa_added_blocks_to_delete {
            inner.daa_added_blocks.erase(tx, hash)?;
        }
        Ok(())
    }

    fn update_caches(self) {
        let inner = &self.store.inner;
        for hash in &self.daa_score_to_delete {
            inner.daa_score.cache_remove(hash);
        }
        for hash in &self.daa_added_blocks_to_delete {
            inner.daa_added_blocks.cache_remove(hash);
        }
        for (hash, daa_score) in self.daa_score_to_add {
            inner.daa_score.cache_insert(hash, daa_score);
        }
        for (hash, added) in self.daa_added_blocks_to_add {
            inner.daa_added_blocks.cache_insert(hash, added);
        }
    }

    fn is_staged(&self) -> bool {
        !self.daa_score_to_add.is_empty()
            || !self.daa_added_blocks_to_add.is_empty()
            || !self.daa_score_to_delete.is_empty()
            || !self.daa_added_blocks_to_delete.is_empty()
    }
}
