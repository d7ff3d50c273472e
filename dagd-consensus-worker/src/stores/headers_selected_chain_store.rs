// Copyright (c) 2022 MASSA LABS <info@massa.net>

use super::cached_access::{decode_u64, encode_u64, hash_from_slice, StoredU64};
use crate::staging_area::{StagingArea, StagingShardOps};
use dagd_consensus_exports::error::{ConsensusError, ConsensusResult};
use dagd_db_exports::{
    Bucket, DatabaseError, DbKey, DbReader, DbTransaction, CHAIN_BLOCK_HASH_BY_INDEX_BUCKET,
    CHAIN_BLOCK_INDEX_BY_HASH_BUCKET, HIGHEST_CHAIN_BLOCK_INDEX_KEY,
};
use dagd_hash::Hash;
use dagd_models::cache::{LruCache, LruCacheU64};
use dagd_models::chain_changes::ChainChanges;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

struct HeadersSelectedChainStoreInner {
    hash_by_index_bucket: Bucket,
    index_by_hash_bucket: Bucket,
    cache_by_index: LruCacheU64<Hash>,
    cache_by_hash: LruCache<Hash, u64>,
    highest_index: StoredU64,
}

/// Bidirectional mapping between the blocks of the headers selected chain
/// and their position in it.
///
/// Indices are contiguous from 0 (the chain root) to the highest index
/// (the selected tip). Index keys are big-endian so that the
/// hash-by-index bucket iterates in chain order.
#[derive(Clone)]
pub struct HeadersSelectedChainStore {
    inner: Arc<HeadersSelectedChainStoreInner>,
}

impl HeadersSelectedChainStore {
    pub fn new<R: DbReader + ?Sized>(
        db: &R,
        prefix_bucket: &Bucket,
        cache_size: u32,
    ) -> ConsensusResult<Self> {
        let highest_index =
            StoredU64::load(db, prefix_bucket.key(HIGHEST_CHAIN_BLOCK_INDEX_KEY))?;
        Ok(HeadersSelectedChainStore {
            inner: Arc::new(HeadersSelectedChainStoreInner {
                hash_by_index_bucket: prefix_bucket.bucket(CHAIN_BLOCK_HASH_BY_INDEX_BUCKET),
                index_by_hash_bucket: prefix_bucket.bucket(CHAIN_BLOCK_INDEX_BY_HASH_BUCKET),
                cache_by_index: LruCache::new(cache_size),
                cache_by_hash: LruCache::new(cache_size),
                highest_index,
            }),
        })
    }

    fn index_key(&self, index: u64) -> DbKey {
        self.inner.hash_by_index_bucket.key(&index.to_be_bytes())
    }

    fn hash_key(&self, hash: &Hash) -> DbKey {
        self.inner.index_by_hash_bucket.key(hash.to_bytes())
    }

    fn shard<'a>(&self, area: &'a mut StagingArea) -> &'a mut HeadersSelectedChainStagingShard {
        area.get_or_create_shard(|| HeadersSelectedChainStagingShard {
            store: self.clone(),
            added_by_hash: HashMap::new(),
            added_by_index: HashMap::new(),
            removed_by_hash: HashSet::new(),
            removed_by_index: HashSet::new(),
            new_highest_index: None,
        })
    }

    /// Stage a chain movement.
    ///
    /// `removed` must be exactly the top of the current chain and `added`
    /// is appended right above what remains. Only one set of changes may
    /// be staged per area.
    pub fn stage<R: DbReader + ?Sized>(
        &self,
        db: &R,
        area: &mut StagingArea,
        changes: &ChainChanges,
    ) -> ConsensusResult<()> {
        if self.is_staged(area) {
            return Err(ConsensusError::AlreadyStaged);
        }
        let current_highest = self.highest_index(area);

        let mut removed = Vec::with_capacity(changes.removed.len());
        for hash in &changes.removed {
            match self.index_by_hash(db, area, hash) {
                Ok(index) => removed.push((index, *hash)),
                Err(err) if err.is_not_found() => {
                    return Err(ConsensusError::InvalidChainChanges(format!(
                        "removed block {} is not in the chain",
                        hash
                    )))
                }
                Err(err) => return Err(err),
            }
        }
        removed.sort_unstable_by_key(|(index, _)| *index);
        let chain_length = current_highest.map_or(0, |highest| highest + 1);
        let remaining = chain_length
            .checked_sub(removed.len() as u64)
            .ok_or_else(|| {
                ConsensusError::InvalidChainChanges(format!(
                    "cannot remove {} blocks from a chain of {}",
                    removed.len(),
                    chain_length
                ))
            })?;
        for (offset, (index, hash)) in removed.iter().enumerate() {
            if *index != remaining + offset as u64 {
                return Err(ConsensusError::InvalidChainChanges(format!(
                    "removed block {} at index {} is not part of the chain top",
                    hash, index
                )));
            }
        }

        let removed_hashes: HashSet<Hash> = changes.removed.iter().copied().collect();
        let mut added_seen = HashSet::with_capacity(changes.added.len());
        for hash in &changes.added {
            if !added_seen.insert(*hash) {
                return Err(ConsensusError::InvalidChainChanges(format!(
                    "block {} is added twice",
                    hash
                )));
            }
            if removed_hashes.contains(hash) {
                continue;
            }
            match self.index_by_hash(db, area, hash) {
                Ok(index) => {
                    return Err(ConsensusError::InvalidChainChanges(format!(
                        "block {} is already in the chain at index {}",
                        hash, index
                    )))
                }
                Err(err) if err.is_not_found() => {}
                Err(err) => return Err(err),
            }
        }

        let new_highest_index = match (changes.added.len() as u64, remaining) {
            (0, 0) => None,
            (0, remaining) => Some(remaining - 1),
            (added, remaining) => Some(remaining + added - 1),
        };

        let shard = self.shard(area);
        for (index, hash) in removed {
            shard.removed_by_index.insert(index);
            shard.removed_by_hash.insert(hash);
        }
        for (offset, hash) in changes.added.iter().enumerate() {
            let index = remaining + offset as u64;
            shard.added_by_index.insert(index, *hash);
            shard.added_by_hash.insert(*hash, index);
        }
        shard.new_highest_index = Some(new_highest_index);
        Ok(())
    }

    pub fn is_staged(&self, area: &StagingArea) -> bool {
        area.shard::<HeadersSelectedChainStagingShard>()
            .map_or(false, StagingShardOps::is_staged)
    }

    /// Position of `hash` in the chain
    pub fn index_by_hash<R: DbReader + ?Sized>(
        &self,
        db: &R,
        area: &StagingArea,
        hash: &Hash,
    ) -> ConsensusResult<u64> {
        if let Some(shard) = area.shard::<HeadersSelectedChainStagingShard>() {
            if let Some(index) = shard.added_by_hash.get(hash) {
                return Ok(*index);
            }
            if shard.removed_by_hash.contains(hash) {
                return Err(DatabaseError::NotFound(format!(
                    "block {} is staged to leave the chain",
                    hash
                ))
                .into());
            }
        }
        if let Some(index) = self.inner.cache_by_hash.get(hash) {
            return Ok(index);
        }
        let generation = self.inner.cache_by_hash.generation();
        let index = decode_u64(&db.get(&self.hash_key(hash))?)?;
        self.inner.cache_by_hash.fill(*hash, index, generation);
        Ok(index)
    }

    /// Chain block at `index`
    pub fn hash_by_index<R: DbReader + ?Sized>(
        &self,
        db: &R,
        area: &StagingArea,
        index: u64,
    ) -> ConsensusResult<Hash> {
        if let Some(shard) = area.shard::<HeadersSelectedChainStagingShard>() {
            if let Some(hash) = shard.added_by_index.get(&index) {
                return Ok(*hash);
            }
            if shard.removed_by_index.contains(&index) {
                return Err(DatabaseError::NotFound(format!(
                    "chain index {} is staged for removal",
                    index
                ))
                .into());
            }
        }
        if let Some(hash) = self.inner.cache_by_index.get(&index) {
            return Ok(hash);
        }
        let generation = self.inner.cache_by_index.generation();
        let hash = hash_from_slice(&db.get(&self.index_key(index))?)?;
        self.inner.cache_by_index.fill(index, hash, generation);
        Ok(hash)
    }

    /// Index of the selected tip, `None` for an empty chain
    pub fn highest_index(&self, area: &StagingArea) -> Option<u64> {
        if let Some(shard) = area.shard::<HeadersSelectedChainStagingShard>() {
            if let Some(staged) = shard.new_highest_index {
                return staged;
            }
        }
        self.inner.highest_index.get()
    }

    /// Chain blocks from `index` up to the tip, in chain order
    pub fn chain_from_index<R: DbReader + ?Sized>(
        &self,
        db: &R,
        area: &StagingArea,
        index: u64,
    ) -> ConsensusResult<Vec<Hash>> {
        match self.highest_index(area) {
            Some(highest) if index <= highest => (index..=highest)
                .map(|index| self.hash_by_index(db, area, index))
                .collect(),
            _ => Ok(Vec::new()),
        }
    }
}

pub(crate) struct HeadersSelectedChainStagingShard {
    store: HeadersSelectedChainStore,
    added_by_hash: HashMap<Hash, u64>,
    added_by_index: HashMap<u64, Hash>,
    removed_by_hash: HashSet<Hash>,
    removed_by_index: HashSet<u64>,
    /// `Some(None)` once the whole chain is staged for removal
    new_highest_index: Option<Option<u64>>,
}

impl StagingShardOps for HeadersSelectedChainStagingShard {
    fn commit(&mut self, tx: &dyn DbTransaction) -> ConsensusResult<()> {
        let Some(new_highest_index) = self.new_highest_index else {
            return Ok(());
        };
        let store = &self.store;
        for hash in &self.removed_by_hash {
            tx.delete(&store.hash_key(hash))?;
        }
        for index in &self.removed_by_index {
            tx.delete(&store.index_key(*index))?;
        }
        for (hash, index) in &self.added_by_hash {
            tx.put(&store.hash_key(hash), &encode_u64(*index)?)?;
            tx.put(&store.index_key(*index), hash.to_bytes())?;
        }
        store.inner.highest_index.write(tx, new_highest_index)?;
        Ok(())
    }

    fn update_caches(self) {
        let inner = &self.store.inner;
        for hash in &self.removed_by_hash {
            inner.cache_by_hash.remove(hash);
        }
        for index in &self.removed_by_index {
            inner.cache_by_index.remove(index);
        }
        for (hash, index) in self.added_by_hash {
            inner.cache_by_hash.insert(hash, index);
            inner.cache_by_index.insert(index, hash);
        }
        if let Some(new_highest_index) = self.new_highest_index {
            inner.highest_index.set(new_highest_index);
        }
    }

    fn is_staged(&self) -> bool {
        self.new_highest_index.is_some()
    }
}
