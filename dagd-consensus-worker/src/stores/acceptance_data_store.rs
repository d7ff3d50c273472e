// Copyright (c) 2022 MASSA LABS <info@massa.net>

use super::cached_access::CachedBucketAccess;
use crate::staging_area::{StagingArea, StagingShardOps};
use dagd_consensus_exports::error::ConsensusResult;
use dagd_db_exports::{Bucket, DatabaseError, DbReader, DbTransaction, ACCEPTANCE_DATA_BUCKET};
use dagd_hash::Hash;
use dagd_models::acceptance_data::{
    AcceptanceData, AcceptanceDataDeserializer, AcceptanceDataSerializer,
};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Acceptance data of chain blocks by hash
#[derive(Clone)]
pub struct AcceptanceDataStore {
    access: Arc<CachedBucketAccess<AcceptanceData, AcceptanceDataSerializer, AcceptanceDataDeserializer>>,
}

impl AcceptanceDataStore {
    pub fn new(prefix_bucket: &Bucket, cache_size: u32) -> Self {
        AcceptanceDataStore {
            access: Arc::new(CachedBucketAccess::new(
                prefix_bucket.bucket(ACCEPTANCE_DATA_BUCKET),
                cache_size,
                AcceptanceDataSerializer::new(),
                AcceptanceDataDeserializer::new(),
            )),
        }
    }

    fn shard<'a>(&self, area: &'a mut StagingArea) -> &'a mut AcceptanceDataStagingShard {
        area.get_or_create_shard(|| AcceptanceDataStagingShard {
            store: self.clone(),
            to_add: HashMap::new(),
            to_delete: HashSet::new(),
        })
    }

    pub fn stage(&self, area: &mut StagingArea, hash: Hash, acceptance_data: &AcceptanceData) {
        let shard = self.shard(area);
        shard.to_delete.remove(&hash);
        shard.to_add.insert(hash, acceptance_data.clone());
    }

    pub fn is_staged(&self, area: &StagingArea) -> bool {
        area.shard::<AcceptanceDataStagingShard>()
            .map_or(false, StagingShardOps::is_staged)
    }

    pub fn get<R: DbReader + ?Sized>(
        &self,
        db: &R,
        area: &StagingArea,
        hash: &Hash,
    ) -> ConsensusResult<AcceptanceData> {
        if let Some(shard) = area.shard::<AcceptanceDataStagingShard>() {
            if let Some(acceptance_data) = shard.to_add.get(hash) {
                return Ok(acceptance_data.clone());
            }
            if shard.to_delete.contains(hash) {
                return Err(DatabaseError::NotFound(format!(
                    "acceptance data of {} is staged for deletion",
                    hash
                ))
                .into());
            }
        }
        self.access.read(db, hash)
    }

    pub fn has<R: DbReader + ?Sized>(
        &self,
        db: &R,
        area: &StagingArea,
        hash: &Hash,
    ) -> ConsensusResult<bool> {
        if let Some(shard) = area.shard::<AcceptanceDataStagingShard>() {
            if shard.to_add.contains_key(hash) {
                return Ok(true);
            }
            if shard.to_delete.contains(hash) {
                return Ok(false);
            }
        }
        self.access.contains(db, hash)
    }

    pub fn delete(&self, area: &mut StagingArea, hash: Hash) {
        let shard = self.shard(area);
        if shard.to_add.remove(&hash).is_none() {
            shard.to_delete.insert(hash);
        }
    }
}

pub(crate) struct AcceptanceDataStagingShard {
    store: AcceptanceDataStore,
    to_add: HashMap<Hash, AcceptanceData>,
    to_delete: HashSet<Hash>,
}

impl StagingShardOps for AcceptanceDataStagingShard {
    fn commit(&mut self, tx: &dyn DbTransaction) -> ConsensusResult<()> {
        for (hash, acceptance_data) in &self.to_add {
            self.store.access.write(tx, hash, acceptance_data)?;
        }
        for hash in &self.to_delete {
            self.store.access.erase(tx, hash)?;
        }
        Ok(())
    }

    fn update_caches(self) {
        for hash in &self.to_delete {
            self.store.access.cache_remove(hash);
        }
        for (hash, acceptance_data) in self.to_add {
            self.store.access.cache_insert(hash, acceptance_data);
        }
    }

    fn is_staged(&self) -> bool {
        !self.to_add.is_empty() || !self.to_delete.is_empty()
    }
}
