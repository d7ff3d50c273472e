// Copyright (c) 2022 MASSA LABS <info@massa.net>
//! Datastores of a consensus instance.
//!
//! Every store reads in three tiers: the staging area of the current
//! operation, then its LRU cache, then the database. Writes only ever go
//! through a staging area.

pub mod acceptance_data_store;
pub mod block_header_store;
pub mod block_store;
pub mod daa_blocks_store;
pub mod headers_selected_chain_store;

mod cached_access;

use acceptance_data_store::AcceptanceDataStore;
use block_header_store::BlockHeaderStore;
use block_store::BlockStore;
use daa_blocks_store::DaaBlocksStore;
use dagd_consensus_exports::{error::ConsensusResult, ConsensusConfig};
use dagd_db_exports::{DbPrefix, DbReader};
use headers_selected_chain_store::HeadersSelectedChainStore;

/// All the stores of one consensus instance, rooted under its prefix
#[derive(Clone)]
pub struct ConsensusStores {
    pub block_store: BlockStore,
    pub block_header_store: BlockHeaderStore,
    pub acceptance_data_store: AcceptanceDataStore,
    pub daa_blocks_store: DaaBlocksStore,
    pub headers_selected_chain_store: HeadersSelectedChainStore,
}

impl ConsensusStores {
    pub fn new<R: DbReader + ?Sized>(
        db: &R,
        prefix: DbPrefix,
        config: &ConsensusConfig,
    ) -> ConsensusResult<Self> {
        let prefix_bucket = prefix.bucket();
        Ok(ConsensusStores {
            block_store: BlockStore::new(db, &prefix_bucket, config.block_cache_size)?,
            block_header_store: BlockHeaderStore::new(
                db,
                &prefix_bucket,
                config.header_cache_size,
            )?,
            acceptance_data_store: AcceptanceDataStore::new(
                &prefix_bucket,
                config.acceptance_data_cache_size,
            ),
            daa_blocks_store: DaaBlocksStore::new(&prefix_bucket, config.daa_cache_size),
            headers_selected_chain_store: HeadersSelectedChainStore::new(
                db,
                &prefix_bucket,
                config.selected_chain_cache_size,
            )?,
        })
    }
}
