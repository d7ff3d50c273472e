// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::staging_area::{commit_all_changes, StagingArea};
use crate::stores::ConsensusStores;
use dagd_consensus_exports::{
    error::{ConsensusError, ConsensusResult},
    BlockContext, BlockInsertionResult, ConsensusConfig, ConsensusController,
};
use dagd_db_exports::{Database, DatabaseError, DbPrefix};
use dagd_hash::Hash;
use dagd_logging::dagd_trace;
use dagd_models::{
    acceptance_data::AcceptanceData, block::Block, block_header::BlockHeader,
    chain_changes::ChainChanges,
};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info, Span};

/// A consensus instance: the stores of one database prefix and the logic
/// that keeps them consistent.
///
/// Insertions are serialized by `processing_lock` and each one is applied
/// through a single staging area, hence a single database transaction.
pub struct Consensus {
    db: Arc<dyn Database>,
    prefix: DbPrefix,
    config: ConsensusConfig,
    stores: ConsensusStores,
    processing_lock: Mutex<()>,
    span: Span,
}

impl Consensus {
    /// Open the consensus stored under `prefix`, inserting the genesis block
    /// unless `config.skip_adding_genesis` is set or it is already there.
    pub fn new(
        config: ConsensusConfig,
        db: Arc<dyn Database>,
        prefix: DbPrefix,
        span: Span,
    ) -> ConsensusResult<Self> {
        let stores = ConsensusStores::new(&*db, prefix, &config)?;
        let consensus = Consensus {
            db,
            prefix,
            config,
            stores,
            processing_lock: Mutex::new(()),
            span,
        };
        if !consensus.config.skip_adding_genesis {
            let genesis = consensus.config.genesis.clone();
            let genesis_hash = genesis.hash();
            if !consensus.has_block(&genesis_hash)? {
                consensus.validate_and_insert_block(genesis, BlockContext::default())?;
                info!("genesis block {} added under prefix {}", genesis_hash, prefix);
            }
        }
        Ok(consensus)
    }

    pub fn stores(&self) -> &ConsensusStores {
        &self.stores
    }

    pub fn config(&self) -> &ConsensusConfig {
        &self.config
    }

    /// Parent with the highest blue work, ties broken by the highest hash
    fn selected_parent(
        &self,
        area: &StagingArea,
        header: &BlockHeader,
    ) -> ConsensusResult<Option<Hash>> {
        let mut best: Option<(u128, Hash)> = None;
        for parent in &header.parents {
            let parent_header = self
                .stores
                .block_header_store
                .get(&*self.db, area, parent)?;
            let candidate = (parent_header.blue_work, *parent);
            if best.map_or(true, |current| candidate > current) {
                best = Some(candidate);
            }
        }
        Ok(best.map(|(_, hash)| hash))
    }

    /// Follow selected parents from `hash` until a chain block is reached.
    ///
    /// Returns the visited blocks that are not on the chain, starting with
    /// `hash` itself, and the chain index where the walk stopped.
    fn walk_to_chain(
        &self,
        area: &StagingArea,
        hash: Hash,
        header: BlockHeader,
    ) -> ConsensusResult<(Vec<Hash>, u64)> {
        let chain = &self.stores.headers_selected_chain_store;
        let mut walked = Vec::new();
        let (mut current, mut current_header) = (hash, header);
        loop {
            match chain.index_by_hash(&*self.db, area, &current) {
                Ok(index) => return Ok((walked, index)),
                Err(err) if err.is_not_found() => {}
                Err(err) => return Err(err),
            }
            walked.push(current);
            let Some(parent) = self.selected_parent(area, &current_header)? else {
                return Err(ConsensusError::ContainerInconsistency(format!(
                    "block {} is not connected to the selected chain",
                    hash
                )));
            };
            current_header = self
                .stores
                .block_header_store
                .get(&*self.db, area, &parent)?;
            current = parent;
        }
    }

    /// Chain movement caused by a new header, empty if it does not beat the
    /// current selected tip
    fn selected_chain_changes(
        &self,
        area: &StagingArea,
        hash: Hash,
        header: &BlockHeader,
    ) -> ConsensusResult<ChainChanges> {
        let db = &*self.db;
        let chain = &self.stores.headers_selected_chain_store;
        let Some(highest) = chain.highest_index(area) else {
            return Ok(ChainChanges {
                removed: Vec::new(),
                added: vec![hash],
            });
        };
        let tip = chain.hash_by_index(db, area, highest)?;
        let tip_header = self.stores.block_header_store.get(db, area, &tip)?;
        if (header.blue_work, hash) <= (tip_header.blue_work, tip) {
            return Ok(ChainChanges::default());
        }
        let (mut added, fork_index) = self.walk_to_chain(area, hash, header.clone())?;
        added.reverse();
        let removed = ((fork_index + 1)..=highest)
            .rev()
            .map(|index| chain.hash_by_index(db, area, index))
            .collect::<ConsensusResult<Vec<_>>>()?;
        Ok(ChainChanges { removed, added })
    }

    /// Stage a new header and the chain movement it causes
    fn stage_header(
        &self,
        area: &mut StagingArea,
        hash: Hash,
        header: &BlockHeader,
    ) -> ConsensusResult<ChainChanges> {
        let db = &*self.db;
        let header_store = &self.stores.block_header_store;
        if header.is_genesis() {
            if header_store.count(db, area)? > 0 {
                return Err(ConsensusError::InvalidBlock(format!(
                    "parentless block {} can only be the first block",
                    hash
                )));
            }
        } else {
            for parent in &header.parents {
                if !header_store.has(db, area, parent)? {
                    return Err(ConsensusError::MissingParent(*parent));
                }
            }
        }
        header_store.stage(area, hash, header);
        let changes = self.selected_chain_changes(area, hash, header)?;
        if !changes.is_empty() {
            self.stores
                .headers_selected_chain_store
                .stage(db, area, &changes)?;
        }
        Ok(changes)
    }

    /// Blocks referenced by a block context must have a known header
    fn check_known_headers(
        &self,
        area: &StagingArea,
        hashes: impl IntoIterator<Item = Hash>,
    ) -> ConsensusResult<()> {
        for hash in hashes {
            if !self
                .stores
                .block_header_store
                .has(&*self.db, area, &hash)?
            {
                return Err(ConsensusError::MissingHeader(hash));
            }
        }
        Ok(())
    }
}

impl ConsensusController for Consensus {
    fn prefix(&self) -> DbPrefix {
        self.prefix
    }

    fn validate_and_insert_block(
        &self,
        block: Block,
        context: BlockContext,
    ) -> ConsensusResult<BlockInsertionResult> {
        let _processing = self.processing_lock.lock();
        let _entered = self.span.enter();
        let db = &*self.db;
        let hash = block.hash();
        let mut area = StagingArea::new();
        if self.stores.block_store.has(db, &area, &hash)? {
            return Err(ConsensusError::DuplicateBlock(hash));
        }

        let selected_chain_changes = if self.stores.block_header_store.has(db, &area, &hash)? {
            ChainChanges::default()
        } else {
            self.stage_header(&mut area, hash, &block.header)?
        };
        self.check_known_headers(&area, context.daa_added_blocks.iter().copied())?;
        self.check_known_headers(
            &area,
            context.acceptance_data.iter().map(|data| data.block_hash),
        )?;

        self.stores.block_store.stage(&mut area, hash, &block);
        self.stores
            .daa_blocks_store
            .stage_daa_score(&mut area, hash, block.header.daa_score);
        self.stores
            .daa_blocks_store
            .stage_daa_added_blocks(&mut area, hash, &context.daa_added_blocks);
        self.stores
            .acceptance_data_store
            .stage(&mut area, hash, &context.acceptance_data);
        commit_all_changes(db, area)?;

        dagd_trace!("consensus.block_inserted", {
            "hash": hash.to_string(),
            "removed": selected_chain_changes.removed.len(),
            "added": selected_chain_changes.added.len()
        });
        debug!("block {} inserted under prefix {}", hash, self.prefix);
        Ok(BlockInsertionResult {
            block_hash: hash,
            selected_chain_changes,
        })
    }

    fn validate_and_insert_header(
        &self,
        header: BlockHeader,
    ) -> ConsensusResult<BlockInsertionResult> {
        let _processing = self.processing_lock.lock();
        let _entered = self.span.enter();
        let db = &*self.db;
        let hash = header.hash();
        let mut area = StagingArea::new();
        if self.stores.block_header_store.has(db, &area, &hash)? {
            return Err(ConsensusError::DuplicateBlock(hash));
        }
        let selected_chain_changes = self.stage_header(&mut area, hash, &header)?;
        commit_all_changes(db, area)?;

        dagd_trace!("consensus.header_inserted", {
            "hash": hash.to_string(),
            "removed": selected_chain_changes.removed.len(),
            "added": selected_chain_changes.added.len()
        });
        Ok(BlockInsertionResult {
            block_hash: hash,
            selected_chain_changes,
        })
    }

    fn get_block(&self, hash: &Hash) -> ConsensusResult<Block> {
        self.stores
            .block_store
            .get(&*self.db, &StagingArea::new(), hash)
    }

    fn get_blocks(&self, hashes: &[Hash]) -> ConsensusResult<Vec<Block>> {
        self.stores
            .block_store
            .get_many(&*self.db, &StagingArea::new(), hashes)
    }

    fn has_block(&self, hash: &Hash) -> ConsensusResult<bool> {
        self.stores
            .block_store
            .has(&*self.db, &StagingArea::new(), hash)
    }

    fn get_block_header(&self, hash: &Hash) -> ConsensusResult<BlockHeader> {
        self.stores
            .block_header_store
            .get(&*self.db, &StagingArea::new(), hash)
    }

    fn has_block_header(&self, hash: &Hash) -> ConsensusResult<bool> {
        self.stores
            .block_header_store
            .has(&*self.db, &StagingArea::new(), hash)
    }

    fn get_block_count(&self) -> ConsensusResult<u64> {
        self.stores
            .block_store
            .count(&*self.db, &StagingArea::new())
    }

    fn get_header_count(&self) -> ConsensusResult<u64> {
        self.stores
            .block_header_store
            .count(&*self.db, &StagingArea::new())
    }

    fn get_all_block_hashes(&self) -> ConsensusResult<Vec<Hash>> {
        self.stores
            .block_store
            .all_hashes(&*self.db, &StagingArea::new())
    }

    fn get_daa_score(&self, hash: &Hash) -> ConsensusResult<u64> {
        self.stores
            .daa_blocks_store
            .daa_score(&*self.db, &StagingArea::new(), hash)
    }

    fn get_daa_added_blocks(&self, hash: &Hash) -> ConsensusResult<Vec<Hash>> {
        self.stores
            .daa_blocks_store
            .daa_added_blocks(&*self.db, &StagingArea::new(), hash)
    }

    fn get_acceptance_data(&self, hash: &Hash) -> ConsensusResult<AcceptanceData> {
        self.stores
            .acceptance_data_store
            .get(&*self.db, &StagingArea::new(), hash)
    }

    fn get_headers_selected_tip(&self) -> ConsensusResult<Option<Hash>> {
        let area = StagingArea::new();
        let chain = &self.stores.headers_selected_chain_store;
        chain
            .highest_index(&area)
            .map(|highest| chain.hash_by_index(&*self.db, &area, highest))
            .transpose()
    }

    fn get_chain_block_by_index(&self, index: u64) -> ConsensusResult<Hash> {
        self.stores
            .headers_selected_chain_store
            .hash_by_index(&*self.db, &StagingArea::new(), index)
    }

    fn get_chain_block_index(&self, hash: &Hash) -> ConsensusResult<u64> {
        self.stores
            .headers_selected_chain_store
            .index_by_hash(&*self.db, &StagingArea::new(), hash)
    }

    fn get_virtual_selected_parent_chain_from_block(
        &self,
        hash: &Hash,
    ) -> ConsensusResult<ChainChanges> {
        let area = StagingArea::new();
        let header = self.get_block_header(hash)?;
        let (removed, fork_index) = self.walk_to_chain(&area, *hash, header)?;
        let added = self
            .stores
            .headers_selected_chain_store
            .chain_from_index(&*self.db, &area, fork_index + 1)?;
        Ok(ChainChanges { removed, added })
    }

    fn delete_block_body(&self, hash: &Hash) -> ConsensusResult<()> {
        let _processing = self.processing_lock.lock();
        let _entered = self.span.enter();
        let db = &*self.db;
        let mut area = StagingArea::new();
        if !self.stores.block_store.has(db, &area, hash)? {
            return Err(DatabaseError::NotFound(format!("block {}", hash)).into());
        }
        self.stores.block_store.delete(&mut area, *hash);
        self.stores.acceptance_data_store.delete(&mut area, *hash);
        self.stores.daa_blocks_store.delete(&mut area, *hash);
        commit_all_changes(db, area)?;
        debug!("body of block {} deleted under prefix {}", hash, self.prefix);
        Ok(())
    }
}
