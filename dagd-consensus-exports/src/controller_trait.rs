// Copyright (c) 2022 MASSA LABS <info@massa.net>
use crate::block_context::{BlockContext, BlockInsertionResult};
use crate::error::ConsensusResult;
use dagd_db_exports::DbPrefix;
use dagd_hash::Hash;
use dagd_models::{
    acceptance_data::AcceptanceData, block::Block, block_header::BlockHeader,
    chain_changes::ChainChanges,
};

/// Interface of a consensus instance, shared by the node components.
///
/// Reads go straight to the stores; writes are serialized and applied
/// atomically, so a reader observes either none or all of an insertion.
pub trait ConsensusController: Send + Sync {
    /// Database prefix this instance lives under
    fn prefix(&self) -> DbPrefix;

    /// Insert a block with its header and the context computed by validation
    fn validate_and_insert_block(
        &self,
        block: Block,
        context: BlockContext,
    ) -> ConsensusResult<BlockInsertionResult>;

    /// Insert a header without body
    fn validate_and_insert_header(
        &self,
        header: BlockHeader,
    ) -> ConsensusResult<BlockInsertionResult>;

    fn get_block(&self, hash: &Hash) -> ConsensusResult<Block>;

    /// Blocks in the requested order, fails on the first unknown hash
    fn get_blocks(&self, hashes: &[Hash]) -> ConsensusResult<Vec<Block>>;

    fn has_block(&self, hash: &Hash) -> ConsensusResult<bool>;

    fn get_block_header(&self, hash: &Hash) -> ConsensusResult<BlockHeader>;

    fn has_block_header(&self, hash: &Hash) -> ConsensusResult<bool>;

    /// Number of stored block bodies
    fn get_block_count(&self) -> ConsensusResult<u64>;

    /// Number of stored headers
    fn get_header_count(&self) -> ConsensusResult<u64>;

    /// Every block with a stored body, in key order
    fn get_all_block_hashes(&self) -> ConsensusResult<Vec<Hash>>;

    fn get_daa_score(&self, hash: &Hash) -> ConsensusResult<u64>;

    fn get_daa_added_blocks(&self, hash: &Hash) -> ConsensusResult<Vec<Hash>>;

    fn get_acceptance_data(&self, hash: &Hash) -> ConsensusResult<AcceptanceData>;

    /// Tip of the headers selected chain, `None` before any insertion
    fn get_headers_selected_tip(&self) -> ConsensusResult<Option<Hash>>;

    fn get_chain_block_by_index(&self, index: u64) -> ConsensusResult<Hash>;

    fn get_chain_block_index(&self, hash: &Hash) -> ConsensusResult<u64>;

    /// Chain changes leading from `hash` to the current selected tip
    fn get_virtual_selected_parent_chain_from_block(
        &self,
        hash: &Hash,
    ) -> ConsensusResult<ChainChanges>;

    /// Drop the body, acceptance data and DAA data of a block, keeping its header
    fn delete_block_body(&self, hash: &Hash) -> ConsensusResult<()>;
}
