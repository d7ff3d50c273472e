// Copyright (c) 2022 MASSA LABS <info@massa.net>
use dagd_hash::Hash;
use dagd_models::{acceptance_data::AcceptanceData, chain_changes::ChainChanges};
use serde::{Deserialize, Serialize};

/// Data computed by the validation pipeline and persisted with a block body
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockContext {
    /// blocks merged by this block and counted for difficulty adjustment
    pub daa_added_blocks: Vec<Hash>,
    /// acceptance of the merged transactions
    pub acceptance_data: AcceptanceData,
}

/// Outcome of inserting a header or a block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockInsertionResult {
    /// inserted block
    pub block_hash: Hash,
    /// movement of the headers selected chain caused by the insertion
    pub selected_chain_changes: ChainChanges,
}
