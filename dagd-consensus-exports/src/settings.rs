// Copyright (c) 2022 MASSA LABS <info@massa.net>
//! Consensus configuration
//!
//! Cache sizes are counted in entries. They only bound memory, every
//! value stays readable from the database once evicted.
use crate::genesis::default_genesis_block;
use dagd_models::block::Block;

/// Consensus configuration
#[derive(Debug, Clone)]
pub struct ConsensusConfig {
    /// root block inserted when the consensus is created
    pub genesis: Block,
    /// do not insert `genesis` on creation, used when building a staging consensus
    pub skip_adding_genesis: bool,
    /// block bodies cache size
    pub block_cache_size: u32,
    /// block headers cache size
    pub header_cache_size: u32,
    /// acceptance data cache size
    pub acceptance_data_cache_size: u32,
    /// DAA score and DAA added blocks cache size
    pub daa_cache_size: u32,
    /// headers selected chain cache size, for each direction
    pub selected_chain_cache_size: u32,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        ConsensusConfig {
            genesis: default_genesis_block(),
            skip_adding_genesis: false,
            block_cache_size: 200,
            header_cache_size: 10_000,
            acceptance_data_cache_size: 200,
            daa_cache_size: 10_000,
            selected_chain_cache_size: 10_000,
        }
    }
}
