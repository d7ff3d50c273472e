// Copyright (c) 2022 MASSA LABS <info@massa.net>
use dagd_hash::Hash;
use dagd_models::{
    block::Block,
    block_header::BlockHeader,
    config::BLOCK_VERSION,
    transaction::Transaction,
};

/// Timestamp of the default genesis block, in milliseconds
const GENESIS_TIMESTAMP: u64 = 1_637_609_671_037;
const GENESIS_BITS: u32 = 0x1e7f_ffff;
const GENESIS_PAYLOAD: &[u8] = b"dagd genesis";

/// Root block of the default network: no parents and a single coinbase
pub fn default_genesis_block() -> Block {
    let coinbase = Transaction {
        version: 0,
        inputs: Vec::new(),
        outputs: Vec::new(),
        lock_time: 0,
        payload: GENESIS_PAYLOAD.to_vec(),
    };
    let header = BlockHeader {
        version: BLOCK_VERSION,
        parents: Vec::new(),
        hash_merkle_root: coinbase.id(),
        accepted_id_merkle_root: Hash::ZERO,
        utxo_commitment: Hash::ZERO,
        timestamp: GENESIS_TIMESTAMP,
        bits: GENESIS_BITS,
        nonce: 0,
        daa_score: 0,
        blue_score: 0,
        blue_work: 0,
        pruning_point: Hash::ZERO,
    };
    Block {
        header,
        transactions: vec![coinbase],
    }
}
