// Copyright (c) 2022 MASSA LABS <info@massa.net>

/// Maximum number of parents a block header may reference
pub const MAX_BLOCK_PARENTS: u64 = 10;
/// Maximum number of transactions in a block
pub const MAX_TRANSACTIONS_PER_BLOCK: u64 = 10_000;
/// Maximum number of inputs of a transaction
pub const MAX_TRANSACTION_INPUTS: u64 = 1_000;
/// Maximum number of outputs of a transaction
pub const MAX_TRANSACTION_OUTPUTS: u64 = 1_000;
/// Maximum size of a signature script or script public key, in bytes
pub const MAX_SCRIPT_SIZE: u64 = 10_000;
/// Maximum size of a transaction payload, in bytes
pub const MAX_PAYLOAD_SIZE: u64 = 100_000;
/// Maximum number of blocks merged by a single chain block
pub const MAX_MERGESET_SIZE: u64 = 1_000;
/// Block header version produced by this node
pub const BLOCK_VERSION: u16 = 1;
