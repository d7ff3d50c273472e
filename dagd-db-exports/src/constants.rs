// Bucket names, relative to a prefix bucket
pub const BLOCKS_BUCKET: &[u8] = b"blocks";
pub const BLOCKS_COUNT_KEY: &[u8] = b"blocks-count";
pub const BLOCK_HEADERS_BUCKET: &[u8] = b"block-headers";
pub const BLOCK_HEADERS_COUNT_KEY: &[u8] = b"block-headers-count";
pub const ACCEPTANCE_DATA_BUCKET: &[u8] = b"acceptance-data";
pub const DAA_SCORE_BUCKET: &[u8] = b"daa-score";
pub const DAA_ADDED_BLOCKS_BUCKET: &[u8] = b"daa-added-blocks";
pub const CHAIN_BLOCK_HASH_BY_INDEX_BUCKET: &[u8] = b"chain-block-hash-by-index";
pub const CHAIN_BLOCK_INDEX_BY_HASH_BUCKET: &[u8] = b"chain-block-index-by-hash";
pub const HIGHEST_CHAIN_BLOCK_INDEX_KEY: &[u8] = b"highest-chain-block-index";

// Global keys, outside of any prefix bucket
pub const ACTIVE_PREFIX_KEY: &[u8] = b"active-prefix";
pub const INACTIVE_PREFIX_KEY: &[u8] = b"inactive-prefix";

// Errors
pub const CLOSED_CURSOR_ERROR: &str = "critical: cannot move a closed cursor";
