// Copyright (c) 2022 MASSA LABS <info@massa.net>

//! Domain values of the node (headers, blocks, transactions, acceptance data)
//! with their binary codecs, and the bounded LRU cache used by the stores.
#![warn(missing_docs)]

/// acceptance data of a chain block
pub mod acceptance_data;
/// full blocks
pub mod block;
/// block headers
pub mod block_header;
/// bounded LRU caches
pub mod cache;
/// selected chain diffs
pub mod chain_changes;
/// protocol constants
pub mod config;
/// models error
pub mod error;
/// hash list codec
pub mod hash_list;
/// transactions
pub mod transaction;

pub use error::ModelsError;

use dagd_serialization::{DeserializeError, Deserializer};

/// Deserialize a whole buffer into a `T`, failing if any byte is left over.
pub fn deserialize_exact<T, D: Deserializer<T>>(
    deserializer: &D,
    bytes: &[u8],
) -> Result<T, ModelsError> {
    let (rest, value) = deserializer
        .deserialize::<DeserializeError>(bytes)
        .map_err(|err| ModelsError::DeserializeError(err.to_string()))?;
    if !rest.is_empty() {
        return Err(ModelsError::DeserializeError(format!(
            "{} trailing bytes after value",
            rest.len()
        )));
    }
    Ok(value)
}
