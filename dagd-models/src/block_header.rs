// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::config::{BLOCK_VERSION, MAX_BLOCK_PARENTS};
use dagd_hash::{Hash, HashDeserializer, HashSerializer};
use dagd_serialization::{
    Deserializer, SerializeError, Serializer, U32VarIntDeserializer,
    U32VarIntSerializer, U64VarIntDeserializer, U64VarIntSerializer,
};
use nom::{
    error::{context, ContextError, ParseError},
    multi::length_count,
    number::complete::be_u128,
    sequence::tuple,
    IResult, Parser,
};
use serde::{Deserialize, Serialize};
use std::ops::Bound::{Included, Unbounded};

const HEADER_SER_ERROR: &str = "critical: block header serialization into memory failed";

/// Header of a block in the DAG
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    /// header version
    pub version: u16,
    /// direct parents, the first one is not necessarily the selected parent
    pub parents: Vec<Hash>,
    /// merkle root of the block transactions
    pub hash_merkle_root: Hash,
    /// merkle root of the accepted transaction ids
    pub accepted_id_merkle_root: Hash,
    /// commitment to the UTXO set after this block
    pub utxo_commitment: Hash,
    /// timestamp in milliseconds
    pub timestamp: u64,
    /// compact difficulty target
    pub bits: u32,
    /// proof of work nonce
    pub nonce: u64,
    /// difficulty adjustment score
    pub daa_score: u64,
    /// number of blue blocks in the past of this block
    pub blue_score: u64,
    /// accumulated work of the blue past
    pub blue_work: u128,
    /// pruning point seen by this block
    pub pruning_point: Hash,
}

impl BlockHeader {
    /// Creates a header with the default version and no merkle commitments.
    /// Mostly useful to build chains in tests.
    pub fn new_basic(
        parents: Vec<Hash>,
        timestamp: u64,
        daa_score: u64,
        blue_score: u64,
        blue_work: u128,
    ) -> Self {
        BlockHeader {
            version: BLOCK_VERSION,
            parents,
            hash_merkle_root: Hash::ZERO,
            accepted_id_merkle_root: Hash::ZERO,
            utxo_commitment: Hash::ZERO,
            timestamp,
            bits: 0,
            nonce: 0,
            daa_score,
            blue_score,
            blue_work,
            pruning_point: Hash::ZERO,
        }
    }

    /// Hash of the serialized header, which identifies the block.
    pub fn hash(&self) -> Hash {
        let mut buffer = Vec::new();
        BlockHeaderSerializer::new()
            .serialize(self, &mut buffer)
            .expect(HEADER_SER_ERROR);
        Hash::compute_from(&buffer)
    }

    /// A header without parents can only be the root of the DAG.
    pub fn is_genesis(&self) -> bool {
        self.parents.is_empty()
    }
}

/// Serializer for `BlockHeader`
#[derive(Default, Clone)]
pub struct BlockHeaderSerializer {
    u32_serializer: U32VarIntSerializer,
    u64_serializer: U64VarIntSerializer,
    hash_serializer: HashSerializer,
}

impl BlockHeaderSerializer {
    /// Creates a new `BlockHeaderSerializer`
    pub const fn new() -> Self {
        Self {
            u32_serializer: U32VarIntSerializer::new(),
            u64_serializer: U64VarIntSerializer::new(),
            hash_serializer: HashSerializer::new(),
        }
    }
}

impl Serializer<BlockHeader> for BlockHeaderSerializer {
    fn serialize(&self, value: &BlockHeader, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        self.u32_serializer
            .serialize(&u32::from(value.version), buffer)?;
        let parents_count: u64 = value.parents.len().try_into().map_err(|err| {
            SerializeError::NumberTooBig(format!("too many parents in header: {}", err))
        })?;
        self.u64_serializer.serialize(&parents_count, buffer)?;
        for parent in &value.parents {
            self.hash_serializer.serialize(parent, buffer)?;
        }
        self.hash_serializer
            .serialize(&value.hash_merkle_root, buffer)?;
        self.hash_serializer
            .serialize(&value.accepted_id_merkle_root, buffer)?;
        self.hash_serializer
            .serialize(&value.utxo_commitment, buffer)?;
        self.u64_serializer.serialize(&value.timestamp, buffer)?;
        self.u32_serializer.serialize(&value.bits, buffer)?;
        self.u64_serializer.serialize(&value.nonce, buffer)?;
        self.u64_serializer.serialize(&value.daa_score, buffer)?;
        self.u64_serializer.serialize(&value.blue_score, buffer)?;
        buffer.extend_from_slice(&value.blue_work.to_be_bytes());
        self.hash_serializer.serialize(&value.pruning_point, buffer)?;
        Ok(())
    }
}

/// Deserializer for `BlockHeader`
#[derive(Clone)]
pub struct BlockHeaderDeserializer {
    version_deserializer: U32VarIntDeserializer,
    parents_count_deserializer: U64VarIntDeserializer,
    u32_deserializer: U32VarIntDeserializer,
    u64_deserializer: U64VarIntDeserializer,
    hash_deserializer: HashDeserializer,
}

impl BlockHeaderDeserializer {
    /// Creates a new `BlockHeaderDeserializer`
    pub const fn new() -> Self {
        Self {
            version_deserializer: U32VarIntDeserializer::new(
                Included(0),
                Included(u16::MAX as u32),
            ),
            parents_count_deserializer: U64VarIntDeserializer::new(
                Included(0),
                Included(MAX_BLOCK_PARENTS),
            ),
            u32_deserializer: U32VarIntDeserializer::new(Included(0), Unbounded),
            u64_deserializer: U64VarIntDeserializer::new(Included(0), Unbounded),
            hash_deserializer: HashDeserializer::new(),
        }
    }
}

impl Default for BlockHeaderDeserializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Deserializer<BlockHeader> for BlockHeaderDeserializer {
    /// ## Example:
    /// ```rust
    /// use dagd_models::block_header::{BlockHeader, BlockHeaderDeserializer, BlockHeaderSerializer};
    /// use dagd_hash::Hash;
    /// use dagd_serialization::{Serializer, Deserializer, DeserializeError};
    ///
    /// let header = BlockHeader::new_basic(vec![Hash::compute_from(b"parent")], 1000, 2, 2, 42);
    /// let mut buffer = vec![];
    /// BlockHeaderSerializer::new().serialize(&header, &mut buffer).unwrap();
    /// let (rest, deserialized) = BlockHeaderDeserializer::new().deserialize::<DeserializeError>(&buffer).unwrap();
    /// assert_eq!(rest.len(), 0);
    /// assert_eq!(deserialized.hash(), header.hash());
    /// ```
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], BlockHeader, E> {
        context(
            "Failed BlockHeader deserialization",
            tuple((
                context("Failed version deserialization", |input| {
                    self.version_deserializer.deserialize(input)
                }),
                context(
                    "Failed parents deserialization",
                    length_count(
                        |input| self.parents_count_deserializer.deserialize(input),
                        |input| self.hash_deserializer.deserialize(input),
                    ),
                ),
                context("Failed hash_merkle_root deserialization", |input| {
                    self.hash_deserializer.deserialize(input)
                }),
                context("Failed accepted_id_merkle_root deserialization", |input| {
                    self.hash_deserializer.deserialize(input)
                }),
                context("Failed utxo_commitment deserialization", |input| {
                    self.hash_deserializer.deserialize(input)
                }),
                context("Failed timestamp deserialization", |input| {
                    self.u64_deserializer.deserialize(input)
                }),
                context("Failed bits deserialization", |input| {
                    self.u32_deserializer.deserialize(input)
                }),
                context("Failed nonce deserialization", |input| {
                    self.u64_deserializer.deserialize(input)
                }),
                context("Failed daa_score deserialization", |input| {
                    self.u64_deserializer.deserialize(input)
                }),
                context("Failed blue_score deserialization", |input| {
                    self.u64_deserializer.deserialize(input)
                }),
                context("Failed blue_work deserialization", be_u128),
                context("Failed pruning_point deserialization", |input| {
                    self.hash_deserializer.deserialize(input)
                }),
            )),
        )
        .map(
            |(
                version,
                parents,
                hash_merkle_root,
                accepted_id_merkle_root,
                utxo_commitment,
                timestamp,
                bits,
                nonce,
                daa_score,
                blue_score,
                blue_work,
                pruning_point,
            )| BlockHeader {
                version: version as u16,
                parents,
                hash_merkle_root,
                accepted_id_merkle_root,
                utxo_commitment,
                timestamp,
                bits,
                nonce,
                daa_score,
                blue_score,
                blue_work,
                pruning_point,
            },
        )
        .parse(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deserialize_exact;
    use serial_test::serial;

    fn decode_block_header(bytes: &[u8]) -> Result<BlockHeader, crate::ModelsError> {
        deserialize_exact(&BlockHeaderDeserializer::new(), bytes)
    }

    #[test]
    #[serial]
    fn test_header_hash_changes_with_fields() {
        let parent = Hash::compute_from(b"genesis");
        let header = BlockHeader::new_basic(vec![parent], 10, 1, 1, 100);
        let mut other = header.clone();
        other.nonce = 1;
        assert_ne!(header.hash(), other.hash());
        assert_eq!(header.hash(), header.clone().hash());
    }

    #[test]
    #[serial]
    fn test_too_many_parents_rejected() {
        let parents = (0..=MAX_BLOCK_PARENTS)
            .map(|i| Hash::compute_from(&i.to_be_bytes()))
            .collect();
        let header = BlockHeader::new_basic(parents, 0, 0, 0, 0);
        let mut buffer = Vec::new();
        BlockHeaderSerializer::new()
            .serialize(&header, &mut buffer)
            .unwrap();
        assert!(decode_block_header(&buffer).is_err());
    }

    #[test]
    #[serial]
    fn test_trailing_bytes_rejected() {
        let header = BlockHeader::new_basic(vec![], 0, 0, 0, u128::MAX);
        let mut buffer = Vec::new();
        BlockHeaderSerializer::new()
            .serialize(&header, &mut buffer)
            .unwrap();
        assert_eq!(decode_block_header(&buffer).unwrap(), header);
        buffer.push(0);
        assert!(decode_block_header(&buffer).is_err());
    }
}
