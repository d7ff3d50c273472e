// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::config::MAX_MERGESET_SIZE;
use dagd_hash::{Hash, HashDeserializer, HashSerializer};
use dagd_serialization::{
    Deserializer, SerializeError, Serializer, U64VarIntDeserializer, U64VarIntSerializer,
};
use nom::{
    error::{context, ContextError, ParseError},
    multi::length_count,
    IResult,
};
use std::ops::Bound::Included;

/// Serializer for a list of hashes, such as the DAA added blocks of a block
#[derive(Default, Clone)]
pub struct HashListSerializer {
    len_serializer: U64VarIntSerializer,
    hash_serializer: HashSerializer,
}

impl HashListSerializer {
    /// Creates a new `HashListSerializer`
    pub const fn new() -> Self {
        Self {
            len_serializer: U64VarIntSerializer::new(),
            hash_serializer: HashSerializer::new(),
        }
    }
}

impl Serializer<Vec<Hash>> for HashListSerializer {
    fn serialize(&self, value: &Vec<Hash>, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        let len: u64 = value.len().try_into().map_err(|err| {
            SerializeError::NumberTooBig(format!("too many hashes in list: {}", err))
        })?;
        self.len_serializer.serialize(&len, buffer)?;
        for hash in value {
            self.hash_serializer.serialize(hash, buffer)?;
        }
        Ok(())
    }
}

/// Deserializer for a list of hashes, bounded by the mergeset size
#[derive(Clone)]
pub struct HashListDeserializer {
    len_deserializer: U64VarIntDeserializer,
    hash_deserializer: HashDeserializer,
}

impl HashListDeserializer {
    /// Creates a new `HashListDeserializer`
    pub const fn new() -> Self {
        Self {
            len_deserializer: U64VarIntDeserializer::new(Included(0), Included(MAX_MERGESET_SIZE)),
            hash_deserializer: HashDeserializer::new(),
        }
    }
}

impl Default for HashListDeserializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Deserializer<Vec<Hash>> for HashListDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], Vec<Hash>, E> {
        context(
            "Failed hash list deserialization",
            length_count(
                |input| self.len_deserializer.deserialize(input),
                |input| self.hash_deserializer.deserialize(input),
            ),
        )(buffer)
    }
}
