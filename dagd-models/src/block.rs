// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::block_header::{BlockHeader, BlockHeaderDeserializer, BlockHeaderSerializer};
use crate::config::MAX_TRANSACTIONS_PER_BLOCK;
use crate::transaction::{Transaction, TransactionDeserializer, TransactionSerializer};
use dagd_hash::Hash;
use dagd_serialization::{
    Deserializer, SerializeError, Serializer, U64VarIntDeserializer, U64VarIntSerializer,
};
use nom::{
    error::{context, ContextError, ParseError},
    multi::length_count,
    sequence::tuple,
    IResult, Parser,
};
use serde::{Deserialize, Serialize};
use std::ops::Bound::Included;

/// A block: header plus body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// header
    pub header: BlockHeader,
    /// transactions of the body
    pub transactions: Vec<Transaction>,
}

impl Block {
    /// The block is identified by its header hash
    pub fn hash(&self) -> Hash {
        self.header.hash()
    }
}

/// Serializer for `Block`
#[derive(Default, Clone)]
pub struct BlockSerializer {
    header_serializer: BlockHeaderSerializer,
    transaction_serializer: TransactionSerializer,
    u64_serializer: U64VarIntSerializer,
}

impl BlockSerializer {
    /// Creates a new `BlockSerializer`
    pub const fn new() -> Self {
        Self {
            header_serializer: BlockHeaderSerializer::new(),
            transaction_serializer: TransactionSerializer::new(),
            u64_serializer: U64VarIntSerializer::new(),
        }
    }
}

impl Serializer<Block> for BlockSerializer {
    fn serialize(&self, value: &Block, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        self.header_serializer.serialize(&value.header, buffer)?;
        let count: u64 = value.transactions.len().try_into().map_err(|err| {
            SerializeError::NumberTooBig(format!("too many transactions in block: {}", err))
        })?;
        self.u64_serializer.serialize(&count, buffer)?;
        for transaction in &value.transactions {
            self.transaction_serializer.serialize(transaction, buffer)?;
        }
        Ok(())
    }
}

/// Deserializer for `Block`
#[derive(Clone)]
pub struct BlockDeserializer {
    header_deserializer: BlockHeaderDeserializer,
    transaction_deserializer: TransactionDeserializer,
    count_deserializer: U64VarIntDeserializer,
}

impl BlockDeserializer {
    /// Creates a new `BlockDeserializer`
    pub const fn new() -> Self {
        Self {
            header_deserializer: BlockHeaderDeserializer::new(),
            transaction_deserializer: TransactionDeserializer::new(),
            count_deserializer: U64VarIntDeserializer::new(
                Included(0),
                Included(MAX_TRANSACTIONS_PER_BLOCK),
            ),
        }
    }
}

impl Default for BlockDeserializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Deserializer<Block> for BlockDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], Block, E> {
        context(
            "Failed Block deserialization",
            tuple((
                context("Failed header deserialization", |input| {
                    self.header_deserializer.deserialize(input)
                }),
                context(
                    "Failed transactions deserialization",
                    length_count(
                        |input| self.count_deserializer.deserialize(input),
                        |input| self.transaction_deserializer.deserialize(input),
                    ),
                ),
            )),
        )
        .map(|(header, transactions)| Block {
            header,
            transactions,
        })
        .parse(buffer)
    }
}
