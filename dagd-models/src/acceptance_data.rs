// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::config::{MAX_MERGESET_SIZE, MAX_TRANSACTIONS_PER_BLOCK};
use crate::transaction::{Transaction, TransactionDeserializer, TransactionSerializer};
use dagd_hash::{Hash, HashDeserializer, HashSerializer};
use dagd_serialization::{
    BoolDeserializer, BoolSerializer, Deserializer, SerializeError, Serializer,
    U64VarIntDeserializer, U64VarIntSerializer,
};
use nom::{
    error::{context, ContextError, ParseError},
    multi::length_count,
    sequence::tuple,
    IResult, Parser,
};
use serde::{Deserialize, Serialize};
use std::ops::Bound::{Included, Unbounded};

/// Whether a transaction of a merged block was accepted, and its fee
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionAcceptanceData {
    /// the transaction
    pub transaction: Transaction,
    /// fee paid
    pub fee: u64,
    /// accepted by the merging chain block
    pub is_accepted: bool,
}

/// Acceptance of the transactions of one merged block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockAcceptanceData {
    /// merged block
    pub block_hash: Hash,
    /// its transactions, in block order
    pub transaction_acceptance_data: Vec<TransactionAcceptanceData>,
}

/// Acceptance data of a chain block: one entry per block of its mergeset
pub type AcceptanceData = Vec<BlockAcceptanceData>;

/// Serializer for `AcceptanceData`
#[derive(Default, Clone)]
pub struct AcceptanceDataSerializer {
    u64_serializer: U64VarIntSerializer,
    hash_serializer: HashSerializer,
    bool_serializer: BoolSerializer,
    transaction_serializer: TransactionSerializer,
}

impl AcceptanceDataSerializer {
    /// Creates a new `AcceptanceDataSerializer`
    pub const fn new() -> Self {
        Self {
            u64_serializer: U64VarIntSerializer::new(),
            hash_serializer: HashSerializer::new(),
            bool_serializer: BoolSerializer::new(),
            transaction_serializer: TransactionSerializer::new(),
        }
    }

    fn serialize_len(&self, len: usize, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        let len: u64 = len.try_into().map_err(|err| {
            SerializeError::NumberTooBig(format!("too many entries in acceptance data: {}", err))
        })?;
        self.u64_serializer.serialize(&len, buffer)
    }
}

impl Serializer<AcceptanceData> for AcceptanceDataSerializer {
    fn serialize(
        &self,
        value: &AcceptanceData,
        buffer: &mut Vec<u8>,
    ) -> Result<(), SerializeError> {
        self.serialize_len(value.len(), buffer)?;
        for block_data in value {
            self.hash_serializer
                .serialize(&block_data.block_hash, buffer)?;
            self.serialize_len(block_data.transaction_acceptance_data.len(), buffer)?;
            for tx_data in &block_data.transaction_acceptance_data {
                self.transaction_serializer
                    .serialize(&tx_data.transaction, buffer)?;
                self.u64_serializer.serialize(&tx_data.fee, buffer)?;
                self.bool_serializer.serialize(&tx_data.is_accepted, buffer)?;
            }
        }
        Ok(())
    }
}

/// Deserializer for `AcceptanceData`
#[derive(Clone)]
pub struct AcceptanceDataDeserializer {
    blocks_count_deserializer: U64VarIntDeserializer,
    transactions_count_deserializer: U64VarIntDeserializer,
    fee_deserializer: U64VarIntDeserializer,
    hash_deserializer: HashDeserializer,
    bool_deserializer: BoolDeserializer,
    transaction_deserializer: TransactionDeserializer,
}

impl AcceptanceDataDeserializer {
    /// Creates a new `AcceptanceDataDeserializer`
    pub const fn new() -> Self {
        Self {
            blocks_count_deserializer: U64VarIntDeserializer::new(
                Included(0),
                Included(MAX_MERGESET_SIZE),
            ),
            transactions_count_deserializer: U64VarIntDeserializer::new(
                Included(0),
                Included(MAX_TRANSACTIONS_PER_BLOCK),
            ),
            fee_deserializer: U64VarIntDeserializer::new(Included(0), Unbounded),
            hash_deserializer: HashDeserializer::new(),
            bool_deserializer: BoolDeserializer::new(),
            transaction_deserializer: TransactionDeserializer::new(),
        }
    }
}

impl Default for AcceptanceDataDeserializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Deserializer<AcceptanceData> for AcceptanceDataDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], AcceptanceData, E> {
        context(
            "Failed AcceptanceData deserialization",
            length_count(
                |input| self.blocks_count_deserializer.deserialize(input),
                |input: &'a [u8]| {
                    tuple((
                        context("Failed block_hash deserialization", |input| {
                            self.hash_deserializer.deserialize(input)
                        }),
                        context(
                            "Failed transaction acceptance deserialization",
                            length_count(
                                |input| self.transactions_count_deserializer.deserialize(input),
                                |input: &'a [u8]| {
                                    tuple((
                                        |input| self.transaction_deserializer.deserialize(input),
                                        |input| self.fee_deserializer.deserialize(input),
                                        |input| self.bool_deserializer.deserialize(input),
                                    ))
                                    .map(|(transaction, fee, is_accepted)| {
                                        TransactionAcceptanceData {
                                            transaction,
                                            fee,
                                            is_accepted,
                                        }
                                    })
                                    .parse(input)
                                },
                            ),
                        ),
                    ))
                    .map(|(block_hash, transaction_acceptance_data)| BlockAcceptanceData {
                        block_hash,
                        transaction_acceptance_data,
                    })
                    .parse(input)
                },
            ),
        )(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deserialize_exact;

    #[test]
    fn test_acceptance_data_codec() {
        let data: AcceptanceData = vec![
            BlockAcceptanceData {
                block_hash: Hash::compute_from(b"merged"),
                transaction_acceptance_data: vec![TransactionAcceptanceData {
                    transaction: Transaction {
                        version: 0,
                        inputs: vec![],
                        outputs: vec![],
                        lock_time: 0,
                        payload: vec![7],
                    },
                    fee: 12,
                    is_accepted: false,
                }],
            },
            BlockAcceptanceData {
                block_hash: Hash::compute_from(b"empty"),
                transaction_acceptance_data: vec![],
            },
        ];
        let mut buffer = Vec::new();
        AcceptanceDataSerializer::new()
            .serialize(&data, &mut buffer)
            .unwrap();
        let decoded = deserialize_exact(&AcceptanceDataDeserializer::new(), &buffer).unwrap();
        assert_eq!(decoded, data);
    }
}
