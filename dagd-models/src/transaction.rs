// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::config::{
    MAX_PAYLOAD_SIZE, MAX_SCRIPT_SIZE, MAX_TRANSACTION_INPUTS, MAX_TRANSACTION_OUTPUTS,
};
use dagd_hash::{Hash, HashDeserializer, HashSerializer};
use dagd_serialization::{
    Deserializer, SerializeError, Serializer, U32VarIntDeserializer, U32VarIntSerializer,
    U64VarIntDeserializer, U64VarIntSerializer, VecU8Deserializer, VecU8Serializer,
};
use nom::{
    error::{context, ContextError, ParseError},
    multi::length_count,
    sequence::tuple,
    IResult, Parser,
};
use serde::{Deserialize, Serialize};
use std::ops::Bound::{Included, Unbounded};

const TRANSACTION_SER_ERROR: &str = "critical: transaction serialization into memory failed";

/// Reference to an output of a previous transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionOutpoint {
    /// id of the transaction holding the output
    pub transaction_id: Hash,
    /// index of the output in that transaction
    pub index: u32,
}

/// Transaction input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionInput {
    /// spent output
    pub previous_outpoint: TransactionOutpoint,
    /// unlocking script
    pub signature_script: Vec<u8>,
    /// relative lock
    pub sequence: u64,
}

/// Transaction output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionOutput {
    /// amount in base units
    pub value: u64,
    /// locking script
    pub script_public_key: Vec<u8>,
}

/// Transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// version
    pub version: u16,
    /// inputs
    pub inputs: Vec<TransactionInput>,
    /// outputs
    pub outputs: Vec<TransactionOutput>,
    /// lock time
    pub lock_time: u64,
    /// arbitrary data
    pub payload: Vec<u8>,
}

impl Transaction {
    /// Transaction id: hash of the serialized transaction
    pub fn id(&self) -> Hash {
        let mut buffer = Vec::new();
        TransactionSerializer::new()
            .serialize(self, &mut buffer)
            .expect(TRANSACTION_SER_ERROR);
        Hash::compute_from(&buffer)
    }

    /// A coinbase transaction spends nothing.
    pub fn is_coinbase(&self) -> bool {
        self.inputs.is_empty()
    }
}

/// Serializer for `Transaction`
#[derive(Default, Clone)]
pub struct TransactionSerializer {
    u32_serializer: U32VarIntSerializer,
    u64_serializer: U64VarIntSerializer,
    hash_serializer: HashSerializer,
    vec_u8_serializer: VecU8Serializer,
}

impl TransactionSerializer {
    /// Creates a new `TransactionSerializer`
    pub const fn new() -> Self {
        Self {
            u32_serializer: U32VarIntSerializer::new(),
            u64_serializer: U64VarIntSerializer::new(),
            hash_serializer: HashSerializer::new(),
            vec_u8_serializer: VecU8Serializer::new(),
        }
    }

    fn serialize_len(&self, len: usize, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        let len: u64 = len.try_into().map_err(|err| {
            SerializeError::NumberTooBig(format!("too many entries in transaction: {}", err))
        })?;
        self.u64_serializer.serialize(&len, buffer)
    }
}

impl Serializer<Transaction> for TransactionSerializer {
    fn serialize(&self, value: &Transaction, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        self.u32_serializer
            .serialize(&u32::from(value.version), buffer)?;
        self.serialize_len(value.inputs.len(), buffer)?;
        for input in &value.inputs {
            self.hash_serializer
                .serialize(&input.previous_outpoint.transaction_id, buffer)?;
            self.u32_serializer
                .serialize(&input.previous_outpoint.index, buffer)?;
            self.vec_u8_serializer
                .serialize(&input.signature_script, buffer)?;
            self.u64_serializer.serialize(&input.sequence, buffer)?;
        }
        self.serialize_len(value.outputs.len(), buffer)?;
        for output in &value.outputs {
            self.u64_serializer.serialize(&output.value, buffer)?;
            self.vec_u8_serializer
                .serialize(&output.script_public_key, buffer)?;
        }
        self.u64_serializer.serialize(&value.lock_time, buffer)?;
        self.vec_u8_serializer.serialize(&value.payload, buffer)?;
        Ok(())
    }
}

/// Deserializer for `Transaction`
#[derive(Clone)]
pub struct TransactionDeserializer {
    version_deserializer: U32VarIntDeserializer,
    u32_deserializer: U32VarIntDeserializer,
    u64_deserializer: U64VarIntDeserializer,
    inputs_count_deserializer: U64VarIntDeserializer,
    outputs_count_deserializer: U64VarIntDeserializer,
    hash_deserializer: HashDeserializer,
    script_deserializer: VecU8Deserializer,
    payload_deserializer: VecU8Deserializer,
}

impl TransactionDeserializer {
    /// Creates a new `TransactionDeserializer`
    pub const fn new() -> Self {
        Self {
            version_deserializer: U32VarIntDeserializer::new(
                Included(0),
                Included(u16::MAX as u32),
            ),
            u32_deserializer: U32VarIntDeserializer::new(Included(0), Unbounded),
            u64_deserializer: U64VarIntDeserializer::new(Included(0), Unbounded),
            inputs_count_deserializer: U64VarIntDeserializer::new(
                Included(0),
                Included(MAX_TRANSACTION_INPUTS),
            ),
            outputs_count_deserializer: U64VarIntDeserializer::new(
                Included(0),
                Included(MAX_TRANSACTION_OUTPUTS),
            ),
            hash_deserializer: HashDeserializer::new(),
            script_deserializer: VecU8Deserializer::new(Included(0), Included(MAX_SCRIPT_SIZE)),
            payload_deserializer: VecU8Deserializer::new(Included(0), Included(MAX_PAYLOAD_SIZE)),
        }
    }
}

impl Default for TransactionDeserializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Deserializer<Transaction> for TransactionDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], Transaction, E> {
        context(
            "Failed Transaction deserialization",
            tuple((
                context("Failed version deserialization", |input| {
                    self.version_deserializer.deserialize(input)
                }),
                context(
                    "Failed inputs deserialization",
                    length_count(
                        |input| self.inputs_count_deserializer.deserialize(input),
                        |input: &'a [u8]| {
                            tuple((
                                |input| self.hash_deserializer.deserialize(input),
                                |input| self.u32_deserializer.deserialize(input),
                                |input| self.script_deserializer.deserialize(input),
                                |input| self.u64_deserializer.deserialize(input),
                            ))
                            .map(|(transaction_id, index, signature_script, sequence)| {
                                TransactionInput {
                                    previous_outpoint: TransactionOutpoint {
                                        transaction_id,
                                        index,
                                    },
                                    signature_script,
                                    sequence,
                                }
                            })
                            .parse(input)
                        },
                    ),
                ),
                context(
                    "Failed outputs deserialization",
                    length_count(
                        |input| self.outputs_count_deserializer.deserialize(input),
                        |input: &'a [u8]| {
                            tuple((
                                |input| self.u64_deserializer.deserialize(input),
                                |input| self.script_deserializer.deserialize(input),
                            ))
                            .map(|(value, script_public_key)| TransactionOutput {
                                value,
                                script_public_key,
                            })
                            .parse(input)
                        },
                    ),
                ),
                context("Failed lock_time deserialization", |input| {
                    self.u64_deserializer.deserialize(input)
                }),
                context("Failed payload deserialization", |input| {
                    self.payload_deserializer.deserialize(input)
                }),
            )),
        )
        .map(
            |(version, inputs, outputs, lock_time, payload)| Transaction {
                version: version as u16,
                inputs,
                outputs,
                lock_time,
                payload,
            },
        )
        .parse(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deserialize_exact;

    fn transfer() -> Transaction {
        Transaction {
            version: 0,
            inputs: vec![TransactionInput {
                previous_outpoint: TransactionOutpoint {
                    transaction_id: Hash::compute_from(b"funding"),
                    index: 3,
                },
                signature_script: vec![1, 2, 3],
                sequence: u64::MAX,
            }],
            outputs: vec![TransactionOutput {
                value: 5_000,
                script_public_key: vec![0xaa; 34],
            }],
            lock_time: 0,
            payload: Vec::new(),
        }
    }

    #[test]
    fn test_transaction_codec() {
        let tx = transfer();
        let mut buffer = Vec::new();
        TransactionSerializer::new()
            .serialize(&tx, &mut buffer)
            .unwrap();
        let decoded = deserialize_exact(&TransactionDeserializer::new(), &buffer).unwrap();
        assert_eq!(tx, decoded);
        assert_eq!(tx.id(), decoded.id());
        assert!(!tx.is_coinbase());
    }

    #[test]
    fn test_oversized_script_rejected() {
        let mut tx = transfer();
        tx.outputs[0].script_public_key = vec![0; MAX_SCRIPT_SIZE as usize + 1];
        let mut buffer = Vec::new();
        TransactionSerializer::new()
            .serialize(&tx, &mut buffer)
            .unwrap();
        assert!(deserialize_exact(&TransactionDeserializer::new(), &buffer).is_err());
    }
}
