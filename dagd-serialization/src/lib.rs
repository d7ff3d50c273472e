// Copyright (c) 2022 MASSA LABS <info@massa.net>

//! Binary codecs used for every value persisted in the database.
//!
//! Values are written by a [`Serializer`] into a byte buffer and read back
//! by a [`Deserializer`] built on `nom` parsers, so that composite values can
//! chain the parsers of their fields.
#![warn(missing_docs)]

use displaydoc::Display;
use nom::{
    error::{context, ContextError, ErrorKind, ParseError},
    IResult,
};
use std::ops::Bound;
use thiserror::Error;

mod varint;

pub use varint::{
    U32VarIntDeserializer, U32VarIntSerializer, U64VarIntDeserializer, U64VarIntSerializer,
};

/// Serialization errors
#[non_exhaustive]
#[derive(Display, Error, Debug, Clone)]
pub enum SerializeError {
    /// Number {0} is too big to be serialized
    NumberTooBig(String),
    /// General error {0}
    GeneralError(String),
}

/// Error type returned by the deserializers when parsing fails.
///
/// It keeps the chain of `context` labels so that a failed read of a
/// nested value reports which field broke.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeserializeError<'a> {
    errors: Vec<(&'a [u8], String)>,
}

impl<'a> ParseError<&'a [u8]> for DeserializeError<'a> {
    fn from_error_kind(input: &'a [u8], kind: ErrorKind) -> Self {
        Self {
            errors: vec![(input, kind.description().to_string())],
        }
    }

    fn append(input: &'a [u8], kind: ErrorKind, mut other: Self) -> Self {
        other.errors.push((input, kind.description().to_string()));
        other
    }
}

impl<'a> ContextError<&'a [u8]> for DeserializeError<'a> {
    fn add_context(input: &'a [u8], ctx: &'static str, mut other: Self) -> Self {
        other.errors.push((input, ctx.to_string()));
        other
    }
}

impl<'a> std::fmt::Display for DeserializeError<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let labels: Vec<&str> = self
            .errors
            .iter()
            .map(|(_, label)| label.as_str())
            .collect();
        write!(f, "{}", labels.join(" / "))
    }
}

/// Trait that define the deserialize method that must be implemented for all types that have a serialized form.
///
/// Implementations must recover exactly the value that the matching
/// [`Serializer`] wrote and return the unread rest of the buffer.
pub trait Deserializer<T> {
    /// Deserialize a value `T` from a buffer of `u8`.
    ///
    /// ## Parameters
    /// * buffer: the buffer that contains the whole serialized data.
    ///
    /// ## Returns
    /// A nom result with the rest of the serialized data and the decoded value.
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], T, E>;
}

/// This trait must be implemented to serializer all data in the node.
pub trait Serializer<T> {
    /// Serialize a value `T` into a buffer of `u8`.
    ///
    /// ## Parameters
    /// * value: the value to be serialized.
    /// * buffer: the buffer that will contain the serialized data.
    ///
    /// ## Returns
    /// A result that signals if the serialization succeeded.
    fn serialize(&self, value: &T, buffer: &mut Vec<u8>) -> Result<(), SerializeError>;
}

/// Serializer for `Vec<u8>` prefixed by its varint length
#[derive(Default, Clone)]
pub struct VecU8Serializer {
    len_serializer: U64VarIntSerializer,
}

impl VecU8Serializer {
    /// Creates a new `VecU8Serializer`
    pub const fn new() -> Self {
        Self {
            len_serializer: U64VarIntSerializer::new(),
        }
    }
}

impl Serializer<Vec<u8>> for VecU8Serializer {
    fn serialize(&self, value: &Vec<u8>, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        let len: u64 = value.len().try_into().map_err(|err| {
            SerializeError::NumberTooBig(format!("too many entries data in VecU8: {}", err))
        })?;
        self.len_serializer.serialize(&len, buffer)?;
        buffer.extend(value);
        Ok(())
    }
}

/// Deserializer for `Vec<u8>` prefixed by its varint length
#[derive(Clone)]
pub struct VecU8Deserializer {
    varint_u64_deserializer: U64VarIntDeserializer,
}

impl VecU8Deserializer {
    /// Creates a new `VecU8Deserializer`
    pub const fn new(min_length: Bound<u64>, max_length: Bound<u64>) -> Self {
        Self {
            varint_u64_deserializer: U64VarIntDeserializer::new(min_length, max_length),
        }
    }
}

impl Deserializer<Vec<u8>> for VecU8Deserializer {
    /// ```
    /// use std::ops::Bound::Included;
    /// use dagd_serialization::{Serializer, Deserializer, DeserializeError, VecU8Serializer, VecU8Deserializer};
    ///
    /// let vec = vec![1, 2, 3];
    /// let mut serialized = Vec::new();
    /// let serializer = VecU8Serializer::new();
    /// let deserializer = VecU8Deserializer::new(Included(0), Included(1000000));
    /// serializer.serialize(&vec, &mut serialized).unwrap();
    /// let (rest, vec_deser) = deserializer.deserialize::<DeserializeError>(&serialized).unwrap();
    /// assert!(rest.is_empty());
    /// assert_eq!(vec, vec_deser);
    /// ```
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], Vec<u8>, E> {
        context(
            "Failed Vec<u8> deserialization",
            nom::multi::length_data(|input| self.varint_u64_deserializer.deserialize(input)),
        )(buffer)
        .map(|(rest, data)| (rest, data.to_vec()))
    }
}

/// Serializer for `bool`, written as a single byte
#[derive(Default, Clone)]
pub struct BoolSerializer;

impl BoolSerializer {
    /// Creates a new `BoolSerializer`
    pub const fn new() -> Self {
        Self
    }
}

impl Serializer<bool> for BoolSerializer {
    fn serialize(&self, value: &bool, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        buffer.push(u8::from(*value));
        Ok(())
    }
}

/// Deserializer for `bool`, only `0` and `1` are accepted
#[derive(Default, Clone)]
pub struct BoolDeserializer;

impl BoolDeserializer {
    /// Creates a new `BoolDeserializer`
    pub const fn new() -> Self {
        Self
    }
}

impl Deserializer<bool> for BoolDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], bool, E> {
        context("Failed bool deserialization", |input: &'a [u8]| {
            match input.first() {
                Some(0) => Ok((&input[1..], false)),
                Some(1) => Ok((&input[1..], true)),
                _ => Err(nom::Err::Error(E::from_error_kind(input, ErrorKind::Tag))),
            }
        })(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::ops::Bound::Included;

    #[test]
    fn test_bool_rejects_other_bytes() {
        let deserializer = BoolDeserializer::new();
        assert_matches!(deserializer.deserialize::<DeserializeError>(&[1, 7]), Ok((rest, true)) if rest == [7]);
        assert!(deserializer.deserialize::<DeserializeError>(&[2]).is_err());
        assert!(deserializer.deserialize::<DeserializeError>(&[]).is_err());
    }

    #[test]
    fn test_vec_u8_length_bound() {
        let mut buffer = Vec::new();
        VecU8Serializer::new()
            .serialize(&vec![9u8; 10], &mut buffer)
            .unwrap();
        let strict = VecU8Deserializer::new(Included(0), Included(5));
        assert!(strict.deserialize::<DeserializeError>(&buffer).is_err());
        let loose = VecU8Deserializer::new(Included(0), Included(10));
        let (rest, value) = loose.deserialize::<DeserializeError>(&buffer).unwrap();
        assert!(rest.is_empty());
        assert_eq!(value, vec![9u8; 10]);
    }

    #[test]
    fn test_error_keeps_context() {
        let err = VecU8Deserializer::new(Included(0), Included(5))
            .deserialize::<DeserializeError>(&[9, 1])
            .unwrap_err();
        match err {
            nom::Err::Error(e) | nom::Err::Failure(e) => {
                assert!(e.to_string().contains("Failed Vec<u8> deserialization"))
            }
            nom::Err::Incomplete(_) => panic!("unexpected incomplete"),
        }
    }
}
