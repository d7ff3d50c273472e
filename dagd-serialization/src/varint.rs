// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::{Deserializer, SerializeError, Serializer};
use nom::{
    error::{context, ContextError, ErrorKind, ParseError},
    IResult,
};
use std::ops::{Bound, RangeBounds};
use unsigned_varint::nom as unsigned_nom;

macro_rules! gen_varint {
    ($($type:ident, $s:ident, $d:ident, $encode:path, $buffer:path, $decode:path, $label:literal);*) => {
        $(
            #[doc = concat!("Serializer for ", stringify!($type), " in a varint form")]
            #[derive(Default, Clone, Copy)]
            pub struct $s;

            impl $s {
                #[doc = concat!("Creates a serializer for ", stringify!($type))]
                pub const fn new() -> Self {
                    Self
                }
            }

            impl Serializer<$type> for $s {
                fn serialize(&self, value: &$type, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
                    buffer.extend_from_slice($encode(*value, &mut $buffer()));
                    Ok(())
                }
            }

            #[doc = concat!("Deserializer for ", stringify!($type), " in a varint form, checked against a range")]
            #[derive(Clone, Copy)]
            pub struct $d {
                range: (Bound<$type>, Bound<$type>),
            }

            impl $d {
                #[doc = concat!("Creates a deserializer for ", stringify!($type), " accepting values within the bounds")]
                pub const fn new(min: Bound<$type>, max: Bound<$type>) -> Self {
                    Self { range: (min, max) }
                }
            }

            impl Deserializer<$type> for $d {
                fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
                    &self,
                    buffer: &'a [u8],
                ) -> IResult<&'a [u8], $type, E> {
                    context($label, |input: &'a [u8]| {
                        let (rest, value) = $decode(input).map_err(|_| {
                            nom::Err::Error(E::from_error_kind(input, ErrorKind::Fail))
                        })?;
                        if !self.range.contains(&value) {
                            return Err(nom::Err::Error(E::from_error_kind(
                                input,
                                ErrorKind::Verify,
                            )));
                        }
                        Ok((rest, value))
                    })(buffer)
                }
            }
        )*
    };
}

gen_varint! {
    u32, U32VarIntSerializer, U32VarIntDeserializer, unsigned_varint::encode::u32, unsigned_varint::encode::u32_buffer, unsigned_nom::u32, "Failed u32 deserialization";
    u64, U64VarIntSerializer, U64VarIntDeserializer, unsigned_varint::encode::u64, unsigned_varint::encode::u64_buffer, unsigned_nom::u64, "Failed u64 deserialization"
}
