use crate::{Bucket, DatabaseError};
use std::fmt;

/// One-byte namespace under which a whole consensus instance lives.
///
/// Only two values exist, so that a staging consensus can be built under
/// the inactive one while the active one keeps serving.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct DbPrefix(u8);

impl DbPrefix {
    pub const ZERO: DbPrefix = DbPrefix(0);
    pub const ONE: DbPrefix = DbPrefix(1);

    pub fn from_byte(byte: u8) -> Result<Self, DatabaseError> {
        match byte {
            0 | 1 => Ok(DbPrefix(byte)),
            other => Err(DatabaseError::InvalidPrefix(other)),
        }
    }

    /// Parse a stored prefix record, which is exactly one byte
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DatabaseError> {
        match bytes {
            [byte] => Self::from_byte(*byte),
            _ => Err(DatabaseError::CorruptedData(format!(
                "prefix record must be 1 byte, got {}",
                bytes.len()
            ))),
        }
    }

    pub fn to_byte(self) -> u8 {
        self.0
    }

    /// The other prefix
    pub fn flip(self) -> Self {
        DbPrefix(self.0 ^ 1)
    }

    /// Root bucket of every key of this namespace
    pub fn bucket(self) -> Bucket {
        Bucket::make(&[self.0])
    }
}

impl fmt::Display for DbPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
