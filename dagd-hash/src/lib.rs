// Copyright (c) 2022 MASSA LABS <info@massa.net>

//! 32-byte block and transaction identifiers.
#![warn(missing_docs)]
pub use error::DagdHashError;
pub use hash::{Hash, HashDeserializer, HashSerializer};
pub use settings::HASH_SIZE_BYTES;

mod error;
mod hash;
mod settings;
