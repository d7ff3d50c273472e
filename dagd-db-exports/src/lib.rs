// Copyright (c) 2022 MASSA LABS <info@massa.net>

//! Contracts of the ordered key-value store: bucketed keys, readers,
//! writers, cursors, transactions and the one-byte namespace prefixes that
//! allow two consensus instances to share a single database.

mod bucket;
mod constants;
mod controller;
mod error;
mod prefix;
mod settings;

pub use bucket::*;
pub use constants::*;
pub use controller::*;
pub use error::*;
pub use prefix::*;
pub use settings::*;
