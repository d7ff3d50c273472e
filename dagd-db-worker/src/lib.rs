// Copyright (c) 2022 MASSA LABS <info@massa.net>

//! # General description
//!
//! `RocksDatabase` is the on-disk implementation of the `Database` contract
//! of `dagd_db_exports`, backed by a single RocksDB instance.
//!
//! # Key space
//!
//! Every key is the path of its bucket followed by a suffix. Buckets end
//! with a separator byte, so the keys of a bucket form one contiguous
//! range and cursors are plain range scans bounded with `end_prefix`.
//!
//! The first byte of every consensus key is the database prefix (0 or 1),
//! which lets a staging consensus be built next to the active one.
//!
//! # Transactions
//!
//! A `RocksTransaction` buffers writes in memory and applies them with a
//! single `WriteBatch` on commit. Reads and cursors opened on the
//! transaction see its pending writes merged over the on-disk state.

mod cursor;
mod helpers;
mod rocks_db;
mod transaction;

pub use cursor::{MemoryCursor, RocksCursor};
pub use rocks_db::RocksDatabase;
pub use transaction::RocksTransaction;
