// Copyright (c) 2022 MASSA LABS <info@massa.net>
//! Consensus storage core.
//!
//! A [`Consensus`] owns the datastores of one database prefix. Each write
//! operation gathers its changes in a [`StagingArea`] and commits them
//! atomically with [`commit_all_changes`].

mod consensus;
mod staging_area;

pub mod stores;

pub use consensus::Consensus;
pub use staging_area::{commit_all_changes, CommittedStagingArea, StagingArea, StagingShardId};

#[cfg(test)]
mod tests;
