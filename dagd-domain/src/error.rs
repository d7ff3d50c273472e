// Copyright (c) 2022 MASSA LABS <info@massa.net>
use dagd_consensus_exports::error::ConsensusError;
use dagd_db_exports::DatabaseError;
use displaydoc::Display;
use thiserror::Error;

/// Result of domain operations
pub type DomainResult<T, E = DomainError> = core::result::Result<T, E>;

/// Domain error
#[non_exhaustive]
#[derive(Display, Error, Debug)]
pub enum DomainError {
    /// database error: {0}
    DatabaseError(#[from] DatabaseError),
    /// consensus error: {0}
    ConsensusError(#[from] ConsensusError),
    /// a staging consensus already exists
    StagingConsensusExists,
    /// no active consensus prefix is recorded
    NoActiveConsensus,
    /// no inactive consensus prefix is recorded
    NoInactivePrefix,
    /// there is no staging consensus
    NoStagingConsensus,
}
