// Copyright (c) 2022 MASSA LABS <info@massa.net>
use dagd_db_exports::DatabaseError;
use dagd_hash::Hash;
use dagd_models::error::ModelsError;
use dagd_serialization::SerializeError;
use displaydoc::Display;
use thiserror::Error;

/// Result of consensus operations
pub type ConsensusResult<T, E = ConsensusError> = core::result::Result<T, E>;

/// Consensus error
#[non_exhaustive]
#[derive(Display, Error, Debug)]
pub enum ConsensusError {
    /// database error: {0}
    DatabaseError(#[from] DatabaseError),
    /// models error: {0}
    ModelsError(#[from] ModelsError),
    /// serialization error: {0}
    SerializeError(#[from] SerializeError),
    /// selected chain changes are already staged in this staging area
    AlreadyStaged,
    /// invalid selected chain changes: {0}
    InvalidChainChanges(String),
    /// missing parent {0}
    MissingParent(Hash),
    /// missing header of block {0}
    MissingHeader(Hash),
    /// block {0} is already known
    DuplicateBlock(Hash),
    /// invalid block: {0}
    InvalidBlock(String),
    /// there was an inconsistency between stores: {0}
    ContainerInconsistency(String),
}

impl ConsensusError {
    /// The error only reports that some record does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, ConsensusError::DatabaseError(err) if err.is_not_found())
    }
}
