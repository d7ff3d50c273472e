// Copyright (c) 2022 MASSA LABS <info@massa.net>
//! # General description
//!
//! The domain owns the consensus instances of a node. One consensus is
//! active and serves every reader. A second, staging consensus can be built
//! under the other database prefix (for instance while resyncing from
//! scratch) and then atomically take over, after which the data of the
//! former active prefix is deleted.
//!
//! # Prefix records
//!
//! Which prefix is active is persisted under a global key, outside of both
//! prefix buckets. A prefix recorded as inactive at startup belongs to an
//! abandoned staging consensus and is wiped, see [`prefix_manager`].

mod domain;
mod error;
pub mod prefix_manager;

pub use domain::{Domain, StagingState};
pub use error::{DomainError, DomainResult};
