// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::error::{DomainError, DomainResult};
use crate::prefix_manager;
use dagd_consensus_exports::{ConsensusConfig, ConsensusController};
use dagd_consensus_worker::Consensus;
use dagd_db_exports::{Database, DbPrefix};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tracing::{info, info_span, warn};

/// Lifecycle of the staging consensus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StagingState {
    NoStaging,
    StagingInProgress,
    Committed,
}

enum StagingSlot {
    NoStaging,
    InProgress(Arc<dyn ConsensusController>),
    Committed,
}

/// Owner of the active consensus and of the optional staging one
pub struct Domain {
    db: Arc<dyn Database>,
    config: ConsensusConfig,
    /// readers only clone the `Arc`, so a swap never waits on them for long
    consensus: RwLock<Arc<dyn ConsensusController>>,
    /// held for the whole duration of every staging lifecycle operation
    staging: Mutex<StagingSlot>,
}

impl Domain {
    /// Open the domain stored in `db`.
    ///
    /// Data left under an inactive prefix by an interrupted migration is
    /// deleted, and a fresh database gets prefix 0 as active prefix.
    pub fn new(config: ConsensusConfig, db: Arc<dyn Database>) -> DomainResult<Self> {
        if let Some(prefix) = prefix_manager::delete_inactive_prefix(&*db)? {
            warn!("deleted leftover staging consensus data under prefix {}", prefix);
        }
        let active = match prefix_manager::active_prefix(&*db)? {
            Some(prefix) => prefix,
            None => {
                prefix_manager::set_prefix_as_active(&*db, DbPrefix::ZERO)?;
                DbPrefix::ZERO
            }
        };
        let consensus = create_consensus(config.clone(), db.clone(), active)?;
        info!("active consensus opened under prefix {}", active);
        Ok(Domain {
            db,
            config,
            consensus: RwLock::new(consensus),
            staging: Mutex::new(StagingSlot::NoStaging),
        })
    }

    /// The consensus currently serving reads and writes
    pub fn consensus(&self) -> Arc<dyn ConsensusController> {
        self.consensus.read().clone()
    }

    pub fn staging_consensus(&self) -> Option<Arc<dyn ConsensusController>> {
        match &*self.staging.lock() {
            StagingSlot::InProgress(consensus) => Some(consensus.clone()),
            _ => None,
        }
    }

    pub fn staging_state(&self) -> StagingState {
        match &*self.staging.lock() {
            StagingSlot::NoStaging => StagingState::NoStaging,
            StagingSlot::InProgress(_) => StagingState::StagingInProgress,
            StagingSlot::Committed => StagingState::Committed,
        }
    }

    /// Create an empty consensus under the inactive prefix, without genesis.
    ///
    /// The caller fills it, then either commits or deletes it.
    pub fn init_staging_consensus_without_genesis(
        &self,
    ) -> DomainResult<Arc<dyn ConsensusController>> {
        let mut staging = self.staging.lock();
        if matches!(*staging, StagingSlot::InProgress(_))
            || prefix_manager::inactive_prefix(&*self.db)?.is_some()
        {
            return Err(DomainError::StagingConsensusExists);
        }
        let active = prefix_manager::active_prefix(&*self.db)?
            .ok_or(DomainError::NoActiveConsensus)?;
        let inactive = active.flip();
        prefix_manager::set_prefix_as_inactive(&*self.db, inactive)?;

        let config = ConsensusConfig {
            skip_adding_genesis: true,
            ..self.config.clone()
        };
        let consensus = match create_consensus(config, self.db.clone(), inactive) {
            Ok(consensus) => consensus,
            Err(err) => {
                prefix_manager::delete_inactive_prefix(&*self.db)?;
                return Err(err);
            }
        };
        *staging = StagingSlot::InProgress(consensus.clone());
        info!("staging consensus created under prefix {}", inactive);
        Ok(consensus)
    }

    /// Make the staging consensus the active one.
    ///
    /// The prefix records are swapped in a single transaction before the
    /// in-memory pointer, then the former active data is deleted.
    pub fn commit_staging_consensus(&self) -> DomainResult<()> {
        let mut staging = self.staging.lock();
        let staging_consensus = match &*staging {
            StagingSlot::InProgress(consensus) => consensus.clone(),
            _ => return Err(DomainError::NoStagingConsensus),
        };
        let active = prefix_manager::active_prefix(&*self.db)?
            .ok_or(DomainError::NoActiveConsensus)?;
        let inactive = prefix_manager::inactive_prefix(&*self.db)?
            .ok_or(DomainError::NoInactivePrefix)?;

        let tx = self.db.begin()?;
        let flipped = prefix_manager::set_prefix_as_active(tx.as_ref(), inactive)
            .and_then(|_| prefix_manager::set_prefix_as_inactive(tx.as_ref(), active))
            .and_then(|_| tx.commit());
        if let Err(err) = flipped {
            tx.rollback_unless_closed()?;
            return Err(err.into());
        }

        *self.consensus.write() = staging_consensus;
        *staging = StagingSlot::Committed;
        info!("staging consensus under prefix {} is now active", inactive);

        prefix_manager::delete_inactive_prefix(&*self.db)?;
        Ok(())
    }

    /// Drop the staging consensus and delete its data
    pub fn delete_staging_consensus(&self) -> DomainResult<()> {
        let mut staging = self.staging.lock();
        if !matches!(*staging, StagingSlot::InProgress(_)) {
            return Err(DomainError::NoStagingConsensus);
        }
        *staging = StagingSlot::NoStaging;
        if let Some(prefix) = prefix_manager::delete_inactive_prefix(&*self.db)? {
            info!("staging consensus under prefix {} deleted", prefix);
        }
        Ok(())
    }
}

fn create_consensus(
    config: ConsensusConfig,
    db: Arc<dyn Database>,
    prefix: DbPrefix,
) -> DomainResult<Arc<dyn ConsensusController>> {
    let span = info_span!("consensus", prefix = prefix.to_byte());
    Ok(Arc::new(Consensus::new(config, db, prefix, span)?))
}
