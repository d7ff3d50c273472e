// Copyright (c) 2022 MASSA LABS <info@massa.net>
//! Per-operation buffer of pending store mutations.
//!
//! Every store keeps its pending changes in a shard of the staging area.
//! Committing the area writes all shards into one database transaction;
//! only once that transaction is committed do the stores update their
//! caches, so a failed commit leaves both the disk and the caches as they
//! were.

use crate::stores::{
    acceptance_data_store::AcceptanceDataStagingShard, block_header_store::BlockHeaderStagingShard,
    block_store::BlockStagingShard, daa_blocks_store::DaaBlocksStagingShard,
    headers_selected_chain_store::HeadersSelectedChainStagingShard,
};
use dagd_consensus_exports::error::ConsensusResult;
use dagd_db_exports::{Database, DbTransaction};
use tracing::debug;

/// Identifier of the shard owned by each store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StagingShardId {
    Block,
    BlockHeader,
    AcceptanceData,
    DaaBlocks,
    HeadersSelectedChain,
}

/// Pending changes of one store
pub(crate) enum StagingShard {
    Block(BlockStagingShard),
    BlockHeader(BlockHeaderStagingShard),
    AcceptanceData(AcceptanceDataStagingShard),
    DaaBlocks(DaaBlocksStagingShard),
    HeadersSelectedChain(HeadersSelectedChainStagingShard),
}

macro_rules! dispatch {
    ($shard:expr, $inner:ident => $body:expr) => {
        match $shard {
            StagingShard::Block($inner) => $body,
            StagingShard::BlockHeader($inner) => $body,
            StagingShard::AcceptanceData($inner) => $body,
            StagingShard::DaaBlocks($inner) => $body,
            StagingShard::HeadersSelectedChain($inner) => $body,
        }
    };
}

impl StagingShard {
    fn id(&self) -> StagingShardId {
        match self {
            StagingShard::Block(_) => StagingShardId::Block,
            StagingShard::BlockHeader(_) => StagingShardId::BlockHeader,
            StagingShard::AcceptanceData(_) => StagingShardId::AcceptanceData,
            StagingShard::DaaBlocks(_) => StagingShardId::DaaBlocks,
            StagingShard::HeadersSelectedChain(_) => StagingShardId::HeadersSelectedChain,
        }
    }

    fn commit(&mut self, tx: &dyn DbTransaction) -> ConsensusResult<()> {
        dispatch!(self, shard => shard.commit(tx))
    }

    fn update_caches(self) {
        dispatch!(self, shard => shard.update_caches())
    }

    fn is_staged(&self) -> bool {
        dispatch!(self, shard => shard.is_staged())
    }
}

/// Behaviour shared by every shard
pub(crate) trait StagingShardOps {
    /// Write the pending changes into `tx`. Must not touch any cache
    fn commit(&mut self, tx: &dyn DbTransaction) -> ConsensusResult<()>;

    /// Reflect the committed changes in the store caches
    fn update_caches(self);

    fn is_staged(&self) -> bool;
}

/// Links a concrete shard type to its variant of `StagingShard`
pub(crate) trait ShardKind: StagingShardOps + Sized {
    const ID: StagingShardId;

    fn wrap(self) -> StagingShard;

    fn unwrap_ref(shard: &StagingShard) -> Option<&Self>;

    fn unwrap_mut(shard: &mut StagingShard) -> Option<&mut Self>;
}

macro_rules! shard_kind {
    ($ty:ty, $variant:ident) => {
        impl ShardKind for $ty {
            const ID: StagingShardId = StagingShardId::$variant;

            fn wrap(self) -> StagingShard {
                StagingShard::$variant(self)
            }

            fn unwrap_ref(shard: &StagingShard) -> Option<&Self> {
                match shard {
                    StagingShard::$variant(inner) => Some(inner),
                    _ => None,
                }
            }

            fn unwrap_mut(shard: &mut StagingShard) -> Option<&mut Self> {
                match shard {
                    StagingShard::$variant(inner) => Some(inner),
                    _ => None,
                }
            }
        }
    };
}

shard_kind!(BlockStagingShard, Block);
shard_kind!(BlockHeaderStagingShard, BlockHeader);
shard_kind!(AcceptanceDataStagingShard, AcceptanceData);
shard_kind!(DaaBlocksStagingShard, DaaBlocks);
shard_kind!(HeadersSelectedChainStagingShard, HeadersSelectedChain);

/// Pending changes of a single consensus operation.
///
/// An area is consumed by `commit`, so it cannot be reused afterwards.
#[derive(Default)]
pub struct StagingArea {
    /// shards in creation order, which is also their commit order
    shards: Vec<StagingShard>,
}

impl StagingArea {
    pub fn new() -> Self {
        StagingArea { shards: Vec::new() }
    }

    fn position(&self, id: StagingShardId) -> Option<usize> {
        self.shards.iter().position(|shard| shard.id() == id)
    }

    /// Shard of type `S`, created with `factory` on first use
    pub(crate) fn get_or_create_shard<S: ShardKind>(
        &mut self,
        factory: impl FnOnce() -> S,
    ) -> &mut S {
        let position = match self.position(S::ID) {
            Some(position) => position,
            None => {
                self.shards.push(factory().wrap());
                self.shards.len() - 1
            }
        };
        S::unwrap_mut(&mut self.shards[position]).expect(SHARD_KIND_ERROR)
    }

    /// Shard of type `S` if some store already created it
    pub(crate) fn shard<S: ShardKind>(&self) -> Option<&S> {
        self.position(S::ID)
            .and_then(|position| S::unwrap_ref(&self.shards[position]))
    }

    /// Whether any shard holds a pending change
    pub fn is_staged(&self) -> bool {
        self.shards.iter().any(StagingShard::is_staged)
    }

    /// Write every shard into `tx`, in shard creation order.
    ///
    /// Caches are only updated by `CommittedStagingArea::update_caches`,
    /// which must be called once `tx` itself is committed.
    pub fn commit(mut self, tx: &dyn DbTransaction) -> ConsensusResult<CommittedStagingArea> {
        for shard in self.shards.iter_mut() {
            shard.commit(tx)?;
        }
        Ok(CommittedStagingArea {
            shards: self.shards,
        })
    }
}

const SHARD_KIND_ERROR: &str = "critical: staging shard registered under a foreign id";

/// Staging area whose changes were written into a transaction
#[must_use = "caches must be updated once the transaction is committed"]
pub struct CommittedStagingArea {
    shards: Vec<StagingShard>,
}

impl CommittedStagingArea {
    pub fn update_caches(self) {
        for shard in self.shards {
            shard.update_caches();
        }
    }
}

/// Commit `area` atomically: one transaction for all shards, then caches.
///
/// On any failure the transaction is rolled back and the caches are left
/// untouched.
pub fn commit_all_changes<D: Database + ?Sized>(db: &D, area: StagingArea) -> ConsensusResult<()> {
    let tx = db.begin()?;
    let committed = match area.commit(tx.as_ref()) {
        Ok(committed) => committed,
        Err(err) => {
            tx.rollback_unless_closed()?;
            return Err(err);
        }
    };
    if let Err(err) = tx.commit() {
        tx.rollback_unless_closed()?;
        return Err(err.into());
    }
    committed.update_caches();
    debug!("staging area committed");
    Ok(())
}
