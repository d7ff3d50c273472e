// Copyright (c) 2022 MASSA LABS <info@massa.net>

use super::tools::{create_block, open_db, start_consensus};
use crate::{commit_all_changes, Consensus, StagingArea};
use assert_matches::assert_matches;
use dagd_consensus_exports::{
    default_genesis_block, error::ConsensusError, BlockContext, ConsensusConfig,
    ConsensusController,
};
use dagd_hash::Hash;
use dagd_models::{block::Block, chain_changes::ChainChanges};
use serial_test::serial;
use tempfile::tempdir;

fn insert(consensus: &Consensus, block: &Block) -> ChainChanges {
    consensus
        .validate_and_insert_block(block.clone(), BlockContext::default())
        .expect("block insertion failed")
        .selected_chain_changes
}

fn assert_chain(consensus: &Consensus, expected: &[Hash]) {
    for (index, hash) in expected.iter().enumerate() {
        assert_eq!(consensus.get_chain_block_by_index(index as u64).unwrap(), *hash);
        assert_eq!(consensus.get_chain_block_index(hash).unwrap(), index as u64);
    }
    assert_eq!(consensus.get_headers_selected_tip().unwrap(), expected.last().copied());
    assert!(consensus
        .get_chain_block_by_index(expected.len() as u64)
        .unwrap_err()
        .is_not_found());
}

#[test]
#[serial]
fn test_linear_chain() {
    let dir = tempdir().expect("cannot create temp directory");
    let consensus = start_consensus(open_db(&dir), ConsensusConfig::default());
    let genesis_hash = default_genesis_block().hash();

    let first = create_block(vec![genesis_hash], 1, 1);
    let second = create_block(vec![first.hash()], 2, 2);
    assert_eq!(
        insert(&consensus, &first),
        ChainChanges {
            removed: Vec::new(),
            added: vec![first.hash()],
        }
    );
    assert_eq!(insert(&consensus, &second).added, vec![second.hash()]);
    assert_chain(&consensus, &[genesis_hash, first.hash(), second.hash()]);
}

#[test]
#[serial]
fn test_reorg_to_heavier_branch() {
    let dir = tempdir().expect("cannot create temp directory");
    let consensus = start_consensus(open_db(&dir), ConsensusConfig::default());
    let genesis_hash = default_genesis_block().hash();

    let a1 = create_block(vec![genesis_hash], 1, 1);
    let a2 = create_block(vec![a1.hash()], 2, 2);
    let c1 = create_block(vec![genesis_hash], 1, 11);
    let c2 = create_block(vec![c1.hash()], 3, 12);
    insert(&consensus, &a1);
    insert(&consensus, &a2);

    // lighter than the tip: the chain does not move
    assert!(insert(&consensus, &c1).is_empty());
    assert_chain(&consensus, &[genesis_hash, a1.hash(), a2.hash()]);

    assert_eq!(
        insert(&consensus, &c2),
        ChainChanges {
            removed: vec![a2.hash(), a1.hash()],
            added: vec![c1.hash(), c2.hash()],
        }
    );
    assert_chain(&consensus, &[genesis_hash, c1.hash(), c2.hash()]);
    assert!(consensus.get_chain_block_index(&a1.hash()).unwrap_err().is_not_found());

    assert_eq!(
        consensus
            .get_virtual_selected_parent_chain_from_block(&a2.hash())
            .unwrap(),
        ChainChanges {
            removed: vec![a2.hash(), a1.hash()],
            added: vec![c1.hash(), c2.hash()],
        }
    );
    assert_eq!(
        consensus
            .get_virtual_selected_parent_chain_from_block(&c1.hash())
            .unwrap(),
        ChainChanges {
            removed: Vec::new(),
            added: vec![c2.hash()],
        }
    );
    assert!(consensus
        .get_virtual_selected_parent_chain_from_block(&c2.hash())
        .unwrap()
        .is_empty());
}

#[test]
#[serial]
fn test_merge_follows_heaviest_parent() {
    let dir = tempdir().expect("cannot create temp directory");
    let consensus = start_consensus(open_db(&dir), ConsensusConfig::default());
    let genesis_hash = default_genesis_block().hash();

    let light = create_block(vec![genesis_hash], 1, 1);
    let heavy = create_block(vec![genesis_hash], 5, 2);
    insert(&consensus, &light);
    assert_eq!(
        insert(&consensus, &heavy),
        ChainChanges {
            removed: vec![light.hash()],
            added: vec![heavy.hash()],
        }
    );

    let merge = create_block(vec![light.hash(), heavy.hash()], 6, 3);
    assert_eq!(
        insert(&consensus, &merge),
        ChainChanges {
            removed: Vec::new(),
            added: vec![merge.hash()],
        }
    );
    assert_chain(&consensus, &[genesis_hash, heavy.hash(), merge.hash()]);
}

#[test]
#[serial]
fn test_chain_store_staging_rules() {
    let dir = tempdir().expect("cannot create temp directory");
    let db = open_db(&dir);
    let consensus = start_consensus(db.clone(), ConsensusConfig::default());
    let chain = consensus.stores().headers_selected_chain_store.clone();
    let genesis_hash = default_genesis_block().hash();
    let blocks: Vec<Hash> = (1..=3)
        .map(|tag| create_block(vec![genesis_hash], tag as u128, tag).hash())
        .collect();

    let mut area = StagingArea::new();
    chain
        .stage(
            &*db,
            &mut area,
            &ChainChanges {
                removed: Vec::new(),
                added: blocks.clone(),
            },
        )
        .unwrap();
    assert_eq!(chain.highest_index(&area), Some(3));
    assert_eq!(chain.index_by_hash(&*db, &area, &blocks[2]).unwrap(), 3);
    assert_eq!(chain.highest_index(&StagingArea::new()), Some(0));
    assert_matches!(
        chain.stage(&*db, &mut area, &ChainChanges::default()),
        Err(ConsensusError::AlreadyStaged)
    );
    commit_all_changes(&*db, area).unwrap();

    let empty = StagingArea::new();
    for index in 0..=3 {
        let hash = chain.hash_by_index(&*db, &empty, index).unwrap();
        assert_eq!(chain.index_by_hash(&*db, &empty, &hash).unwrap(), index);
    }

    // only the top of the chain can be removed
    let mut area = StagingArea::new();
    assert_matches!(
        chain.stage(
            &*db,
            &mut area,
            &ChainChanges {
                removed: vec![blocks[1]],
                added: Vec::new(),
            },
        ),
        Err(ConsensusError::InvalidChainChanges(_))
    );
    assert_matches!(
        chain.stage(
            &*db,
            &mut area,
            &ChainChanges {
                removed: Vec::new(),
                added: vec![blocks[0]],
            },
        ),
        Err(ConsensusError::InvalidChainChanges(_))
    );
    assert!(!chain.is_staged(&area));

    chain
        .stage(
            &*db,
            &mut area,
            &ChainChanges {
                removed: vec![blocks[2], blocks[1], blocks[0], genesis_hash],
                added: Vec::new(),
            },
        )
        .unwrap();
    assert_eq!(chain.highest_index(&area), None);
    assert!(chain.index_by_hash(&*db, &area, &genesis_hash).unwrap_err().is_not_found());
    commit_all_changes(&*db, area).unwrap();
    assert_eq!(consensus.get_headers_selected_tip().unwrap(), None);
    assert!(chain.chain_from_index(&*db, &StagingArea::new(), 0).unwrap().is_empty());
}
