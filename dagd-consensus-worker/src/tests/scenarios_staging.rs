// Copyright (c) 2022 MASSA LABS <info@massa.net>

use super::tools::{create_block, open_db, start_consensus, FailingDatabase};
use crate::{commit_all_changes, Consensus, StagingArea};
use assert_matches::assert_matches;
use dagd_consensus_exports::{
    default_genesis_block, error::ConsensusError, BlockContext, ConsensusConfig,
    ConsensusController,
};
use dagd_db_exports::{DatabaseError, DbConfig, DbPrefix};
use dagd_db_worker::RocksDatabase;
use serial_test::serial;
use std::sync::Arc;
use tempfile::tempdir;
use tracing::info_span;

#[test]
#[serial]
fn test_staged_changes_are_only_visible_through_the_area() {
    let dir = tempdir().expect("cannot create temp directory");
    let db = open_db(&dir);
    let consensus = start_consensus(db.clone(), ConsensusConfig::default());
    let store = consensus.stores().block_store.clone();
    let block = create_block(vec![default_genesis_block().hash()], 1, 1);

    let mut area = StagingArea::new();
    store.stage(&mut area, block.hash(), &block);
    assert!(area.is_staged());
    assert_eq!(store.get(&*db, &area, &block.hash()).unwrap(), block);
    assert_eq!(store.count(&*db, &area).unwrap(), 2);
    assert!(!store.has(&*db, &StagingArea::new(), &block.hash()).unwrap());
    assert_eq!(store.count(&*db, &StagingArea::new()).unwrap(), 1);

    commit_all_changes(&*db, area).unwrap();
    assert_eq!(consensus.get_block(&block.hash()).unwrap(), block);
    assert_eq!(consensus.get_block_count().unwrap(), 2);
}

#[test]
#[serial]
fn test_staged_deletion_hides_committed_data() {
    let dir = tempdir().expect("cannot create temp directory");
    let db = open_db(&dir);
    let consensus = start_consensus(db.clone(), ConsensusConfig::default());
    let store = consensus.stores().block_store.clone();
    let genesis_hash = default_genesis_block().hash();

    let mut area = StagingArea::new();
    store.delete(&mut area, genesis_hash);
    assert!(!store.has(&*db, &area, &genesis_hash).unwrap());
    assert!(store.get(&*db, &area, &genesis_hash).unwrap_err().is_not_found());
    assert_eq!(store.count(&*db, &area).unwrap(), 0);
    assert!(store.all_hashes(&*db, &area).unwrap().is_empty());
    assert!(consensus.has_block(&genesis_hash).unwrap());

    // staging again in the same area overrides the deletion
    store.stage(&mut area, genesis_hash, &default_genesis_block());
    assert!(store.has(&*db, &area, &genesis_hash).unwrap());
    assert_eq!(store.count(&*db, &area).unwrap(), 1);
}

#[test]
#[serial]
fn test_daa_deletion_is_tracked_per_record() {
    let dir = tempdir().expect("cannot create temp directory");
    let db = open_db(&dir);
    let consensus = start_consensus(db.clone(), ConsensusConfig::default());
    let store = consensus.stores().daa_blocks_store.clone();
    let genesis_hash = default_genesis_block().hash();

    let mut area = StagingArea::new();
    store.delete(&mut area, genesis_hash);
    store.stage_daa_score(&mut area, genesis_hash, 7);
    assert_eq!(store.daa_score(&*db, &area, &genesis_hash).unwrap(), 7);
    assert!(store
        .daa_added_blocks(&*db, &area, &genesis_hash)
        .unwrap_err()
        .is_not_found());
    commit_all_changes(&*db, area).unwrap();

    assert_eq!(consensus.get_daa_score(&genesis_hash).unwrap(), 7);
    assert!(consensus.get_daa_added_blocks(&genesis_hash).unwrap_err().is_not_found());
}

#[test]
#[serial]
fn test_failed_commit_changes_nothing() {
    let dir = tempdir().expect("cannot create temp directory");
    let rocks = RocksDatabase::new(DbConfig::new(dir.path().to_path_buf()))
        .expect("could not open test database");
    let db = Arc::new(FailingDatabase::new(rocks));
    let consensus = Consensus::new(
        ConsensusConfig::default(),
        db.clone(),
        DbPrefix::ZERO,
        info_span!("consensus"),
    )
    .expect("could not start consensus");
    let genesis_hash = default_genesis_block().hash();
    let block = create_block(vec![genesis_hash], 1, 1);

    for allowed_puts in 0..4 {
        db.fail_after(allowed_puts);
        assert_matches!(
            consensus.validate_and_insert_block(block.clone(), BlockContext::default()),
            Err(ConsensusError::DatabaseError(DatabaseError::RocksDBError(_)))
        );
        db.stop_failing();

        assert!(!consensus.has_block(&block.hash()).unwrap());
        assert!(!consensus.has_block_header(&block.hash()).unwrap());
        assert_eq!(consensus.get_block_count().unwrap(), 1);
        assert_eq!(consensus.get_header_count().unwrap(), 1);
        assert_eq!(consensus.get_headers_selected_tip().unwrap(), Some(genesis_hash));
        assert!(consensus.get_daa_score(&block.hash()).unwrap_err().is_not_found());
    }

    consensus
        .validate_and_insert_block(block.clone(), BlockContext::default())
        .unwrap();
    assert_eq!(consensus.get_headers_selected_tip().unwrap(), Some(block.hash()));
}

#[test]
#[serial]
fn test_count_matches_recount() {
    let dir = tempdir().expect("cannot create temp directory");
    let db = open_db(&dir);
    let consensus = start_consensus(db.clone(), ConsensusConfig::default());
    let genesis_hash = default_genesis_block().hash();

    let mut parent = genesis_hash;
    let mut hashes = vec![genesis_hash];
    for tag in 1..=5u64 {
        let block = create_block(vec![parent], tag as u128, tag);
        parent = block.hash();
        hashes.push(parent);
        consensus
            .validate_and_insert_block(block, BlockContext::default())
            .unwrap();
    }
    consensus.delete_block_body(&hashes[2]).unwrap();

    let stores = consensus.stores();
    assert_eq!(consensus.get_block_count().unwrap(), 5);
    assert_eq!(stores.block_store.recount(&*db).unwrap(), 5);
    assert_eq!(consensus.get_header_count().unwrap(), 6);
    assert_eq!(stores.block_header_store.recount(&*db).unwrap(), 6);

    hashes.remove(2);
    hashes.sort();
    assert_eq!(consensus.get_all_block_hashes().unwrap(), hashes);
}
