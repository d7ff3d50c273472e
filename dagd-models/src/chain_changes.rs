// Copyright (c) 2022 MASSA LABS <info@massa.net>

use dagd_hash::Hash;
use serde::{Deserialize, Serialize};

/// Diff of the selected parent chain caused by a new selected tip.
///
/// `removed` is ordered from the old tip downwards, `added` from the fork
/// point upwards, so that applying both keeps chain indices contiguous.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainChanges {
    /// blocks leaving the chain, highest first
    pub removed: Vec<Hash>,
    /// blocks joining the chain, lowest first
    pub added: Vec<Hash>,
}

impl ChainChanges {
    /// true if the chain does not move
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.added.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_changes_json() {
        let changes = ChainChanges {
            removed: vec![Hash::compute_from(b"old tip")],
            added: vec![Hash::compute_from(b"fork"), Hash::compute_from(b"new tip")],
        };
        assert!(!changes.is_empty());
        assert!(ChainChanges::default().is_empty());

        let json = serde_json::to_value(&changes).unwrap();
        assert_eq!(json["added"].as_array().unwrap().len(), 2);
        assert_eq!(
            json["removed"][0].as_str().unwrap(),
            changes.removed[0].to_string()
        );
        let decoded: ChainChanges = serde_json::from_value(json).unwrap();
        assert_eq!(decoded, changes);
    }
}
