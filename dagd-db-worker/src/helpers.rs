use dagd_db_exports::{Bucket, DatabaseError, DbKey};

/// For a given start prefix (inclusive), returns the correct end prefix (non-inclusive).
/// This assumes the key bytes are ordered in lexicographical order.
/// Since key length is not limited, for some case we return `None` because there is
/// no bounded limit (every keys in the series `[]`, `[255]`, `[255, 255]` ...).
pub(crate) fn end_prefix(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut end_range = prefix.to_vec();
    while let Some(0xff) = end_range.last() {
        end_range.pop();
    }
    if let Some(byte) = end_range.last_mut() {
        *byte += 1;
        Some(end_range)
    } else {
        None
    }
}

/// Rebuild a `DbKey` from a raw key found while scanning `bucket`.
pub(crate) fn key_in_bucket(bucket: &Bucket, raw_key: &[u8]) -> Result<DbKey, DatabaseError> {
    match raw_key.strip_prefix(bucket.path()) {
        Some(suffix) => Ok(bucket.key(suffix)),
        None => Err(DatabaseError::CorruptedData(format!(
            "key {:?} found outside of scanned bucket {}",
            raw_key, bucket
        ))),
    }
}
