// Copyright (c) 2022 MASSA LABS <info@massa.net>

use dagd_consensus_exports::error::{ConsensusError, ConsensusResult};
use dagd_db_exports::{Bucket, DatabaseError, DbKey, DbReader, DbWriter};
use dagd_hash::{Hash, HASH_SIZE_BYTES};
use dagd_models::{cache::LruCache, deserialize_exact};
use dagd_serialization::{
    Deserializer, Serializer, U64VarIntDeserializer, U64VarIntSerializer,
};
use parking_lot::Mutex;
use std::ops::Bound::{Included, Unbounded};

/// Hash-keyed bucket of serialized values fronted by an LRU cache.
///
/// The cache only ever holds committed values: shards insert into it after
/// their transaction is committed, and reads only fill it when no commit
/// touched the cache during the database read.
pub(crate) struct CachedBucketAccess<V: Clone, S: Serializer<V>, D: Deserializer<V>> {
    bucket: Bucket,
    cache: LruCache<Hash, V>,
    serializer: S,
    deserializer: D,
}

impl<V: Clone, S: Serializer<V>, D: Deserializer<V>> CachedBucketAccess<V, S, D> {
    pub(crate) fn new(bucket: Bucket, cache_size: u32, serializer: S, deserializer: D) -> Self {
        CachedBucketAccess {
            bucket,
            cache: LruCache::new(cache_size),
            serializer,
            deserializer,
        }
    }

    pub(crate) fn key(&self, hash: &Hash) -> DbKey {
        self.bucket.key(hash.to_bytes())
    }

    /// Committed value of `hash`, from the cache or the database
    pub(crate) fn read<R: DbReader + ?Sized>(&self, db: &R, hash: &Hash) -> ConsensusResult<V> {
        if let Some(value) = self.cache.get(hash) {
            return Ok(value);
        }
        let generation = self.cache.generation();
        let bytes = db.get(&self.key(hash))?;
        let value = deserialize_exact(&self.deserializer, &bytes)?;
        self.cache.fill(*hash, value.clone(), generation);
        Ok(value)
    }

    pub(crate) fn contains<R: DbReader + ?Sized>(&self, db: &R, hash: &Hash) -> ConsensusResult<bool> {
        if self.cache.contains_key(hash) {
            return Ok(true);
        }
        Ok(db.has(&self.key(hash))?)
    }

    pub(crate) fn write<W: DbWriter + ?Sized>(
        &self,
        tx: &W,
        hash: &Hash,
        value: &V,
    ) -> ConsensusResult<()> {
        let mut buffer = Vec::new();
        self.serializer.serialize(value, &mut buffer)?;
        tx.put(&self.key(hash), &buffer)?;
        Ok(())
    }

    pub(crate) fn erase<W: DbWriter + ?Sized>(&self, tx: &W, hash: &Hash) -> ConsensusResult<()> {
        tx.delete(&self.key(hash))?;
        Ok(())
    }

    pub(crate) fn cache_insert(&self, hash: Hash, value: V) {
        self.cache.insert(hash, value);
    }

    pub(crate) fn cache_remove(&self, hash: &Hash) {
        self.cache.remove(hash);
    }

    /// Every committed hash of the bucket, in key order
    pub(crate) fn hashes<R: DbReader + ?Sized>(&self, db: &R) -> ConsensusResult<Vec<Hash>> {
        let mut hashes = Vec::new();
        let mut cursor = db.cursor(&self.bucket)?;
        while cursor.next() {
            hashes.push(hash_from_slice(cursor.key()?.suffix())?);
        }
        cursor.close()?;
        Ok(hashes)
    }
}

pub(crate) fn hash_from_slice(bytes: &[u8]) -> ConsensusResult<Hash> {
    let array: &[u8; HASH_SIZE_BYTES] = bytes.try_into().map_err(|_| {
        ConsensusError::DatabaseError(DatabaseError::CorruptedData(format!(
            "{} bytes cannot hold a hash",
            bytes.len()
        )))
    })?;
    Ok(Hash::from_bytes(array))
}

/// A `u64` persisted under a single key, mirrored in memory.
///
/// `None` means the record is absent.
pub(crate) struct StoredU64 {
    key: DbKey,
    cached: Mutex<Option<u64>>,
}

impl StoredU64 {
    pub(crate) fn load<R: DbReader + ?Sized>(db: &R, key: DbKey) -> ConsensusResult<Self> {
        let cached = match db.get(&key) {
            Ok(bytes) => Some(decode_u64(&bytes)?),
            Err(err) if err.is_not_found() => None,
            Err(err) => return Err(err.into()),
        };
        Ok(StoredU64 {
            key,
            cached: Mutex::new(cached),
        })
    }

    pub(crate) fn get(&self) -> Option<u64> {
        *self.cached.lock()
    }

    /// Write `value` into `tx`, `None` deletes the record
    pub(crate) fn write<W: DbWriter + ?Sized>(&self, tx: &W, value: Option<u64>) -> ConsensusResult<()> {
        match value {
            Some(value) => tx.put(&self.key, &encode_u64(value)?)?,
            None => tx.delete(&self.key)?,
        }
        Ok(())
    }

    pub(crate) fn set(&self, value: Option<u64>) {
        *self.cached.lock() = value;
    }
}

pub(crate) fn encode_u64(value: u64) -> ConsensusResult<Vec<u8>> {
    let mut buffer = Vec::new();
    U64VarIntSerializer::new().serialize(&value, &mut buffer)?;
    Ok(buffer)
}

pub(crate) fn decode_u64(bytes: &[u8]) -> ConsensusResult<u64> {
    Ok(deserialize_exact(
        &U64VarIntDeserializer::new(Included(0), Unbounded),
        bytes,
    )?)
}
