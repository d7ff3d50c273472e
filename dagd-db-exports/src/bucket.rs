use std::fmt;

/// Byte appended after every bucket path segment
pub const BUCKET_SEPARATOR: u8 = b'/';

/// A hierarchical namespace of keys.
///
/// The path of a bucket always ends with [`BUCKET_SEPARATOR`], so the keys
/// of two sibling buckets can never share a byte prefix and a range scan
/// over one bucket never returns keys of another.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Bucket {
    path: Vec<u8>,
}

impl Bucket {
    /// Bucket at `path`, followed by the separator
    pub fn make(path: &[u8]) -> Bucket {
        let mut full = Vec::with_capacity(path.len() + 1);
        full.extend_from_slice(path);
        full.push(BUCKET_SEPARATOR);
        Bucket { path: full }
    }

    /// Nested bucket named `name` inside this one
    pub fn bucket(&self, name: &[u8]) -> Bucket {
        let mut full = Vec::with_capacity(self.path.len() + name.len() + 1);
        full.extend_from_slice(&self.path);
        full.extend_from_slice(name);
        full.push(BUCKET_SEPARATOR);
        Bucket { path: full }
    }

    /// Key `suffix` inside this bucket
    pub fn key(&self, suffix: &[u8]) -> DbKey {
        DbKey {
            bucket: self.clone(),
            suffix: suffix.to_vec(),
        }
    }

    /// Full path, separator included
    pub fn path(&self) -> &[u8] {
        &self.path
    }
}

/// A key: the path of its bucket followed by a suffix
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct DbKey {
    bucket: Bucket,
    suffix: Vec<u8>,
}

impl DbKey {
    /// Raw bytes as stored in the database
    pub fn bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.bucket.path.len() + self.suffix.len());
        bytes.extend_from_slice(&self.bucket.path);
        bytes.extend_from_slice(&self.suffix);
        bytes
    }

    pub fn bucket(&self) -> &Bucket {
        &self.bucket
    }

    pub fn suffix(&self) -> &[u8] {
        &self.suffix
    }
}

fn write_escaped(f: &mut fmt::Formatter<'_>, bytes: &[u8]) -> fmt::Result {
    for byte in bytes {
        write!(f, "{}", std::ascii::escape_default(*byte))?;
    }
    Ok(())
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_escaped(f, &self.path)
    }
}

impl fmt::Debug for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bucket({})", self)
    }
}

impl fmt::Display for DbKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_escaped(f, &self.bucket.path)?;
        write_escaped(f, &self.suffix)
    }
}

impl fmt::Debug for DbKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DbKey({})", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_layout() {
        let root = Bucket::make(&[0]);
        let blocks = root.bucket(b"blocks");
        assert_eq!(blocks.path(), b"\x00/blocks/");
        let key = blocks.key(b"abc");
        assert_eq!(key.bytes(), b"\x00/blocks/abc".to_vec());
        assert_eq!(key.suffix(), b"abc");
        assert_eq!(key.bucket(), &blocks);
        assert_eq!(key.to_string(), "\\x00/blocks/abc");
    }

    #[test]
    fn test_sibling_buckets_do_not_overlap() {
        let root = Bucket::make(b"");
        let a = root.bucket(b"a");
        let ab = root.bucket(b"ab");
        assert!(!ab.path().starts_with(a.path()));
        assert!(!a.path().starts_with(ab.path()));
    }
}
