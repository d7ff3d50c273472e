use std::path::PathBuf;

/// Config structure for a `RocksDatabase`
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// The path to the database, used in the wrapped RocksDB instance
    pub path: PathBuf,
    /// Maximum number of files RocksDB keeps open, -1 for unlimited
    pub max_open_files: i32,
    /// Create the database directory when missing
    pub create_if_missing: bool,
}

impl DbConfig {
    pub fn new(path: PathBuf) -> Self {
        DbConfig {
            path,
            ..Default::default()
        }
    }
}

impl Default for DbConfig {
    fn default() -> Self {
        DbConfig {
            path: PathBuf::from("storage/dagd_db"),
            max_open_files: 820,
            create_if_missing: true,
        }
    }
}
