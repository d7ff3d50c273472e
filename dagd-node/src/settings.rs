// Copyright (c) 2022 MASSA LABS <info@massa.net>
//! Node settings.
//!
//! Sources are merged in order, later ones overriding earlier ones:
//! 1. `base_config/config.toml` in the configuration directory
//! 2. `config/config.toml` in the configuration directory, if present
//! 3. environment variables prefixed with `DAGD`, nested keys separated by
//!    `__` (for instance `DAGD_LOGGING__LEVEL=3`)

use dagd_consensus_exports::ConsensusConfig;
use dagd_db_exports::DbConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};

const BASE_CONFIG_PATH: &str = "base_config/config.toml";
const OVERRIDE_CONFIG_PATH: &str = "config/config.toml";
const ENV_PREFIX: &str = "DAGD";

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct LoggingSettings {
    pub level: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseSettings {
    pub path: PathBuf,
    pub max_open_files: i32,
}

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct ConsensusSettings {
    pub block_cache_size: u32,
    pub header_cache_size: u32,
    pub acceptance_data_cache_size: u32,
    pub daa_cache_size: u32,
    pub selected_chain_cache_size: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub database: DatabaseSettings,
    pub consensus: ConsensusSettings,
}

impl Settings {
    /// Database config, `data_dir` taking precedence over the configured path
    pub fn db_config(&self, data_dir: Option<PathBuf>) -> DbConfig {
        DbConfig {
            path: data_dir.unwrap_or_else(|| self.database.path.clone()),
            max_open_files: self.database.max_open_files,
            ..DbConfig::default()
        }
    }

    pub fn consensus_config(&self) -> ConsensusConfig {
        ConsensusConfig {
            block_cache_size: self.consensus.block_cache_size,
            header_cache_size: self.consensus.header_cache_size,
            acceptance_data_cache_size: self.consensus.acceptance_data_cache_size,
            daa_cache_size: self.consensus.daa_cache_size,
            selected_chain_cache_size: self.consensus.selected_chain_cache_size,
            ..ConsensusConfig::default()
        }
    }
}

/// Merge every settings source found in `config_dir`
pub fn build_settings(config_dir: &Path) -> Result<Settings, config::ConfigError> {
    let mut builder = config::Config::builder()
        .add_source(config::File::from(config_dir.join(BASE_CONFIG_PATH)));
    let override_path = config_dir.join(OVERRIDE_CONFIG_PATH);
    if override_path.is_file() {
        builder = builder.add_source(config::File::from(override_path));
    }
    builder
        .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
        .build()?
        .try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const BASE: &str = r#"
[logging]
level = 2

[database]
path = "storage/dagd_db"
max_open_files = 820

[consensus]
block_cache_size = 200
header_cache_size = 10000
acceptance_data_cache_size = 200
daa_cache_size = 10000
selected_chain_cache_size = 10000
"#;

    #[test]
    fn test_override_file() {
        let dir = tempdir().expect("cannot create temp directory");
        fs::create_dir_all(dir.path().join("base_config")).unwrap();
        fs::create_dir_all(dir.path().join("config")).unwrap();
        fs::write(dir.path().join(BASE_CONFIG_PATH), BASE).unwrap();

        let settings = build_settings(dir.path()).unwrap();
        assert_eq!(settings.logging.level, 2);
        assert_eq!(settings.consensus_config().block_cache_size, 200);

        fs::write(
            dir.path().join(OVERRIDE_CONFIG_PATH),
            "[consensus]\nblock_cache_size = 5\n",
        )
        .unwrap();
        let settings = build_settings(dir.path()).unwrap();
        assert_eq!(settings.consensus.block_cache_size, 5);
        assert_eq!(settings.consensus.header_cache_size, 10000);

        let db_config = settings.db_config(Some(dir.path().join("db")));
        assert_eq!(db_config.path, dir.path().join("db"));
        assert_eq!(db_config.max_open_files, 820);
    }

    #[test]
    fn test_missing_base_config() {
        let dir = tempdir().expect("cannot create temp directory");
        assert!(build_settings(dir.path()).is_err());
    }
}
