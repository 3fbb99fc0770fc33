//! Process configuration for the `trdb` binary, loaded once at startup from
//! a TOML file. Library crates below `storage-api` never read files or
//! environment variables themselves — they take configuration as plain
//! constructor arguments.

use serde::Deserialize;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors loading or validating an [`EngineConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config file {path} as TOML")]
    ParseToml {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid configuration: {message}")]
    Invalid { message: String },
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    pub storage: StorageConfig,
    #[serde(default)]
    pub index: IndexConfig,
}

/// Storage-layer configuration: where data and logs live, and how many
/// buffer-pool frames to allocate.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub logs_dir: PathBuf,
    pub buffer_pages: NonZeroUsize,
}

/// Sanity-check overrides for the B-tree's compile-time page-layout
/// constants. `page::PAGE_SIZE` and `btree::layout::MAX_RECORD_SIZE` are
/// fixed at build time (like every other size constant in the storage
/// stack) rather than threaded through as runtime parameters, so these
/// fields exist only to let a deployment assert its build matches the
/// values its config file expects; they don't change the index's behavior.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IndexConfig {
    pub page_size: Option<usize>,
    pub max_record_size: Option<usize>,
}

impl EngineConfig {
    /// Loads and validates configuration from `path`.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref().to_path_buf();
        let text = std::fs::read_to_string(&path).map_err(|e| ConfigError::Io {
            path: path.clone(),
            source: e,
        })?;

        let cfg: EngineConfig = toml::from_str(&text).map_err(|e| ConfigError::ParseToml {
            path: path.clone(),
            source: e,
        })?;

        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.data_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid {
                message: "storage.data_dir must not be empty".to_string(),
            });
        }
        if let Some(expected) = self.index.page_size {
            if expected != page::PAGE_SIZE {
                return Err(ConfigError::Invalid {
                    message: format!(
                        "index.page_size={expected} does not match this build's page::PAGE_SIZE={}",
                        page::PAGE_SIZE
                    ),
                });
            }
        }
        if let Some(expected) = self.index.max_record_size {
            if expected != btree::layout::MAX_RECORD_SIZE {
                return Err(ConfigError::Invalid {
                    message: format!(
                        "index.max_record_size={expected} does not match this build's btree::layout::MAX_RECORD_SIZE={}",
                        btree::layout::MAX_RECORD_SIZE
                    ),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_well_formed_config() {
        let dir = std::env::temp_dir().join(format!("trdb-config-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("trdb.toml");
        std::fs::write(
            &path,
            r#"
            [storage]
            data_dir = "./data"
            logs_dir = "./logs"
            buffer_pages = 256
            "#,
        )
        .unwrap();

        let cfg = EngineConfig::load_from_file(&path).unwrap();
        assert_eq!(cfg.storage.buffer_pages.get(), 256);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn rejects_config_with_empty_data_dir() {
        let dir = std::env::temp_dir().join(format!("trdb-config-test-empty-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("trdb.toml");
        std::fs::write(
            &path,
            r#"
            [storage]
            data_dir = ""
            logs_dir = "./logs"
            buffer_pages = 16
            "#,
        )
        .unwrap();

        assert!(matches!(
            EngineConfig::load_from_file(&path),
            Err(ConfigError::Invalid { .. })
        ));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn reports_io_error_for_missing_file() {
        let err = EngineConfig::load_from_file("/nonexistent/trdb.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn index_overrides_default_to_unchecked() {
        let dir = std::env::temp_dir().join(format!("trdb-config-test-noindex-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("trdb.toml");
        std::fs::write(
            &path,
            r#"
            [storage]
            data_dir = "./data"
            logs_dir = "./logs"
            buffer_pages = 16
            "#,
        )
        .unwrap();

        let cfg = EngineConfig::load_from_file(&path).unwrap();
        assert!(cfg.index.page_size.is_none());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn rejects_index_page_size_override_that_does_not_match_the_build() {
        let dir = std::env::temp_dir().join(format!("trdb-config-test-pagesize-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("trdb.toml");
        std::fs::write(
            &path,
            r#"
            [storage]
            data_dir = "./data"
            logs_dir = "./logs"
            buffer_pages = 16

            [index]
            page_size = 1
            "#,
        )
        .unwrap();

        assert!(matches!(
            EngineConfig::load_from_file(&path),
            Err(ConfigError::Invalid { .. })
        ));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
