//! Storage configuration.

use std::path::PathBuf;

/// Configuration for the embedded database.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Directory holding all databases.
    pub data_dir: PathBuf,

    /// Database name; the database lives in `data_dir/name`.
    pub name: String,

    /// Delete the database before opening it.
    pub clean: bool,

    /// Temporary database (deleted on drop).
    pub temporary: bool,

    /// Page cache capacity in bytes.
    pub cache_capacity: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            name: "pao".to_string(),
            clean: false,
            temporary: false,
            cache_capacity: 64 * 1024 * 1024, // 64MB
        }
    }
}

impl StorageConfig {
    /// Create a new configuration for the named database under `data_dir`.
    pub fn new(data_dir: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            data_dir: data_dir.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    /// Create a temporary configuration for testing.
    pub fn temporary() -> Self {
        Self {
            data_dir: PathBuf::from(""),
            temporary: true,
            ..Default::default()
        }
    }

    /// Delete any existing database before opening.
    pub fn with_clean(mut self, clean: bool) -> Self {
        self.clean = clean;
        self
    }

    /// Set the page cache capacity.
    pub fn with_cache_capacity(mut self, bytes: u64) -> Self {
        self.cache_capacity = bytes;
        self
    }

    /// Directory of this database.
    pub fn path(&self) -> PathBuf {
        self.data_dir.join(&self.name)
    }

    /// Convert to sled configuration.
    pub(crate) fn to_sled_config(&self) -> sled::Config {
        let config = sled::Config::new().cache_capacity(self.cache_capacity);

        if self.temporary {
            config.temporary(true)
        } else {
            config.path(self.path())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_path() {
        let config = StorageConfig::new("/var/lib/pao", "app");
        assert_eq!(config.path(), PathBuf::from("/var/lib/pao/app"));
        assert!(!config.clean);
        assert!(!config.temporary);
    }

    #[test]
    fn test_builder() {
        let config = StorageConfig::temporary()
            .with_clean(true)
            .with_cache_capacity(1024);
        assert!(config.temporary);
        assert!(config.clean);
        assert_eq!(config.cache_capacity, 1024);
    }
}
