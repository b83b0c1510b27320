//! Application configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (~/.config/stowage/config.toml)
//! 3. Environment variables (STOWAGE_* prefix)
//!
//! Environment variables take precedence over config file values.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::storage::error::{StorageError, StorageResult};

/// Environment variable prefix
const ENV_PREFIX: &str = "STOWAGE";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory for data storage (SQLite db)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl Config {
    /// Load configuration from default location and environment
    ///
    /// Order of precedence (highest to lowest):
    /// 1. Environment variables (STOWAGE_DATA_DIR)
    /// 2. Config file (~/.config/stowage/config.toml or STOWAGE_CONFIG)
    /// 3. Default values
    pub fn load() -> StorageResult<Self> {
        Self::load_from_path(&Self::config_file_path())
    }

    /// Load configuration from a specific path
    ///
    /// Environment variables are still applied as overrides.
    /// If the file doesn't exist, defaults are used.
    pub fn load_from_path(path: &PathBuf) -> StorageResult<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            toml::from_str(&content).map_err(|e| StorageError::InvalidConfig {
                path: path.clone(),
                message: e.to_string(),
            })?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        config.ensure_data_dir()?;
        Ok(config)
    }

    /// Load configuration from a TOML string (useful for testing)
    pub fn load_from_str(toml_content: &str) -> StorageResult<Self> {
        let mut config: Config =
            toml::from_str(toml_content).map_err(|e| StorageError::InvalidConfig {
                path: PathBuf::from("<inline>"),
                message: e.to_string(),
            })?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var(format!("{}_DATA_DIR", ENV_PREFIX)) {
            self.data_dir = PathBuf::from(val);
        }
    }

    /// Ensure data directory exists
    fn ensure_data_dir(&self) -> StorageResult<()> {
        if !self.data_dir.exists() {
            std::fs::create_dir_all(&self.data_dir).map_err(|source| {
                StorageError::CreateDirectory {
                    path: self.data_dir.clone(),
                    source,
                }
            })?;
        }
        Ok(())
    }

    /// Get the config file path
    ///
    /// Can be overridden with STOWAGE_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(format!("{}_CONFIG", ENV_PREFIX)) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("stowage")
            .join("config.toml")
    }

    /// Get the path to the SQLite database
    pub fn sqlite_path(&self) -> PathBuf {
        self.data_dir.join("stowage.db")
    }
}

/// Get the default data directory
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("stowage")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Mutex to serialize tests that touch environment variables
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// Guard that locks env access and saves/restores env vars
    struct EnvGuard<'a> {
        _lock: std::sync::MutexGuard<'a, ()>,
        saved: Vec<(String, Option<String>)>,
    }

    impl<'a> EnvGuard<'a> {
        fn new(vars: &[&str]) -> Self {
            let lock = ENV_MUTEX.lock().unwrap();
            let saved = vars
                .iter()
                .map(|&name| (name.to_string(), env::var(name).ok()))
                .collect();
            for name in vars {
                env::remove_var(name);
            }
            Self { _lock: lock, saved }
        }
    }

    impl Drop for EnvGuard<'_> {
        fn drop(&mut self) {
            for (name, value) in &self.saved {
                match value {
                    Some(v) => env::set_var(name, v),
                    None => env::remove_var(name),
                }
            }
        }
    }

    #[test]
    fn test_defaults() {
        let _guard = EnvGuard::new(&["STOWAGE_DATA_DIR"]);

        let config = Config::default();
        assert!(config.data_dir.ends_with("stowage"));
        assert!(config.sqlite_path().ends_with("stowage.db"));
    }

    #[test]
    fn test_load_from_str() {
        let _guard = EnvGuard::new(&["STOWAGE_DATA_DIR"]);

        let config = Config::load_from_str(r#"data_dir = "/tmp/stowage-test""#).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/tmp/stowage-test"));
    }

    #[test]
    fn test_env_override_wins() {
        let _guard = EnvGuard::new(&["STOWAGE_DATA_DIR"]);
        env::set_var("STOWAGE_DATA_DIR", "/tmp/stowage-env");

        let config = Config::load_from_str(r#"data_dir = "/tmp/stowage-file""#).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/tmp/stowage-env"));
    }

    #[test]
    fn test_invalid_toml_is_reported() {
        let _guard = EnvGuard::new(&["STOWAGE_DATA_DIR"]);

        let err = Config::load_from_str("data_dir = [not toml").unwrap_err();
        assert!(matches!(err, StorageError::InvalidConfig { .. }));
    }

    #[test]
    fn test_load_from_missing_path_uses_defaults() {
        let _guard = EnvGuard::new(&["STOWAGE_DATA_DIR"]);
        let temp = tempfile::TempDir::new().unwrap();
        env::set_var("STOWAGE_DATA_DIR", temp.path().join("data"));

        let missing = temp.path().join("nope.toml");
        let config = Config::load_from_path(&missing).unwrap();

        // Data dir comes from the env override and is created on load
        assert_eq!(config.data_dir, temp.path().join("data"));
        assert!(config.data_dir.exists());
    }
}
