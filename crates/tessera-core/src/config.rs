//! Shell configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use tessera_navigation::{DEFAULT_FALLBACK_HOMEPAGE, DEFAULT_POLL_INTERVAL};

use crate::error::CoreError;
use crate::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Root of everything the shell writes
    pub data_dir: PathBuf,
    /// Path to the database file
    pub database_path: PathBuf,
    /// Directory holding one storage partition per profile
    pub partition_root: PathBuf,
    /// Navigation state sampling period
    pub poll_interval_ms: u64,
    /// Where items with an unrecoverable placeholder URL are sent
    pub fallback_homepage: String,
}

/// On-disk form; anything missing comes from [`Config::new`]
#[derive(Debug, Deserialize)]
struct ConfigFile {
    data_dir: Option<PathBuf>,
    database_path: Option<PathBuf>,
    partition_root: Option<PathBuf>,
    poll_interval_ms: Option<u64>,
    fallback_homepage: Option<String>,
}

impl Config {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            database_path: data_dir.join("tessera.db"),
            partition_root: data_dir.join("Partitions"),
            poll_interval_ms: DEFAULT_POLL_INTERVAL.as_millis() as u64,
            fallback_homepage: DEFAULT_FALLBACK_HOMEPAGE.to_string(),
            data_dir,
        }
    }

    pub fn data_dir() -> PathBuf {
        dirs::data_local_dir()
            .map(|d| d.join("Tessera"))
            .unwrap_or_else(|| PathBuf::from(".tessera"))
    }

    /// Read a JSON config file. Relative paths inside it are taken as given.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let file: ConfigFile = serde_json::from_str(&contents)?;

        let mut config = Self::new(file.data_dir.unwrap_or_else(Self::data_dir));
        if let Some(database_path) = file.database_path {
            config.database_path = database_path;
        }
        if let Some(partition_root) = file.partition_root {
            config.partition_root = partition_root;
        }
        if let Some(interval) = file.poll_interval_ms {
            config.poll_interval_ms = interval;
        }
        if let Some(homepage) = file.fallback_homepage {
            config.fallback_homepage = homepage;
        }

        config.validate()?;
        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_ms == 0 {
            return Err(CoreError::Config("poll_interval_ms must be positive".into()));
        }
        tessera_navigation::UrlRecovery::with_fallback(&self.fallback_homepage)?;
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Self::data_dir())
    }
}

// Simple dirs implementation for the platform data directory
mod dirs {
    use std::path::PathBuf;

    pub fn data_local_dir() -> Option<PathBuf> {
        #[cfg(target_os = "windows")]
        {
            std::env::var("LOCALAPPDATA").ok().map(PathBuf::from)
        }
        #[cfg(target_os = "macos")]
        {
            std::env::var("HOME")
                .ok()
                .map(|h| PathBuf::from(h).join("Library/Application Support"))
        }
        #[cfg(target_os = "linux")]
        {
            std::env::var("XDG_DATA_HOME")
                .ok()
                .map(PathBuf::from)
                .or_else(|| {
                    std::env::var("HOME")
                        .ok()
                        .map(|h| PathBuf::from(h).join(".local/share"))
                })
        }
        #[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
        {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_derives_paths() {
        let config = Config::new(PathBuf::from("/tmp/tessera"));

        assert_eq!(config.database_path, PathBuf::from("/tmp/tessera/tessera.db"));
        assert_eq!(config.partition_root, PathBuf::from("/tmp/tessera/Partitions"));
        assert_eq!(config.poll_interval(), Duration::from_millis(250));
        assert_eq!(config.fallback_homepage, "https://www.google.com");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_fills_missing_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let data_dir = dir.path().join("data");
        std::fs::write(
            &path,
            serde_json::json!({
                "data_dir": data_dir,
                "poll_interval_ms": 100
            })
            .to_string(),
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.poll_interval_ms, 100);
        assert_eq!(config.database_path, data_dir.join("tessera.db"));
        assert_eq!(config.fallback_homepage, DEFAULT_FALLBACK_HOMEPAGE);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/config.json");
        let mut config = Config::new(dir.path().to_path_buf());
        config.fallback_homepage = "https://start.example".to_string();

        config.save(&path).unwrap();
        assert_eq!(Config::load(&path).unwrap(), config);
    }

    #[test]
    fn test_load_rejects_bad_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        std::fs::write(&path, r#"{ "poll_interval_ms": 0 }"#).unwrap();
        assert!(matches!(Config::load(&path), Err(CoreError::Config(_))));

        std::fs::write(&path, r#"{ "fallback_homepage": "nowhere" }"#).unwrap();
        assert!(matches!(Config::load(&path), Err(CoreError::Navigation(_))));

        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(Config::load(&path), Err(CoreError::Serialization(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Config::load(&dir.path().join("absent.json")),
            Err(CoreError::Io(_))
        ));
    }
}
