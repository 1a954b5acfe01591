//! Configuration service.
//!
//! Loads [`RootConfig`] from `~/.config/seqthink/config.toml` and caches it.

use crate::paths::SeqThinkPaths;
use seqthink_core::config::RootConfig;
use seqthink_core::error::{Result, SeqThinkError};
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

/// Loads and caches the root configuration.
///
/// A missing file is created with defaults on first access. An unreadable
/// file falls back to defaults with a warning.
#[derive(Debug, Clone)]
pub struct ConfigService {
    path: Option<PathBuf>,
    config: Arc<RwLock<Option<RootConfig>>>,
}

impl ConfigService {
    /// Uses the platform config file.
    pub fn new() -> Self {
        Self {
            path: SeqThinkPaths::config_file().ok(),
            config: Arc::new(RwLock::new(None)),
        }
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            config: Arc::new(RwLock::new(None)),
        }
    }

    /// Gets the root configuration, loading from file if not cached.
    ///
    /// Failures are not cached, so a later [`get_config`](Self::get_config)
    /// retries the file and reports the problem.
    pub fn try_get_config(&self) -> Result<RootConfig> {
        if let Some(config) = self.cached() {
            return Ok(config);
        }

        let loaded = self.load_config()?;
        self.store(loaded.clone());
        Ok(loaded)
    }

    /// Like [`try_get_config`](Self::try_get_config), falling back to defaults
    /// with a warning.
    pub fn get_config(&self) -> RootConfig {
        self.try_get_config().unwrap_or_else(|e| {
            tracing::warn!("[ConfigService] Using default configuration: {}", e);
            let config = RootConfig::default();
            self.store(config.clone());
            config
        })
    }

    fn cached(&self) -> Option<RootConfig> {
        self.config
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn store(&self, config: RootConfig) {
        let mut cached = self
            .config
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *cached = Some(config);
    }

    /// Invalidates the cache, forcing a reload on next access.
    pub fn invalidate_cache(&self) {
        let mut cached = self
            .config
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *cached = None;
    }

    fn load_config(&self) -> Result<RootConfig> {
        let path = self
            .path
            .as_ref()
            .ok_or_else(|| SeqThinkError::config("no configuration directory on this platform"))?;

        if !path.exists() {
            let config = RootConfig::default();
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, toml::to_string_pretty(&config)?)?;
            tracing::debug!("[ConfigService] Wrote default configuration to {:?}", path);
            return Ok(config);
        }

        let content = fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| SeqThinkError::config(format!("{}: {}", path.display(), e)))
    }
}

impl Default for ConfigService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_creates_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("seqthink/config.toml");
        let service = ConfigService::with_path(&path);

        assert_eq!(service.get_config(), RootConfig::default());
        assert!(path.exists());
    }

    #[test]
    fn test_reads_and_caches() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "default_estimate = 9\n").unwrap();
        let service = ConfigService::with_path(&path);

        assert_eq!(service.get_config().default_estimate, 9);

        fs::write(&path, "default_estimate = 3\n").unwrap();
        assert_eq!(service.get_config().default_estimate, 9);

        service.invalidate_cache();
        assert_eq!(service.get_config().default_estimate, 3);
    }

    #[test]
    fn test_invalid_file_falls_back() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "default_estimate = \"many\"").unwrap();

        let service = ConfigService::with_path(&path);
        assert_eq!(service.get_config(), RootConfig::default());
    }

    #[test]
    fn test_try_get_config_reports_invalid_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "default_estimate = \"many\"").unwrap();

        let service = ConfigService::with_path(&path);
        let err = service.try_get_config().unwrap_err();
        assert!(err.to_string().contains("config.toml"));
        // Still not cached, so a retry sees the fixed file.
        fs::write(&path, "default_estimate = 7\n").unwrap();
        assert_eq!(service.get_config().default_estimate, 7);
    }
}
