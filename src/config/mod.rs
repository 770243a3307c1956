// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/wattlog

//! Configuration module

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::core::ConfigError;
use crate::recording::DEFAULT_HISTORY_CAPACITY;
use crate::sensors::{DEFAULT_MAX_WATTS, DEFAULT_MIN_WATTS};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level
    pub log_level: String,

    /// Directory for on-demand exports
    pub export_dir: PathBuf,

    /// Sampling configuration
    pub sampling: SamplingConfig,

    /// Sync configuration
    pub sync: SyncConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            export_dir: PathBuf::from("./exports"),
            sampling: SamplingConfig::default(),
            sync: SyncConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Load or create default configuration
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            let config = Self::default();

            // Create parent directories
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            config.save(path)?;
            Ok(config)
        }
    }

    /// Get configuration directory
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("wattlog"))
            .unwrap_or_else(|| PathBuf::from("./config"))
    }

    /// Get default configuration path
    pub fn default_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.sampling.validate()?;
        self.sync.validate()
    }
}

/// Sampling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Tick cadence in milliseconds
    pub sample_interval_ms: u64,

    /// Points kept in the live history window
    pub history_capacity: usize,

    /// Price per kWh
    pub cost_rate: f64,

    /// Simulated load lower bound
    pub min_power_watts: u32,

    /// Simulated load upper bound
    pub max_power_watts: u32,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            sample_interval_ms: 100,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            cost_rate: 0.12,
            min_power_watts: DEFAULT_MIN_WATTS,
            max_power_watts: DEFAULT_MAX_WATTS,
        }
    }
}

impl SamplingConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_interval_ms == 0 {
            return Err(invalid("sampling.sample_interval_ms must be greater than zero"));
        }
        if self.history_capacity == 0 {
            return Err(invalid("sampling.history_capacity must be greater than zero"));
        }
        if !self.cost_rate.is_finite() || self.cost_rate <= 0.0 {
            return Err(invalid(format!(
                "sampling.cost_rate must be positive, got {}",
                self.cost_rate
            )));
        }
        if self.min_power_watts > self.max_power_watts {
            return Err(invalid(format!(
                "sampling.min_power_watts ({}) exceeds max_power_watts ({})",
                self.min_power_watts, self.max_power_watts
            )));
        }
        Ok(())
    }
}

/// Sync configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Sync cadence in milliseconds
    pub sync_interval_ms: u64,

    /// Upper bound on one publish call
    pub timeout_ms: u64,

    /// Local CSV sink handed to the target
    pub sink_path: PathBuf,

    /// Where the sink is published
    pub target: SyncTargetConfig,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            sync_interval_ms: 30_000,
            timeout_ms: 20_000,
            sink_path: PathBuf::from("data.csv"),
            target: SyncTargetConfig::None,
        }
    }
}

impl SyncConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.sync_interval_ms == 0 {
            return Err(invalid("sync.sync_interval_ms must be greater than zero"));
        }
        if self.timeout_ms == 0 {
            return Err(invalid("sync.timeout_ms must be greater than zero"));
        }
        if self.sink_path.as_os_str().is_empty() {
            return Err(invalid("sync.sink_path must not be empty"));
        }
        self.target.validate()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SyncTargetConfig {
    /// Keep the local sink only
    None,

    /// Commit and push the sink from a git working tree
    Git {
        repo_dir: PathBuf,
        remote: String,
        branch: String,
        commit_message: String,
    },

    /// POST the sink to an HTTP endpoint
    Http { endpoint: String },
}

impl Default for SyncTargetConfig {
    fn default() -> Self {
        Self::None
    }
}

impl SyncTargetConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        match self {
            Self::None => Ok(()),
            Self::Git { remote, branch, .. } => {
                if remote.trim().is_empty() || branch.trim().is_empty() {
                    Err(invalid("sync.target git remote and branch must be set"))
                } else {
                    Ok(())
                }
            }
            Self::Http { endpoint } => {
                if endpoint.trim().is_empty() {
                    Err(invalid("sync.target http endpoint must be set"))
                } else {
                    Ok(())
                }
            }
        }
    }
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid(message.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.sampling.sample_interval_ms, 100);
        assert_eq!(config.sync.sync_interval_ms, 30_000);
        assert_eq!(config.sampling.history_capacity, 500);
        assert_eq!(config.sampling.cost_rate, 0.12);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_falls_back_to_defaults() {
        let config: Config = toml::from_str(
            r#"
            [sampling]
            cost_rate = 0.31

            [sync.target]
            kind = "git"
            repo_dir = "."
            remote = "origin"
            branch = "main"
            commit_message = "auto update data"
            "#,
        )
        .unwrap();

        assert_eq!(config.sampling.cost_rate, 0.31);
        assert_eq!(config.sampling.sample_interval_ms, 100);
        assert!(matches!(config.sync.target, SyncTargetConfig::Git { .. }));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_fresh_file_keeps_sink_local() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let created = Config::load_or_create(&path).unwrap();
        assert_eq!(created.sync.target, SyncTargetConfig::None);

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("kind = \"none\""));
        assert_eq!(Config::load(&path).unwrap().sync.target, SyncTargetConfig::None);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/config.toml");

        let mut config = Config::load_or_create(&path).unwrap();
        assert!(path.exists());

        config.sync.target = SyncTargetConfig::Http {
            endpoint: "https://example.invalid/upload".into(),
        };
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.sync.target, config.sync.target);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = Config::default();
        config.sampling.cost_rate = 0.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.sampling.history_capacity = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.sampling.min_power_watts = 6000;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.sync.timeout_ms = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.sync.target = SyncTargetConfig::Http { endpoint: " ".into() };
        assert!(config.validate().is_err());
    }
}
