//! Configuration management for Arbor
//!
//! Provides hierarchical configuration loading from multiple sources:
//! 1. CLI arguments (highest precedence)
//! 2. Environment variables (ARBOR_* prefix, `__` between nested keys)
//! 3. arbor.local.toml (gitignored, local overrides)
//! 4. arbor.toml (git-tracked, project config)
//! 5. ~/.config/arbor/config.toml (user defaults)
//! 6. Built-in defaults (lowest precedence)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

mod error;
mod loader;
mod paths;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use paths::{Layer, Paths};

/// Log levels accepted by `logging.level`.
pub const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Main Arbor configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ArborConfig {
    pub project: ProjectConfig,
    pub persistence: PersistenceConfig,
    pub execution: ExecutionConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ProjectConfig {
    pub name: String,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: "arbor-project".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PersistenceConfig {
    /// Where temp files are written before being moved into place.
    /// Unset means the system temp directory.
    pub scratch_dir: Option<PathBuf>,
    pub backup_suffix: String,
    pub pretty: bool,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            scratch_dir: None,
            backup_suffix: ".bak".to_string(),
            pretty: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ExecutionConfig {
    pub parallel: bool,
    /// Worker threads for parallel runs; 0 uses the thread pool default.
    pub threads: usize,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            threads: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl ArborConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        ConfigLoader::new().load()
    }

    /// Load configuration from specific project directory
    pub fn load_from_dir(project_dir: impl AsRef<Path>) -> Result<Self> {
        ConfigLoader::new().with_project_dir(project_dir).load()
    }

    /// Configuration for running every replicate on the calling thread
    pub fn sequential() -> Self {
        Self {
            execution: ExecutionConfig {
                parallel: false,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Resolve relative paths to absolute
    pub fn resolve_paths(&mut self, base_dir: impl AsRef<Path>) {
        let base = base_dir.as_ref();

        if let Some(scratch) = &self.persistence.scratch_dir
            && scratch.is_relative()
        {
            self.persistence.scratch_dir = Some(base.join(scratch));
        }
    }

    /// Effective scratch directory
    pub fn scratch_dir(&self) -> PathBuf {
        self.persistence
            .scratch_dir
            .clone()
            .unwrap_or_else(Paths::default_scratch_dir)
    }

    /// Check values that deserialize fine but make no sense
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.persistence.backup_suffix.is_empty() {
            return Err(ConfigError::ValidationError(
                "persistence.backup_suffix must not be empty".to_string(),
            ));
        }
        if !LOG_LEVELS.contains(&self.logging.level.to_ascii_lowercase().as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "logging.level '{}' is not one of {}",
                self.logging.level,
                LOG_LEVELS.join(", ")
            )));
        }
        Ok(())
    }

    /// Render the effective configuration as TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ArborConfig::default();
        assert_eq!(config.persistence.backup_suffix, ".bak");
        assert!(config.persistence.pretty);
        assert!(config.execution.parallel);
        assert_eq!(config.execution.threads, 0);
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_sequential_config() {
        let config = ArborConfig::sequential();
        assert!(!config.execution.parallel);
        assert_eq!(config.persistence, PersistenceConfig::default());
    }

    #[test]
    fn test_path_resolution() {
        let mut config = ArborConfig::default();
        config.resolve_paths("/home/user/project");
        assert_eq!(config.persistence.scratch_dir, None);

        config.persistence.scratch_dir = Some(PathBuf::from(".arbor/tmp"));
        config.resolve_paths("/home/user/project");
        assert_eq!(
            config.scratch_dir(),
            PathBuf::from("/home/user/project/.arbor/tmp")
        );
    }

    #[test]
    fn test_validation() {
        let mut config = ArborConfig::default();
        config.logging.level = "loud".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));

        let mut config = ArborConfig::default();
        config.persistence.backup_suffix.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_render_toml() {
        let rendered = ArborConfig::default().to_toml().unwrap();
        assert!(rendered.contains("[execution]"));
        assert!(rendered.contains("backup_suffix = \".bak\""));
    }
}
