//! Layered configuration loading.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};

use crate::{ArborConfig, Paths};

/// Builds an [`ArborConfig`] from defaults, the files listed by [`Paths`]
/// and `ARBOR_*` environment variables, in that order.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    project_dir: PathBuf,
    env_prefix: String,
    user_config: bool,
}

impl ConfigLoader {
    /// A loader rooted at the current directory.
    pub fn new() -> Self {
        Self {
            project_dir: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            env_prefix: "ARBOR".to_string(),
            user_config: true,
        }
    }

    pub fn with_project_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.project_dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    pub fn without_user_config(mut self) -> Self {
        self.user_config = false;
        self
    }

    /// The files this loader reads, whether or not they exist.
    pub fn paths(&self) -> Paths {
        let paths = Paths::new(&self.project_dir);
        if self.user_config {
            paths
        } else {
            paths.without_user()
        }
    }

    pub fn load(self) -> Result<ArborConfig> {
        let mut builder = Config::builder().add_source(Config::try_from(&ArborConfig::default())?);
        for (_, file) in self.paths().config_files() {
            if file.exists() {
                builder = builder.add_source(File::from(file).format(FileFormat::Toml));
            }
        }
        // ARBOR_EXECUTION__PARALLEL=false
        builder = builder.add_source(
            Environment::with_prefix(&self.env_prefix)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let mut config: ArborConfig = builder
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        config.resolve_paths(&self.project_dir);
        config.validate()?;
        Ok(config)
    }

    /// Falls back to the defaults when any layer is unreadable or invalid.
    pub fn load_or_default(self) -> ArborConfig {
        self.load().unwrap_or_default()
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;

    fn loader(dir: &Path) -> ConfigLoader {
        ConfigLoader::new()
            .with_project_dir(dir)
            .with_env_prefix("ARBOR_LOADER_TEST")
            .without_user_config()
    }

    #[test]
    fn test_load_defaults() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let config = loader(temp_dir.path())
            .load()
            .expect("Failed to load config");

        assert_eq!(config, ArborConfig::default());
    }

    #[test]
    fn test_load_project_config() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let project_dir = temp_dir.path();

        let config_content = r#"
[project]
name = "wheat-trials"

[persistence]
scratch_dir = "scratch"
pretty = false

[execution]
parallel = false
threads = 4
"#;
        fs::write(project_dir.join("arbor.toml"), config_content)
            .expect("Failed to write config");

        let config = loader(project_dir).load().expect("Failed to load config");

        assert_eq!(config.project.name, "wheat-trials");
        assert!(!config.persistence.pretty);
        assert_eq!(config.persistence.scratch_dir, Some(project_dir.join("scratch")));
        assert!(!config.execution.parallel);
        assert_eq!(config.execution.threads, 4);
    }

    #[test]
    fn test_local_overrides() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let project_dir = temp_dir.path();

        fs::write(
            project_dir.join("arbor.toml"),
            r#"
[logging]
level = "warn"
"#,
        )
        .expect("Failed to write project config");

        fs::write(
            project_dir.join("arbor.local.toml"),
            r#"
[logging]
level = "debug"
"#,
        )
        .expect("Failed to write local config");

        let config = loader(project_dir).load().expect("Failed to load config");

        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_malformed_toml_is_an_error() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        fs::write(temp_dir.path().join("arbor.local.toml"), "[execution\nparallel = ")
            .expect("Failed to write config");

        assert!(loader(temp_dir.path()).load().is_err());
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        fs::write(
            temp_dir.path().join("arbor.toml"),
            "[logging]\nlevel = \"shouting\"\n",
        )
        .expect("Failed to write config");

        assert!(loader(temp_dir.path()).load().is_err());
        assert!(loader(temp_dir.path()).paths().user_config_file().is_none());
        assert_eq!(
            loader(temp_dir.path()).load_or_default(),
            ArborConfig::default()
        );
    }
}
