//! Where configuration files are looked for.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;

/// A file-backed configuration layer. Later layers override earlier ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    /// `~/.config/arbor/config.toml`
    User,
    /// `arbor.toml` in the project directory
    Project,
    /// `arbor.local.toml` in the project directory, kept out of version control
    Local,
}

impl Layer {
    pub fn label(self) -> &'static str {
        match self {
            Layer::User => "User",
            Layer::Project => "Project",
            Layer::Local => "Local",
        }
    }
}

/// The configuration files for one project directory.
#[derive(Debug, Clone)]
pub struct Paths {
    project_dir: PathBuf,
    user_dir: Option<PathBuf>,
}

impl Paths {
    /// Paths for `project_dir`, with the user directory taken from the platform.
    pub fn new(project_dir: impl AsRef<Path>) -> Self {
        Self {
            project_dir: project_dir.as_ref().to_path_buf(),
            user_dir: ProjectDirs::from("org", "Arbor", "arbor")
                .map(|dirs| dirs.config_dir().to_path_buf()),
        }
    }

    /// Drops the user layer, for callers that must not see the machine's settings.
    pub fn without_user(mut self) -> Self {
        self.user_dir = None;
        self
    }

    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    /// `None` when the platform has no home directory to look in.
    pub fn user_config_file(&self) -> Option<PathBuf> {
        self.user_dir.as_ref().map(|dir| dir.join("config.toml"))
    }

    /// Every candidate file, lowest precedence first. Files may not exist.
    pub fn config_files(&self) -> Vec<(Layer, PathBuf)> {
        let mut files = Vec::with_capacity(3);
        if let Some(user) = self.user_config_file() {
            files.push((Layer::User, user));
        }
        files.push((Layer::Project, self.project_dir.join("arbor.toml")));
        files.push((Layer::Local, self.project_dir.join("arbor.local.toml")));
        files
    }

    /// Where temp files are written before a document is moved into place.
    pub fn default_scratch_dir() -> PathBuf {
        std::env::temp_dir().join("arbor")
    }
}
