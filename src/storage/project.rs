//! Project management
//!
//! Handles project initialization and provides access to the task store.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;

use super::{Config, TaskStore};
use crate::domain::{OwnerId, TaskGraph};

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("Not in a nextup project. Run 'nextup init' first.")]
    NotInProject,
}

const DEFAULT_CONFIG: &str = r#"# nextup configuration

# Owner to act as when --owner / NEXTUP_OWNER are not set (defaults to $USER)
# owner = "alice"

[next_up]
# Show the next-up list in 'nextup task show'
visible = true
# Number of ranked tasks printed by 'nextup next' (0 = all)
limit = 10

[outline]
# Show completed tasks in 'nextup outline'
show_completed = true
"#;

const GITIGNORE: &str = "# Store lock and in-flight rewrites\n*.lock\n*.tmp\n";

/// A nextup project
pub struct Project {
    root: PathBuf,
    config: Config,
}

impl Project {
    /// Opens an existing project at the given path
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let data_dir = root.join(".nextup");

        if !data_dir.is_dir() {
            return Err(ProjectError::NotInProject.into());
        }

        let config = Config::for_project(&root)?;

        Ok(Self { root, config })
    }

    /// Opens the project at the current directory or a parent
    pub fn open_current() -> Result<Self> {
        let root = Config::find_project_root().ok_or(ProjectError::NotInProject)?;

        Self::open(root)
    }

    /// Initializes a new project at the given path
    pub fn init(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let data_dir = root.join(".nextup");

        fs::create_dir_all(&data_dir).with_context(|| {
            format!("Failed to create .nextup directory: {}", data_dir.display())
        })?;

        let config_path = data_dir.join("config.toml");
        if !config_path.exists() {
            fs::write(&config_path, DEFAULT_CONFIG)
                .with_context(|| format!("Failed to write config: {}", config_path.display()))?;
        }

        let gitignore_path = data_dir.join(".gitignore");
        if !gitignore_path.exists() {
            fs::write(&gitignore_path, GITIGNORE).with_context(|| {
                format!("Failed to write .gitignore: {}", gitignore_path.display())
            })?;
        }

        Self::open(root)
    }

    /// Returns the project root path
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the .nextup directory path
    pub fn data_dir(&self) -> PathBuf {
        self.root.join(".nextup")
    }

    /// Returns the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns a mutable reference to the configuration
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    /// Returns the task store
    pub fn task_store(&self) -> TaskStore {
        TaskStore::for_project(&self.root)
    }

    /// Reads the store once and builds the owner's snapshot from it
    pub fn snapshot(&self, owner: &OwnerId) -> Result<TaskGraph> {
        let tasks = self.task_store().read_for_owner(owner)?;
        Ok(TaskGraph::for_owner(owner, tasks.into_values()))
    }
}
