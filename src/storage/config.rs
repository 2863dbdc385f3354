//! Configuration handling for nextup
//!
//! Configuration is stored in `.nextup/config.toml` (project) and
//! `~/.config/nextup/config.toml` (global).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::OwnerId;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// Settings for the next-up ranking
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NextUpConfig {
    /// Show the next-up list in `task show`
    pub visible: bool,

    /// Maximum number of ranked tasks printed (0 = no limit)
    pub limit: usize,
}

impl Default for NextUpConfig {
    fn default() -> Self {
        Self {
            visible: true,
            limit: 10,
        }
    }
}

/// Settings for the outline view
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlineConfig {
    /// Show completed tasks in text output
    pub show_completed: bool,
}

impl Default for OutlineConfig {
    fn default() -> Self {
        Self {
            show_completed: true,
        }
    }
}

/// Project-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ProjectConfig {
    /// Owner used when none is given on the command line
    pub owner: Option<String>,

    /// Next-up ranking settings
    pub next_up: NextUpConfig,

    /// Outline settings
    pub outline: OutlineConfig,
}

/// Global user configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GlobalConfig {
    /// Default output format (text or json)
    pub default_format: OutputFormat,

    /// Owner used when neither the command line nor the project names one
    pub owner: Option<String>,
}

/// Output format for commands
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Combined configuration (global + project)
#[derive(Debug, Clone)]
pub struct Config {
    pub project: ProjectConfig,
    pub global: GlobalConfig,
    pub project_root: Option<PathBuf>,
}

impl Config {
    /// Loads configuration from default locations
    pub fn load() -> Result<Self> {
        let global = Self::load_global()?;
        let project_root = Self::find_project_root();
        let project = match &project_root {
            Some(root) => Self::load_project_config(root)?,
            None => ProjectConfig::default(),
        };

        Ok(Self {
            project,
            global,
            project_root,
        })
    }

    /// Loads configuration for a specific project
    pub fn for_project(project_root: &Path) -> Result<Self> {
        let global = Self::load_global()?;
        let project = Self::load_project_config(project_root)?;

        Ok(Self {
            project,
            global,
            project_root: Some(project_root.to_path_buf()),
        })
    }

    /// Returns the global config directory
    pub fn global_config_dir() -> Option<PathBuf> {
        ProjectDirs::from("dev", "nextup", "nextup").map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Loads global configuration
    fn load_global() -> Result<GlobalConfig> {
        let config_dir = match Self::global_config_dir() {
            Some(dir) => dir,
            None => return Ok(GlobalConfig::default()),
        };

        let config_path = config_dir.join("config.toml");
        if !config_path.exists() {
            return Ok(GlobalConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read global config: {}", config_path.display()))?;

        toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .context("Failed to parse global config")
    }

    /// Loads project configuration from a specific root
    fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
        let config_path = project_root.join(".nextup").join("config.toml");

        if !config_path.exists() {
            return Ok(ProjectConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read project config: {}", config_path.display()))?;

        toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .context("Failed to parse project config")
    }

    /// Finds the project root by looking for a `.nextup/` directory
    pub fn find_project_root() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;

        loop {
            if current.join(".nextup").is_dir() {
                return Some(current);
            }

            if !current.pop() {
                return None;
            }
        }
    }

    /// Resolves the owner to act as
    ///
    /// Order: explicit value (flag or `NEXTUP_OWNER`), project config, global
    /// config, `$USER`, then `anonymous`.
    pub fn resolve_owner(&self, explicit: Option<&str>) -> Result<OwnerId> {
        let name = explicit
            .map(str::to_string)
            .or_else(|| self.project.owner.clone())
            .or_else(|| self.global.owner.clone())
            .or_else(|| std::env::var("USER").ok().filter(|u| !u.trim().is_empty()))
            .unwrap_or_else(|| "anonymous".to_string());

        let owner = name
            .parse::<OwnerId>()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        Ok(owner)
    }

    /// Saves the project configuration
    pub fn save_project(&self) -> Result<()> {
        let root = self
            .project_root
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("Not in a nextup project. Run 'nextup init' first."))?;
        let config_path = root.join(".nextup").join("config.toml");

        let content =
            toml::to_string_pretty(&self.project).context("Failed to serialize project config")?;

        fs::write(&config_path, content)
            .with_context(|| format!("Failed to write project config: {}", config_path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn bare() -> Config {
        Config {
            project: ProjectConfig::default(),
            global: GlobalConfig::default(),
            project_root: None,
        }
    }

    #[test]
    fn default_config() {
        let config = bare();

        assert!(config.project.next_up.visible);
        assert_eq!(config.project.next_up.limit, 10);
        assert!(config.project.outline.show_completed);
        assert_eq!(config.global.default_format, OutputFormat::Text);
    }

    #[test]
    fn parse_project_config() {
        let toml = r#"
owner = "alice"

[next_up]
limit = 3

[outline]
show_completed = false
"#;

        let config: ProjectConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.owner.as_deref(), Some("alice"));
        assert_eq!(config.next_up.limit, 3);
        assert!(config.next_up.visible);
        assert!(!config.outline.show_completed);
    }

    #[test]
    fn parse_global_config() {
        let toml = r#"
default_format = "json"
owner = "bob"
"#;

        let config: GlobalConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.default_format, OutputFormat::Json);
        assert_eq!(config.owner.as_deref(), Some("bob"));
    }

    #[test]
    fn explicit_owner_wins() {
        let mut config = bare();
        config.project.owner = Some("project-owner".to_string());
        config.global.owner = Some("global-owner".to_string());

        let owner = config.resolve_owner(Some("flag-owner")).unwrap();
        assert_eq!(owner.as_str(), "flag-owner");
    }

    #[test]
    fn project_owner_beats_global() {
        let mut config = bare();
        config.project.owner = Some("project-owner".to_string());
        config.global.owner = Some("global-owner".to_string());

        assert_eq!(config.resolve_owner(None).unwrap().as_str(), "project-owner");

        config.project.owner = None;
        assert_eq!(config.resolve_owner(None).unwrap().as_str(), "global-owner");
    }

    #[test]
    fn invalid_owner_is_rejected() {
        let config = bare();
        assert!(config.resolve_owner(Some("two words")).is_err());
    }

    #[test]
    fn save_and_reload_project_config() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join(".nextup")).unwrap();

        let mut config = bare();
        config.project_root = Some(dir.path().to_path_buf());
        config.project.next_up.limit = 5;
        config.save_project().unwrap();

        let reloaded = Config::load_project_config(dir.path()).unwrap();
        assert_eq!(reloaded.next_up.limit, 5);
    }

    #[test]
    fn save_without_project_fails() {
        assert!(bare().save_project().is_err());
    }
}
