//! Configuration file handling

use serde::Deserialize;
use std::path::{Path, PathBuf};

use super::paths::config_path;
use super::Result;

/// Main configuration structure
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Python interpreter settings
    #[serde(default)]
    pub python: PythonConfig,

    /// Workspace settings
    #[serde(default)]
    pub workspace: WorkspaceSettings,

    /// behave invocation settings
    #[serde(default)]
    pub behave: BehaveConfig,
}

/// Python interpreter settings
#[derive(Debug, Deserialize, Default, Clone)]
pub struct PythonConfig {
    /// Explicit interpreter path; when unset the workspace venv and PATH are searched
    pub path: Option<PathBuf>,
}

/// Workspace settings
#[derive(Debug, Deserialize, Default, Clone)]
pub struct WorkspaceSettings {
    /// Workspace root; defaults to the current directory
    pub root: Option<PathBuf>,
}

/// behave invocation settings
#[derive(Debug, Deserialize, Clone)]
pub struct BehaveConfig {
    /// Module passed to `python -m`
    #[serde(default = "default_module")]
    pub module: String,

    /// Extra arguments appended to every behave invocation
    #[serde(default)]
    pub args: Vec<String>,
}

impl Default for BehaveConfig {
    fn default() -> Self {
        Self {
            module: default_module(),
            args: Vec::new(),
        }
    }
}

fn default_module() -> String {
    "behave".to_string()
}

impl Config {
    /// Load configuration from the default config file
    ///
    /// Returns default configuration if file doesn't exist
    pub fn load() -> Result<Self> {
        match config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load configuration from an explicit path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| super::Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| super::Error::ConfigParse(e.to_string()))
    }
}
