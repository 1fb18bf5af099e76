//! Workspace configuration collaborator
//!
//! Answers the two questions the engine asks of its host: which interpreter
//! to run behave with, and which directory to run it in.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::common::config::{BehaveConfig, Config};
use crate::common::paths;

/// Interpreter and workspace lookup used by discovery and execution
#[async_trait]
pub trait Configuration: Send + Sync {
    /// Interpreter that runs `-m behave`, if one can be found
    async fn interpreter_command(&self) -> Option<PathBuf>;

    /// Absolute workspace root; behave runs from here
    fn workspace_root(&self) -> PathBuf;

    /// behave module and extra arguments
    fn behave(&self) -> BehaveConfig {
        BehaveConfig::default()
    }
}

/// Configuration resolved from CLI overrides, the config file, and the
/// environment
#[derive(Debug, Clone)]
pub struct WorkspaceConfig {
    root: PathBuf,
    python_override: Option<PathBuf>,
    python_configured: Option<PathBuf>,
    behave: BehaveConfig,
}

impl WorkspaceConfig {
    /// Build from the loaded config file plus optional CLI overrides
    ///
    /// The workspace root falls back to the current directory.
    pub fn new(config: Config, workspace: Option<PathBuf>, python: Option<PathBuf>) -> Self {
        let root = workspace
            .or(config.workspace.root)
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."));
        let root = root.canonicalize().unwrap_or(root);

        Self {
            root: paths::to_forward_slashes(&root),
            python_override: python,
            python_configured: config.python.path,
            behave: config.behave,
        }
    }

    /// Where the interpreter would come from, for display
    pub fn interpreter_source(&self) -> &'static str {
        if self.python_override.is_some() {
            "command line"
        } else if self.python_configured.is_some() {
            "config file"
        } else if paths::venv_python(&self.root).is_some() {
            "workspace virtualenv"
        } else {
            "PATH"
        }
    }

    fn resolve_interpreter(&self) -> Option<PathBuf> {
        if let Some(path) = &self.python_override {
            return Some(path.clone());
        }
        if let Some(path) = &self.python_configured {
            return Some(path.clone());
        }
        if let Some(path) = paths::venv_python(&self.root) {
            return Some(path);
        }
        ["python3", "python"]
            .iter()
            .find_map(|name| which::which(name).ok())
    }
}

#[async_trait]
impl Configuration for WorkspaceConfig {
    async fn interpreter_command(&self) -> Option<PathBuf> {
        // PATH and venv probing touch the filesystem
        let this = self.clone();
        match tokio::task::spawn_blocking(move || this.resolve_interpreter()).await {
            Ok(path) => path,
            Err(e) => {
                tracing::warn!("Interpreter lookup failed: {}", e);
                None
            }
        }
    }

    fn workspace_root(&self) -> PathBuf {
        self.root.clone()
    }

    fn behave(&self) -> BehaveConfig {
        self.behave.clone()
    }
}
