//! Configuration and workspace paths

use std::path::{Path, PathBuf};

/// Name used for the configuration directory
const APP_NAME: &str = "behave-explorer";

/// Directories searched for a workspace-local virtual environment
const VENV_DIRS: &[&str] = &[".venv", "venv", "env"];

/// Get the configuration directory path
///
/// Uses the directories crate for platform-appropriate locations:
/// - Linux: `~/.config/behave-explorer/`
/// - macOS: `~/Library/Application Support/behave-explorer/`
/// - Windows: `%APPDATA%\behave-explorer\`
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", APP_NAME)
        .map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the configuration file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}

/// Find a python interpreter inside a virtual environment of the workspace
pub fn venv_python(workspace: &Path) -> Option<PathBuf> {
    VENV_DIRS
        .iter()
        .map(|dir| workspace.join(dir).join(venv_python_relative()))
        .find(|candidate| candidate.is_file())
}

#[cfg(unix)]
fn venv_python_relative() -> PathBuf {
    PathBuf::from("bin").join("python")
}

#[cfg(windows)]
fn venv_python_relative() -> PathBuf {
    PathBuf::from("Scripts").join("python.exe")
}

/// Convert a host path to forward slashes
///
/// behave reports locations with forward slashes on every platform, so the
/// workspace root is normalised the same way before paths are joined.
pub fn to_forward_slashes(path: &Path) -> PathBuf {
    PathBuf::from(path.to_string_lossy().replace('\\', "/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_config_dir_is_valid() {
        let dir = config_dir();
        assert!(dir.is_some());
    }

    #[test]
    fn test_forward_slashes() {
        let path = to_forward_slashes(Path::new(r"C:\work\project"));
        assert_eq!(path, PathBuf::from("C:/work/project"));
    }

    #[cfg(unix)]
    #[test]
    fn test_venv_python_found() {
        let dir = tempdir().unwrap();
        let bin = dir.path().join(".venv").join("bin");
        std::fs::create_dir_all(&bin).unwrap();
        std::fs::write(bin.join("python"), "").unwrap();

        assert_eq!(venv_python(dir.path()), Some(bin.join("python")));
    }

    #[test]
    fn test_venv_python_missing() {
        let dir = tempdir().unwrap();
        assert_eq!(venv_python(dir.path()), None);
    }
}
