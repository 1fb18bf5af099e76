//! Error types for behave-explorer
//!
//! Only failures that the caller has to decide about end up here. Test
//! failures and per-test transport problems are reported as run events
//! instead, see [`crate::execution`].

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for behave-explorer
#[derive(Error, Debug)]
pub enum Error {
    // === Discovery Errors ===
    #[error("Failed to parse behave dry-run output: {0}")]
    DiscoveryParse(#[source] serde_json::Error),

    #[error("No test tree loaded. Run discovery first")]
    NotLoaded,

    // === Process Errors ===
    #[error("Failed to execute process '{command}': {reason}")]
    SpawnFailed { command: String, reason: String },

    // === Configuration Errors ===
    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    // === IO Errors ===
    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Internal Errors ===
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a spawn failure error for a command
    pub fn spawn_failed(command: &str, reason: impl ToString) -> Self {
        Self::SpawnFailed {
            command: command.to_string(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discovery_parse_message() {
        let json_err = serde_json::from_str::<Vec<u8>>("{not json").unwrap_err();
        let err = Error::DiscoveryParse(json_err);
        assert!(err.to_string().starts_with("Failed to parse behave dry-run output"));
    }

    #[test]
    fn test_spawn_failed_message() {
        let err = Error::spawn_failed("python3", "No such file or directory");
        assert_eq!(
            err.to_string(),
            "Failed to execute process 'python3': No such file or directory"
        );
    }
}
