//! Discovery engine
//!
//! Runs behave in dry-run mode and turns its JSON description into a fresh
//! [`Tree`]. Every call produces a full replacement snapshot.

mod description;

use tokio_util::sync::CancellationToken;

use crate::common::{Error, Result};
use crate::process::{NullSink, ProcessOutcome, ProcessRunner};
use crate::tree::Tree;
use crate::workspace::Configuration;

pub use description::{build_suites, parse_description, ElementRecord, FeatureRecord};

/// Arguments for a side-effect free structural dump
pub fn dry_run_args(module: &str, extra: &[String]) -> Vec<String> {
    let mut args: Vec<String> = ["-m", module, "--dry-run", "--format", "json", "--no-summary"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    args.extend(extra.iter().cloned());
    args
}

/// Discover the behave features of the workspace
///
/// A missing interpreter or a failing dry run yields an empty tree. Output
/// that is not a valid description is an error.
pub async fn discover(config: &dyn Configuration, runner: &dyn ProcessRunner) -> Result<Tree> {
    let Some(interpreter) = config.interpreter_command().await else {
        tracing::error!("Failed to resolve a python interpreter; no tests discovered");
        return Ok(Tree::empty());
    };

    let root = config.workspace_root();
    let behave = config.behave();
    let args = dry_run_args(&behave.module, &behave.args);

    tracing::info!("Discovering behave tests in {}", root.display());

    let outcome = runner
        .run(&interpreter, &root, &args, &NullSink, &CancellationToken::new())
        .await;

    let stdout = match outcome {
        ProcessOutcome::Exited { code: 0, stdout, .. } => stdout,
        ProcessOutcome::Exited { code, stderr, .. } => {
            tracing::error!("behave dry run exited with code {}: {}", code, stderr.trim());
            return Ok(Tree::empty());
        }
        ProcessOutcome::SpawnFailed(reason) | ProcessOutcome::Failed(reason) => {
            tracing::error!("behave dry run failed: {}", reason);
            return Ok(Tree::empty());
        }
        ProcessOutcome::Cancelled => {
            tracing::warn!("behave dry run was cancelled");
            return Ok(Tree::empty());
        }
    };

    let records = parse_description(&stdout).map_err(Error::DiscoveryParse)?;
    let tree = Tree::new(build_suites(&root, records));

    for id in tree.duplicate_ids() {
        tracing::warn!("Duplicate test id '{}'; only the first node can be run", id);
    }

    tracing::info!(
        "Discovered {} features with {} tests",
        tree.features().len(),
        tree.test_count()
    );

    Ok(tree)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{FakeConfig, ScriptedRunner};

    const TWO_FEATURES: &str = r#"[
      {"keyword": "Feature", "name": "A", "location": "features/a.feature:1",
       "elements": [
         {"keyword": "Scenario", "name": "a1", "location": "features/a.feature:3"},
         {"keyword": "Scenario", "name": "a2", "location": "features/a.feature:6"}
       ]},
      {"keyword": "Feature", "name": "B", "location": "features/b.feature:1",
       "elements": [
         {"keyword": "Scenario Outline", "name": "b1", "location": "features/b.feature:2"}
       ]}
    ]"#;

    #[test]
    fn test_dry_run_args() {
        assert_eq!(
            dry_run_args("behave", &[]),
            vec!["-m", "behave", "--dry-run", "--format", "json", "--no-summary"]
        );
        assert_eq!(dry_run_args("behave", &["--tags=smoke".to_string()]).last().unwrap(), "--tags=smoke");
    }

    #[tokio::test]
    async fn test_discover_builds_tree() {
        let config = FakeConfig::with_python();
        let runner = ScriptedRunner::exit(0, TWO_FEATURES, "");

        let tree = discover(&config, &runner).await.unwrap();

        assert_eq!(tree.features().len(), 2);
        assert_eq!(tree.features()[0].children().len(), 2);
        assert_eq!(tree.features()[1].children().len(), 1);
        assert_eq!(tree.root().id().as_str(), "");
        assert_eq!(tree.root().label(), "");

        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].working_dir, config.workspace_root());
        assert!(calls[0].args.contains(&"--dry-run".to_string()));
    }

    #[tokio::test]
    async fn test_discover_is_idempotent() {
        let config = FakeConfig::with_python();
        let runner = ScriptedRunner::exit(0, TWO_FEATURES, "");

        let first = discover(&config, &runner).await.unwrap();
        let second = discover(&config, &runner).await.unwrap();

        assert_eq!(first.ids(), second.ids());
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_discover_without_interpreter() {
        let config = FakeConfig::without_python();
        let runner = ScriptedRunner::exit(0, TWO_FEATURES, "");

        let tree = discover(&config, &runner).await.unwrap();

        assert!(tree.is_empty());
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_discover_nonzero_exit_is_empty() {
        let config = FakeConfig::with_python();
        let runner = ScriptedRunner::exit(2, "not json at all", "ConfigError");

        let tree = discover(&config, &runner).await.unwrap();
        assert!(tree.is_empty());
    }

    #[tokio::test]
    async fn test_discover_spawn_failure_is_empty() {
        let config = FakeConfig::with_python();
        let runner = ScriptedRunner::new(vec![ProcessOutcome::SpawnFailed("not found".to_string())]);

        let tree = discover(&config, &runner).await.unwrap();
        assert!(tree.is_empty());
    }

    #[tokio::test]
    async fn test_discover_empty_output() {
        let config = FakeConfig::with_python();
        let runner = ScriptedRunner::exit(0, "", "");

        let tree = discover(&config, &runner).await.unwrap();
        assert!(tree.is_empty());
    }

    #[tokio::test]
    async fn test_discover_malformed_json_is_error() {
        let config = FakeConfig::with_python();
        let runner = ScriptedRunner::exit(0, "[{\"keyword\": ", "");

        let err = discover(&config, &runner).await.unwrap_err();
        assert!(matches!(err, Error::DiscoveryParse(_)));
    }
}
