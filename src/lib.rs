//! behave-explorer - behave test discovery and execution
//!
//! Turns behave's dry-run description into a tree of suites and tests, and
//! runs selected nodes one process per scenario while reporting lifecycle
//! events to a test-explorer host.

pub mod cli;
pub mod commands;
pub mod common;
pub mod discovery;
pub mod execution;
pub mod explorer;
pub mod process;
pub mod tree;
pub mod workspace;

#[cfg(test)]
mod testutil;

// Re-export commonly used types
pub use common::{Error, Result};
pub use execution::{RunEvent, SuiteState, TestState};
pub use explorer::{Explorer, ExplorerEvent};
pub use tree::{Location, Node, NodeId, Tree};
