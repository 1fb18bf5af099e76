//! Test tree model
//!
//! Suites (features) and tests (scenarios) addressed by [`NodeId`], plus the
//! location parsing shared by discovery and execution.

mod location;
mod node;

pub use location::{split_location, Location, NodeId};
pub use node::{Node, Suite, Test, Tree};
