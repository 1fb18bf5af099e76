//! Execution engine
//!
//! Runs requested suites and tests one process at a time and reports each
//! state change as a [`RunEvent`].

mod events;
mod executor;

pub use events::{RunEvent, RunSummary, SuiteState, TestState};
pub use executor::{classify, run_args, Executor};
