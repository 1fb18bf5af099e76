//! Common utilities shared by the engine and the CLI host

pub mod config;
pub mod error;
pub mod logging;
pub mod paths;

pub use error::{Error, Result};
