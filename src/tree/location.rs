//! Source locations and node identifiers
//!
//! behave reports locations as `path:line` with one-based lines. Nodes store
//! zero-based lines, and subprocess targeting converts back. Both directions
//! live here.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// A targetable position in a feature file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    /// Feature file path
    pub file: PathBuf,
    /// Zero-based line number
    pub line: u32,
}

impl Location {
    pub fn new(file: impl Into<PathBuf>, line: u32) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }

    /// Parse a `path:lineOneBased` location
    ///
    /// Returns `None` when there is no line part or the line is not a
    /// positive integer.
    pub fn parse(raw: &str) -> Option<Self> {
        let (file, line) = split_location(raw);
        line.map(|line| Self::new(file, line))
    }

    /// Render as `path:lineOneBased`, the form behave accepts as a target
    pub fn target(&self) -> String {
        format!("{}:{}", self.file.display(), u64::from(self.line) + 1)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.target())
    }
}

/// Split a raw `path:lineOneBased` into the path and a zero-based line
///
/// The path is kept even when the line is unusable so the node can still be
/// displayed. Splits on the last `:` so Windows drive letters survive.
pub fn split_location(raw: &str) -> (&str, Option<u32>) {
    match raw.rsplit_once(':') {
        Some((file, line)) => (file, parse_line(line)),
        None => (raw, None),
    }
}

fn parse_line(one_based: &str) -> Option<u32> {
    one_based
        .trim()
        .parse::<u32>()
        .ok()
        .and_then(|line| line.checked_sub(1))
}

/// Identifier of a node in the test tree
///
/// Formatted as `<name>:<location>` where `location` is the raw
/// `path:lineOneBased` behave reported. The synthetic root has an empty id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Build the id of a feature or scenario
    pub fn new(name: &str, raw_location: &str) -> Self {
        Self(format!("{}:{}", name, raw_location))
    }

    /// Id of the synthetic root suite
    pub fn root() -> Self {
        Self(String::new())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Split an id back into its name and location
    ///
    /// Splits from the right so names containing `:` survive. Returns `None`
    /// for ids that do not end in `path:line`.
    pub fn parse(&self) -> Option<(&str, Location)> {
        let mut parts = self.0.rsplitn(3, ':');
        let line = parts.next()?;
        let file = parts.next()?;
        let name = parts.next()?;
        let line = parse_line(line)?;
        Some((name, Location::new(file, line)))
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl PartialEq<str> for NodeId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}
