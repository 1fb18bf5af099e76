//! Test tree nodes
//!
//! Trees are built bottom-up in one pass: children first, then the suite that
//! owns them. Nothing mutates a node after construction.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use super::location::{Location, NodeId};

/// A node in the test tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Node {
    Suite(Suite),
    Test(Test),
}

/// A group of nodes, one per feature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suite {
    pub id: NodeId,
    pub label: String,
    /// Feature file; absent on the synthetic root
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
    /// Zero-based line of the feature keyword
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    pub children: Vec<Node>,
}

/// A single runnable scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Test {
    pub id: NodeId,
    pub label: String,
    pub file: PathBuf,
    /// Zero-based line; absent when behave's location could not be parsed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
}

impl Test {
    /// Location this test can be targeted at, if its line is known
    pub fn location(&self) -> Option<Location> {
        self.line.map(|line| Location::new(&self.file, line))
    }
}

impl Node {
    pub fn id(&self) -> &NodeId {
        match self {
            Node::Suite(suite) => &suite.id,
            Node::Test(test) => &test.id,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Node::Suite(suite) => &suite.label,
            Node::Test(test) => &test.label,
        }
    }

    pub fn file(&self) -> Option<&Path> {
        match self {
            Node::Suite(suite) => suite.file.as_deref(),
            Node::Test(test) => Some(&test.file),
        }
    }

    pub fn line(&self) -> Option<u32> {
        match self {
            Node::Suite(suite) => suite.line,
            Node::Test(test) => test.line,
        }
    }

    /// Children in declaration order; empty for tests
    pub fn children(&self) -> &[Node] {
        match self {
            Node::Suite(suite) => &suite.children,
            Node::Test(_) => &[],
        }
    }

    /// Depth-first search by exact id, first match wins
    pub fn find(&self, id: &str) -> Option<&Node> {
        if self.id() == id {
            return Some(self);
        }
        self.children().iter().find_map(|child| child.find(id))
    }

    fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Node)) {
        visit(self);
        for child in self.children() {
            child.walk(visit);
        }
    }
}

/// A discovery snapshot: one synthetic root suite holding a suite per feature
#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    root: Node,
}

impl Tree {
    /// Wrap feature suites in the synthetic root
    pub fn new(features: Vec<Node>) -> Self {
        Self {
            root: Node::Suite(Suite {
                id: NodeId::root(),
                label: String::new(),
                file: None,
                line: None,
                children: features,
            }),
        }
    }

    /// A tree with no features
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Top-level feature suites
    pub fn features(&self) -> &[Node] {
        self.root.children()
    }

    pub fn is_empty(&self) -> bool {
        self.features().is_empty()
    }

    /// Look up a node by id
    pub fn find(&self, id: &str) -> Option<&Node> {
        self.root.find(id)
    }

    /// All non-root ids in depth-first declaration order
    pub fn ids(&self) -> Vec<&NodeId> {
        let mut ids = Vec::new();
        self.root.walk(&mut |node| {
            if !node.id().is_root() {
                ids.push(node.id());
            }
        });
        ids
    }

    /// Number of runnable leaves
    pub fn test_count(&self) -> usize {
        let mut count = 0;
        self.root.walk(&mut |node| {
            if matches!(node, Node::Test(_)) {
                count += 1;
            }
        });
        count
    }

    /// Ids that occur more than once; lookups resolve them to the first node
    pub fn duplicate_ids(&self) -> Vec<&NodeId> {
        let mut seen = HashSet::new();
        let mut duplicates = Vec::new();
        for id in self.ids() {
            if !seen.insert(id) && !duplicates.contains(&id) {
                duplicates.push(id);
            }
        }
        duplicates
    }
}

impl Serialize for Tree {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.root.serialize(serializer)
    }
}
