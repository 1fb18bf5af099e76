//! behave JSON description types
//!
//! Only the structural fields are read; steps, tags and results are ignored.

use serde::Deserialize;
use std::path::Path;

use crate::tree::{split_location, Node, NodeId, Suite, Test};

/// Keyword of a feature record
const FEATURE: &str = "Feature";

/// Element keywords that become runnable tests
const SCENARIO_KEYWORDS: &[&str] = &["Scenario", "Scenario Outline"];

/// One feature record of `behave --format json`
#[derive(Deserialize, Debug)]
pub struct FeatureRecord {
    pub keyword: String,
    pub name: String,
    pub location: String,
    #[serde(default)]
    pub elements: Vec<ElementRecord>,
}

/// A scenario-level element inside a feature
#[derive(Deserialize, Debug)]
pub struct ElementRecord {
    pub keyword: String,
    pub name: String,
    pub location: String,
}

/// Parse the dry-run output into feature records
///
/// Blank output means behave found no features.
pub fn parse_description(output: &str) -> serde_json::Result<Vec<FeatureRecord>> {
    if output.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(output)
}

/// Convert feature records into suites, skipping unknown keywords
pub fn build_suites(root: &Path, records: Vec<FeatureRecord>) -> Vec<Node> {
    records
        .into_iter()
        .filter_map(|record| {
            if record.keyword == FEATURE {
                Some(feature_to_suite(root, record))
            } else {
                tracing::warn!(
                    "Skipping unknown feature record '{}' ({}) at {}",
                    record.name,
                    record.keyword,
                    record.location
                );
                None
            }
        })
        .collect()
}

fn feature_to_suite(root: &Path, feature: FeatureRecord) -> Node {
    let (file, line) = split_location(&feature.location);

    let children = feature
        .elements
        .iter()
        .filter_map(|element| {
            if SCENARIO_KEYWORDS.contains(&element.keyword.as_str()) {
                Some(element_to_test(root, element))
            } else {
                tracing::debug!(
                    "Skipping {} '{}' in feature '{}'",
                    element.keyword,
                    element.name,
                    feature.name
                );
                None
            }
        })
        .collect();

    Node::Suite(Suite {
        id: NodeId::new(&feature.name, &feature.location),
        label: feature.name.clone(),
        file: Some(root.join(file)),
        line,
        children,
    })
}

fn element_to_test(root: &Path, element: &ElementRecord) -> Node {
    let (file, line) = split_location(&element.location);
    if line.is_none() {
        tracing::warn!(
            "Scenario '{}' has no usable line in '{}'; it cannot be run",
            element.name,
            element.location
        );
    }

    Node::Test(Test {
        id: NodeId::new(&element.name, &element.location),
        label: element.name.clone(),
        file: root.join(file),
        line,
    })
}
