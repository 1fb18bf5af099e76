//! Run lifecycle events

use serde::{Deserialize, Serialize};

use crate::tree::NodeId;

/// State of a suite during a run; suites carry no pass/fail of their own
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuiteState {
    Running,
    Completed,
}

/// State of a test during a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestState {
    Running,
    Passed,
    Failed,
    Errored,
}

impl TestState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, TestState::Running)
    }
}

/// A state change of one node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunEvent {
    Suite {
        id: NodeId,
        state: SuiteState,
    },
    Test {
        id: NodeId,
        state: TestState,
        /// Captured output, or a diagnostic for `errored`
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
}

impl RunEvent {
    pub fn suite(id: &NodeId, state: SuiteState) -> Self {
        Self::Suite {
            id: id.clone(),
            state,
        }
    }

    pub fn test(id: &NodeId, state: TestState, message: Option<String>) -> Self {
        Self::Test {
            id: id.clone(),
            state,
            message,
        }
    }

    pub fn id(&self) -> &NodeId {
        match self {
            RunEvent::Suite { id, .. } | RunEvent::Test { id, .. } => id,
        }
    }
}

/// Terminal test counts of one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub passed: usize,
    pub failed: usize,
    pub errored: usize,
}

impl RunSummary {
    pub fn record(&mut self, state: TestState) {
        match state {
            TestState::Passed => self.passed += 1,
            TestState::Failed => self.failed += 1,
            TestState::Errored => self.errored += 1,
            TestState::Running => {}
        }
    }

    pub fn total(&self) -> usize {
        self.passed + self.failed + self.errored
    }

    /// True when every executed test passed
    pub fn success(&self) -> bool {
        self.failed == 0 && self.errored == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization() {
        let id = NodeId::new("Login", "features/a.feature:1");
        let json = serde_json::to_value(RunEvent::suite(&id, SuiteState::Running)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "suite", "id": "Login:features/a.feature:1", "state": "running"})
        );

        let json = serde_json::to_value(RunEvent::test(&id, TestState::Errored, Some("boom".into())))
            .unwrap();
        assert_eq!(json["type"], "test");
        assert_eq!(json["state"], "errored");
        assert_eq!(json["message"], "boom");

        let json = serde_json::to_value(RunEvent::test(&id, TestState::Running, None)).unwrap();
        assert!(json.get("message").is_none());
    }

    #[test]
    fn test_summary() {
        let mut summary = RunSummary::default();
        summary.record(TestState::Passed);
        summary.record(TestState::Running);
        assert!(summary.success());

        summary.record(TestState::Failed);
        assert_eq!(summary.total(), 2);
        assert!(!summary.success());
    }
}
