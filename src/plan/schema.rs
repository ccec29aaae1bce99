//! Serialized forms of the generated plan and its derived documents

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The phased implementation plan emitted for a downstream build system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImplementationPlan {
    pub feature: String,
    pub workflow_type: String,
    pub services_involved: Vec<String>,
    pub phases: Vec<Phase>,
    pub final_acceptance: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub status: String,
    #[serde(rename = "planStatus")]
    pub plan_status: String,
}

/// One phase: the subtasks of a single parallel-group level, with explicit
/// dependencies on earlier phases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Phase {
    pub phase: u32,
    pub name: String,
    #[serde(rename = "type")]
    pub phase_type: PhaseType,
    pub subtasks: Vec<Subtask>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<u32>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub parallel_safe: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseType {
    Investigation,
    Setup,
    Integration,
    Cleanup,
    Implementation,
}

/// A unit of work derived from one flowchart node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subtask {
    pub id: String,
    pub description: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub patterns_from: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files_to_create: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification: Option<Verification>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
}

/// How a subtask is verified once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Verification {
    Command {
        run: String,
        expected: String,
    },
    Api {
        method: String,
        url: String,
        expect_status: u16,
    },
    Component {
        scenario: String,
    },
    Manual {
        scenario: String,
    },
}

/// Flat requirements summary derived from the same graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Requirements {
    pub task_description: String,
    pub workflow_type: String,
    pub services_involved: Vec<String>,
    pub user_requirements: Vec<String>,
    pub acceptance_criteria: Vec<String>,
    pub constraints: Vec<String>,
    pub additional_context: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_omits_empty_dependency_fields() {
        let phase = Phase {
            phase: 1,
            name: "Setup".to_string(),
            phase_type: PhaseType::Setup,
            subtasks: vec![],
            depends_on: vec![],
            parallel_safe: false,
        };

        let json = serde_json::to_value(&phase).unwrap();
        assert!(json.get("depends_on").is_none());
        assert!(json.get("parallel_safe").is_none());
        assert_eq!(json["type"], "setup");
    }

    #[test]
    fn test_phase_keeps_populated_dependency_fields() {
        let phase = Phase {
            phase: 2,
            name: "Build".to_string(),
            phase_type: PhaseType::Implementation,
            subtasks: vec![],
            depends_on: vec![1],
            parallel_safe: true,
        };

        let json = serde_json::to_value(&phase).unwrap();
        assert_eq!(json["depends_on"], serde_json::json!([1]));
        assert_eq!(json["parallel_safe"], true);
    }

    #[test]
    fn test_verification_tags_by_type() {
        let verification = Verification::Command {
            run: "npm test".to_string(),
            expected: "All tests pass".to_string(),
        };
        let json = serde_json::to_value(&verification).unwrap();
        assert_eq!(json["type"], "command");
        assert_eq!(json["run"], "npm test");

        let manual = Verification::Manual {
            scenario: "Human review required: Check output".to_string(),
        };
        let json = serde_json::to_value(&manual).unwrap();
        assert_eq!(json["type"], "manual");
    }

    #[test]
    fn test_plan_status_field_uses_camel_case_key() {
        let plan = ImplementationPlan {
            feature: "Demo".to_string(),
            workflow_type: "feature".to_string(),
            services_involved: vec![],
            phases: vec![],
            final_acceptance: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
            status: "backlog".to_string(),
            plan_status: "pending".to_string(),
        };

        let json = serde_json::to_value(&plan).unwrap();
        assert_eq!(json["planStatus"], "pending");
        assert!(json.get("plan_status").is_none());
    }
}
