//! Plan generation from task graphs
//!
//! Turns a validated (or force-accepted) task graph into a phased
//! implementation plan plus two derived documents: a Markdown spec and a
//! requirements summary. Phases come from the graph's parallel-group
//! levels; start/end nodes never become subtasks. The generator does not
//! re-validate; whether to proceed past validation errors is the caller's
//! decision.

mod schema;

pub use schema::{
    ImplementationPlan, Phase, PhaseType, Requirements, Subtask, Verification,
};

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use regex::Regex;

use crate::ir::{NodeKind, TaskGraph, TaskNode};

/// Ordered keyword families for phase classification; the first family with
/// a match anywhere in the phase wins. Extend these lists rather than the
/// call sites.
const PHASE_KEYWORDS: &[(PhaseType, &[&str])] = &[
    (
        PhaseType::Investigation,
        &["analyze", "investigate", "research", "review", "assess"],
    ),
    (
        PhaseType::Setup,
        &["setup", "configure", "install", "initialize", "create"],
    ),
    (
        PhaseType::Integration,
        &["integrate", "connect", "wire", "combine", "merge"],
    ),
    (
        PhaseType::Cleanup,
        &["cleanup", "remove", "delete", "deprecate", "finalize"],
    ),
];

/// Keyword families for service inference, evaluated top to bottom.
const SERVICE_KEYWORDS: &[(&str, &[&str])] = &[
    ("backend", &["backend", "api", "server", "database", "model"]),
    ("frontend", &["frontend", "ui", "component", "page", "react"]),
    ("worker", &["worker", "queue", "job", "background"]),
];

/// Paths of the documents written by [`PlanGenerator::save_to_spec_dir`].
#[derive(Debug, Clone)]
pub struct GeneratedFiles {
    pub plan: PathBuf,
    pub spec: PathBuf,
    pub requirements: PathBuf,
}

/// Generates implementation plans from task graphs.
///
/// Stateless: the phase counter lives inside each `generate` call, so one
/// generator can serve any number of graphs.
#[derive(Debug, Default)]
pub struct PlanGenerator;

impl PlanGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Generate a phased implementation plan.
    pub fn generate(
        &self,
        graph: &TaskGraph,
        feature_name: Option<&str>,
        workflow_type: &str,
    ) -> ImplementationPlan {
        let feature = resolve_feature_name(graph, feature_name);
        let groups = graph.parallel_groups();

        let mut phases = Vec::new();
        let mut phase_map: HashMap<&str, u32> = HashMap::new();
        let mut phase_counter: u32 = 0;

        for group in &groups {
            let members: Vec<&TaskNode> = group
                .iter()
                .copied()
                .filter(|n| !n.is_start() && !n.is_end())
                .collect();
            if members.is_empty() {
                continue;
            }

            phase_counter += 1;
            for node in &members {
                phase_map.insert(node.id.as_str(), phase_counter);
            }

            let depends_on = phase_dependencies(&members, graph, &phase_map);
            let parallel_safe = members.len() > 1 && is_parallel_safe(&members, graph);

            phases.push(Phase {
                phase: phase_counter,
                name: phase_name(&members, phase_counter),
                phase_type: classify_phase(&members),
                subtasks: members.iter().map(|n| node_to_subtask(n)).collect(),
                depends_on,
                parallel_safe,
            });
        }

        let now = Utc::now();
        ImplementationPlan {
            feature,
            workflow_type: workflow_type.to_string(),
            services_involved: collect_services(graph),
            phases,
            final_acceptance: acceptance_criteria(graph),
            created_at: now,
            updated_at: now,
            status: "backlog".to_string(),
            plan_status: "pending".to_string(),
        }
    }

    /// Generate the human-readable spec document.
    pub fn generate_spec(
        &self,
        graph: &TaskGraph,
        feature_name: Option<&str>,
        workflow_type: &str,
    ) -> String {
        let feature = resolve_feature_name(graph, feature_name);

        let mut lines = vec![
            format!("# {feature}"),
            String::new(),
            "## Overview".to_string(),
            String::new(),
            "This specification was generated from a flowchart import.".to_string(),
            String::new(),
            "## Workflow Type".to_string(),
            String::new(),
            workflow_type.to_string(),
            String::new(),
            "## Task Scope".to_string(),
            String::new(),
        ];

        for node in graph.nodes() {
            if !node.is_start() && !node.is_end() {
                lines.push(format!("- {}", node.name));
            }
        }

        lines.extend([String::new(), "## Success Criteria".to_string(), String::new()]);
        for criterion in acceptance_criteria(graph) {
            lines.push(format!("- {criterion}"));
        }

        let mut files_to_modify: BTreeSet<&str> = BTreeSet::new();
        let mut files_to_create: BTreeSet<&str> = BTreeSet::new();
        for node in graph.nodes() {
            files_to_modify.extend(node.inputs.iter().map(String::as_str));
            files_to_create.extend(node.outputs.iter().map(String::as_str));
        }

        lines.extend([String::new(), "## Files to Modify".to_string(), String::new()]);
        if files_to_modify.is_empty() {
            lines.push("- TBD based on implementation".to_string());
        } else {
            lines.extend(files_to_modify.iter().map(|f| format!("- `{f}`")));
        }

        lines.extend([String::new(), "## Files to Create".to_string(), String::new()]);
        if files_to_create.is_empty() {
            lines.push("- TBD based on implementation".to_string());
        } else {
            lines.extend(files_to_create.iter().map(|f| format!("- `{f}`")));
        }

        lines.extend([
            String::new(),
            "## QA Acceptance Criteria".to_string(),
            String::new(),
            "- All tasks complete without errors".to_string(),
            "- Code follows project conventions".to_string(),
            "- Tests pass (if applicable)".to_string(),
            String::new(),
        ]);

        lines.join("\n")
    }

    /// Generate the flat requirements summary.
    pub fn generate_requirements(
        &self,
        graph: &TaskGraph,
        feature_name: Option<&str>,
        workflow_type: &str,
    ) -> Requirements {
        let feature = resolve_feature_name(graph, feature_name);

        let user_requirements = graph
            .nodes()
            .iter()
            .filter(|n| !n.is_start() && !n.is_end())
            .map(|n| n.name.clone())
            .collect();

        let source = graph
            .metadata
            .get("name")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown");

        Requirements {
            task_description: feature,
            workflow_type: workflow_type.to_string(),
            services_involved: collect_services(graph),
            user_requirements,
            acceptance_criteria: acceptance_criteria(graph),
            constraints: Vec::new(),
            additional_context: format!("Generated from flowchart: {source}"),
            created_at: Utc::now(),
        }
    }

    /// Write the plan and both derived documents into `spec_dir`, creating
    /// it if needed.
    pub fn save_to_spec_dir(
        &self,
        graph: &TaskGraph,
        spec_dir: &Path,
        feature_name: Option<&str>,
        workflow_type: &str,
    ) -> Result<GeneratedFiles> {
        fs::create_dir_all(spec_dir)
            .with_context(|| format!("Failed to create spec directory: {}", spec_dir.display()))?;

        let plan = self.generate(graph, feature_name, workflow_type);
        let plan_path = spec_dir.join("implementation_plan.json");
        fs::write(&plan_path, serde_json::to_string_pretty(&plan)?)
            .with_context(|| format!("Failed to write {}", plan_path.display()))?;

        let spec_path = spec_dir.join("spec.md");
        fs::write(&spec_path, self.generate_spec(graph, feature_name, workflow_type))
            .with_context(|| format!("Failed to write {}", spec_path.display()))?;

        let requirements = self.generate_requirements(graph, feature_name, workflow_type);
        let requirements_path = spec_dir.join("requirements.json");
        fs::write(&requirements_path, serde_json::to_string_pretty(&requirements)?)
            .with_context(|| format!("Failed to write {}", requirements_path.display()))?;

        Ok(GeneratedFiles {
            plan: plan_path,
            spec: spec_path,
            requirements: requirements_path,
        })
    }
}

fn resolve_feature_name(graph: &TaskGraph, feature_name: Option<&str>) -> String {
    feature_name
        .map(str::to_string)
        .or_else(|| {
            graph
                .metadata
                .get("name")
                .and_then(|v| v.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| "Flowchart Import".to_string())
}

/// Earlier phases this phase depends on: any predecessor of a member that
/// was mapped to a different phase. Start nodes never contribute.
fn phase_dependencies(
    members: &[&TaskNode],
    graph: &TaskGraph,
    phase_map: &HashMap<&str, u32>,
) -> Vec<u32> {
    let mut depends_on: BTreeSet<u32> = BTreeSet::new();

    for node in members {
        let own_phase = phase_map.get(node.id.as_str()).copied();
        for predecessor in graph.predecessors(&node.id) {
            if predecessor.kind == NodeKind::Start {
                continue;
            }
            if let Some(&pred_phase) = phase_map.get(predecessor.id.as_str()) {
                if Some(pred_phase) != own_phase {
                    depends_on.insert(pred_phase);
                }
            }
        }
    }

    depends_on.into_iter().collect()
}

fn classify_phase(members: &[&TaskNode]) -> PhaseType {
    for (phase_type, keywords) in PHASE_KEYWORDS {
        let matched = members.iter().any(|node| {
            let name = node.name.to_lowercase();
            keywords.iter().any(|kw| name.contains(kw))
        });
        if matched {
            return *phase_type;
        }
    }
    PhaseType::Implementation
}

/// True when no member depends on another member of the same group.
fn is_parallel_safe(members: &[&TaskNode], graph: &TaskGraph) -> bool {
    let member_ids: BTreeSet<&str> = members.iter().map(|n| n.id.as_str()).collect();

    for node in members {
        for predecessor in graph.predecessors(&node.id) {
            if member_ids.contains(predecessor.id.as_str()) {
                return false;
            }
        }
    }
    true
}

fn node_to_subtask(node: &TaskNode) -> Subtask {
    Subtask {
        id: sanitize_id(&node.id),
        description: node.name.clone(),
        status: "pending".to_string(),
        patterns_from: node.inputs.clone(),
        files_to_create: node.outputs.clone(),
        verification: infer_verification(node),
        service: infer_service(node),
    }
}

/// Sanitize a raw node id into a subtask id: anything outside
/// `[a-zA-Z0-9_-]` becomes a hyphen, runs collapse, edges trim, lower-case.
fn sanitize_id(node_id: &str) -> String {
    let invalid = Regex::new(r"[^a-zA-Z0-9_-]").expect("static pattern compiles");
    let runs = Regex::new(r"-+").expect("static pattern compiles");

    let replaced = invalid.replace_all(node_id, "-");
    let collapsed = runs.replace_all(&replaced, "-");
    collapsed.trim_matches('-').to_lowercase()
}

fn infer_verification(node: &TaskNode) -> Option<Verification> {
    // Human review always requires manual sign-off, regardless of keywords
    if node.is_human() {
        return Some(Verification::Manual {
            scenario: format!("Human review required: {}", node.name),
        });
    }

    let name = node.name.to_lowercase();

    if ["test", "verify", "validate"].iter().any(|kw| name.contains(kw)) {
        return Some(Verification::Command {
            run: "npm test".to_string(),
            expected: "All tests pass".to_string(),
        });
    }
    if ["api", "endpoint", "route"].iter().any(|kw| name.contains(kw)) {
        return Some(Verification::Api {
            method: "GET".to_string(),
            url: "/api/health".to_string(),
            expect_status: 200,
        });
    }
    if ["ui", "component", "page", "render"].iter().any(|kw| name.contains(kw)) {
        return Some(Verification::Component {
            scenario: format!("Component renders: {}", node.name),
        });
    }

    None
}

fn infer_service(node: &TaskNode) -> Option<String> {
    // An explicit attribute wins over name heuristics
    if let Some(service) = node.attributes.get("service").and_then(|v| v.as_str()) {
        return Some(service.to_string());
    }

    let name = node.name.to_lowercase();
    for (service, keywords) in SERVICE_KEYWORDS {
        if keywords.iter().any(|kw| name.contains(kw)) {
            return Some((*service).to_string());
        }
    }
    None
}

fn phase_name(members: &[&TaskNode], phase_num: u32) -> String {
    if members.len() == 1 {
        return members[0].name.clone();
    }

    let services: BTreeSet<String> = members.iter().filter_map(|n| infer_service(n)).collect();
    if services.len() == 1 {
        if let Some(service) = services.iter().next() {
            return format!("{} Implementation", title_case(service));
        }
    }

    if members.iter().any(|n| n.is_human()) {
        return "Review & Validation".to_string();
    }

    format!("Phase {phase_num}")
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Distinct inferred services across the whole graph, sorted.
fn collect_services(graph: &TaskGraph) -> Vec<String> {
    let services: BTreeSet<String> = graph.nodes().iter().filter_map(infer_service).collect();
    services.into_iter().collect()
}

/// Acceptance criteria from each end node's direct predecessors; generic
/// fallbacks when no end node yields any.
fn acceptance_criteria(graph: &TaskGraph) -> Vec<String> {
    let mut criteria = Vec::new();

    for end_node in graph.end_nodes() {
        for predecessor in graph.predecessors(&end_node.id) {
            match predecessor.kind {
                NodeKind::Process => criteria.push(format!("Completed: {}", predecessor.name)),
                NodeKind::HumanReview => {
                    criteria.push(format!("Human approved: {}", predecessor.name))
                }
                _ => {}
            }
        }
    }

    if criteria.is_empty() {
        criteria = vec![
            "All tasks completed successfully".to_string(),
            "No critical errors or warnings".to_string(),
        ];
    }

    criteria
}
