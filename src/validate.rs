//! Structural validation of task graphs
//!
//! Certifies a graph before plan generation. Checks are independent and
//! accumulate into a single result; only an empty graph short-circuits.
//! Errors make the graph invalid, warnings are advisory. The validator
//! never mutates the graph.
//!
//! Issue codes are a public vocabulary: adding codes is backward
//! compatible, renaming is not.

use std::collections::{HashMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::ir::{NodeKind, TaskGraph};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// A single validation finding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    pub severity: Severity,
}

/// Aggregated validation outcome. `valid` is true iff no errors were
/// recorded; warnings never affect validity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidationResult {
    pub fn new() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    fn add_error(&mut self, code: &str, message: String, node_id: Option<&str>) {
        self.errors.push(ValidationIssue {
            code: code.to_string(),
            message,
            node_id: node_id.map(str::to_string),
            severity: Severity::Error,
        });
        self.valid = false;
    }

    fn add_warning(&mut self, code: &str, message: String, node_id: Option<&str>) {
        self.warnings.push(ValidationIssue {
            code: code.to_string(),
            message,
            node_id: node_id.map(str::to_string),
            severity: Severity::Warning,
        });
    }
}

/// Validate a task graph and return all findings.
pub fn validate(graph: &TaskGraph) -> ValidationResult {
    let mut result = ValidationResult::new();

    check_empty_graph(graph, &mut result);
    if !result.valid {
        return result;
    }

    check_start_nodes(graph, &mut result);
    check_end_nodes(graph, &mut result);
    check_edge_references(graph, &mut result);
    check_decision_nodes(graph, &mut result);
    check_orphan_nodes(graph, &mut result);
    check_connectivity(graph, &mut result);
    check_cycles(graph, &mut result);
    check_node_names(graph, &mut result);

    result
}

fn check_empty_graph(graph: &TaskGraph, result: &mut ValidationResult) {
    if graph.nodes().is_empty() {
        result.add_error("EMPTY_GRAPH", "The flowchart contains no nodes".to_string(), None);
    }
}

fn check_start_nodes(graph: &TaskGraph, result: &mut ValidationResult) {
    let start_nodes: Vec<_> = graph.nodes().iter().filter(|n| n.is_start()).collect();

    match start_nodes.len() {
        0 => {
            let with_incoming: HashSet<&str> =
                graph.edges().iter().map(|e| e.target_id.as_str()).collect();
            let implicit = graph
                .nodes()
                .iter()
                .find(|n| !with_incoming.contains(n.id.as_str()));

            match implicit {
                Some(node) => result.add_warning(
                    "NO_EXPLICIT_START",
                    format!(
                        "No explicit start node found. Node '{}' has no incoming edges \
                         and will be used as the start node.",
                        node.name
                    ),
                    Some(&node.id),
                ),
                None => result.add_error(
                    "NO_START_NODE",
                    "The flowchart must have a start node".to_string(),
                    None,
                ),
            }
        }
        1 => {}
        _ => {
            let names: Vec<String> = start_nodes
                .iter()
                .map(|n| format!("'{}' ({})", n.name, n.id))
                .collect();
            result.add_error(
                "MULTIPLE_START_NODES",
                format!(
                    "The flowchart has multiple start nodes: {}. Only one is allowed.",
                    names.join(", ")
                ),
                None,
            );
        }
    }
}

fn check_end_nodes(graph: &TaskGraph, result: &mut ValidationResult) {
    if graph.nodes().iter().any(|n| n.is_end()) {
        return;
    }

    let with_outgoing: HashSet<&str> =
        graph.edges().iter().map(|e| e.source_id.as_str()).collect();
    let implicit = graph
        .nodes()
        .iter()
        .find(|n| !with_outgoing.contains(n.id.as_str()) && !n.is_start());

    match implicit {
        Some(node) => result.add_warning(
            "NO_EXPLICIT_END",
            format!(
                "No explicit end node found. Node '{}' has no outgoing edges \
                 and will be used as an end node.",
                node.name
            ),
            Some(&node.id),
        ),
        None => result.add_error(
            "NO_END_NODE",
            "The flowchart must have at least one end node".to_string(),
            None,
        ),
    }
}

fn check_edge_references(graph: &TaskGraph, result: &mut ValidationResult) {
    for edge in graph.edges() {
        if graph.get_node(&edge.source_id).is_none() {
            result.add_error(
                "INVALID_EDGE_SOURCE",
                format!("Edge references non-existent source node: {}", edge.source_id),
                None,
            );
        }
        if graph.get_node(&edge.target_id).is_none() {
            result.add_error(
                "INVALID_EDGE_TARGET",
                format!("Edge references non-existent target node: {}", edge.target_id),
                None,
            );
        }
    }
}

fn check_decision_nodes(graph: &TaskGraph, result: &mut ValidationResult) {
    for node in graph.nodes().iter().filter(|n| n.is_decision()) {
        let outgoing = graph.outgoing_edges(&node.id);

        if outgoing.len() < 2 {
            result.add_error(
                "DECISION_INSUFFICIENT_BRANCHES",
                format!(
                    "Decision node '{}' ({}) must have at least 2 outgoing edges, but has {}",
                    node.name,
                    node.id,
                    outgoing.len()
                ),
                Some(&node.id),
            );
        } else if outgoing.len() == 2 && outgoing.iter().all(|e| e.condition.is_none()) {
            result.add_warning(
                "DECISION_NO_CONDITIONS",
                format!(
                    "Decision node '{}' ({}) has no conditions on its edges. Consider \
                     adding labels like 'Yes'/'No' or 'Validated'/'Rejected'.",
                    node.name, node.id
                ),
                Some(&node.id),
            );
        }
    }
}

fn check_orphan_nodes(graph: &TaskGraph, result: &mut ValidationResult) {
    let mut touched: HashSet<&str> = HashSet::new();
    for edge in graph.edges() {
        touched.insert(edge.source_id.as_str());
        touched.insert(edge.target_id.as_str());
    }

    for node in graph.nodes() {
        if touched.contains(node.id.as_str()) {
            continue;
        }

        match node.kind {
            NodeKind::Start => result.add_error(
                "START_NO_OUTGOING",
                format!("Start node '{}' ({}) has no outgoing edges", node.name, node.id),
                Some(&node.id),
            ),
            NodeKind::End => result.add_error(
                "END_NO_INCOMING",
                format!("End node '{}' ({}) has no incoming edges", node.name, node.id),
                Some(&node.id),
            ),
            _ => result.add_error(
                "ORPHAN_NODE",
                format!(
                    "Node '{}' ({}) is not connected to any other node",
                    node.name, node.id
                ),
                Some(&node.id),
            ),
        }
    }
}

fn check_connectivity(graph: &TaskGraph, result: &mut ValidationResult) {
    // Root at the explicit start, or the node the start check would adopt
    let root = graph.start_node().or_else(|| {
        let with_incoming: HashSet<&str> =
            graph.edges().iter().map(|e| e.target_id.as_str()).collect();
        graph
            .nodes()
            .iter()
            .find(|n| !with_incoming.contains(n.id.as_str()))
    });
    let Some(root) = root else {
        // Already reported by the start-node check
        return;
    };

    let mut visited: HashSet<&str> = HashSet::new();
    let mut queue: VecDeque<&str> = VecDeque::new();
    queue.push_back(root.id.as_str());

    while let Some(current) = queue.pop_front() {
        if !visited.insert(current) {
            continue;
        }
        for successor in graph.successors(current) {
            if !visited.contains(successor.id.as_str()) {
                queue.push_back(successor.id.as_str());
            }
        }
    }

    let unreachable: Vec<_> = graph
        .nodes()
        .iter()
        .filter(|n| !visited.contains(n.id.as_str()))
        .collect();
    if unreachable.is_empty() {
        return;
    }

    let mut names = unreachable
        .iter()
        .take(3)
        .map(|n| format!("'{}'", n.name))
        .collect::<Vec<_>>()
        .join(", ");
    if unreachable.len() > 3 {
        names.push_str(&format!(" and {} more", unreachable.len() - 3));
    }

    result.add_warning(
        "UNREACHABLE_NODES",
        format!("Some nodes are not reachable from the start node: {names}"),
        None,
    );
}

const WHITE: u8 = 0;
const GRAY: u8 = 1;
const BLACK: u8 = 2;

fn check_cycles(graph: &TaskGraph, result: &mut ValidationResult) {
    let mut colors: HashMap<&str, u8> =
        graph.nodes().iter().map(|n| (n.id.as_str(), WHITE)).collect();
    let mut parent: HashMap<&str, &str> = HashMap::new();

    for node in graph.nodes() {
        if colors[node.id.as_str()] != WHITE {
            continue;
        }
        let Some(cycle) = find_cycle(graph, &node.id, &mut colors, &mut parent) else {
            continue;
        };

        let has_decision = cycle
            .iter()
            .filter_map(|id| graph.get_node(id))
            .any(|n| n.is_decision());
        let path = cycle.join(" -> ");

        if has_decision {
            result.add_warning(
                "DECISION_LOOP",
                format!(
                    "Found a loop through decision node. This is valid for \
                     retry/review workflows. Cycle: {path}"
                ),
                None,
            );
        } else {
            result.add_error(
                "INVALID_CYCLE",
                format!(
                    "Found a cycle that doesn't go through a decision node: {path}. \
                     Cycles are only allowed for decision-based loops."
                ),
                None,
            );
        }
    }
}

/// DFS 3-color traversal. Returns the reconstructed cycle path on the
/// first back edge found in this component.
fn find_cycle<'a>(
    graph: &'a TaskGraph,
    node_id: &'a str,
    colors: &mut HashMap<&'a str, u8>,
    parent: &mut HashMap<&'a str, &'a str>,
) -> Option<Vec<String>> {
    colors.insert(node_id, GRAY);

    for successor in graph.successors(node_id) {
        let succ_id = successor.id.as_str();
        match colors.get(succ_id).copied() {
            Some(GRAY) => {
                // Back edge: walk parents from here back to the successor
                let mut cycle = vec![succ_id.to_string()];
                let mut current = node_id;
                while current != succ_id {
                    cycle.push(current.to_string());
                    match parent.get(current) {
                        Some(&p) => current = p,
                        None => break,
                    }
                }
                cycle.push(succ_id.to_string());
                cycle.reverse();
                return Some(cycle);
            }
            Some(WHITE) => {
                parent.insert(succ_id, node_id);
                if let Some(cycle) = find_cycle(graph, succ_id, colors, parent) {
                    return Some(cycle);
                }
            }
            _ => {}
        }
    }

    colors.insert(node_id, BLACK);
    None
}

fn check_node_names(graph: &TaskGraph, result: &mut ValidationResult) {
    for node in graph.nodes() {
        if node.is_start() || node.is_end() {
            continue;
        }

        if node.name.trim().is_empty() {
            result.add_warning(
                "EMPTY_NODE_NAME",
                format!("Node {} has no name. Consider adding a description.", node.id),
                Some(&node.id),
            );
        } else if is_placeholder_name(&node.name) {
            result.add_warning(
                "GENERIC_NODE_NAME",
                format!(
                    "Node '{}' ({}) has a generic name. Consider adding a more \
                     descriptive label.",
                    node.name, node.id
                ),
                Some(&node.id),
            );
        }
    }
}

/// Matches the adapter placeholder pattern "Task <digits>".
fn is_placeholder_name(name: &str) -> bool {
    name.strip_prefix("Task ")
        .is_some_and(|rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{TaskEdge, TaskNode};

    fn node(id: &str, name: &str, kind: NodeKind) -> TaskNode {
        TaskNode::new(id, name, kind)
    }

    fn valid_graph() -> TaskGraph {
        let mut graph = TaskGraph::new();
        graph.add_node(node("start", "Start", NodeKind::Start));
        graph.add_node(node("work", "Implement feature", NodeKind::Process));
        graph.add_node(node("end", "End", NodeKind::End));
        graph.add_edge(TaskEdge::new("start", "work"));
        graph.add_edge(TaskEdge::new("work", "end"));
        graph
    }

    fn codes(issues: &[ValidationIssue]) -> Vec<&str> {
        issues.iter().map(|i| i.code.as_str()).collect()
    }

    #[test]
    fn test_valid_graph_passes_clean() {
        let result = validate(&valid_graph());
        assert!(result.valid);
        assert!(result.errors.is_empty());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_empty_graph_short_circuits() {
        let result = validate(&TaskGraph::new());
        assert!(!result.valid);
        assert_eq!(codes(&result.errors), vec!["EMPTY_GRAPH"]);
        // No follow-on errors like NO_START_NODE
        assert_eq!(result.errors.len(), 1);
    }

    #[test]
    fn test_missing_start_with_candidate_is_warning() {
        let mut graph = TaskGraph::new();
        graph.add_node(node("a", "First task", NodeKind::Process));
        graph.add_node(node("end", "End", NodeKind::End));
        graph.add_edge(TaskEdge::new("a", "end"));

        let result = validate(&graph);
        assert!(result.valid);
        assert!(codes(&result.warnings).contains(&"NO_EXPLICIT_START"));
        let warning = result
            .warnings
            .iter()
            .find(|w| w.code == "NO_EXPLICIT_START")
            .unwrap();
        assert_eq!(warning.node_id.as_deref(), Some("a"));
    }

    #[test]
    fn test_missing_start_without_candidate_is_error() {
        // Two-node cycle: every node has an incoming edge
        let mut graph = TaskGraph::new();
        graph.add_node(node("a", "A", NodeKind::Process));
        graph.add_node(node("b", "B", NodeKind::Process));
        graph.add_edge(TaskEdge::new("a", "b"));
        graph.add_edge(TaskEdge::new("b", "a"));

        let result = validate(&graph);
        assert!(!result.valid);
        assert!(codes(&result.errors).contains(&"NO_START_NODE"));
    }

    #[test]
    fn test_multiple_start_nodes_lists_offenders() {
        let mut graph = valid_graph();
        graph.add_node(node("start2", "Another start", NodeKind::Start));
        graph.add_edge(TaskEdge::new("start2", "work"));

        let result = validate(&graph);
        assert!(!result.valid);
        let error = result
            .errors
            .iter()
            .find(|e| e.code == "MULTIPLE_START_NODES")
            .unwrap();
        assert!(error.message.contains("'Start' (start)"));
        assert!(error.message.contains("'Another start' (start2)"));
    }

    #[test]
    fn test_missing_end_with_candidate_is_warning() {
        let mut graph = TaskGraph::new();
        graph.add_node(node("start", "Start", NodeKind::Start));
        graph.add_node(node("a", "Finish work", NodeKind::Process));
        graph.add_edge(TaskEdge::new("start", "a"));

        let result = validate(&graph);
        assert!(result.valid);
        assert!(codes(&result.warnings).contains(&"NO_EXPLICIT_END"));
    }

    #[test]
    fn test_dangling_edges_report_each_endpoint() {
        let mut graph = valid_graph();
        graph.add_edge(TaskEdge::new("ghost", "work"));
        graph.add_edge(TaskEdge::new("work", "phantom"));

        let result = validate(&graph);
        assert!(!result.valid);
        assert!(codes(&result.errors).contains(&"INVALID_EDGE_SOURCE"));
        assert!(codes(&result.errors).contains(&"INVALID_EDGE_TARGET"));
    }

    #[test]
    fn test_decision_with_one_branch_is_error() {
        let mut graph = valid_graph();
        graph.add_node(node("d", "Valid?", NodeKind::Decision));
        graph.add_edge(TaskEdge::new("work", "d"));
        graph.add_edge(TaskEdge::new("d", "end"));

        let result = validate(&graph);
        assert!(!result.valid);
        assert!(codes(&result.errors).contains(&"DECISION_INSUFFICIENT_BRANCHES"));
    }

    #[test]
    fn test_decision_with_two_unlabeled_branches_is_warning() {
        let mut graph = valid_graph();
        graph.add_node(node("d", "Valid?", NodeKind::Decision));
        graph.add_node(node("retry", "Rework item", NodeKind::Process));
        graph.add_edge(TaskEdge::new("work", "d"));
        graph.add_edge(TaskEdge::new("d", "end"));
        graph.add_edge(TaskEdge::new("d", "retry"));
        graph.add_edge(TaskEdge::new("retry", "end"));

        let result = validate(&graph);
        assert!(result.valid);
        assert!(codes(&result.warnings).contains(&"DECISION_NO_CONDITIONS"));
    }

    #[test]
    fn test_decision_with_conditions_has_no_condition_warning() {
        let mut graph = valid_graph();
        graph.add_node(node("d", "Valid?", NodeKind::Decision));
        graph.add_node(node("retry", "Rework item", NodeKind::Process));
        graph.add_edge(TaskEdge::new("work", "d"));
        graph.add_edge(TaskEdge {
            source_id: "d".to_string(),
            target_id: "end".to_string(),
            condition: Some("validated".to_string()),
            label: Some("Yes".to_string()),
        });
        graph.add_edge(TaskEdge {
            source_id: "d".to_string(),
            target_id: "retry".to_string(),
            condition: Some("rejected".to_string()),
            label: Some("No".to_string()),
        });
        graph.add_edge(TaskEdge::new("retry", "end"));

        let result = validate(&graph);
        assert!(result.valid);
        assert!(!codes(&result.warnings).contains(&"DECISION_NO_CONDITIONS"));
    }

    #[test]
    fn test_orphan_node_variants() {
        let mut graph = valid_graph();
        graph.add_node(node("island", "Stranded task", NodeKind::Process));
        graph.add_node(node("start2", "Lone start", NodeKind::Start));
        graph.add_node(node("end2", "Lone end", NodeKind::End));

        let result = validate(&graph);
        let error_codes = codes(&result.errors);
        assert!(error_codes.contains(&"ORPHAN_NODE"));
        assert!(error_codes.contains(&"START_NO_OUTGOING"));
        assert!(error_codes.contains(&"END_NO_INCOMING"));
    }

    #[test]
    fn test_unreachable_nodes_warn_with_truncated_names() {
        let mut graph = valid_graph();
        for i in 0..5 {
            let id = format!("u{i}");
            graph.add_node(node(&id, &format!("Unreachable {i}"), NodeKind::Process));
        }
        // Chain the unreachable nodes so none is an orphan
        for i in 0..4 {
            graph.add_edge(TaskEdge::new(format!("u{i}"), format!("u{}", i + 1)));
        }
        graph.add_edge(TaskEdge::new("u4", "u0"));

        let result = validate(&graph);
        let warning = result
            .warnings
            .iter()
            .find(|w| w.code == "UNREACHABLE_NODES")
            .unwrap();
        assert!(warning.message.contains("and 2 more"));
    }

    #[test]
    fn test_plain_cycle_is_error_with_path() {
        let mut graph = TaskGraph::new();
        graph.add_node(node("start", "Start", NodeKind::Start));
        graph.add_node(node("a", "Step one", NodeKind::Process));
        graph.add_node(node("b", "Step two", NodeKind::Process));
        graph.add_node(node("end", "End", NodeKind::End));
        graph.add_edge(TaskEdge::new("start", "a"));
        graph.add_edge(TaskEdge::new("a", "b"));
        graph.add_edge(TaskEdge::new("b", "a"));
        graph.add_edge(TaskEdge::new("b", "end"));

        let result = validate(&graph);
        assert!(!result.valid);
        let error = result
            .errors
            .iter()
            .find(|e| e.code == "INVALID_CYCLE")
            .unwrap();
        assert!(error.message.contains("a -> b -> a"));
    }

    #[test]
    fn test_decision_loop_is_tolerated_as_warning() {
        let mut graph = TaskGraph::new();
        graph.add_node(node("start", "Start", NodeKind::Start));
        graph.add_node(node("a", "Draft document", NodeKind::Process));
        graph.add_node(node("d", "Approved?", NodeKind::Decision));
        graph.add_node(node("end", "End", NodeKind::End));
        graph.add_edge(TaskEdge::new("start", "a"));
        graph.add_edge(TaskEdge::new("a", "d"));
        graph.add_edge(TaskEdge {
            source_id: "d".to_string(),
            target_id: "end".to_string(),
            condition: Some("validated".to_string()),
            label: None,
        });
        graph.add_edge(TaskEdge {
            source_id: "d".to_string(),
            target_id: "a".to_string(),
            condition: Some("rejected".to_string()),
            label: None,
        });

        let result = validate(&graph);
        assert!(result.valid);
        assert!(codes(&result.warnings).contains(&"DECISION_LOOP"));
    }

    #[test]
    fn test_name_warnings() {
        let mut graph = valid_graph();
        graph.add_node(node("n1", "   ", NodeKind::Process));
        graph.add_node(node("n2", "Task 12", NodeKind::Process));
        graph.add_edge(TaskEdge::new("work", "n1"));
        graph.add_edge(TaskEdge::new("work", "n2"));
        graph.add_edge(TaskEdge::new("n1", "end"));
        graph.add_edge(TaskEdge::new("n2", "end"));

        let result = validate(&graph);
        let warning_codes = codes(&result.warnings);
        assert!(warning_codes.contains(&"EMPTY_NODE_NAME"));
        assert!(warning_codes.contains(&"GENERIC_NODE_NAME"));
    }

    #[test]
    fn test_placeholder_name_matching_is_exact() {
        assert!(is_placeholder_name("Task 3"));
        assert!(is_placeholder_name("Task 123"));
        assert!(!is_placeholder_name("Task "));
        assert!(!is_placeholder_name("Task 3b"));
        assert!(!is_placeholder_name("Tasks 3"));
    }

    #[test]
    fn test_start_end_names_are_exempt_from_name_checks() {
        let mut graph = TaskGraph::new();
        graph.add_node(node("start", "", NodeKind::Start));
        graph.add_node(node("work", "Do the work", NodeKind::Process));
        graph.add_node(node("end", "", NodeKind::End));
        graph.add_edge(TaskEdge::new("start", "work"));
        graph.add_edge(TaskEdge::new("work", "end"));

        let result = validate(&graph);
        assert!(!codes(&result.warnings).contains(&"EMPTY_NODE_NAME"));
    }
}
