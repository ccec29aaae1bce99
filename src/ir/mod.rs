//! Intermediate representation for flowchart task graphs
//!
//! The task graph is the contract between diagram adapters and the plan
//! generator: adapters produce it, the validator certifies it, and the
//! generator consumes it. Construction is append-only and performs no
//! validation; structurally broken graphs (dangling edges, missing start
//! nodes) are representable here and reported by the `validate` module.

mod traversal;

pub use traversal::GraphError;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Kind of a flowchart node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Start,
    End,
    Process,
    Decision,
    HumanReview,
}

impl NodeKind {
    /// Wire name of the kind, matching its serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Start => "start",
            NodeKind::End => "end",
            NodeKind::Process => "process",
            NodeKind::Decision => "decision",
            NodeKind::HumanReview => "human_review",
        }
    }
}

/// Who executes the task derived from a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Executor {
    #[default]
    Automated,
    Human,
}

/// A single unit of work or control point in the flowchart.
///
/// Ids are assigned by the adapter that produced the graph and are never
/// regenerated here. `attributes` is an open map for adapter metadata
/// (geometry, shape style, arbitrary tags); the core only reads the keys
/// it defines, such as the `y` position hint used for start/end inference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskNode {
    pub id: String,
    pub name: String,
    pub kind: NodeKind,
    #[serde(default)]
    pub executor: Executor,
    #[serde(default)]
    pub inputs: Vec<String>,
    #[serde(default)]
    pub outputs: Vec<String>,
    #[serde(default)]
    pub attributes: HashMap<String, Value>,
}

impl TaskNode {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            executor: Executor::Automated,
            inputs: Vec::new(),
            outputs: Vec::new(),
            attributes: HashMap::new(),
        }
    }

    pub fn is_start(&self) -> bool {
        self.kind == NodeKind::Start
    }

    pub fn is_end(&self) -> bool {
        self.kind == NodeKind::End
    }

    pub fn is_decision(&self) -> bool {
        self.kind == NodeKind::Decision
    }

    /// True when the task requires a person, either because the node is a
    /// human-review shape or because the executor was marked human.
    pub fn is_human(&self) -> bool {
        self.executor == Executor::Human || self.kind == NodeKind::HumanReview
    }
}

/// A directed edge between two nodes.
///
/// `condition` carries the normalized branch label for decision edges
/// ("validated"/"rejected"); `label` keeps the raw display text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskEdge {
    pub source_id: String,
    pub target_id: String,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
}

impl TaskEdge {
    pub fn new(source_id: impl Into<String>, target_id: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            target_id: target_id.into(),
            condition: None,
            label: None,
        }
    }
}

/// A complete task graph parsed from a flowchart.
///
/// Nodes keep insertion order; that order is not significant to any
/// algorithm, but it is the only ordering contract query results follow.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "RawGraph")]
pub struct TaskGraph {
    nodes: Vec<TaskNode>,
    edges: Vec<TaskEdge>,
    pub metadata: HashMap<String, Value>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

/// Exchange form of the graph, used to rebuild the id index on deserialize.
#[derive(Deserialize)]
struct RawGraph {
    #[serde(default)]
    nodes: Vec<TaskNode>,
    #[serde(default)]
    edges: Vec<TaskEdge>,
    #[serde(default)]
    metadata: HashMap<String, Value>,
}

impl From<RawGraph> for TaskGraph {
    fn from(raw: RawGraph) -> Self {
        let mut graph = TaskGraph::new();
        graph.metadata = raw.metadata;
        for node in raw.nodes {
            graph.add_node(node);
        }
        for edge in raw.edges {
            graph.add_edge(edge);
        }
        graph
    }
}

impl Default for TaskGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskGraph {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            metadata: HashMap::new(),
            index: HashMap::new(),
        }
    }

    /// Add a node to the graph.
    ///
    /// A duplicate id replaces the earlier node in place (last write wins),
    /// so the node list and the id index never disagree.
    pub fn add_node(&mut self, node: TaskNode) {
        match self.index.get(&node.id) {
            Some(&pos) => self.nodes[pos] = node,
            None => {
                self.index.insert(node.id.clone(), self.nodes.len());
                self.nodes.push(node);
            }
        }
    }

    /// Add an edge to the graph. Endpoints are not checked here; dangling
    /// edges are flagged by validation.
    pub fn add_edge(&mut self, edge: TaskEdge) {
        self.edges.push(edge);
    }

    pub fn nodes(&self) -> &[TaskNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[TaskEdge] {
        &self.edges
    }

    pub fn get_node(&self, node_id: &str) -> Option<&TaskNode> {
        self.index.get(node_id).map(|&pos| &self.nodes[pos])
    }

    pub fn get_node_mut(&mut self, node_id: &str) -> Option<&mut TaskNode> {
        let pos = *self.index.get(node_id)?;
        Some(&mut self.nodes[pos])
    }

    /// First explicit start node, in insertion order.
    pub fn start_node(&self) -> Option<&TaskNode> {
        self.nodes.iter().find(|n| n.is_start())
    }

    pub fn end_nodes(&self) -> Vec<&TaskNode> {
        self.nodes.iter().filter(|n| n.is_end()).collect()
    }

    /// Edges originating from a node, in edge insertion order.
    pub fn outgoing_edges(&self, node_id: &str) -> Vec<&TaskEdge> {
        self.edges.iter().filter(|e| e.source_id == node_id).collect()
    }

    /// Edges targeting a node, in edge insertion order.
    pub fn incoming_edges(&self, node_id: &str) -> Vec<&TaskEdge> {
        self.edges.iter().filter(|e| e.target_id == node_id).collect()
    }

    /// Nodes directly reachable from a node. Edges pointing at unknown ids
    /// are skipped.
    pub fn successors(&self, node_id: &str) -> Vec<&TaskNode> {
        self.outgoing_edges(node_id)
            .into_iter()
            .filter_map(|e| self.get_node(&e.target_id))
            .collect()
    }

    /// Nodes with an edge into a node. Edges from unknown ids are skipped.
    pub fn predecessors(&self, node_id: &str) -> Vec<&TaskNode> {
        self.incoming_edges(node_id)
            .into_iter()
            .filter_map(|e| self.get_node(&e.source_id))
            .collect()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
