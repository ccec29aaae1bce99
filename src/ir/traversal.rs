//! Graph ordering queries: topological sort, parallel levels, decision branches

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use thiserror::Error;

use super::{TaskGraph, TaskNode};

/// Errors surfaced by graph ordering queries.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    /// The graph could not be fully ordered. Unlike validation, which
    /// tolerates loops through decision nodes, a topological order request
    /// fails on any remaining cycle.
    #[error("graph contains a cycle involving nodes: {}", .remaining.join(", "))]
    CycleDetected { remaining: Vec<String> },
}

enum Frame<'a> {
    Enter(&'a str),
    Exit(&'a str),
}

impl TaskGraph {
    /// Order nodes so that for every edge (u, v), u precedes v.
    ///
    /// Kahn's algorithm; among the ready nodes the lexicographically
    /// smallest id is always taken, so the result is deterministic
    /// regardless of insertion order.
    pub fn topological_sort(&self) -> Result<Vec<&TaskNode>, GraphError> {
        let mut in_degree: HashMap<&str, usize> =
            self.nodes().iter().map(|n| (n.id.as_str(), 0)).collect();

        for edge in self.edges() {
            if let Some(degree) = in_degree.get_mut(edge.target_id.as_str()) {
                *degree += 1;
            }
        }

        let mut ready: BTreeSet<&str> = in_degree
            .iter()
            .filter(|(_, &degree)| degree == 0)
            .map(|(&id, _)| id)
            .collect();

        let mut result: Vec<&TaskNode> = Vec::new();

        while let Some(id) = ready.pop_first() {
            if let Some(node) = self.get_node(id) {
                result.push(node);
            }

            for successor in self.successors(id) {
                if let Some(degree) = in_degree.get_mut(successor.id.as_str()) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.insert(successor.id.as_str());
                    }
                }
            }
        }

        if result.len() != self.nodes().len() {
            let placed: HashSet<&str> = result.iter().map(|n| n.id.as_str()).collect();
            let remaining = self
                .nodes()
                .iter()
                .filter(|n| !placed.contains(n.id.as_str()))
                .map(|n| n.id.clone())
                .collect();
            return Err(GraphError::CycleDetected { remaining });
        }

        Ok(result)
    }

    /// Group nodes by their longest-path distance from any predecessor-free
    /// node. Group k holds every node at level k; nodes sharing a level have
    /// no ordering constraint between them and are candidates for parallel
    /// execution.
    pub fn parallel_groups(&self) -> Vec<Vec<&TaskNode>> {
        let levels = self.node_levels();

        let mut groups: BTreeMap<usize, Vec<&TaskNode>> = BTreeMap::new();
        for node in self.nodes() {
            let level = levels.get(node.id.as_str()).copied().unwrap_or(0);
            groups.entry(level).or_default().push(node);
        }

        groups.into_values().collect()
    }

    /// Longest-path level per node, computed with an explicit DFS stack over
    /// predecessor edges. A predecessor found on the current DFS path (a
    /// cycle) contributes level 0 instead of recursing forever, so leveling
    /// stays defined on graphs that only carry decision loops.
    fn node_levels(&self) -> HashMap<&str, usize> {
        let mut levels: HashMap<&str, usize> = HashMap::new();

        for node in self.nodes() {
            if levels.contains_key(node.id.as_str()) {
                continue;
            }

            let mut on_path: HashSet<&str> = HashSet::new();
            let mut stack = vec![Frame::Enter(node.id.as_str())];

            while let Some(frame) = stack.pop() {
                match frame {
                    Frame::Enter(id) => {
                        if levels.contains_key(id) || on_path.contains(id) {
                            continue;
                        }
                        on_path.insert(id);
                        stack.push(Frame::Exit(id));
                        for pred in self.predecessors(id) {
                            stack.push(Frame::Enter(pred.id.as_str()));
                        }
                    }
                    Frame::Exit(id) => {
                        on_path.remove(id);
                        let preds = self.predecessors(id);
                        let level = if preds.is_empty() {
                            0
                        } else {
                            preds
                                .iter()
                                .map(|p| levels.get(p.id.as_str()).copied().unwrap_or(0))
                                .max()
                                .unwrap_or(0)
                                + 1
                        };
                        levels.insert(id, level);
                    }
                }
            }
        }

        levels
    }

    /// Branches leaving a decision node, keyed by the edge condition. An
    /// edge with neither condition nor label lands in the "default" bucket.
    pub fn decision_branches(&self, node_id: &str) -> BTreeMap<String, Vec<&TaskNode>> {
        let mut branches: BTreeMap<String, Vec<&TaskNode>> = BTreeMap::new();

        for edge in self.outgoing_edges(node_id) {
            let condition = edge
                .condition
                .as_deref()
                .filter(|c| !c.is_empty())
                .or(edge.label.as_deref().filter(|l| !l.is_empty()))
                .unwrap_or("default");

            if let Some(target) = self.get_node(&edge.target_id) {
                branches
                    .entry(condition.to_string())
                    .or_default()
                    .push(target);
            }
        }

        branches
    }
}
