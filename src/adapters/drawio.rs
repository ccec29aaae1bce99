//! draw.io / Lucidchart mxGraph XML adapter
//!
//! Both tools export diagrams as mxGraph XML: `<mxCell>` elements carry
//! nodes (`vertex="1"`) and edges (`edge="1"`), shape styles encode the
//! node kind, and labels may carry HTML markup. Some exports compress the
//! model into a base64 + deflate `<diagram>` payload; those are inflated
//! transparently.

use std::collections::HashSet;
use std::io::Read;

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use percent_encoding::percent_decode_str;
use regex::Regex;
use roxmltree::{Document, Node as XmlNode};

use super::DiagramAdapter;
use crate::ir::{Executor, NodeKind, TaskEdge, TaskGraph, TaskNode};

/// Shape-style fragments mapped to node kinds, checked top to bottom.
/// Terminator shapes default to start; position-based inference sorts out
/// which terminators are really ends.
const SHAPE_KINDS: &[(&str, NodeKind)] = &[
    ("ellipse", NodeKind::Start),
    ("terminator", NodeKind::Start),
    ("rounded", NodeKind::Process),
    ("rectangle", NodeKind::Process),
    ("shape=process", NodeKind::Process),
    ("process", NodeKind::Process),
    ("rhombus", NodeKind::Decision),
    ("shape=diamond", NodeKind::Decision),
    ("diamond", NodeKind::Decision),
    ("shape=manualinput", NodeKind::HumanReview),
    ("manualoperation", NodeKind::HumanReview),
    ("manual", NodeKind::HumanReview),
];

/// Common edge labels normalized to branch conditions.
const CONDITION_MAP: &[(&str, &str)] = &[
    ("yes", "validated"),
    ("no", "rejected"),
    ("true", "validated"),
    ("false", "rejected"),
    ("pass", "validated"),
    ("fail", "rejected"),
    ("validated", "validated"),
    ("rejected", "rejected"),
    ("approved", "validated"),
    ("denied", "rejected"),
    ("accept", "validated"),
    ("reject", "rejected"),
];

pub struct DrawioAdapter;

impl DiagramAdapter for DrawioAdapter {
    fn name(&self) -> &'static str {
        "drawio"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["xml", "drawio"]
    }

    fn parse_string(&self, content: &str, name: &str) -> Result<TaskGraph> {
        let doc = Document::parse(content).context("Failed to parse diagram XML")?;

        if !doc.descendants().any(|n| n.has_tag_name("mxGraphModel")) {
            let payload = doc
                .descendants()
                .find(|n| n.has_tag_name("diagram"))
                .and_then(|n| n.text())
                .and_then(decompress_diagram);
            if let Some(xml) = payload {
                let inner =
                    Document::parse(&xml).context("Failed to parse decompressed diagram XML")?;
                return Ok(build_graph(&inner, name));
            }
        }

        Ok(build_graph(&doc, name))
    }
}

fn build_graph(doc: &Document, name: &str) -> TaskGraph {
    let mut graph = TaskGraph::new();
    graph
        .metadata
        .insert("name".to_string(), serde_json::json!(name));
    graph
        .metadata
        .insert("format".to_string(), serde_json::json!("drawio"));

    let mut pending_edges: Vec<TaskEdge> = Vec::new();

    for cell in doc.descendants().filter(|n| n.has_tag_name("mxCell")) {
        let cell_id = cell.attribute("id").unwrap_or("");
        // Cells 0 and 1 are the mxGraph container cells
        if matches!(cell_id, "" | "0" | "1") {
            continue;
        }

        if cell.attribute("edge") == Some("1") {
            if let Some(edge) = extract_edge(&cell) {
                pending_edges.push(edge);
            }
        } else if cell.attribute("vertex") == Some("1") {
            graph.add_node(extract_node(&cell, cell_id));
        }
    }

    // Edges with a missing endpoint are dropped here rather than handed on
    for edge in pending_edges {
        if graph.get_node(&edge.source_id).is_some() && graph.get_node(&edge.target_id).is_some() {
            graph.add_edge(edge);
        }
    }

    infer_start_end(&mut graph);
    graph
}

fn extract_node(cell: &XmlNode, cell_id: &str) -> TaskNode {
    let value = clean_html(cell.attribute("value").unwrap_or(""));
    let style = cell.attribute("style").unwrap_or("");
    let kind = determine_kind(style, &value);

    let geometry = cell.children().find(|c| c.has_tag_name("mxGeometry"));
    let x = geometry
        .and_then(|g| g.attribute("x"))
        .and_then(|v| v.parse::<f64>().ok())
        .unwrap_or(0.0);
    let y = geometry
        .and_then(|g| g.attribute("y"))
        .and_then(|v| v.parse::<f64>().ok())
        .unwrap_or(0.0);

    let mut attributes = parse_style(style);
    attributes.insert("x".to_string(), serde_json::json!(x));
    attributes.insert("y".to_string(), serde_json::json!(y));

    let (inputs, outputs, clean_name) = parse_io(&value);

    let mut node = TaskNode::new(
        cell_id,
        if clean_name.is_empty() {
            format!("Task {cell_id}")
        } else {
            clean_name
        },
        kind,
    );
    node.executor = if kind == NodeKind::HumanReview {
        Executor::Human
    } else {
        Executor::Automated
    };
    node.inputs = inputs;
    node.outputs = outputs;
    node.attributes = attributes;
    node
}

fn extract_edge(cell: &XmlNode) -> Option<TaskEdge> {
    let source_id = cell.attribute("source")?;
    let target_id = cell.attribute("target")?;

    let label = clean_html(cell.attribute("value").unwrap_or(""));

    Some(TaskEdge {
        source_id: source_id.to_string(),
        target_id: target_id.to_string(),
        condition: normalize_condition(&label),
        label: if label.is_empty() { None } else { Some(label) },
    })
}

/// Explicit label markers take precedence over shape styles, so a rectangle
/// labeled "Start" still becomes the start node.
fn determine_kind(style: &str, value: &str) -> NodeKind {
    let value_lower = value.to_lowercase();
    let style_lower = style.to_lowercase();

    if ["start", "begin"].iter().any(|m| value_lower.contains(m)) {
        return NodeKind::Start;
    }
    if ["end", "done", "finish", "complete"]
        .iter()
        .any(|m| value_lower.contains(m))
    {
        return NodeKind::End;
    }
    if ["review", "human", "approve", "manual"]
        .iter()
        .any(|m| value_lower.contains(m))
    {
        return NodeKind::HumanReview;
    }

    for (pattern, kind) in SHAPE_KINDS {
        if style_lower.contains(pattern) {
            return *kind;
        }
    }

    NodeKind::Process
}

/// Split a `key1=value1;key2=value2;flag` style string into attributes.
fn parse_style(style: &str) -> std::collections::HashMap<String, serde_json::Value> {
    let mut attributes = std::collections::HashMap::new();

    for item in style.split(';') {
        match item.split_once('=') {
            Some((key, value)) => {
                attributes.insert(
                    key.trim().to_string(),
                    serde_json::json!(value.trim()),
                );
            }
            None => {
                let flag = item.trim();
                if !flag.is_empty() {
                    attributes.insert(flag.to_string(), serde_json::json!(true));
                }
            }
        }
    }

    attributes
}

fn normalize_condition(label: &str) -> Option<String> {
    let normalized = label.trim().to_lowercase();
    if normalized.is_empty() {
        return None;
    }

    let mapped = CONDITION_MAP
        .iter()
        .find(|(raw, _)| *raw == normalized)
        .map(|(_, condition)| (*condition).to_string());

    Some(mapped.unwrap_or(normalized))
}

/// Lift `[in:a,b]` / `[out:c]` artifact lists out of a node label,
/// returning (inputs, outputs, remaining name).
fn parse_io(value: &str) -> (Vec<String>, Vec<String>, String) {
    let in_re = Regex::new(r"(?i)\[in:([^\]]+)\]").expect("static pattern compiles");
    let out_re = Regex::new(r"(?i)\[out:([^\]]+)\]").expect("static pattern compiles");

    let mut clean_name = value.to_string();

    let mut inputs = Vec::new();
    if let Some(captures) = in_re.captures(value) {
        inputs = captures[1].split(',').map(|f| f.trim().to_string()).collect();
        clean_name = clean_name.replace(&captures[0], "");
    }

    let mut outputs = Vec::new();
    if let Some(captures) = out_re.captures(value) {
        outputs = captures[1].split(',').map(|f| f.trim().to_string()).collect();
        clean_name = clean_name.replace(&captures[0], "");
    }

    (inputs, outputs, clean_name.trim().to_string())
}

/// Strip HTML markup from a label: tags become spaces, common entities are
/// decoded, whitespace collapses.
fn clean_html(value: &str) -> String {
    if value.is_empty() {
        return String::new();
    }

    let tag_re = Regex::new(r"<[^>]+>").expect("static pattern compiles");
    let stripped = tag_re.replace_all(value, " ");

    let decoded = stripped
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
        .replace("&quot;", "\"");

    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Inflate a compressed `<diagram>` payload: base64, raw deflate, then
/// percent-decoding. Returns None when the payload isn't in that format.
fn decompress_diagram(text: &str) -> Option<String> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    let decoded = BASE64.decode(compact.as_bytes()).ok()?;

    let mut inflated = String::new();
    flate2::read::DeflateDecoder::new(decoded.as_slice())
        .read_to_string(&mut inflated)
        .ok()?;

    percent_decode_str(&inflated)
        .decode_utf8()
        .ok()
        .map(|s| s.to_string())
}

/// Promote unmarked boundary nodes: the topmost predecessor-free process
/// node becomes the start, the bottommost successor-free process node
/// becomes the end. Ties on equal y break toward the smallest id.
fn infer_start_end(graph: &mut TaskGraph) {
    let with_incoming: HashSet<String> = graph
        .edges()
        .iter()
        .map(|e| e.target_id.clone())
        .collect();
    let with_outgoing: HashSet<String> = graph
        .edges()
        .iter()
        .map(|e| e.source_id.clone())
        .collect();

    let start = graph
        .nodes()
        .iter()
        .filter(|n| n.kind == NodeKind::Process && !with_incoming.contains(&n.id))
        .min_by(|a, b| {
            node_y(a, f64::INFINITY)
                .partial_cmp(&node_y(b, f64::INFINITY))
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        })
        .map(|n| n.id.clone());
    if let Some(id) = start {
        if let Some(node) = graph.get_node_mut(&id) {
            node.kind = NodeKind::Start;
        }
    }

    let end = graph
        .nodes()
        .iter()
        .filter(|n| n.kind == NodeKind::Process && !with_outgoing.contains(&n.id))
        .max_by(|a, b| {
            node_y(a, 0.0)
                .partial_cmp(&node_y(b, 0.0))
                .unwrap_or(std::cmp::Ordering::Equal)
                // Reversed id comparison so the max prefers the smaller id
                .then_with(|| b.id.cmp(&a.id))
        })
        .map(|n| n.id.clone());
    if let Some(id) = end {
        if let Some(node) = graph.get_node_mut(&id) {
            node.kind = NodeKind::End;
        }
    }
}

fn node_y(node: &TaskNode, default: f64) -> f64 {
    node.attributes
        .get("y")
        .and_then(|v| v.as_f64())
        .unwrap_or(default)
}
