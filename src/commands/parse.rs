//! `flowplan parse` - parse a flowchart file and show the task graph

use std::path::Path;

use anyhow::Result;

use crate::adapters::FlowchartParser;
use crate::commands::ParseOutput;

pub fn run(file: &Path, output: ParseOutput) -> Result<()> {
    let parser = FlowchartParser::new();
    let graph = parser.parse(file)?;

    match output {
        ParseOutput::Json => println!("{}", graph.to_json()?),
        ParseOutput::Yaml => println!("{}", serde_yaml::to_string(&graph)?),
        ParseOutput::Summary => {
            println!("Parsed flowchart: {}", file.display());
            println!("Nodes: {}", graph.nodes().len());
            println!("Edges: {}", graph.edges().len());
            println!();
            println!("Nodes:");
            for node in graph.nodes() {
                println!("  - [{}] {} ({})", node.kind.as_str(), node.name, node.id);
            }
            println!();
            println!("Edges:");
            for edge in graph.edges() {
                let condition = edge
                    .condition
                    .as_deref()
                    .map(|c| format!(" [{c}]"))
                    .unwrap_or_default();
                println!("  - {} -> {}{}", edge.source_id, edge.target_id, condition);
            }
        }
    }

    Ok(())
}
