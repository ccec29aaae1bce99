//! `flowplan validate` - report structural problems in a flowchart

use std::path::Path;

use anyhow::Result;
use colored::Colorize;

use crate::adapters::FlowchartParser;
use crate::commands::OutputFormat;
use crate::validate::{ValidationIssue, ValidationResult};

pub fn run(file: &Path, output: OutputFormat) -> Result<()> {
    let parser = FlowchartParser::new();
    let graph = parser.parse(file)?;
    let result = crate::validate::validate(&graph);

    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Text => print_report(file, &result),
    }

    if !result.valid {
        std::process::exit(1);
    }
    Ok(())
}

fn print_report(file: &Path, result: &ValidationResult) {
    if result.valid {
        println!("{} Flowchart is valid: {}", "✓".green(), file.display());
    } else {
        println!("{} Flowchart has errors: {}", "✗".red(), file.display());
    }

    if !result.errors.is_empty() {
        println!();
        println!("Errors:");
        for error in &result.errors {
            println!("  {} [{}] {}{}", "✗".red(), error.code, error.message, node_info(error));
        }
    }

    if !result.warnings.is_empty() {
        println!();
        println!("Warnings:");
        for warning in &result.warnings {
            println!(
                "  {} [{}] {}{}",
                "⚠".yellow(),
                warning.code,
                warning.message,
                node_info(warning)
            );
        }
    }
}

fn node_info(issue: &ValidationIssue) -> String {
    issue
        .node_id
        .as_deref()
        .map(|id| format!(" (node: {id})"))
        .unwrap_or_default()
}
