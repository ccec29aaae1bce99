//! `flowplan generate` - turn a flowchart into a numbered spec directory

use std::path::Path;

use anyhow::{bail, Result};
use colored::Colorize;
use regex::Regex;

use crate::adapters::FlowchartParser;
use crate::commands::{OutputFormat, WorkflowType};
use crate::plan::PlanGenerator;

pub fn run(
    file: &Path,
    project_dir: &Path,
    spec_name: Option<&str>,
    workflow_type: WorkflowType,
    force: bool,
    output: OutputFormat,
) -> Result<()> {
    let parser = FlowchartParser::new();
    let graph = parser.parse(file)?;

    let result = crate::validate::validate(&graph);
    if !result.valid && !force {
        eprintln!("Error: Flowchart has validation errors:");
        for error in &result.errors {
            eprintln!("  - {}", error.message);
        }
        eprintln!();
        eprintln!("Use --force to generate anyway.");
        std::process::exit(1);
    }

    if !project_dir.exists() {
        bail!("Project directory does not exist: {}", project_dir.display());
    }

    let specs_dir = project_dir.join("specs");
    let spec_num = next_spec_number(&specs_dir)?;

    let metadata_name = graph.metadata.get("name").and_then(|v| v.as_str());
    let slug = slugify(spec_name.or(metadata_name).unwrap_or("flowchart-import"));
    let spec_dir = specs_dir.join(format!("{spec_num:03}-{slug}"));

    let generator = PlanGenerator::new();
    let files = generator.save_to_spec_dir(&graph, &spec_dir, spec_name, workflow_type.as_str())?;

    match output {
        OutputFormat::Json => {
            let report = serde_json::json!({
                "success": true,
                "spec_dir": spec_dir,
                "spec_number": format!("{spec_num:03}"),
                "files": {
                    "plan": files.plan,
                    "spec": files.spec,
                    "requirements": files.requirements,
                },
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => {
            println!("{} Generated spec in: {}", "✓".green(), spec_dir.display());
            println!();
            println!("Created files:");
            for (name, path) in [
                ("plan", &files.plan),
                ("spec", &files.spec),
                ("requirements", &files.requirements),
            ] {
                if let Some(file_name) = path.file_name() {
                    println!("  - {name}: {}", file_name.to_string_lossy());
                }
            }
        }
    }

    Ok(())
}

/// Next free spec number: one past the highest `NNN-` prefix already
/// present, or 1 for a fresh specs directory.
fn next_spec_number(specs_dir: &Path) -> Result<u32> {
    if !specs_dir.exists() {
        return Ok(1);
    }

    let mut highest = 0;
    for entry in std::fs::read_dir(specs_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if let Some(number) = name.get(..3).and_then(|p| p.parse::<u32>().ok()) {
            highest = highest.max(number);
        }
    }

    Ok(highest + 1)
}

fn slugify(name: &str) -> String {
    let invalid = Regex::new(r"[^a-z0-9-]+").expect("static pattern compiles");
    let collapsed = Regex::new(r"-{2,}").expect("static pattern compiles");

    let lowered = name.to_lowercase();
    let slug = invalid.replace_all(&lowered, "-");
    let slug = collapsed.replace_all(&slug, "-");
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        "flowchart-import".to_string()
    } else {
        slug.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("User Login Flow"), "user-login-flow");
        assert_eq!(slugify("API  &  Routing!"), "api-routing");
        assert_eq!(slugify("---"), "flowchart-import");
    }

    #[test]
    fn test_next_spec_number_counts_past_existing() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(next_spec_number(&dir.path().join("missing")).unwrap(), 1);

        std::fs::create_dir(dir.path().join("001-first")).unwrap();
        std::fs::create_dir(dir.path().join("007-later")).unwrap();
        std::fs::create_dir(dir.path().join("notes")).unwrap();
        assert_eq!(next_spec_number(dir.path()).unwrap(), 8);
    }
}
