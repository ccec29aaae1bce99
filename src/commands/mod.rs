//! CLI command implementations
//!
//! Each subcommand lives in its own module and prints directly; exit
//! codes are handled here rather than bubbled up as errors so that a
//! failed validation still gets its full report printed.

pub mod adapters;
pub mod generate;
pub mod parse;
pub mod validate;

use clap::ValueEnum;

/// Output format for the parse command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ParseOutput {
    Summary,
    Json,
    Yaml,
}

/// Output format for the remaining commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Workflow type recorded in the generated plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum WorkflowType {
    Feature,
    Refactor,
    Investigation,
    Migration,
    Simple,
}

impl WorkflowType {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowType::Feature => "feature",
            WorkflowType::Refactor => "refactor",
            WorkflowType::Investigation => "investigation",
            WorkflowType::Migration => "migration",
            WorkflowType::Simple => "simple",
        }
    }
}
