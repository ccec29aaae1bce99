use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use flowplan::commands::{adapters, generate, parse, validate, OutputFormat, ParseOutput, WorkflowType};

#[derive(Parser)]
#[command(name = "flowplan")]
#[command(about = "Parse flowcharts and generate phased implementation plans", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a flowchart file and show the task graph
    Parse {
        /// Path to the flowchart file
        file: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = ParseOutput::Summary)]
        output: ParseOutput,
    },

    /// Validate a flowchart file
    Validate {
        /// Path to the flowchart file
        file: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        output: OutputFormat,
    },

    /// Generate an implementation plan from a flowchart
    Generate {
        /// Path to the flowchart file
        file: PathBuf,

        /// Project directory to receive the spec
        #[arg(short, long)]
        project_dir: PathBuf,

        /// Spec name (defaults to the diagram name)
        #[arg(short, long)]
        spec_name: Option<String>,

        /// Workflow type recorded in the plan
        #[arg(short, long, value_enum, default_value_t = WorkflowType::Feature)]
        workflow_type: WorkflowType,

        /// Generate even when validation reports errors
        #[arg(short, long)]
        force: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        output: OutputFormat,
    },

    /// List registered diagram adapters
    Adapters {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        output: OutputFormat,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Parse { file, output } => parse::run(&file, output),
        Commands::Validate { file, output } => validate::run(&file, output),
        Commands::Generate {
            file,
            project_dir,
            spec_name,
            workflow_type,
            force,
            output,
        } => generate::run(
            &file,
            &project_dir,
            spec_name.as_deref(),
            workflow_type,
            force,
            output,
        ),
        Commands::Adapters { output } => adapters::list(output),
    }
}
