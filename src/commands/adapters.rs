//! `flowplan adapters` - list registered diagram adapters

use anyhow::Result;

use crate::adapters::FlowchartParser;
use crate::commands::OutputFormat;

pub fn list(output: OutputFormat) -> Result<()> {
    let parser = FlowchartParser::new();

    match output {
        OutputFormat::Json => {
            let adapters: Vec<_> = parser
                .adapters()
                .map(|a| {
                    serde_json::json!({
                        "name": a.name(),
                        "extensions": a.extensions(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&adapters)?);
        }
        OutputFormat::Text => {
            println!("Available flowchart adapters:");
            println!();
            for adapter in parser.adapters() {
                println!("  {}", adapter.name());
                let extensions: Vec<String> = adapter
                    .extensions()
                    .iter()
                    .map(|e| format!(".{e}"))
                    .collect();
                println!("    Formats: {}", extensions.join(", "));
                println!();
            }
        }
    }

    Ok(())
}
