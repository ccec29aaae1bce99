//! Diagram format adapters
//!
//! Adapters turn a diagram export into a [`TaskGraph`]; everything past
//! that point (validation, generation) is format-agnostic. The parser
//! facade picks an adapter by file extension and supports registering
//! custom adapters at runtime.

mod drawio;

pub use drawio::DrawioAdapter;

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::ir::TaskGraph;

/// A parser for one diagram format family.
pub trait DiagramAdapter {
    /// Short adapter name, e.g. "drawio".
    fn name(&self) -> &'static str;

    /// File extensions (without dot, lower-case) this adapter handles.
    fn extensions(&self) -> &'static [&'static str];

    /// Parse diagram content into a task graph. `name` seeds the graph
    /// metadata and defaults the feature name downstream.
    fn parse_string(&self, content: &str, name: &str) -> Result<TaskGraph>;

    fn parse_file(&self, path: &Path) -> Result<TaskGraph> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "flowchart".to_string());
        self.parse_string(&content, &name)
    }
}

/// Facade over the registered adapters, dispatching on file extension.
pub struct FlowchartParser {
    adapters: Vec<Box<dyn DiagramAdapter>>,
}

impl Default for FlowchartParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FlowchartParser {
    /// Parser with the built-in adapters registered.
    pub fn new() -> Self {
        let mut parser = Self { adapters: Vec::new() };
        parser.register(Box::new(DrawioAdapter));
        parser
    }

    /// Register a custom adapter. Later registrations win on extension
    /// conflicts.
    pub fn register(&mut self, adapter: Box<dyn DiagramAdapter>) {
        self.adapters.push(adapter);
    }

    pub fn adapters(&self) -> impl Iterator<Item = &dyn DiagramAdapter> {
        self.adapters.iter().map(|a| a.as_ref())
    }

    pub fn supported_extensions(&self) -> Vec<&'static str> {
        self.adapters.iter().flat_map(|a| a.extensions()).copied().collect()
    }

    fn adapter_for(&self, extension: &str) -> Option<&dyn DiagramAdapter> {
        self.adapters
            .iter()
            .rev()
            .find(|a| a.extensions().contains(&extension))
            .map(|a| a.as_ref())
    }

    /// Parse a diagram file, picking the adapter from the extension.
    pub fn parse(&self, path: &Path) -> Result<TaskGraph> {
        if !path.exists() {
            bail!("File not found: {}", path.display());
        }

        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        let Some(adapter) = self.adapter_for(&extension) else {
            bail!(
                "Unsupported file format: .{extension}. Supported formats: {}",
                self.supported_extensions()
                    .iter()
                    .map(|e| format!(".{e}"))
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        };

        adapter.parse_file(path)
    }

    /// Parse diagram content with a named adapter.
    pub fn parse_with(&self, adapter_name: &str, content: &str, name: &str) -> Result<TaskGraph> {
        let adapter = self
            .adapters
            .iter()
            .rev()
            .find(|a| a.name() == adapter_name)
            .with_context(|| format!("Unknown adapter: {adapter_name}"))?;
        adapter.parse_string(content, name)
    }
}
