//! Integration tests for the flowchart-to-plan pipeline
//!
//! These tests drive the full pipeline the CLI wires together: parse a
//! diagram file, validate the resulting graph, and generate the spec
//! documents on disk.

pub mod helpers;
pub mod pipeline;
