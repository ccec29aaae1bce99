pub mod adapters;
pub mod commands;
pub mod ir;
pub mod plan;
pub mod validate;
