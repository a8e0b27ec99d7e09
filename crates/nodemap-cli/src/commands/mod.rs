//! CLI command implementations

pub mod completions;
pub mod config;
pub mod load;
pub mod query;
pub mod show;
