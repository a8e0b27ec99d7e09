//! Output formatting utilities

use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use nodemap_core::{GraphStore, Projection, ProjectionTree};

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Indented tree
    #[default]
    Tree,
    /// Projection forest as JSON
    Json,
    /// Nested value matrix as JSON
    Matrix,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tree => "tree",
            Self::Json => "json",
            Self::Matrix => "matrix",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tree" => Ok(Self::Tree),
            "json" => Ok(Self::Json),
            "matrix" => Ok(Self::Matrix),
            other => Err(format!("Unknown format: {} (expected tree, json, matrix)", other)),
        }
    }
}

/// Format a projection forest
pub fn format_projections(
    roots: &[Projection],
    store: &GraphStore,
    format: OutputFormat,
) -> anyhow::Result<String> {
    Ok(match format {
        OutputFormat::Tree => ProjectionTree::new(roots, store).to_string(),
        OutputFormat::Json => serde_json::to_string_pretty(roots)?,
        OutputFormat::Matrix => {
            let matrix: Vec<Value> = roots.iter().map(Projection::to_value_matrix).collect();
            serde_json::to_string(&matrix)?
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use nodemap_core::QueryPath;

    #[test]
    fn test_parse_format() {
        assert_eq!("JSON".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert_eq!("tree".parse::<OutputFormat>(), Ok(OutputFormat::Tree));
        assert!("csv".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_matrix_output() {
        let mut store = GraphStore::new();
        store.add_instance("C1", ["Contact"], None).unwrap();
        store
            .add_instance("N1", ["PersonName"], Some("Ana".into()))
            .unwrap();
        store.add_link("C1", "PersonName", "N1").unwrap();

        let path: QueryPath = ["Contact", "PersonName"].into_iter().collect();
        let roots = store.query(&path).unwrap();
        let out = format_projections(&roots, &store, OutputFormat::Matrix).unwrap();

        assert_eq!(out, r#"[[null,"Ana"]]"#);
    }
}
