//! Human-readable rendering of projections

use crate::projection::Projection;
use crate::store::GraphStore;
use std::fmt;

/// Indented tree view of a projection forest
///
/// ```text
/// - id: C1, type: [Contact], value: , source: C1
///   Link: Academy
///     - id: A1, type: [Academy], value: , source: A1
/// ```
///
/// The source column is resolved through the store; a projection whose
/// source has since been removed shows `-`.
pub struct ProjectionTree<'a> {
    roots: &'a [Projection],
    store: &'a GraphStore,
}

impl<'a> ProjectionTree<'a> {
    pub fn new(roots: &'a [Projection], store: &'a GraphStore) -> Self {
        Self { roots, store }
    }

    fn write_node(&self, f: &mut fmt::Formatter<'_>, node: &Projection, level: usize) -> fmt::Result {
        let indent = "  ".repeat(level);
        let labels: Vec<&str> = node.labels.iter().map(|l| l.as_str()).collect();
        let value = node.value.as_ref().map(ToString::to_string).unwrap_or_default();
        let source = self
            .store
            .resolve(node.source)
            .map(|instance| instance.id().as_str())
            .unwrap_or("-");

        writeln!(
            f,
            "{}- id: {}, type: [{}], value: {}, source: {}",
            indent,
            node.id,
            labels.join(", "),
            value,
            source
        )?;
        for (edge_type, children) in &node.links {
            writeln!(f, "{}  Link: {}", indent, edge_type)?;
            for child in children {
                self.write_node(f, child, level + 2)?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for ProjectionTree<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for root in self.roots {
            self.write_node(f, root, 0)?;
        }
        Ok(())
    }
}
