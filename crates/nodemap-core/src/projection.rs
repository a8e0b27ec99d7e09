//! Detached, tree-shaped copies of traversed instances

use crate::instance::{Handle, NodeInstance};
use crate::label::{InstanceId, Label, ScalarValue};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

/// One node of a query result
///
/// Holds a copy of the source instance's id, labels and value plus the
/// handle of the instance it was copied from. Children are grouped by the
/// edge-type they were reached through, in query order; edge-types that
/// matched nothing are absent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Projection {
    /// Edge-type this node was reached through (the root type label for roots)
    pub edge_type: Label,

    pub id: InstanceId,

    pub labels: Vec<Label>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<ScalarValue>,

    /// Originating instance in the store
    #[serde(skip)]
    pub source: Handle,

    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub links: IndexMap<Label, Vec<Projection>>,
}

impl Projection {
    pub(crate) fn from_instance(edge_type: Label, instance: &NodeInstance) -> Self {
        Self {
            edge_type,
            id: instance.id().clone(),
            labels: instance.labels().cloned().collect(),
            value: instance.value().cloned(),
            source: instance.handle(),
            links: IndexMap::new(),
        }
    }

    pub(crate) fn push_child(&mut self, child: Projection) {
        self.links
            .entry(child.edge_type.clone())
            .or_default()
            .push(child);
    }

    /// Children reached through `edge_type`
    pub fn children(&self, edge_type: &str) -> &[Projection] {
        self.links.get(edge_type).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All children in group order
    pub fn all_children(&self) -> impl Iterator<Item = &Projection> {
        self.links.values().flatten()
    }

    pub fn is_leaf(&self) -> bool {
        self.links.is_empty()
    }

    /// Hops along the deepest projected chain
    pub fn depth(&self) -> usize {
        self.all_children()
            .map(|c| c.depth() + 1)
            .max()
            .unwrap_or(0)
    }

    /// Number of projection nodes in this subtree, itself included
    pub fn node_count(&self) -> usize {
        1 + self.all_children().map(Projection::node_count).sum::<usize>()
    }

    /// Nested value view of the subtree
    ///
    /// A leaf becomes its value (`null` if it has none); an inner node
    /// becomes `[value, child, child, ...]` with children in group order.
    pub fn to_value_matrix(&self) -> Value {
        let own = self.value.as_ref().map_or(Value::Null, scalar_to_json);
        if self.is_leaf() {
            return own;
        }
        let mut row = vec![own];
        row.extend(self.all_children().map(Projection::to_value_matrix));
        Value::Array(row)
    }
}

fn scalar_to_json(value: &ScalarValue) -> Value {
    match value {
        ScalarValue::String(s) => Value::String(s.clone()),
        ScalarValue::Number(n) => serde_json::Number::from_f64(*n).map_or(Value::Null, Value::Number),
        ScalarValue::Boolean(b) => Value::Bool(*b),
    }
}
