//! Node instances (vertices) and their typed adjacency

use crate::label::{InstanceId, Label, ScalarValue};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Non-owning reference to an instance slot in a [`GraphStore`](crate::GraphStore)
///
/// The generation changes whenever a slot is reused, so a handle to a removed
/// instance never resolves to its successor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Handle {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

/// Ordered, duplicate-free edges for one edge-type on one instance
#[derive(Debug, Clone, Default)]
pub struct LinkCollection {
    targets: Vec<Handle>,
}

impl LinkCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `target` unless present. Returns true if it was added.
    pub fn add(&mut self, target: Handle) -> bool {
        if self.contains(target) {
            return false;
        }
        self.targets.push(target);
        true
    }

    /// Remove `target` if present. Returns true if it was removed.
    pub fn remove(&mut self, target: Handle) -> bool {
        match self.position(target) {
            Some(pos) => {
                self.targets.remove(pos);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, target: Handle) -> bool {
        self.position(target).is_some()
    }

    pub fn position(&self, target: Handle) -> Option<usize> {
        self.targets.iter().position(|t| *t == target)
    }

    pub fn as_slice(&self) -> &[Handle] {
        &self.targets
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// A graph vertex: identity, type labels, optional value and typed links
///
/// Link and label membership is only mutated through the owning store, which
/// keeps edges symmetric and the type index consistent.
#[derive(Debug, Clone)]
pub struct NodeInstance {
    handle: Handle,
    id: InstanceId,
    labels: IndexSet<Label>,
    value: Option<ScalarValue>,
    links: IndexMap<Label, LinkCollection>,
}

impl NodeInstance {
    pub(crate) fn new(
        handle: Handle,
        id: InstanceId,
        labels: IndexSet<Label>,
        value: Option<ScalarValue>,
    ) -> Self {
        Self {
            handle,
            id,
            labels,
            value,
            links: IndexMap::new(),
        }
    }

    pub fn handle(&self) -> Handle {
        self.handle
    }

    pub fn id(&self) -> &InstanceId {
        &self.id
    }

    pub fn labels(&self) -> impl Iterator<Item = &Label> {
        self.labels.iter()
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.labels.contains(label)
    }

    pub fn value(&self) -> Option<&ScalarValue> {
        self.value.as_ref()
    }

    /// Targets linked under `edge_type`, in insertion order
    pub fn get_links(&self, edge_type: &str) -> &[Handle] {
        self.links
            .get(edge_type)
            .map(LinkCollection::as_slice)
            .unwrap_or(&[])
    }

    pub fn has_link(&self, edge_type: &str, target: Handle) -> bool {
        self.links
            .get(edge_type)
            .is_some_and(|c| c.contains(target))
    }

    /// Edge-types with at least one link, in insertion order
    pub fn edge_types(&self) -> impl Iterator<Item = &Label> {
        self.links.keys()
    }

    /// Total number of stored edges across all edge-types
    pub fn degree(&self) -> usize {
        self.links.values().map(LinkCollection::len).sum()
    }

    pub(crate) fn add_link(&mut self, edge_type: &Label, target: Handle) -> bool {
        self.links.entry(edge_type.clone()).or_default().add(target)
    }

    pub(crate) fn remove_link(&mut self, edge_type: &str, target: Handle) -> bool {
        let Some(collection) = self.links.get_mut(edge_type) else {
            return false;
        };
        let removed = collection.remove(target);
        if collection.is_empty() {
            self.links.shift_remove(edge_type);
        }
        removed
    }

    /// Detach every edge of `edge_type`, returning the former targets
    pub(crate) fn take_links(&mut self, edge_type: &str) -> Vec<Handle> {
        self.links
            .shift_remove(edge_type)
            .map(|c| c.targets)
            .unwrap_or_default()
    }

    /// Detach all edges, returning `(edge_type, targets)` groups
    pub(crate) fn take_all_links(&mut self) -> Vec<(Label, Vec<Handle>)> {
        std::mem::take(&mut self.links)
            .into_iter()
            .map(|(label, c)| (label, c.targets))
            .collect()
    }

    pub(crate) fn insert_label(&mut self, label: Label) -> bool {
        self.labels.insert(label)
    }

    pub(crate) fn remove_label(&mut self, label: &str) -> bool {
        self.labels.shift_remove(label)
    }
}
