//! The graph store: instance arena, identity and type indexes

use crate::engine::QueryEngine;
use crate::error::{Error, Result};
use crate::instance::{Handle, NodeInstance};
use crate::label::{InstanceId, Label, ScalarValue};
use crate::projection::Projection;
use crate::query::{QueryPath, QueryTree};
use indexmap::{IndexMap, IndexSet};
use std::collections::HashMap;

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    instance: Option<NodeInstance>,
}

/// Authoritative registry of node instances
///
/// Instances live in an arena and reference each other through [`Handle`]s.
/// Every mutation goes through the store so that:
/// - each edge `(a, edge_type, b)` has its reciprocal `(b, edge_type, a)`
/// - an instance is indexed under a type label iff it carries that label
/// - no `(edge_type, target)` pair is stored twice on one instance
#[derive(Debug, Default)]
pub struct GraphStore {
    slots: Vec<Slot>,
    free: Vec<u32>,
    by_id: HashMap<InstanceId, Handle>,
    by_type: IndexMap<Label, IndexSet<Handle>>,
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live instances
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Instances
    // ─────────────────────────────────────────────────────────────────────────

    /// Register a new instance under every one of its type labels
    pub fn add_instance<L>(
        &mut self,
        id: impl Into<InstanceId>,
        labels: impl IntoIterator<Item = L>,
        value: Option<ScalarValue>,
    ) -> Result<Handle>
    where
        L: Into<Label>,
    {
        let id = id.into();
        if self.by_id.contains_key(&id) {
            return Err(Error::DuplicateId(id));
        }
        let labels: IndexSet<Label> = labels.into_iter().map(Into::into).collect();

        let handle = self.allocate();
        for label in &labels {
            self.by_type.entry(label.clone()).or_default().insert(handle);
        }
        self.by_id.insert(id.clone(), handle);

        tracing::debug!("Added instance {} {:?} at {}", id, labels, handle);
        self.slots[handle.index as usize].instance =
            Some(NodeInstance::new(handle, id, labels, value));
        Ok(handle)
    }

    /// Remove an instance, every edge incident to it and its index entries
    pub fn remove_instance(&mut self, id: &str) -> Result<()> {
        let handle = self.handle_of(id)?;
        let Some(mut instance) = self.release(handle) else {
            return Err(Error::UnknownInstance(InstanceId::from(id)));
        };

        let mut detached = 0;
        for (edge_type, targets) in instance.take_all_links() {
            for target in targets {
                if target == handle {
                    continue;
                }
                if let Some(neighbor) = self.instance_mut(target) {
                    if neighbor.remove_link(edge_type.as_str(), handle) {
                        detached += 1;
                    }
                }
            }
        }

        for label in instance.labels() {
            self.unindex(label.as_str(), handle);
        }
        self.by_id.remove(id);

        tracing::debug!("Removed instance {} ({} reciprocal edges detached)", id, detached);
        Ok(())
    }

    /// Look up a live instance by its handle
    pub fn resolve(&self, handle: Handle) -> Option<&NodeInstance> {
        self.slots
            .get(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.instance.as_ref())
    }

    pub fn find_by_id(&self, id: &str) -> Option<&NodeInstance> {
        self.by_id.get(id).and_then(|h| self.resolve(*h))
    }

    /// Instances carrying `label`, in registration order
    pub fn find_by_type(&self, label: &str) -> Vec<&NodeInstance> {
        self.by_type
            .get(label)
            .map(|set| set.iter().filter_map(|h| self.resolve(*h)).collect())
            .unwrap_or_default()
    }

    /// Owned snapshot of the ids carrying `label`, safe to hold across mutations
    pub fn ids_of_type(&self, label: &str) -> Vec<InstanceId> {
        self.find_by_type(label)
            .into_iter()
            .map(|instance| instance.id().clone())
            .collect()
    }

    /// Type labels with at least one instance
    pub fn labels(&self) -> impl Iterator<Item = &Label> {
        self.by_type.keys()
    }

    /// All live instances in arena order
    pub fn instances(&self) -> impl Iterator<Item = &NodeInstance> {
        self.slots.iter().filter_map(|slot| slot.instance.as_ref())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Labels
    // ─────────────────────────────────────────────────────────────────────────

    /// Tag an instance with another type label. Returns false if already present.
    pub fn add_label(&mut self, id: &str, label: impl Into<Label>) -> Result<bool> {
        let handle = self.handle_of(id)?;
        let label = label.into();
        let added = self
            .instance_mut(handle)
            .is_some_and(|instance| instance.insert_label(label.clone()));
        if added {
            self.by_type.entry(label).or_default().insert(handle);
        }
        Ok(added)
    }

    /// Drop a type label from an instance. Returns false if it was absent.
    pub fn remove_label(&mut self, id: &str, label: &str) -> Result<bool> {
        let handle = self.handle_of(id)?;
        let removed = self
            .instance_mut(handle)
            .is_some_and(|instance| instance.remove_label(label));
        if removed {
            self.unindex(label, handle);
        }
        Ok(removed)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Links
    // ─────────────────────────────────────────────────────────────────────────

    /// Link two instances under `edge_type` in both directions
    ///
    /// Both ids are resolved before either side is touched, so a failure
    /// leaves the adjacency unchanged.
    pub fn add_link(&mut self, from: &str, edge_type: impl Into<Label>, to: &str) -> Result<()> {
        let from_handle = self.handle_of(from)?;
        let to_handle = self.handle_of(to)?;
        let edge_type = edge_type.into();

        if let Some(source) = self.instance_mut(from_handle) {
            source.add_link(&edge_type, to_handle);
        }
        if let Some(target) = self.instance_mut(to_handle) {
            target.add_link(&edge_type, from_handle);
        }

        tracing::trace!("Linked {} -[{}]- {}", from, edge_type, to);
        Ok(())
    }

    /// Unlink two instances in both directions
    ///
    /// Removing an edge that does not exist, including one between unknown
    /// ids, is a no-op. Returns true if anything was removed.
    pub fn remove_link(&mut self, from: &str, edge_type: &str, to: &str) -> bool {
        let (Some(&from_handle), Some(&to_handle)) = (self.by_id.get(from), self.by_id.get(to))
        else {
            return false;
        };

        let forward = self
            .instance_mut(from_handle)
            .is_some_and(|source| source.remove_link(edge_type, to_handle));
        let reverse = self
            .instance_mut(to_handle)
            .is_some_and(|target| target.remove_link(edge_type, from_handle));

        if forward || reverse {
            tracing::trace!("Unlinked {} -[{}]- {}", from, edge_type, to);
        }
        forward || reverse
    }

    /// Remove every `edge_type` edge of an instance along with the reciprocals
    pub fn remove_all_links(&mut self, id: &str, edge_type: &str) -> Result<usize> {
        let handle = self.handle_of(id)?;
        let targets = self
            .instance_mut(handle)
            .map(|instance| instance.take_links(edge_type))
            .unwrap_or_default();

        for target in &targets {
            if let Some(neighbor) = self.instance_mut(*target) {
                neighbor.remove_link(edge_type, handle);
            }
        }

        tracing::debug!("Removed {} {} links from {}", targets.len(), edge_type, id);
        Ok(targets.len())
    }

    pub fn has_link(&self, from: &str, edge_type: &str, to: &str) -> bool {
        match (self.find_by_id(from), self.by_id.get(to)) {
            (Some(source), Some(target)) => source.has_link(edge_type, *target),
            _ => false,
        }
    }

    /// Instances linked to `id` under `edge_type`, in link order
    pub fn neighbors(&self, id: &str, edge_type: &str) -> Result<Vec<&NodeInstance>> {
        let instance = self
            .find_by_id(id)
            .ok_or_else(|| Error::UnknownInstance(InstanceId::from(id)))?;
        Ok(instance
            .get_links(edge_type)
            .iter()
            .filter_map(|h| self.resolve(*h))
            .collect())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────

    /// Compile `path` and project every instance of its root type
    pub fn query(&self, path: &QueryPath) -> Result<Vec<Projection>> {
        let tree = QueryTree::compile(path)?;
        Ok(QueryEngine::run(&tree, self))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Arena internals
    // ─────────────────────────────────────────────────────────────────────────

    fn handle_of(&self, id: &str) -> Result<Handle> {
        self.by_id
            .get(id)
            .copied()
            .ok_or_else(|| Error::UnknownInstance(InstanceId::from(id)))
    }

    fn instance_mut(&mut self, handle: Handle) -> Option<&mut NodeInstance> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.instance.as_mut())
    }

    fn allocate(&mut self) -> Handle {
        if let Some(index) = self.free.pop() {
            let generation = self.slots[index as usize].generation;
            return Handle { index, generation };
        }
        self.slots.push(Slot::default());
        Handle {
            index: (self.slots.len() - 1) as u32,
            generation: 0,
        }
    }

    fn release(&mut self, handle: Handle) -> Option<NodeInstance> {
        let slot = self
            .slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)?;
        let instance = slot.instance.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        Some(instance)
    }

    fn unindex(&mut self, label: &str, handle: Handle) {
        if let Some(members) = self.by_type.get_mut(label) {
            members.shift_remove(&handle);
            if members.is_empty() {
                self.by_type.shift_remove(label);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact_graph() -> GraphStore {
        let mut store = GraphStore::new();
        store.add_instance("C1", ["Contact"], None).unwrap();
        store.add_instance("A1", ["Academy"], None).unwrap();
        store.add_instance("D1", ["Director"], None).unwrap();
        store
            .add_instance("N1", ["PersonName"], Some("Jorge".into()))
            .unwrap();
        store.add_link("C1", "Academy", "A1").unwrap();
        store.add_link("A1", "Director", "D1").unwrap();
        store.add_link("D1", "PersonName", "N1").unwrap();
        store
    }

    fn linked_ids(store: &GraphStore, id: &str, edge_type: &str) -> Vec<String> {
        store
            .neighbors(id, edge_type)
            .unwrap()
            .into_iter()
            .map(|n| n.id().to_string())
            .collect()
    }

    /// Every stored edge has a reciprocal under the same label
    fn assert_symmetric(store: &GraphStore) {
        for instance in store.instances() {
            for edge_type in instance.edge_types() {
                for target in instance.get_links(edge_type.as_str()) {
                    let neighbor = store.resolve(*target).expect("dangling edge");
                    assert!(
                        neighbor.has_link(edge_type.as_str(), instance.handle()),
                        "{} -[{}]-> {} has no reciprocal",
                        instance.id(),
                        edge_type,
                        neighbor.id()
                    );
                }
            }
        }
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut store = GraphStore::new();
        store.add_instance("C1", ["Contact"], None).unwrap();

        let err = store.add_instance("C1", ["Academy"], None).unwrap_err();
        assert!(matches!(err, Error::DuplicateId(id) if id.as_str() == "C1"));
        assert_eq!(store.len(), 1);
        assert!(store.find_by_type("Academy").is_empty());
    }

    #[test]
    fn test_multi_label_indexing() {
        let mut store = GraphStore::new();
        store
            .add_instance("P1", ["Person", "Director"], None)
            .unwrap();

        assert_eq!(store.find_by_type("Person").len(), 1);
        assert_eq!(store.find_by_type("Director").len(), 1);
        assert_eq!(store.find_by_id("P1").unwrap().labels().count(), 2);
    }

    #[test]
    fn test_add_link_is_bidirectional() {
        let store = contact_graph();

        assert_eq!(linked_ids(&store, "C1", "Academy"), vec!["A1"]);
        assert_eq!(linked_ids(&store, "A1", "Academy"), vec!["C1"]);
        assert!(store.has_link("A1", "Director", "D1"));
        assert!(store.has_link("D1", "Director", "A1"));
        assert_symmetric(&store);
    }

    #[test]
    fn test_add_link_twice_is_idempotent() {
        let mut store = contact_graph();
        store.add_link("C1", "Academy", "A1").unwrap();
        store.add_link("A1", "Academy", "C1").unwrap();

        assert_eq!(linked_ids(&store, "C1", "Academy"), vec!["A1"]);
        assert_eq!(linked_ids(&store, "A1", "Academy"), vec!["C1"]);
    }

    #[test]
    fn test_add_link_unknown_target_leaves_source_untouched() {
        let mut store = contact_graph();

        let err = store.add_link("C1", "Friend", "missing").unwrap_err();
        assert!(matches!(err, Error::UnknownInstance(id) if id.as_str() == "missing"));
        assert!(store.find_by_id("C1").unwrap().get_links("Friend").is_empty());

        let err = store.add_link("missing", "Friend", "C1").unwrap_err();
        assert!(matches!(err, Error::UnknownInstance(_)));
        assert!(store.find_by_id("C1").unwrap().get_links("Friend").is_empty());
    }

    #[test]
    fn test_remove_link_both_directions() {
        let mut store = contact_graph();

        assert!(store.remove_link("A1", "Academy", "C1"));
        assert!(linked_ids(&store, "C1", "Academy").is_empty());
        assert!(linked_ids(&store, "A1", "Academy").is_empty());
        assert_symmetric(&store);
    }

    #[test]
    fn test_remove_missing_link_is_noop() {
        let mut store = contact_graph();

        assert!(!store.remove_link("C1", "Director", "D1"));
        assert!(!store.remove_link("C1", "Academy", "missing"));
        assert!(!store.remove_link("nobody", "Academy", "A1"));

        assert_eq!(linked_ids(&store, "C1", "Academy"), vec!["A1"]);
        assert_symmetric(&store);
    }

    #[test]
    fn test_remove_instance_cascades_every_edge_type() {
        let mut store = contact_graph();
        store.add_instance("C2", ["Contact"], None).unwrap();
        store.add_link("C2", "Mentor", "D1").unwrap();

        store.remove_instance("D1").unwrap();

        assert!(store.find_by_id("D1").is_none());
        assert!(store.find_by_type("Director").is_empty());
        assert!(linked_ids(&store, "A1", "Director").is_empty());
        assert!(linked_ids(&store, "N1", "PersonName").is_empty());
        assert!(linked_ids(&store, "C2", "Mentor").is_empty());
        assert_eq!(store.labels().filter(|l| l.as_str() == "Director").count(), 0);
        assert_symmetric(&store);
    }

    #[test]
    fn test_remove_unknown_instance() {
        let mut store = contact_graph();
        let err = store.remove_instance("D9").unwrap_err();
        assert!(matches!(err, Error::UnknownInstance(_)));
        assert_eq!(store.len(), 4);
    }

    #[test]
    fn test_stale_handle_does_not_resolve_after_reuse() {
        let mut store = contact_graph();
        let old = store.find_by_id("D1").unwrap().handle();

        store.remove_instance("D1").unwrap();
        let new = store.add_instance("D2", ["Director"], None).unwrap();

        assert_eq!(old.index, new.index);
        assert!(store.resolve(old).is_none());
        assert_eq!(store.resolve(new).unwrap().id().as_str(), "D2");
    }

    #[test]
    fn test_self_loop_removed_with_instance() {
        let mut store = GraphStore::new();
        store.add_instance("X", ["Node"], None).unwrap();
        store.add_link("X", "Self", "X").unwrap();

        assert_eq!(linked_ids(&store, "X", "Self"), vec!["X"]);
        store.remove_instance("X").unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_labels_keep_index_consistent() {
        let mut store = contact_graph();

        assert!(store.add_label("D1", "Person").unwrap());
        assert!(!store.add_label("D1", "Person").unwrap());
        assert_eq!(store.ids_of_type("Person"), vec![InstanceId::from("D1")]);

        assert!(store.remove_label("D1", "Director").unwrap());
        assert!(!store.remove_label("D1", "Director").unwrap());
        assert!(store.find_by_type("Director").is_empty());
        assert!(!store.find_by_id("D1").unwrap().has_label("Director"));

        assert!(matches!(
            store.add_label("nobody", "Person"),
            Err(Error::UnknownInstance(_))
        ));
    }

    #[test]
    fn test_find_by_type_preserves_registration_order() {
        let mut store = GraphStore::new();
        for id in ["C3", "C1", "C2"] {
            store.add_instance(id, ["Contact"], None).unwrap();
        }

        let snapshot = store.ids_of_type("Contact");
        for id in &snapshot {
            store.remove_instance(id.as_str()).unwrap();
        }

        let ids: Vec<&str> = snapshot.iter().map(InstanceId::as_str).collect();
        assert_eq!(ids, vec!["C3", "C1", "C2"]);
        assert!(store.is_empty());
    }

    #[test]
    fn test_remove_all_links_of_type() {
        let mut store = contact_graph();
        store.add_instance("A2", ["Academy"], None).unwrap();
        store.add_link("C1", "Academy", "A2").unwrap();

        assert_eq!(store.remove_all_links("C1", "Academy").unwrap(), 2);
        assert!(linked_ids(&store, "C1", "Academy").is_empty());
        assert!(linked_ids(&store, "A2", "Academy").is_empty());
        assert_eq!(linked_ids(&store, "A1", "Director"), vec!["D1"]);
        assert_eq!(store.remove_all_links("C1", "Academy").unwrap(), 0);
        assert_symmetric(&store);
    }

    #[test]
    fn test_random_edit_sequence_stays_symmetric() {
        let mut store = GraphStore::new();
        let ids = ["a", "b", "c", "d", "e"];
        for id in ids {
            store.add_instance(id, ["Node"], None).unwrap();
        }

        // deterministic pseudo-random walk over add/remove operations
        let mut seed: u32 = 7;
        for _ in 0..200 {
            seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            let from = ids[(seed >> 3) as usize % ids.len()];
            let to = ids[(seed >> 9) as usize % ids.len()];
            let edge_type = if seed & 1 == 0 { "Knows" } else { "Likes" };
            if (seed >> 16) % 3 == 0 {
                store.remove_link(from, edge_type, to);
            } else {
                store.add_link(from, edge_type, to).unwrap();
            }
        }

        assert_symmetric(&store);
        store.remove_instance("c").unwrap();
        assert_symmetric(&store);
        for instance in store.instances() {
            assert!(!linked_ids(&store, instance.id().as_str(), "Knows").contains(&"c".to_string()));
            assert!(!linked_ids(&store, instance.id().as_str(), "Likes").contains(&"c".to_string()));
        }
    }
}
