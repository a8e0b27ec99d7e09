//! Thread-safe store wrapper
//!
//! Mutations take the write lock; lookups and queries share the read lock, so
//! a query never observes a half-applied mutation.

use crate::error::{Error, Result};
use crate::label::{InstanceId, Label, ScalarValue};
use crate::projection::Projection;
use crate::query::QueryPath;
use crate::store::GraphStore;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Cloneable handle to a store guarded by a read/write lock
#[derive(Debug, Clone, Default)]
pub struct SharedGraphStore {
    inner: Arc<RwLock<GraphStore>>,
}

impl SharedGraphStore {
    pub fn new(store: GraphStore) -> Self {
        Self {
            inner: Arc::new(RwLock::new(store)),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, GraphStore>> {
        self.inner
            .read()
            .map_err(|e| Error::Lock(e.to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, GraphStore>> {
        self.inner
            .write()
            .map_err(|e| Error::Lock(e.to_string()))
    }

    /// Run `f` against the store under the shared lock
    pub fn with_read<R>(&self, f: impl FnOnce(&GraphStore) -> R) -> Result<R> {
        Ok(f(&*self.read()?))
    }

    /// Run `f` against the store under the exclusive lock
    pub fn with_write<R>(&self, f: impl FnOnce(&mut GraphStore) -> R) -> Result<R> {
        Ok(f(&mut *self.write()?))
    }

    pub fn add_instance<L: Into<Label>>(
        &self,
        id: impl Into<InstanceId>,
        labels: impl IntoIterator<Item = L>,
        value: Option<ScalarValue>,
    ) -> Result<()> {
        self.write()?.add_instance(id, labels, value).map(|_| ())
    }

    pub fn remove_instance(&self, id: &str) -> Result<()> {
        self.write()?.remove_instance(id)
    }

    pub fn add_link(&self, from: &str, edge_type: impl Into<Label>, to: &str) -> Result<()> {
        self.write()?.add_link(from, edge_type, to)
    }

    pub fn remove_link(&self, from: &str, edge_type: &str, to: &str) -> Result<bool> {
        Ok(self.write()?.remove_link(from, edge_type, to))
    }

    pub fn ids_of_type(&self, label: &str) -> Result<Vec<InstanceId>> {
        Ok(self.read()?.ids_of_type(label))
    }

    pub fn contains(&self, id: &str) -> Result<bool> {
        Ok(self.read()?.find_by_id(id).is_some())
    }

    pub fn query(&self, path: &QueryPath) -> Result<Vec<Projection>> {
        self.read()?.query(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_concurrent_readers_and_writer() {
        let shared = SharedGraphStore::default();
        shared.add_instance("C1", ["Contact"], None).unwrap();

        let writer = {
            let shared = shared.clone();
            thread::spawn(move || {
                for i in 0..50 {
                    let id = format!("A{}", i);
                    shared.add_instance(id.as_str(), ["Academy"], None).unwrap();
                    shared.add_link("C1", "Academy", &id).unwrap();
                }
            })
        };
        let readers: Vec<_> = (0..4)
            .map(|_| {
                let shared = shared.clone();
                thread::spawn(move || {
                    let path: QueryPath = ["Contact", "Academy"].into_iter().collect();
                    for _ in 0..20 {
                        let roots = shared.query(&path).unwrap();
                        assert_eq!(roots.len(), 1);
                        // every projected academy links back to the contact
                        for academy in roots[0].children("Academy") {
                            let linked = shared
                                .with_read(|store| store.has_link(academy.id.as_str(), "Academy", "C1"))
                                .unwrap();
                            assert!(linked);
                        }
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }

        let path: QueryPath = ["Contact", "Academy"].into_iter().collect();
        assert_eq!(shared.query(&path).unwrap()[0].children("Academy").len(), 50);
        assert_eq!(shared.ids_of_type("Academy").unwrap().len(), 50);
    }

    #[test]
    fn test_with_write_mutates_in_place() {
        let shared = SharedGraphStore::default();
        shared
            .with_write(|store| store.add_instance("X", ["Node"], None).map(|_| ()))
            .unwrap()
            .unwrap();

        assert!(shared.contains("X").unwrap());
        shared.remove_instance("X").unwrap();
        assert!(!shared.contains("X").unwrap());
        assert!(!shared.remove_link("X", "Self", "X").unwrap());
    }
}
