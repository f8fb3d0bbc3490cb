use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::container::Container;
use crate::error::{BoardError, Result};
use crate::ids::{ContainerId, ItemId};
use crate::item::Item;

/// The trait that all board storage backends implement.
///
/// Saves use optimistic concurrency: a container is written only if the
/// stored version equals `container.version`, after which the stored version
/// is `container.version + 1`. A mismatch is reported as
/// [`BoardError::Conflict`] and nothing is written.
pub trait BoardStore: Send + Sync {
    /// All containers, newest first.
    fn list_containers(&self) -> Result<Vec<Container>>;

    /// Create an empty container with the next free id.
    fn create_container(&self, title: &str) -> Result<Container>;

    /// Get a container by ID.
    fn load_container(&self, id: ContainerId) -> Result<Container>;

    /// Persist a container and its items.
    fn save_container(&self, container: &Container) -> Result<()>;

    /// Persist several containers. Backends that can should write all or
    /// none; the default writes them one at a time.
    fn save_containers(&self, containers: &[&Container]) -> Result<()> {
        for container in containers {
            self.save_container(container)?;
        }
        Ok(())
    }

    /// Delete a container together with its items. Returns what was removed.
    fn delete_container(&self, id: ContainerId) -> Result<Container>;

    /// Find an item by ID regardless of which container lists it.
    fn load_item(&self, id: ItemId) -> Result<Item>;
}

impl<T: BoardStore + ?Sized> BoardStore for Box<T> {
    fn list_containers(&self) -> Result<Vec<Container>> {
        (**self).list_containers()
    }

    fn create_container(&self, title: &str) -> Result<Container> {
        (**self).create_container(title)
    }

    fn load_container(&self, id: ContainerId) -> Result<Container> {
        (**self).load_container(id)
    }

    fn save_container(&self, container: &Container) -> Result<()> {
        (**self).save_container(container)
    }

    fn save_containers(&self, containers: &[&Container]) -> Result<()> {
        (**self).save_containers(containers)
    }

    fn delete_container(&self, id: ContainerId) -> Result<Container> {
        (**self).delete_container(id)
    }

    fn load_item(&self, id: ItemId) -> Result<Item> {
        (**self).load_item(id)
    }
}

/// In-memory store guarded by a single mutex
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    containers: BTreeMap<ContainerId, Container>,
    last_id: u64,
}

impl MemoryState {
    fn check_version(&self, container: &Container) -> Result<()> {
        let stored = self
            .containers
            .get(&container.id)
            .ok_or_else(|| BoardError::container_not_found(container.id))?;
        if stored.version != container.version {
            return Err(BoardError::Conflict {
                container: container.id.to_string(),
                expected: container.version,
                actual: stored.version,
            });
        }
        Ok(())
    }

    fn write(&mut self, container: &Container) {
        let mut stored = container.clone();
        stored.version = container.version + 1;
        self.containers.insert(stored.id, stored);
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BoardStore for MemoryStore {
    fn list_containers(&self) -> Result<Vec<Container>> {
        let state = self.state.lock()?;
        Ok(state.containers.values().rev().cloned().collect())
    }

    fn create_container(&self, title: &str) -> Result<Container> {
        let mut state = self.state.lock()?;
        let id = ContainerId(state.last_id).next();
        let container = Container::new(id, title)?;
        state.last_id = id.0;
        state.containers.insert(id, container.clone());
        tracing::debug!(container = %id, "created container in memory");
        Ok(container)
    }

    fn load_container(&self, id: ContainerId) -> Result<Container> {
        let state = self.state.lock()?;
        state
            .containers
            .get(&id)
            .cloned()
            .ok_or_else(|| BoardError::container_not_found(id))
    }

    fn save_container(&self, container: &Container) -> Result<()> {
        let mut state = self.state.lock()?;
        state.check_version(container)?;
        state.write(container);
        Ok(())
    }

    fn save_containers(&self, containers: &[&Container]) -> Result<()> {
        let mut state = self.state.lock()?;
        for container in containers {
            state.check_version(container)?;
        }
        for container in containers {
            state.write(container);
        }
        Ok(())
    }

    fn delete_container(&self, id: ContainerId) -> Result<Container> {
        let mut state = self.state.lock()?;
        state
            .containers
            .remove(&id)
            .ok_or_else(|| BoardError::container_not_found(id))
    }

    fn load_item(&self, id: ItemId) -> Result<Item> {
        let state = self.state.lock()?;
        state
            .containers
            .values()
            .find_map(|c| c.tasks.get(id).cloned())
            .ok_or_else(|| BoardError::item_not_found(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_allocates_sequential_ids() {
        let store = MemoryStore::new();
        let a = store.create_container("A").unwrap();
        let b = store.create_container("B").unwrap();
        assert_eq!(a.id, ContainerId(1));
        assert_eq!(b.id, ContainerId(2));

        let listed: Vec<_> = store
            .list_containers()
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(listed, vec![ContainerId(2), ContainerId(1)]);
    }

    #[test]
    fn test_ids_are_not_reused_after_delete() {
        let store = MemoryStore::new();
        let a = store.create_container("A").unwrap();
        store.delete_container(a.id).unwrap();
        let b = store.create_container("B").unwrap();
        assert_eq!(b.id, ContainerId(2));
    }

    #[test]
    fn test_stale_save_conflicts() {
        let store = MemoryStore::new();
        let created = store.create_container("A").unwrap();

        let mut first = store.load_container(created.id).unwrap();
        let second = store.load_container(created.id).unwrap();

        first.rename("A1").unwrap();
        store.save_container(&first).unwrap();

        let err = store.save_container(&second).unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(store.load_container(created.id).unwrap().title, "A1");
        assert_eq!(store.load_container(created.id).unwrap().version, 1);
    }

    #[test]
    fn test_save_containers_is_all_or_nothing() {
        let store = MemoryStore::new();
        let a = store.create_container("A").unwrap();
        let b = store.create_container("B").unwrap();

        let mut stale_b = b.clone();
        stale_b.version = 7;
        let mut renamed_a = a.clone();
        renamed_a.rename("A2").unwrap();

        assert!(store.save_containers(&[&renamed_a, &stale_b]).is_err());
        assert_eq!(store.load_container(a.id).unwrap().title, "A");
    }

    #[test]
    fn test_missing_container_and_item() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.load_container(ContainerId(5)),
            Err(BoardError::NotFound(_))
        ));
        assert!(matches!(
            store.delete_container(ContainerId(5)),
            Err(BoardError::NotFound(_))
        ));
        assert!(matches!(
            store.load_item(ItemId::new()),
            Err(BoardError::NotFound(_))
        ));
    }
}
