//! Request-facing facade over a [`BoardStore`]
//!
//! Each call loads the container(s) it needs, applies one collection
//! operation, and saves the result. Nothing here retries: a
//! [`BoardError::Conflict`] goes back to the caller.

use tracing::{debug, info};

use crate::config::ItemConfig;
use crate::container::Container;
use crate::error::{BoardError, Result};
use crate::ids::{ContainerId, IdAllocator, ItemId, RandomIds};
use crate::item::{title_required, Item, ItemDraft, ItemPatch, NewItem, DEFAULT_DATE_FORMAT};
use crate::mover::{CrossContainerMover, MoveOutcome};
use crate::store::BoardStore;

/// A container together with the item an operation touched
#[derive(Debug, Clone)]
pub struct ItemChange {
    pub container: Container,
    pub item: Item,
}

/// Board operations backed by a store
pub struct BoardService<S: BoardStore> {
    store: S,
    ids: Box<dyn IdAllocator>,
    date_format: String,
}

impl<S: BoardStore> BoardService<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            ids: Box::new(RandomIds),
            date_format: DEFAULT_DATE_FORMAT.to_string(),
        }
    }

    pub fn with_config(store: S, items: &ItemConfig) -> Self {
        Self {
            date_format: items.date_format.clone(),
            ..Self::new(store)
        }
    }

    /// Replace the id allocator used for new items
    pub fn with_id_allocator(mut self, ids: impl IdAllocator + 'static) -> Self {
        self.ids = Box::new(ids);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // ==================== Container Operations ====================

    pub fn list_containers(&self) -> Result<Vec<Container>> {
        self.store.list_containers()
    }

    pub fn create_container(&self, title: &str) -> Result<Container> {
        let container = self.store.create_container(title)?;
        info!(container = %container.id, title = %container.title, "created container");
        Ok(container)
    }

    pub fn get_container(&self, id: ContainerId) -> Result<Container> {
        self.store.load_container(id)
    }

    /// Bulk update: optionally rename, optionally replace every task.
    ///
    /// `tasks: None` keeps the current tasks. Positions supplied in the
    /// drafts are stored as given; call [`reindex`](Self::reindex) to
    /// restore density. A draft may not reuse the id of an item listed on a
    /// different container.
    pub fn replace_container(
        &self,
        id: ContainerId,
        title: Option<&str>,
        tasks: Option<Vec<ItemDraft>>,
    ) -> Result<Container> {
        let mut container = self.store.load_container(id)?;

        if let Some(title) = title {
            container.rename(title)?;
        }

        if let Some(drafts) = tasks {
            for item_id in drafts.iter().filter_map(|d| d.id) {
                self.ensure_not_elsewhere(&container, item_id)?;
            }
            let count = drafts.len();
            container
                .tasks
                .replace_all(drafts, &*self.ids, &self.date_format)?;
            container.touch();
            debug!(container = %id, count, "replaced tasks");
        }

        self.commit(&mut container)?;
        Ok(container)
    }

    pub fn delete_container(&self, id: ContainerId) -> Result<Container> {
        let removed = self.store.delete_container(id)?;
        info!(
            container = %id,
            tasks = removed.tasks.len(),
            "deleted container and its tasks"
        );
        Ok(removed)
    }

    /// Renumber a container's tasks to `0..n`
    pub fn reindex(&self, id: ContainerId) -> Result<Container> {
        let mut container = self.store.load_container(id)?;
        container.tasks.reindex();
        container.touch();
        self.commit(&mut container)?;
        Ok(container)
    }

    // ==================== Item Operations ====================

    /// Create an item and insert it at `new.position` (appended if absent)
    pub fn add_item(&self, container_id: ContainerId, new: NewItem) -> Result<ItemChange> {
        let mut container = self.store.load_container(container_id)?;
        let at = new.position;
        let item = new.into_item(self.ids.allocate(), container_id, &self.date_format)?;
        let item = container.tasks.insert(item, at).clone();
        container.touch();
        self.commit(&mut container)?;

        info!(container = %container_id, item = %item.id, position = item.position, "added item");
        Ok(ItemChange { container, item })
    }

    /// Apply a client edit to one item. Every edit restates the title;
    /// one that leaves it out is rejected like a blank one.
    pub fn update_item(
        &self,
        container_id: ContainerId,
        item_id: ItemId,
        patch: ItemPatch,
    ) -> Result<ItemChange> {
        if patch.title.is_unchanged() {
            return Err(title_required());
        }
        let mut container = self.store.load_container(container_id)?;
        let item = container
            .tasks
            .update(item_id, patch, &self.date_format)?
            .clone();
        container.touch();
        self.commit(&mut container)?;

        debug!(container = %container_id, item = %item_id, "updated item");
        Ok(ItemChange { container, item })
    }

    /// Remove an item. Removing an item that is not there succeeds and
    /// leaves the container as it was.
    pub fn remove_item(&self, container_id: ContainerId, item_id: ItemId) -> Result<Container> {
        let mut container = self.store.load_container(container_id)?;
        if container.tasks.remove(item_id).is_none() {
            debug!(container = %container_id, item = %item_id, "remove of absent item ignored");
            return Ok(container);
        }
        container.touch();
        self.commit(&mut container)?;

        info!(container = %container_id, item = %item_id, "removed item");
        Ok(container)
    }

    pub fn move_item(
        &self,
        item_id: ItemId,
        source: ContainerId,
        destination: ContainerId,
        position: usize,
    ) -> Result<MoveOutcome> {
        CrossContainerMover::new(&self.store).move_item(item_id, source, destination, position)
    }

    fn ensure_not_elsewhere(&self, container: &Container, item_id: ItemId) -> Result<()> {
        if container.tasks.contains(item_id) {
            return Ok(());
        }
        match self.store.load_item(item_id) {
            Ok(existing) => Err(BoardError::InvalidArgument(format!(
                "item {} is listed under container {}",
                item_id, existing.container_id
            ))),
            Err(BoardError::NotFound(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }

    fn commit(&self, container: &mut Container) -> Result<()> {
        self.store.save_container(container)?;
        container.version += 1;
        Ok(())
    }
}
