//! Moving items between containers
//!
//! The container's sequence is the source of truth for where an item lives;
//! the item's `container_id` is a cached back-reference. Every function here
//! changes both in the same step.

use crate::container::Container;
use crate::error::{BoardError, Result};
use crate::ids::{ContainerId, ItemId};
use crate::item::Item;
use crate::store::BoardStore;

/// Result of a move. For an in-place reorder `source` and `destination`
/// are the same container.
#[derive(Debug, Clone)]
pub struct MoveOutcome {
    /// The item as placed in the destination
    pub item: Item,
    pub source: Container,
    pub destination: Container,
}

/// Reposition an item inside its own container: remove, then insert at
/// `target` (clamped to the end).
pub fn reorder_within(container: &mut Container, item: Item, target: usize) -> Item {
    container.tasks.remove(item.id);
    let placed = container.tasks.insert(item, Some(target)).clone();
    container.touch();
    placed
}

/// Take an item out of `source` and insert it into `destination` at `target`.
/// Both sequences are dense afterwards and the item points at `destination`.
pub fn transfer(
    source: &mut Container,
    destination: &mut Container,
    item: Item,
    target: usize,
) -> Item {
    source.tasks.remove(item.id);
    source.touch();
    let placed = destination.tasks.insert(item, Some(target)).clone();
    destination.touch();
    placed
}

/// Store-backed mover
pub struct CrossContainerMover<'a, S: BoardStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: BoardStore + ?Sized> CrossContainerMover<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Move `item_id` from `source_id` to `destination_id` at `target`.
    ///
    /// Lookups happen before any mutation: an unknown item, destination or
    /// source fails with `NotFound` and nothing is written. The item must be
    /// listed under `source_id`. Both containers are saved with a single
    /// [`BoardStore::save_containers`] call.
    pub fn move_item(
        &self,
        item_id: ItemId,
        source_id: ContainerId,
        destination_id: ContainerId,
        target: usize,
    ) -> Result<MoveOutcome> {
        let item = self.store.load_item(item_id)?;
        let mut destination = self.store.load_container(destination_id)?;

        if source_id == destination_id {
            ensure_listed(&destination, item_id)?;
            let placed = reorder_within(&mut destination, item, target);
            self.store.save_container(&destination)?;
            destination.version += 1;

            tracing::info!(
                item = %item_id,
                container = %destination_id,
                position = placed.position,
                "reordered item in place"
            );
            return Ok(MoveOutcome {
                item: placed,
                source: destination.clone(),
                destination,
            });
        }

        let mut source = self.store.load_container(source_id)?;
        ensure_listed(&source, item_id)?;

        let placed = transfer(&mut source, &mut destination, item, target);
        self.store.save_containers(&[&source, &destination])?;
        source.version += 1;
        destination.version += 1;

        tracing::info!(
            item = %item_id,
            from = %source_id,
            to = %destination_id,
            position = placed.position,
            "moved item between containers"
        );
        Ok(MoveOutcome {
            item: placed,
            source,
            destination,
        })
    }
}

fn ensure_listed(container: &Container, item_id: ItemId) -> Result<()> {
    if container.tasks.contains(item_id) {
        Ok(())
    } else {
        Err(BoardError::InvalidArgument(format!(
            "item {} is not listed under container {}",
            item_id, container.id
        )))
    }
}
