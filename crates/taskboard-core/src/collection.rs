//! Dense ordering over the items of one container
//!
//! After every single-item mutation and after [`OrderedCollection::reindex`],
//! item positions are exactly `0..len` with no gaps or duplicates, and the
//! backing vector is stored in position order. [`OrderedCollection::replace_all`]
//! is the one operation that may leave gaps or ties; readers go through
//! [`OrderedCollection::read_ordered`], which always sorts.

use chrono::Utc;
use serde::{Serialize, Serializer};

use crate::error::{BoardError, Result};
use crate::ids::{ContainerId, IdAllocator, ItemId};
use crate::item::{date_label, Item, ItemDraft, ItemPatch, TagList};

/// The ordered items of a single container
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedCollection {
    container_id: ContainerId,
    items: Vec<Item>,
}

impl OrderedCollection {
    /// An empty collection for the given container
    pub fn new(container_id: ContainerId) -> Self {
        Self {
            container_id,
            items: Vec::new(),
        }
    }

    /// Wrap items exactly as stored. No reindexing happens here.
    pub fn from_items(container_id: ContainerId, items: Vec<Item>) -> Self {
        Self {
            container_id,
            items,
        }
    }

    pub fn container_id(&self) -> ContainerId {
        self.container_id
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: ItemId) -> Option<&Item> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.index_of(id).is_some()
    }

    /// Items in storage order, which may differ from position order after
    /// a bulk replacement
    pub fn iter(&self) -> std::slice::Iter<'_, Item> {
        self.items.iter()
    }

    /// Items sorted ascending by position. Ties keep storage order.
    pub fn read_ordered(&self) -> impl Iterator<Item = &Item> + '_ {
        let mut ordered: Vec<&Item> = self.items.iter().collect();
        ordered.sort_by_key(|item| item.position);
        ordered.into_iter()
    }

    /// Whether positions form exactly `0..len`
    pub fn is_dense(&self) -> bool {
        self.read_ordered()
            .enumerate()
            .all(|(index, item)| item.position == index)
    }

    /// Insert an item, appending when `at` is `None` or past the end.
    ///
    /// Items at or after the insertion point shift up by one. The item is
    /// rebound to this container.
    pub fn insert(&mut self, mut item: Item, at: Option<usize>) -> &Item {
        self.reindex();

        let len = self.items.len();
        let at = at.map_or(len, |position| position.min(len));

        for existing in self.items.iter_mut().filter(|i| i.position >= at) {
            existing.place(existing.position + 1);
            existing.touch();
        }

        item.container_id = self.container_id;
        item.place(at);
        item.touch();
        self.items.insert(at, item);
        &self.items[at]
    }

    /// Replace the whole sequence from client drafts.
    ///
    /// Missing ids are allocated, missing fields take their defaults, and a
    /// missing position or sort order falls back to the draft's index.
    /// Supplied positions are trusted as-is, so the result may have gaps or
    /// ties until the next [`reindex`](Self::reindex). A position or sort
    /// order too large for a signed 64-bit column is rejected.
    pub fn replace_all(
        &mut self,
        drafts: Vec<ItemDraft>,
        ids: &dyn IdAllocator,
        date_format: &str,
    ) -> Result<()> {
        let mut seen = std::collections::HashSet::new();
        for id in drafts.iter().filter_map(|d| d.id) {
            if !seen.insert(id) {
                return Err(BoardError::InvalidArgument(format!(
                    "item {} appears more than once",
                    id
                )));
            }
        }
        for draft in &drafts {
            for position in [draft.position, draft.sort_order].into_iter().flatten() {
                ensure_storable(position)?;
            }
        }

        let now = Utc::now();
        let container_id = self.container_id;
        self.items = drafts
            .into_iter()
            .enumerate()
            .map(|(index, draft)| Item {
                id: draft.id.unwrap_or_else(|| ids.allocate()),
                container_id,
                title: draft.title.map(|t| t.trim().to_string()).unwrap_or_default(),
                description: draft.description.unwrap_or_default(),
                date: draft.date.unwrap_or_else(|| date_label(now, date_format)),
                tags: draft.tags.map(TagList::into_tags).unwrap_or_default(),
                flag: draft.flag.unwrap_or(false),
                position: draft.position.unwrap_or(index),
                sort_order: draft.sort_order.unwrap_or(index),
                updated_at: now,
            })
            .collect();
        Ok(())
    }

    /// Merge a patch into one item.
    ///
    /// Position only changes when the patch carries one; the item is then
    /// moved there the same way a remove followed by an insert would.
    pub fn update(&mut self, id: ItemId, patch: ItemPatch, date_format: &str) -> Result<&Item> {
        let index = self
            .index_of(id)
            .ok_or_else(|| BoardError::item_not_found(id))?;

        let reposition = patch.position;
        self.items[index].apply_patch(patch, date_format)?;

        match reposition {
            Some(target) => {
                let item = self.items.remove(index);
                self.reindex();
                Ok(self.insert(item, Some(target)))
            }
            None => Ok(&self.items[index]),
        }
    }

    /// Remove an item and close the gap it leaves.
    ///
    /// Unknown ids are a no-op and return `None`, so retries are harmless.
    pub fn remove(&mut self, id: ItemId) -> Option<Item> {
        let index = self.index_of(id)?;
        let removed = self.items.remove(index);
        self.reindex();
        Some(removed)
    }

    /// Renumber to `0..len` by current position, keeping storage order for ties.
    pub fn reindex(&mut self) {
        self.items.sort_by_key(|item| item.position);
        for (index, item) in self.items.iter_mut().enumerate() {
            if item.position != index || item.sort_order != index {
                item.place(index);
                item.touch();
            }
        }
    }

    fn index_of(&self, id: ItemId) -> Option<usize> {
        self.items.iter().position(|item| item.id == id)
    }
}

/// Positions are persisted as `INTEGER`, i.e. `i64`. Inserts clamp to the
/// length, so only caller-supplied bulk positions need this.
fn ensure_storable(position: usize) -> Result<()> {
    if i64::try_from(position).is_err() {
        return Err(BoardError::InvalidArgument(format!(
            "position {} is out of range",
            position
        )));
    }
    Ok(())
}

impl Serialize for OrderedCollection {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.read_ordered())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SequentialIds;
    use crate::item::DEFAULT_DATE_FORMAT;
    use crate::patch::Patch;

    const BOARD: ContainerId = ContainerId(1);

    fn collection(titles: &[&str]) -> OrderedCollection {
        let ids = SequentialIds::new();
        let mut c = OrderedCollection::new(BOARD);
        for title in titles {
            c.insert(Item::new(ids.allocate(), BOARD, *title), None);
        }
        c
    }

    fn layout(c: &OrderedCollection) -> Vec<String> {
        c.read_ordered()
            .map(|i| format!("{}@{}", i.title, i.position))
            .collect()
    }

    fn id_of(c: &OrderedCollection, title: &str) -> ItemId {
        c.iter().find(|i| i.title == title).unwrap().id
    }

    #[test]
    fn test_append_assigns_next_position() {
        let c = collection(&["a", "b", "c"]);
        assert_eq!(
            layout(&c),
            vec!["a@0", "b@1", "c@2"]
        );
        assert!(c.iter().all(|i| i.sort_order == i.position));
    }

    #[test]
    fn test_insert_in_middle_shifts_followers() {
        let mut c = collection(&["a", "b", "c"]);
        c.insert(Item::new(ItemId::new(), BOARD, "x"), Some(1));
        assert_eq!(
            layout(&c),
            vec!["a@0", "x@1", "b@2", "c@3"]
        );
    }

    #[test]
    fn test_insert_past_end_clamps_to_append() {
        let mut c = collection(&["a"]);
        let item = c.insert(Item::new(ItemId::new(), BOARD, "z"), Some(99));
        assert_eq!(item.position, 1);
        assert!(c.is_dense());
    }

    #[test]
    fn test_insert_rebinds_container() {
        let mut c = collection(&[]);
        let item = c.insert(Item::new(ItemId::new(), ContainerId(9), "moved"), None);
        assert_eq!(item.container_id, BOARD);
    }

    #[test]
    fn test_remove_closes_gap() {
        let mut c = collection(&["a", "b", "c"]);
        let b = id_of(&c, "b");
        assert!(c.remove(b).is_some());
        assert_eq!(layout(&c), vec!["a@0", "c@1"]);
    }

    #[test]
    fn test_remove_unknown_is_noop() {
        let mut c = collection(&["a", "b"]);
        let before = c.clone();
        assert!(c.remove(ItemId::new()).is_none());
        assert_eq!(c, before);
    }

    #[test]
    fn test_update_merges_without_moving() {
        let mut c = collection(&["a", "b"]);
        let b = id_of(&c, "b");
        let patch = ItemPatch {
            description: Patch::Set("details".into()),
            ..Default::default()
        };
        let item = c.update(b, patch, DEFAULT_DATE_FORMAT).unwrap();
        assert_eq!(item.description, "details");
        assert_eq!(item.position, 1);
        assert_eq!(item.title, "b");
    }

    #[test]
    fn test_update_with_position_repositions() {
        let mut c = collection(&["a", "b", "c"]);
        let c_id = id_of(&c, "c");
        let patch = ItemPatch {
            position: Some(0),
            ..Default::default()
        };
        c.update(c_id, patch, DEFAULT_DATE_FORMAT).unwrap();
        assert_eq!(
            layout(&c),
            vec!["c@0", "a@1", "b@2"]
        );
    }

    #[test]
    fn test_update_unknown_item_is_not_found() {
        let mut c = collection(&["a"]);
        let err = c
            .update(ItemId::new(), ItemPatch::title("x"), DEFAULT_DATE_FORMAT)
            .unwrap_err();
        assert!(matches!(err, BoardError::NotFound(_)));
    }

    #[test]
    fn test_replace_all_trusts_supplied_positions() {
        let mut c = collection(&[]);
        let drafts = vec![
            ItemDraft {
                title: Some("second".into()),
                position: Some(5),
                ..Default::default()
            },
            ItemDraft {
                title: Some("first".into()),
                position: Some(2),
                ..Default::default()
            },
            ItemDraft {
                title: Some("by-index".into()),
                ..Default::default()
            },
        ];
        c.replace_all(drafts, &SequentialIds::new(), DEFAULT_DATE_FORMAT)
            .unwrap();

        // storage order is the supplied order
        let stored: Vec<_> = c.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(stored, vec!["second", "first", "by-index"]);
        assert_eq!(
            layout(&c),
            vec!["first@2", "by-index@2", "second@5"]
        );
        assert!(!c.is_dense());

        c.reindex();
        assert_eq!(
            layout(&c),
            vec!["first@0", "by-index@1", "second@2"]
        );
        assert!(c.iter().all(|i| i.sort_order == i.position));
    }

    #[test]
    fn test_replace_all_rejects_duplicate_ids() {
        let mut c = collection(&["keep"]);
        let id = ItemId::new();
        let drafts = vec![
            ItemDraft {
                id: Some(id),
                ..Default::default()
            },
            ItemDraft {
                id: Some(id),
                ..Default::default()
            },
        ];
        let before = c.clone();
        assert!(c
            .replace_all(drafts, &SequentialIds::new(), DEFAULT_DATE_FORMAT)
            .is_err());
        assert_eq!(c, before);
    }

    #[test]
    fn test_replace_all_rejects_unstorable_positions() {
        let mut c = collection(&["keep"]);
        let before = c.clone();
        for draft in [
            ItemDraft {
                position: Some(usize::MAX),
                ..Default::default()
            },
            ItemDraft {
                sort_order: Some(usize::MAX),
                ..Default::default()
            },
        ] {
            let err = c
                .replace_all(vec![draft], &SequentialIds::new(), DEFAULT_DATE_FORMAT)
                .unwrap_err();
            assert!(matches!(err, BoardError::InvalidArgument(_)));
        }
        assert_eq!(c, before);
    }

    #[test]
    fn test_huge_insert_position_clamps() {
        let mut c = collection(&["a", "b"]);
        let item = c.insert(Item::new(ItemId::new(), BOARD, "z"), Some(usize::MAX));
        assert_eq!(item.position, 2);
    }

    #[test]
    fn test_reindex_ties_keep_storage_order() {
        let mut items: Vec<Item> = ["p", "q", "r"]
            .iter()
            .map(|t| Item::new(ItemId::new(), BOARD, *t))
            .collect();
        items[0].position = 3;
        items[1].position = 1;
        items[2].position = 1;
        let mut c = OrderedCollection::from_items(BOARD, items);
        c.reindex();
        assert_eq!(
            layout(&c),
            vec!["q@0", "r@1", "p@2"]
        );
    }

    #[test]
    fn test_serializes_in_position_order() {
        let mut c = collection(&[]);
        let drafts = vec![
            ItemDraft {
                title: Some("late".into()),
                position: Some(1),
                ..Default::default()
            },
            ItemDraft {
                title: Some("early".into()),
                position: Some(0),
                ..Default::default()
            },
        ];
        c.replace_all(drafts, &SequentialIds::new(), DEFAULT_DATE_FORMAT)
            .unwrap();
        let json = serde_json::to_value(&c).unwrap();
        assert_eq!(json[0]["title"], "early");
        assert_eq!(json[1]["title"], "late");
    }
}
