//! Item (task) domain model
//!
//! An item is a single unit of work listed on exactly one container. Its
//! `container_id` mirrors the container it is physically listed under; the
//! container's sequence is the source of truth for containment.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{BoardError, Result};
use crate::ids::{ContainerId, ItemId};
use crate::patch::Patch;

/// Default format for an item's creation-date label, e.g. `07 Mar, 2025`
pub const DEFAULT_DATE_FORMAT: &str = "%d %b, %Y";

/// A task on a board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    /// Unique identifier
    pub id: ItemId,
    /// Container this item is listed under
    #[serde(rename = "projectId")]
    pub container_id: ContainerId,
    /// Human-readable title
    pub title: String,
    /// Free-text description
    pub description: String,
    /// Creation-date label
    pub date: String,
    /// Tags for categorization
    pub tags: Vec<String>,
    /// Whether the task carries an image
    #[serde(rename = "image")]
    pub flag: bool,
    /// Zero-based rank within the container
    pub position: usize,
    /// Mirrors `position`; kept for clients that still sort by it
    pub sort_order: usize,
    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

impl Item {
    /// Create an item with default fields, not yet placed anywhere
    pub fn new(id: ItemId, container_id: ContainerId, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            container_id,
            title: title.into(),
            description: String::new(),
            date: date_label(now, DEFAULT_DATE_FORMAT),
            tags: Vec::new(),
            flag: false,
            position: 0,
            sort_order: 0,
            updated_at: now,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    /// Set position and its mirror in one step
    pub(crate) fn place(&mut self, position: usize) {
        self.position = position;
        self.sort_order = position;
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Merge a patch into this item. Position is left to the caller.
    ///
    /// Fails without touching the item if the patch would leave it untitled.
    pub fn apply_patch(&mut self, patch: ItemPatch, date_format: &str) -> Result<()> {
        let title = match patch.title {
            Patch::Unchanged => None,
            Patch::Clear => return Err(title_required()),
            Patch::Set(title) => Some(require_title(&title)?),
        };

        if let Some(title) = title {
            self.title = title;
        }
        self.description = patch
            .description
            .map(|d| d.trim().to_string())
            .apply(std::mem::take(&mut self.description), String::new);
        self.date = patch
            .date
            .apply(std::mem::take(&mut self.date), || {
                date_label(Utc::now(), date_format)
            });
        self.tags = patch
            .tags
            .map(TagList::into_tags)
            .apply(std::mem::take(&mut self.tags), Vec::new);
        self.flag = patch.flag.apply(self.flag, || false);
        self.touch();
        Ok(())
    }
}

/// Tags as clients send them: a list, or one comma-separated string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagList {
    List(Vec<String>),
    Csv(String),
}

impl TagList {
    /// Normalize to trimmed, non-empty tags
    pub fn into_tags(self) -> Vec<String> {
        match self {
            TagList::List(tags) => normalize_tags(tags.iter().map(String::as_str)),
            TagList::Csv(csv) => normalize_tags(csv.split(',')),
        }
    }
}

impl From<Vec<String>> for TagList {
    fn from(tags: Vec<String>) -> Self {
        TagList::List(tags)
    }
}

impl From<&str> for TagList {
    fn from(csv: &str) -> Self {
        TagList::Csv(csv.to_string())
    }
}

fn normalize_tags<'a>(raw: impl Iterator<Item = &'a str>) -> Vec<String> {
    raw.map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

/// Input for inserting a single item
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewItem {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Option<TagList>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default, rename = "image")]
    pub flag: Option<bool>,
    /// Where to insert; appended when absent
    #[serde(default)]
    pub position: Option<usize>,
}

impl NewItem {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn at(mut self, position: usize) -> Self {
        self.position = Some(position);
        self
    }

    /// Validate and build the item. Placement happens on insert.
    pub fn into_item(
        self,
        id: ItemId,
        container_id: ContainerId,
        date_format: &str,
    ) -> Result<Item> {
        let title = require_title(&self.title)?;
        let now = Utc::now();
        Ok(Item {
            id,
            container_id,
            title,
            description: self
                .description
                .map(|d| d.trim().to_string())
                .unwrap_or_default(),
            date: self.date.unwrap_or_else(|| date_label(now, date_format)),
            tags: self.tags.map(TagList::into_tags).unwrap_or_default(),
            flag: self.flag.unwrap_or(false),
            position: 0,
            sort_order: 0,
            updated_at: now,
        })
    }
}

/// One entry of a bulk replacement; every field is optional
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDraft {
    #[serde(default)]
    pub id: Option<ItemId>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub tags: Option<TagList>,
    #[serde(default, rename = "image")]
    pub flag: Option<bool>,
    #[serde(default)]
    pub position: Option<usize>,
    #[serde(default)]
    pub sort_order: Option<usize>,
}

/// Partial update of an item
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ItemPatch {
    pub title: Patch<String>,
    pub description: Patch<String>,
    pub date: Patch<String>,
    pub tags: Patch<TagList>,
    #[serde(rename = "image")]
    pub flag: Patch<bool>,
    /// Reposition the item; `None` leaves it where it is
    pub position: Option<usize>,
}

impl ItemPatch {
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Patch::Set(title.into()),
            ..Default::default()
        }
    }
}

/// Format a creation-date label
pub fn date_label(at: DateTime<Utc>, format: &str) -> String {
    at.format(format).to_string()
}

pub(crate) fn title_required() -> BoardError {
    BoardError::InvalidArgument("title is required".to_string())
}

/// Trim a title, rejecting blank ones
pub(crate) fn require_title(title: &str) -> Result<String> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(title_required());
    }
    Ok(trimmed.to_string())
}
