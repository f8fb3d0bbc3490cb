//! Container (project/board) domain model
//!
//! A container is a titled, ordered list of items. Its `version` is bumped by
//! the store on every successful save and is used to detect concurrent
//! writers.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::collection::OrderedCollection;
use crate::error::Result;
use crate::ids::ContainerId;
use crate::item::require_title;

/// A board and its tasks
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Container {
    /// Unique identifier
    pub id: ContainerId,
    /// Display title
    pub title: String,
    /// Tasks, serialized in position order
    pub tasks: OrderedCollection,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
    /// Store version this copy was loaded at
    pub version: u64,
}

impl Container {
    /// Create an empty container. Fails on a blank title.
    pub fn new(id: ContainerId, title: &str) -> Result<Self> {
        let title = require_title(title)?;
        let now = Utc::now();
        Ok(Self {
            id,
            title,
            tasks: OrderedCollection::new(id),
            created_at: now,
            updated_at: now,
            version: 0,
        })
    }

    /// Change the display title. Fails on a blank title.
    pub fn rename(&mut self, title: &str) -> Result<()> {
        self.title = require_title(title)?;
        self.touch();
        Ok(())
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
