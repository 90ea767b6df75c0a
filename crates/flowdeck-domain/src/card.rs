use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::board::{BoardId, OrgId};
use crate::list::ListId;
use crate::patch::Patch;

pub type CardId = Uuid;

/// Unit of work. Belongs to exactly one list at a time; the position
/// defines total order within that list (ascending sort).
///
/// The version is bumped by exactly 1 on every successful mutation and is
/// the compare-and-swap key for optimistic concurrency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub list_id: ListId,
    pub board_id: BoardId,
    pub org_id: OrgId,
    pub title: String,
    pub description: Option<String>,
    pub position: f64,
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Content changes for a card. Both fields optional; an update with
/// neither is rejected upstream as a validation failure.
#[derive(Debug, Clone, Default)]
pub struct CardChanges {
    pub title: Option<String>,
    pub description: Patch<String>,
}

impl CardChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && !self.description.is_change()
    }
}

impl Card {
    pub fn new(
        org_id: OrgId,
        board_id: BoardId,
        list_id: ListId,
        title: String,
        position: f64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            list_id,
            board_id,
            org_id,
            title,
            description: None,
            position,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply content changes, bumping the version by exactly 1.
    pub fn apply(&mut self, changes: CardChanges) {
        if let Some(title) = changes.title {
            self.title = title;
        }
        changes.description.apply_to(&mut self.description);
        self.version += 1;
        self.updated_at = Utc::now();
    }

    /// Move the card to a list at the given position, bumping the version
    /// by exactly 1. The position is persisted verbatim; computing it is
    /// the caller's job (see `position`).
    pub fn relocate(&mut self, list_id: ListId, position: f64) {
        self.list_id = list_id;
        self.position = position;
        self.version += 1;
        self.updated_at = Utc::now();
    }
}
