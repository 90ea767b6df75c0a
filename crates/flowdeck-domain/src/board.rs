use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type BoardId = Uuid;
pub type OrgId = Uuid;

/// Top-level container for lists and cards, owned by one organization.
///
/// Boards are never hard-deleted. The version counter increases on every
/// successful mutation and backs the optimistic concurrency check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Board {
    pub id: BoardId,
    pub org_id: OrgId,
    pub title: String,
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Board {
    pub fn new(org_id: OrgId, title: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            org_id,
            title,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn rename(&mut self, title: String) {
        self.title = title;
        self.version += 1;
        self.updated_at = Utc::now();
    }
}
