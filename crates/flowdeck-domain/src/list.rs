use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::board::{BoardId, OrgId};

pub type ListId = Uuid;

/// A column within a board. The position is the ordering key among the
/// board's lists; ascending sort by position gives display order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct List {
    pub id: ListId,
    pub board_id: BoardId,
    pub org_id: OrgId,
    pub title: String,
    pub position: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl List {
    pub fn new(org_id: OrgId, board_id: BoardId, title: String, position: f64) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            board_id,
            org_id,
            title,
            position,
            created_at: now,
            updated_at: now,
        }
    }
}
