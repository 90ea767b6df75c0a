use chrono::{DateTime, Utc};
use flowdeck_core::{FlowdeckError, FlowdeckResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::board::{BoardId, OrgId};
use crate::card::CardId;
use crate::list::ListId;
use crate::outbox::EventType;

pub type JobId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    /// Completed and Failed are the only statuses a poller may stop on.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// Synchronous acceptance payload returned when work is queued. The caller
/// polls later using `job_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobAccepted {
    pub job_id: JobId,
    pub event_type: EventType,
    pub status: JobStatus,
    pub queued_at: DateTime<Utc>,
}

/// One card flagged by hygiene detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StuckCard {
    pub card_id: CardId,
    pub list_id: ListId,
    pub title: String,
    pub idle_days: i64,
}

/// Result of a stuck-card detection job, keyed by board.
///
/// Created as Queued at command time and moved to a terminal status by the
/// worker exactly once. A Completed report carries the card list; a Failed
/// one carries a reason. That pairing is a structural invariant checked by
/// [`StuckCardReport::ensure_well_formed`], not a convention.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StuckCardReport {
    pub job_id: JobId,
    pub board_id: BoardId,
    pub org_id: OrgId,
    pub status: JobStatus,
    pub threshold_days: u32,
    pub report: Option<Vec<StuckCard>>,
    pub failure_reason: Option<String>,
    pub queued_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StuckCardReport {
    pub fn queued(board_id: BoardId, org_id: OrgId, threshold_days: u32) -> Self {
        let now = Utc::now();
        Self {
            job_id: Uuid::new_v4(),
            board_id,
            org_id,
            status: JobStatus::Queued,
            threshold_days,
            report: None,
            failure_reason: None,
            queued_at: now,
            updated_at: now,
        }
    }

    pub fn complete(&mut self, cards: Vec<StuckCard>) {
        self.status = JobStatus::Completed;
        self.report = Some(cards);
        self.failure_reason = None;
        self.updated_at = Utc::now();
    }

    pub fn fail(&mut self, reason: String) {
        self.status = JobStatus::Failed;
        self.report = None;
        self.failure_reason = Some(reason);
        self.updated_at = Utc::now();
    }

    /// Enforce the terminal-status invariant at the read boundary.
    pub fn ensure_well_formed(&self) -> FlowdeckResult<()> {
        match self.status {
            JobStatus::Completed if self.report.is_none() => Err(FlowdeckError::Internal(format!(
                "completed report {} is missing its card list",
                self.job_id
            ))),
            JobStatus::Failed if self.failure_reason.is_none() => {
                Err(FlowdeckError::Internal(format!(
                    "failed report {} is missing its failure reason",
                    self.job_id
                )))
            }
            _ => Ok(()),
        }
    }
}
