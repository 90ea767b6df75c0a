use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::board::{BoardId, OrgId};

pub type EventId = Uuid;

/// Closed enumeration of outbox event types.
///
/// Serialized as the dotted wire names consumers match on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    #[serde(rename = "board.created")]
    BoardCreated,
    #[serde(rename = "list.created")]
    ListCreated,
    #[serde(rename = "card.created")]
    CardCreated,
    #[serde(rename = "card.updated")]
    CardUpdated,
    #[serde(rename = "card.moved")]
    CardMoved,
    #[serde(rename = "card.summarize.requested")]
    CardSummarizeRequested,
    #[serde(rename = "hygiene.detect-stuck.requested")]
    HygieneDetectStuckRequested,
    #[serde(rename = "cover.generate-spec.requested")]
    CoverGenerateSpecRequested,
    #[serde(rename = "cover.render.requested")]
    CoverRenderRequested,
}

impl EventType {
    pub fn as_str(self) -> &'static str {
        match self {
            EventType::BoardCreated => "board.created",
            EventType::ListCreated => "list.created",
            EventType::CardCreated => "card.created",
            EventType::CardUpdated => "card.updated",
            EventType::CardMoved => "card.moved",
            EventType::CardSummarizeRequested => "card.summarize.requested",
            EventType::HygieneDetectStuckRequested => "hygiene.detect-stuck.requested",
            EventType::CoverGenerateSpecRequested => "cover.generate-spec.requested",
            EventType::CoverRenderRequested => "cover.render.requested",
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Durable record of a state change, appended inside the same transaction
/// as the mutation it describes.
///
/// Append-only; workers read events and acknowledge them, never mutate
/// them. For job-style events the event id doubles as the job id, which is
/// the idempotency key under at-least-once redelivery: a consumer seeing
/// the same id twice treats the second delivery as a no-op.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboxEvent {
    pub id: EventId,
    pub event_type: EventType,
    pub org_id: OrgId,
    pub board_id: BoardId,
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl OutboxEvent {
    pub fn new(
        event_type: EventType,
        org_id: OrgId,
        board_id: BoardId,
        payload: serde_json::Value,
    ) -> Self {
        Self::with_id(Uuid::new_v4(), event_type, org_id, board_id, payload)
    }

    /// Build an event with a caller-chosen id. Job-queueing use-cases pass
    /// the job id here so polling and redelivery share one identifier.
    pub fn with_id(
        id: EventId,
        event_type: EventType,
        org_id: OrgId,
        board_id: BoardId,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            id,
            event_type,
            org_id,
            board_id,
            payload,
            created_at: Utc::now(),
        }
    }
}
