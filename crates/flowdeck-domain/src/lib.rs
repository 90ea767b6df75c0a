pub mod board;
pub mod card;
pub mod grounding;
pub mod job;
pub mod list;
pub mod outbox;
pub mod patch;
pub mod position;
pub mod validate;

pub use board::{Board, BoardId, OrgId};
pub use card::{Card, CardChanges, CardId};
pub use grounding::{
    AnswerLimits, ContextChunk, GroundedAnswer, RawAnswer, RawCitation, SourceRef, SourceType,
};
pub use job::{JobAccepted, JobId, JobStatus, StuckCard, StuckCardReport};
pub use list::{List, ListId};
pub use outbox::{EventId, EventType, OutboxEvent};
pub use patch::Patch;
pub use validate::Violations;
