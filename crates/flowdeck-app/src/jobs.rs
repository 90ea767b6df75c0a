use std::sync::Arc;

use flowdeck_core::{FlowdeckError, FlowdeckResult, RequestContext};
use flowdeck_domain::{CardId, EventType, JobAccepted, JobStatus, OutboxEvent};
use flowdeck_store::BoardStore;
use serde_json::json;
use uuid::Uuid;

/// Fire-and-forget AI jobs on cards: cover generation and summarization.
///
/// Same queueing pattern as hygiene detection, minus a polled result
/// record — the acceptance payload is the whole synchronous surface, and
/// workers report through their own channels. The event id is the job id.
pub struct JobService<S> {
    store: Arc<S>,
}

impl<S: BoardStore> JobService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Queue the first stage of cover generation. The worker that builds
    /// the cover spec requests rendering with a follow-up
    /// `cover.render.requested` event.
    pub async fn queue_generate_cover(
        &self,
        ctx: &RequestContext,
        card_id: CardId,
    ) -> FlowdeckResult<JobAccepted> {
        self.queue_card_job(ctx, card_id, EventType::CoverGenerateSpecRequested)
            .await
    }

    pub async fn queue_summarize_card(
        &self,
        ctx: &RequestContext,
        card_id: CardId,
    ) -> FlowdeckResult<JobAccepted> {
        self.queue_card_job(ctx, card_id, EventType::CardSummarizeRequested)
            .await
    }

    async fn queue_card_job(
        &self,
        ctx: &RequestContext,
        card_id: CardId,
        event_type: EventType,
    ) -> FlowdeckResult<JobAccepted> {
        ctx.ensure_can_write()?;

        let card = match self.store.find_card_by_id(card_id).await? {
            Some(card) if card.org_id == ctx.org_id => card,
            _ => return Err(FlowdeckError::not_found("card", card_id)),
        };

        let job_id = Uuid::new_v4();
        let event = OutboxEvent::with_id(
            job_id,
            event_type,
            ctx.org_id,
            card.board_id,
            json!({
                "jobId": job_id,
                "cardId": card.id,
                "boardId": card.board_id,
                "actorId": ctx.user_id,
            }),
        );
        let queued_at = event.created_at;

        self.store
            .run_in_transaction(move |tx| {
                Box::pin(async move { tx.append_outbox(event).await })
            })
            .await?;

        tracing::info!("Queued {} job {} for card {}", event_type, job_id, card_id);
        Ok(JobAccepted {
            job_id,
            event_type,
            status: JobStatus::Queued,
            queued_at,
        })
    }
}
