use std::sync::Arc;

use flowdeck_core::{FlowdeckError, FlowdeckResult, RequestContext};
use flowdeck_domain::{
    BoardId, EventType, JobAccepted, OutboxEvent, StuckCardReport, Violations,
};
use flowdeck_store::BoardStore;
use serde::Deserialize;
use serde_json::json;

pub const DEFAULT_STUCK_THRESHOLD_DAYS: u32 = 7;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DetectStuckInput {
    /// Days of inactivity before a card counts as stuck. Defaults to
    /// [`DEFAULT_STUCK_THRESHOLD_DAYS`].
    #[serde(default)]
    pub threshold_days: Option<u32>,
}

impl DetectStuckInput {
    pub fn validate(&self) -> FlowdeckResult<()> {
        let mut violations = Violations::new();
        if let Some(days) = self.threshold_days {
            if days == 0 || days > 365 {
                violations.add("threshold_days must be between 1 and 365");
            }
        }
        violations.into_result()
    }
}

/// Stuck-card hygiene: queue detection work, poll for the report.
///
/// Queueing upserts the report as Queued and appends the request event in
/// one transaction; the event id is the job id, so polling and redelivery
/// share one identifier. The caller is never blocked on the worker.
pub struct HygieneService<S> {
    store: Arc<S>,
}

impl<S: BoardStore> HygieneService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn queue_detect_stuck(
        &self,
        ctx: &RequestContext,
        board_id: BoardId,
        input: DetectStuckInput,
    ) -> FlowdeckResult<JobAccepted> {
        ctx.ensure_can_write()?;
        input.validate()?;

        let board = match self.store.find_board_by_id(board_id).await? {
            Some(board) if board.org_id == ctx.org_id => board,
            _ => return Err(FlowdeckError::not_found("board", board_id)),
        };

        let threshold_days = input
            .threshold_days
            .unwrap_or(DEFAULT_STUCK_THRESHOLD_DAYS);
        let report = StuckCardReport::queued(board.id, ctx.org_id, threshold_days);
        let event = OutboxEvent::with_id(
            report.job_id,
            EventType::HygieneDetectStuckRequested,
            ctx.org_id,
            board.id,
            json!({
                "jobId": report.job_id,
                "boardId": board.id,
                "actorId": ctx.user_id,
                "thresholdDays": threshold_days,
                "asOf": report.queued_at,
            }),
        );

        let accepted = JobAccepted {
            job_id: report.job_id,
            event_type: event.event_type,
            status: report.status,
            queued_at: report.queued_at,
        };

        self.store
            .run_in_transaction(move |tx| {
                Box::pin(async move {
                    tx.upsert_stuck_report(report).await?;
                    tx.append_outbox(event).await?;
                    Ok(())
                })
            })
            .await?;

        tracing::info!(
            "Queued stuck-card detection {} for board {}",
            accepted.job_id,
            board_id
        );
        Ok(accepted)
    }

    /// Poll the report for a board. Readable by any org member; raises
    /// NotFound if detection was never queued for this board. Terminal
    /// reports are structurally checked before being returned.
    pub async fn get_stuck_report(
        &self,
        ctx: &RequestContext,
        board_id: BoardId,
    ) -> FlowdeckResult<StuckCardReport> {
        match self.store.find_stuck_report_by_board_id(board_id).await? {
            Some(report) if report.org_id == ctx.org_id => {
                report.ensure_well_formed()?;
                Ok(report)
            }
            _ => Err(FlowdeckError::not_found("stuck-card report for board", board_id)),
        }
    }
}
