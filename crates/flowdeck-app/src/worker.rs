//! Outbox consumption: a background task drains unconsumed events and
//! dispatches them to handlers.
//!
//! Delivery is at-least-once: an event is acknowledged only after its
//! handler returns Ok, so a crash between handling and acknowledgement
//! redelivers. Handlers must therefore be idempotent; job-style handlers
//! get that from the event-id-as-job-id convention — a job already in a
//! terminal state makes redelivery a no-op.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use flowdeck_core::{FlowdeckError, FlowdeckResult};
use flowdeck_domain::{EventType, OutboxEvent, StuckCard};
use flowdeck_store::BoardStore;

#[async_trait]
pub trait EventHandler: Send + Sync {
    fn event_type(&self) -> EventType;

    async fn handle(&self, event: &OutboxEvent) -> FlowdeckResult<()>;
}

pub struct OutboxDispatcher<S> {
    store: Arc<S>,
    handlers: HashMap<EventType, Arc<dyn EventHandler>>,
    poll_interval: Duration,
    batch_size: usize,
}

impl<S: BoardStore> OutboxDispatcher<S> {
    pub fn new(store: Arc<S>, poll_interval: Duration) -> Self {
        Self {
            store,
            handlers: HashMap::new(),
            poll_interval,
            batch_size: 32,
        }
    }

    pub fn register(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.handlers.insert(handler.event_type(), handler);
        self
    }

    /// Drain one batch. Returns how many events were dispatched to a
    /// handler. Events without a registered handler are acknowledged and
    /// skipped so the queue cannot wedge on them; a failing handler
    /// leaves its event unacknowledged for redelivery.
    pub async fn drain_once(&self) -> FlowdeckResult<usize> {
        let events = self.store.list_unconsumed_outbox(self.batch_size).await?;
        let mut dispatched = 0;

        for event in events {
            match self.handlers.get(&event.event_type) {
                Some(handler) => match handler.handle(&event).await {
                    Ok(()) => {
                        self.store.mark_outbox_consumed(event.id).await?;
                        dispatched += 1;
                    }
                    Err(e) => {
                        tracing::warn!(
                            "Handler for {} failed on event {}: {}",
                            event.event_type,
                            event.id,
                            e
                        );
                    }
                },
                None => {
                    tracing::debug!("No handler for {}, acknowledging event {}", event.event_type, event.id);
                    self.store.mark_outbox_consumed(event.id).await?;
                }
            }
        }
        Ok(dispatched)
    }

    /// Poll forever. Errors are logged and the loop keeps going.
    pub async fn run(&self) {
        let mut interval = tokio::time::interval(self.poll_interval);
        loop {
            interval.tick().await;
            if let Err(e) = self.drain_once().await {
                tracing::error!("Outbox drain failed: {}", e);
            }
        }
    }
}

/// Worker side of stuck-card hygiene: computes which of the board's cards
/// have sat untouched past the report's threshold and writes the terminal
/// report.
pub struct DetectStuckHandler<S> {
    store: Arc<S>,
}

impl<S: BoardStore> DetectStuckHandler<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    fn as_of(event: &OutboxEvent) -> DateTime<Utc> {
        event
            .payload
            .get("asOf")
            .and_then(|v| v.as_str())
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|d| d.with_timezone(&Utc))
            .unwrap_or_else(Utc::now)
    }
}

#[async_trait]
impl<S: BoardStore + 'static> EventHandler for DetectStuckHandler<S> {
    fn event_type(&self) -> EventType {
        EventType::HygieneDetectStuckRequested
    }

    async fn handle(&self, event: &OutboxEvent) -> FlowdeckResult<()> {
        let report = self
            .store
            .find_stuck_report_by_board_id(event.board_id)
            .await?
            .ok_or_else(|| {
                // Queueing writes report and event in one transaction, so
                // an event without a report means corrupted state.
                FlowdeckError::Internal(format!("no report found for hygiene job {}", event.id))
            })?;

        if report.job_id != event.id {
            tracing::debug!(
                "Hygiene event {} superseded by job {}, skipping",
                event.id,
                report.job_id
            );
            return Ok(());
        }
        if report.status.is_terminal() {
            // Redelivery of an already-processed job.
            return Ok(());
        }

        let mut done = report;
        match self.store.find_board_by_id(event.board_id).await? {
            Some(_) => {
                let as_of = Self::as_of(event);
                let threshold = i64::from(done.threshold_days);
                let stuck: Vec<StuckCard> = self
                    .store
                    .find_cards_by_board(event.board_id)
                    .await?
                    .into_iter()
                    .filter(|card| (as_of - card.updated_at).num_days() >= threshold)
                    .map(|card| StuckCard {
                        card_id: card.id,
                        list_id: card.list_id,
                        idle_days: (as_of - card.updated_at).num_days(),
                        title: card.title,
                    })
                    .collect();

                tracing::info!(
                    "Hygiene job {}: {} stuck card(s) on board {}",
                    event.id,
                    stuck.len(),
                    event.board_id
                );
                done.complete(stuck);
            }
            None => {
                done.fail(format!("board {} no longer exists", event.board_id));
            }
        }

        self.store
            .run_in_transaction(move |tx| {
                Box::pin(async move { tx.upsert_stuck_report(done).await })
            })
            .await
    }
}
