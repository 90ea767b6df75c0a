use std::sync::Arc;

use async_trait::async_trait;
use flowdeck_core::FlowdeckResult;
use flowdeck_domain::grounding::{ground_answer, AnswerLimits, ContextChunk, GroundedAnswer, RawAnswer};

/// Boundary to the AI model that drafts answers. Implemented by an
/// external adapter; the core only sees raw text plus claimed citations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn generate_answer(
        &self,
        question: &str,
        context: &[ContextChunk],
    ) -> FlowdeckResult<RawAnswer>;
}

/// Produces grounded answers: every reference the caller sees verifiably
/// exists in the retrieved context, reconciled from retrieval metadata
/// rather than the model's claims.
pub struct AnswerService<M> {
    model: Arc<M>,
    limits: AnswerLimits,
}

impl<M: ModelClient> AnswerService<M> {
    pub fn new(model: Arc<M>) -> Self {
        Self {
            model,
            limits: AnswerLimits::default(),
        }
    }

    pub fn with_limits(model: Arc<M>, limits: AnswerLimits) -> Self {
        Self { model, limits }
    }

    /// Ask the model and ground its answer against `context`. The chunks
    /// must be in retrieval-rank order, most relevant first; the fallback
    /// path cites the top-ranked ones.
    pub async fn answer(
        &self,
        question: &str,
        context: &[ContextChunk],
    ) -> FlowdeckResult<GroundedAnswer> {
        let raw = self.model.generate_answer(question, context).await?;
        let claimed = raw.citations.len();

        let grounded = ground_answer(raw, context, &self.limits)?;
        tracing::debug!(
            "Grounded answer: {} citations claimed, {} references kept",
            claimed,
            grounded.references.len()
        );
        Ok(grounded)
    }
}
