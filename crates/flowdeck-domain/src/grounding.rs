//! Reconciling model-generated citations against retrieved context.
//!
//! A raw model answer arrives with citations the model claims support it.
//! Only citations whose chunk id exists in the retrieved context survive,
//! and the surviving references are rebuilt from the retrieved metadata
//! rather than the model's copy of it. When nothing the model cited is
//! real, the top retrieved chunks are cited instead, so an answer is never
//! surfaced uncited while real context existed.

use std::collections::HashMap;

use flowdeck_core::{FlowdeckError, FlowdeckResult};
use serde::{Deserialize, Serialize};

/// Fallback cap when the model cited nothing verifiable.
pub const MAX_FALLBACK_REFERENCES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Document,
    Card,
    Conversation,
}

/// A citable unit of retrieved source text, ranked most relevant first by
/// the retrieval step. Read-only input to grounding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextChunk {
    pub chunk_id: String,
    pub source_type: SourceType,
    pub source_id: String,
    pub excerpt: String,
}

/// A citation as the model produced it. The metadata fields are the
/// model's own claims and are never trusted; only `chunk_id` is used, as a
/// lookup key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawCitation {
    pub chunk_id: String,
    #[serde(default)]
    pub source_type: Option<String>,
    #[serde(default)]
    pub source_id: Option<String>,
}

/// Unverified model output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawAnswer {
    pub text: String,
    pub citations: Vec<RawCitation>,
}

/// A verified reference, rebuilt from retrieved-chunk metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRef {
    pub chunk_id: String,
    pub source_type: SourceType,
    pub source_id: String,
    pub excerpt: String,
}

impl SourceRef {
    fn from_chunk(chunk: &ContextChunk) -> Self {
        Self {
            chunk_id: chunk.chunk_id.clone(),
            source_type: chunk.source_type,
            source_id: chunk.source_id.clone(),
            excerpt: chunk.excerpt.clone(),
        }
    }
}

/// Answer whose every reference verifiably exists in retrieved context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroundedAnswer {
    pub text: String,
    pub references: Vec<SourceRef>,
}

/// Schema bounds re-checked on the final answer before it is returned.
#[derive(Debug, Clone)]
pub struct AnswerLimits {
    pub max_answer_chars: usize,
    pub max_references: usize,
}

impl Default for AnswerLimits {
    fn default() -> Self {
        Self {
            max_answer_chars: 8000,
            max_references: 10,
        }
    }
}

impl GroundedAnswer {
    fn ensure_within(&self, limits: &AnswerLimits) -> FlowdeckResult<()> {
        if self.text.trim().is_empty() {
            return Err(FlowdeckError::Validation(
                "answer text must not be empty".to_string(),
            ));
        }
        if self.text.chars().count() > limits.max_answer_chars {
            return Err(FlowdeckError::Validation(format!(
                "answer exceeds {} characters",
                limits.max_answer_chars
            )));
        }
        if self.references.len() > limits.max_references {
            return Err(FlowdeckError::Validation(format!(
                "answer carries more than {} references",
                limits.max_references
            )));
        }
        Ok(())
    }
}

/// Ground a raw model answer against the retrieved context.
///
/// Citations referencing unknown chunk ids are dropped; duplicates of the
/// same chunk collapse to one reference. If no citation survives and
/// context chunks exist, the top `min(MAX_FALLBACK_REFERENCES, available)`
/// chunks are cited in retrieval-rank order. The result is validated
/// against `limits` before being returned.
pub fn ground_answer(
    raw: RawAnswer,
    chunks: &[ContextChunk],
    limits: &AnswerLimits,
) -> FlowdeckResult<GroundedAnswer> {
    let by_id: HashMap<&str, &ContextChunk> = chunks
        .iter()
        .map(|chunk| (chunk.chunk_id.as_str(), chunk))
        .collect();

    let mut references: Vec<SourceRef> = Vec::new();
    for citation in &raw.citations {
        if let Some(chunk) = by_id.get(citation.chunk_id.as_str()) {
            if references.iter().all(|r| r.chunk_id != chunk.chunk_id) {
                references.push(SourceRef::from_chunk(chunk));
            }
        }
    }

    if references.is_empty() {
        references = chunks
            .iter()
            .take(MAX_FALLBACK_REFERENCES)
            .map(SourceRef::from_chunk)
            .collect();
    }

    let answer = GroundedAnswer {
        text: raw.text,
        references,
    };
    answer.ensure_within(limits)?;
    Ok(answer)
}
