use thiserror::Error;

/// Error taxonomy for the board backend.
///
/// Boundary adapters map each variant 1:1 to a transport-level category.
/// A `Conflict` is never retried here; refreshing the version and retrying
/// is the caller's decision.
#[derive(Error, Debug)]
pub enum FlowdeckError {
    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl FlowdeckError {
    /// Not-found for a named entity. Also used for cross-org access, which
    /// must be indistinguishable from absence.
    pub fn not_found(entity: &str, id: impl std::fmt::Display) -> Self {
        Self::NotFound(format!("{} {}", entity, id))
    }

    pub fn version_conflict(
        entity: &str,
        id: impl std::fmt::Display,
        expected: u64,
        actual: u64,
    ) -> Self {
        Self::Conflict(format!(
            "{} {} is at version {}, expected {}",
            entity, id, actual, expected
        ))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
