//! Error types for DNIS Core
//!
//! - Planning failures (only ever configuration errors)
//! - Failures reported by a remote gateway or number directory

use crate::types::EntityId;

/// Upload planning errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanError {
    /// Chunk size or other planning input is unusable
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Failure returned by a [`Gateway`](crate::Gateway) or
/// [`NumberDirectory`](crate::NumberDirectory) call
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayFailure {
    /// Entity does not exist remotely
    #[error("entity not found: {0}")]
    NotFound(EntityId),

    /// Optimistic concurrency check failed
    #[error("version conflict on {id}: remote is at {remote}, request carried {requested}")]
    Conflict {
        /// Entity written to
        id: EntityId,
        /// Version currently stored remotely
        remote: u64,
        /// Version token the request carried
        requested: u64,
    },

    /// Remote system refused the request
    #[error("request rejected: {0}")]
    Rejected(String),

    /// Response could not be used
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Connection or protocol level failure
    #[error("transport error: {0}")]
    Transport(String),
}

impl GatewayFailure {
    /// Create a rejection failure
    #[inline]
    pub fn rejected(msg: impl Into<String>) -> Self {
        Self::Rejected(msg.into())
    }

    /// Create a transport failure
    #[inline]
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }
}
