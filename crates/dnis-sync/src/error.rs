//! Error types for DNIS sync
//!
//! The caller always gets the failure that stopped the upload. When a
//! rollback was attempted and itself failed, that failure rides along as
//! supplementary context and never replaces the original.

use crate::state_machine::StateError;
use dnis_core::{Dnis, EntityId, GatewayFailure, Mode, PlanError};

/// Which request of a reconciliation failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Reading the current entity before an update
    Fetch,
    /// The first create/update
    Initial,
    /// A follow-up chunk write; `number` counts the first write as chunk 1
    Chunk {
        /// 1-based position
        number: usize,
        /// Writes in the plan
        total: usize,
    },
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Fetch => f.write_str("fetch"),
            Stage::Initial => f.write_str("initial write"),
            Stage::Chunk { number, total } => write!(f, "chunk {number} of {total}"),
        }
    }
}

/// Rollback action taken after a failed upload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompensationAction {
    /// Delete an entity created by this reconciliation
    Delete,
    /// Put the pre-update snapshot back
    Restore,
}

impl std::fmt::Display for CompensationAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompensationAction::Delete => f.write_str("delete"),
            CompensationAction::Restore => f.write_str("restore"),
        }
    }
}

/// Rollback that did not go through
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{action} of {id} failed: {source}")]
pub struct CompensationFailure {
    /// What was attempted
    pub action: CompensationAction,
    /// Entity involved
    pub id: EntityId,
    /// Gateway failure
    #[source]
    pub source: GatewayFailure,
}

/// Why a number cannot be attached
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unavailable {
    /// No exact match in any DID pool
    NotFound,
    /// Owned by something else
    Assigned {
        /// Kind of owner, if reported
        owner_type: Option<String>,
    },
}

impl std::fmt::Display for Unavailable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Unavailable::NotFound => f.write_str("not found in any DID pool"),
            Unavailable::Assigned {
                owner_type: Some(owner),
            } => write!(f, "already assigned (owner type {owner})"),
            Unavailable::Assigned { owner_type: None } => f.write_str("already assigned"),
        }
    }
}

/// Main reconciliation error type
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Chunk size or other setting is unusable
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A gateway request failed
    #[error("{}, {}: {}{}", .mode, .stage, .source, compensation_note(.compensation.as_ref()))]
    Gateway {
        /// Create or update
        mode: Mode,
        /// Failing request
        stage: Stage,
        /// Original failure
        #[source]
        source: GatewayFailure,
        /// Rollback failure, if rollback was attempted and failed
        compensation: Option<CompensationFailure>,
    },

    /// Cancelled before a chunk write
    #[error("{}, {}: reconciliation cancelled{}", .mode, .stage, compensation_note(.compensation.as_ref()))]
    Cancelled {
        /// Create or update
        mode: Mode,
        /// Chunk that was not written
        stage: Stage,
        /// Rollback failure, if rollback was attempted and failed
        compensation: Option<CompensationFailure>,
    },

    /// A number to be added cannot be attached
    #[error("phone number {number} is {reason}")]
    NumberUnavailable {
        /// Offending number
        number: Dnis,
        /// Why
        reason: Unavailable,
    },

    /// The DID pool lookup itself kept failing
    #[error("failed to look up phone number {number} after {attempts} attempts: {source}")]
    LookupFailed {
        /// Number being checked
        number: Dnis,
        /// Attempts made
        attempts: u32,
        /// Last lookup failure
        #[source]
        source: GatewayFailure,
    },

    /// Internal state machine violation
    #[error(transparent)]
    State(#[from] StateError),
}

impl SyncError {
    /// Rollback failure attached to this error
    #[inline]
    #[must_use]
    pub fn compensation(&self) -> Option<&CompensationFailure> {
        match self {
            Self::Gateway { compensation, .. } | Self::Cancelled { compensation, .. } => {
                compensation.as_ref()
            }
            _ => None,
        }
    }

    /// Gateway failure that stopped the upload
    #[inline]
    #[must_use]
    pub fn gateway_failure(&self) -> Option<&GatewayFailure> {
        match self {
            Self::Gateway { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Failing stage, for upload errors
    #[inline]
    #[must_use]
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Gateway { stage, .. } | Self::Cancelled { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

impl From<PlanError> for SyncError {
    fn from(err: PlanError) -> Self {
        match err {
            PlanError::InvalidConfiguration(msg) => Self::InvalidConfiguration(msg),
        }
    }
}

fn compensation_note(compensation: Option<&CompensationFailure>) -> String {
    compensation
        .map(|c| format!(" (warning: rollback {c})"))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_display() {
        assert_eq!(Stage::Initial.to_string(), "initial write");
        assert_eq!(Stage::Chunk { number: 2, total: 3 }.to_string(), "chunk 2 of 3");
    }

    #[test]
    fn gateway_error_display() {
        let err = SyncError::Gateway {
            mode: Mode::Create,
            stage: Stage::Chunk { number: 2, total: 3 },
            source: GatewayFailure::transport("timeout"),
            compensation: None,
        };
        assert_eq!(err.to_string(), "create, chunk 2 of 3: transport error: timeout");
        assert!(err.compensation().is_none());
    }

    #[test]
    fn compensation_failure_is_appended() {
        let err = SyncError::Gateway {
            mode: Mode::Update,
            stage: Stage::Chunk { number: 3, total: 4 },
            source: GatewayFailure::transport("timeout"),
            compensation: Some(CompensationFailure {
                action: CompensationAction::Restore,
                id: EntityId::from("ivr-1"),
                source: GatewayFailure::rejected("locked"),
            }),
        };
        let text = err.to_string();
        assert!(text.starts_with("update, chunk 3 of 4: transport error: timeout"));
        assert!(text.contains("warning: rollback restore of ivr-1 failed"));
        assert_eq!(err.gateway_failure(), Some(&GatewayFailure::transport("timeout")));
    }

    #[test]
    fn plan_error_converts() {
        let err: SyncError = PlanError::InvalidConfiguration("zero".to_string()).into();
        assert!(matches!(err, SyncError::InvalidConfiguration(_)));
    }

    #[test]
    fn unavailable_display() {
        let err = SyncError::NumberUnavailable {
            number: Dnis::from("+19205552902"),
            reason: Unavailable::Assigned {
                owner_type: Some("USER".to_string()),
            },
        };
        assert_eq!(
            err.to_string(),
            "phone number +19205552902 is already assigned (owner type USER)"
        );
    }
}
