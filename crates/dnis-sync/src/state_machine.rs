//! Reconciliation state machine
//!
//! `Idle -> InitialApplied -> ChunkApplying* -> Completed`, or on failure
//! `Failed -> Compensating -> Compensated`. A failed first write ends in
//! `Failed` since nothing needs undoing.

use serde::Serialize;

/// Where a reconciliation is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ReconcileState {
    /// Nothing written yet
    Idle,
    /// First write accepted
    InitialApplied,
    /// A follow-up chunk write is in flight
    ChunkApplying,
    /// Every write accepted
    Completed,
    /// A write failed or the run was cancelled
    Failed,
    /// Undoing the partial change
    Compensating,
    /// Undo attempted, whatever its outcome
    Compensated,
}

impl ReconcileState {
    /// No transition leaves this state
    #[inline]
    #[must_use]
    pub fn is_terminal(self) -> bool {
        allowed_transitions(self).is_empty()
    }
}

/// Rejected state change
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum StateError {
    /// Transition not in the table
    #[error("illegal reconcile transition {from:?} -> {to:?}")]
    IllegalTransition {
        /// Current state
        from: ReconcileState,
        /// Requested state
        to: ReconcileState,
    },
}

/// States reachable from `from`
#[must_use]
pub fn allowed_transitions(from: ReconcileState) -> Vec<ReconcileState> {
    use ReconcileState::*;
    match from {
        Idle => vec![InitialApplied, Failed],
        InitialApplied => vec![ChunkApplying, Completed, Failed],
        ChunkApplying => vec![ChunkApplying, Completed, Failed],
        Failed => vec![Compensating],
        Compensating => vec![Compensated],
        Completed | Compensated => vec![],
    }
}

/// Validates a state transition.
///
/// # Errors
/// `StateError::IllegalTransition` if `to` is not reachable from `from`
pub fn validate_transition(from: ReconcileState, to: ReconcileState) -> Result<(), StateError> {
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(StateError::IllegalTransition { from, to })
    }
}

/// Transition history of one reconciliation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    history: Vec<ReconcileState>,
}

impl Progress {
    /// Start in `Idle`
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            history: vec![ReconcileState::Idle],
        }
    }

    /// Current state
    #[inline]
    #[must_use]
    pub fn current(&self) -> ReconcileState {
        self.history
            .last()
            .copied()
            .unwrap_or(ReconcileState::Idle)
    }

    /// Move to `to`
    ///
    /// # Errors
    /// `StateError::IllegalTransition`; the state is left unchanged
    pub fn advance(&mut self, to: ReconcileState) -> Result<(), StateError> {
        validate_transition(self.current(), to)?;
        tracing::trace!(from = ?self.current(), ?to, "reconcile transition");
        self.history.push(to);
        Ok(())
    }

    /// Every state visited, oldest first
    #[inline]
    #[must_use]
    pub fn history(&self) -> &[ReconcileState] {
        &self.history
    }

    /// Consume into the visited states
    #[inline]
    #[must_use]
    pub fn into_history(self) -> Vec<ReconcileState> {
        self.history
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self::new()
    }
}
