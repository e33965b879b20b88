//! Rollback of a partially applied upload
//!
//! A create that fails after its first write leaves an entity holding only
//! some of the numbers; it is deleted. An update is put back to the snapshot
//! taken before the first write.

use crate::error::{CompensationAction, CompensationFailure};
use crate::state_machine::{Progress, ReconcileState, StateError};
use dnis_core::{EntityId, Gateway, Mode, Snapshot};

/// Undo action prepared before the first write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Compensation {
    /// Delete the entity the first write created
    DeleteCreated,
    /// Write the snapshot back with its version token cleared
    RestoreSnapshot(Snapshot),
}

impl Compensation {
    /// Undo action for `mode`; `None` for an update without a snapshot
    #[must_use]
    pub fn for_mode(mode: Mode, snapshot: Option<Snapshot>) -> Option<Self> {
        match (mode, snapshot) {
            (Mode::Create, _) => Some(Self::DeleteCreated),
            (Mode::Update, Some(snapshot)) => Some(Self::RestoreSnapshot(snapshot)),
            (Mode::Update, None) => None,
        }
    }

    /// Action this compensation takes
    #[inline]
    #[must_use]
    pub fn action(&self) -> CompensationAction {
        match self {
            Self::DeleteCreated => CompensationAction::Delete,
            Self::RestoreSnapshot(_) => CompensationAction::Restore,
        }
    }

    /// Perform the undo against `id`
    ///
    /// # Errors
    /// `CompensationFailure` wrapping the gateway failure
    pub async fn run<G: Gateway + ?Sized>(
        self,
        gateway: &G,
        id: &EntityId,
    ) -> Result<(), CompensationFailure> {
        let action = self.action();
        let outcome = match self {
            Self::DeleteCreated => gateway.delete(id).await,
            Self::RestoreSnapshot(snapshot) => gateway
                .update(id, snapshot.restore_payload())
                .await
                .map(|_| ()),
        };

        outcome.map_err(|source| CompensationFailure {
            action,
            id: id.clone(),
            source,
        })
    }
}

/// Drive `Failed -> Compensating -> Compensated` around a rollback.
///
/// The rollback outcome never fails the caller; a failed rollback is logged
/// and handed back for attaching to the original error.
pub(crate) async fn compensate<G: Gateway + ?Sized>(
    gateway: &G,
    progress: &mut Progress,
    compensation: Option<Compensation>,
    id: &EntityId,
) -> Result<Option<CompensationFailure>, StateError> {
    progress.advance(ReconcileState::Failed)?;
    let Some(compensation) = compensation else {
        return Ok(None);
    };

    progress.advance(ReconcileState::Compensating)?;
    let action = compensation.action();
    tracing::info!(%id, %action, "compensating partial dnis upload");

    let outcome = compensation.run(gateway, id).await;
    progress.advance(ReconcileState::Compensated)?;

    match outcome {
        Ok(()) => {
            tracing::info!(%id, %action, "compensation completed");
            Ok(None)
        }
        Err(failure) => {
            tracing::warn!(%id, %action, error = %failure.source, "compensation failed");
            Ok(Some(failure))
        }
    }
}
