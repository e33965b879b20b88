//! Upload sequencer
//!
//! Applies an [`UploadPlan`] to the remote entity:
//! - one initial create/update carrying the first chunk
//! - one update per remaining chunk, each carrying everything written so far
//! - rollback through the compensator when a chunk write fails
//!
//! Writes are strictly sequential: every chunk payload is built from the
//! previous response, which also threads the id and version token forward.
//! Nothing stops another client from modifying the entity between chunk
//! writes; the version token is the only guard against that.

use crate::availability::ensure_available;
use crate::compensator::{compensate, Compensation};
use crate::config::SyncConfig;
use crate::error::{Stage, SyncError};
use crate::state_machine::{Progress, ReconcileState};
use crate::throttle::{FixedDelay, Throttle};
use dnis_core::{
    plan_create, plan_update, EntityId, Gateway, GatewayFailure, IvrConfig, Mode, NumberDirectory,
    Snapshot, UploadPlan,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Result of a completed reconciliation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
    /// Entity as returned by the last write
    pub entity: IvrConfig,
    /// Create/update requests issued
    pub writes: usize,
    /// States visited
    pub history: Vec<ReconcileState>,
}

/// Reconciles DNIS lists onto IVR configs through a [`Gateway`]
pub struct Reconciler<G> {
    gateway: G,
    config: SyncConfig,
    throttle: Arc<dyn Throttle>,
    directory: Option<Arc<dyn NumberDirectory>>,
    cancel: CancellationToken,
}

impl<G: Gateway> Reconciler<G> {
    /// Create a reconciler pacing chunk writes by the configured delay
    #[must_use]
    pub fn new(gateway: G, config: SyncConfig) -> Self {
        let throttle = Arc::new(FixedDelay(config.inter_chunk_delay()));
        Self {
            gateway,
            config,
            throttle,
            directory: None,
            cancel: CancellationToken::new(),
        }
    }

    /// With a different pacing strategy
    #[must_use]
    pub fn with_throttle(mut self, throttle: impl Throttle + 'static) -> Self {
        self.throttle = Arc::new(throttle);
        self
    }

    /// Check numbers against `directory` before multi-request uploads
    #[must_use]
    pub fn with_directory(mut self, directory: Arc<dyn NumberDirectory>) -> Self {
        self.directory = Some(directory);
        self
    }

    /// Stop before the next chunk write once `token` is cancelled
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Get gateway
    #[inline]
    #[must_use]
    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Get configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Create a new IVR config holding `desired.dnis`
    ///
    /// # Errors
    /// Configuration, availability or gateway failure; a partially created
    /// entity is deleted before the error is returned
    pub async fn create(&self, desired: IvrConfig) -> Result<SyncOutcome, SyncError> {
        let plan = plan_create(&desired.dnis, self.config.max_dnis_per_request)?;
        tracing::info!(
            name = %desired.name,
            numbers = desired.dnis.len(),
            writes = plan.total_writes(),
            "creating ivr config"
        );
        self.execute(Mode::Create, None, desired, plan, None).await
    }

    /// Rewrite the IVR config `id` so it holds exactly `desired.dnis`
    ///
    /// # Errors
    /// Configuration, fetch, availability or gateway failure; a partially
    /// updated entity is restored to its prior state before the error is
    /// returned
    pub async fn update(&self, id: &EntityId, desired: IvrConfig) -> Result<SyncOutcome, SyncError> {
        if self.config.max_dnis_per_request == 0 {
            return Err(SyncError::InvalidConfiguration(
                "max_dnis_per_request must be positive".to_string(),
            ));
        }

        let current = self
            .gateway
            .fetch(id)
            .await
            .map_err(|source| SyncError::Gateway {
                mode: Mode::Update,
                stage: Stage::Fetch,
                source,
                compensation: None,
            })?;
        self.update_from(id, &current, desired).await
    }

    /// Like [`update`](Self::update) with the current state already in hand
    ///
    /// # Errors
    /// As for [`update`](Self::update), minus the fetch
    pub async fn update_from(
        &self,
        id: &EntityId,
        current: &IvrConfig,
        desired: IvrConfig,
    ) -> Result<SyncOutcome, SyncError> {
        let plan = plan_update(&desired.dnis, &current.dnis, self.config.max_dnis_per_request)?;
        let snapshot = Snapshot::capture(current);
        tracing::info!(
            %id,
            current = current.dnis.len(),
            desired = desired.dnis.len(),
            additions = plan.additions().len(),
            writes = plan.total_writes(),
            "updating ivr config"
        );
        self.execute(Mode::Update, Some(id), desired, plan, Some(snapshot))
            .await
    }

    async fn execute(
        &self,
        mode: Mode,
        id: Option<&EntityId>,
        desired: IvrConfig,
        plan: UploadPlan,
        snapshot: Option<Snapshot>,
    ) -> Result<SyncOutcome, SyncError> {
        if plan.is_chunked() {
            if let Some(directory) = &self.directory {
                ensure_available(directory.as_ref(), plan.additions(), &self.config.validation)
                    .await?;
            }
        }

        let mut progress = Progress::new();
        let total = plan.total_writes();
        let version = snapshot.as_ref().and_then(|s| s.entity().version);
        let compensation = Compensation::for_mode(mode, snapshot);
        let (initial, pending) = plan.into_parts();

        let mut payload = IvrConfig {
            dnis: initial,
            ..desired
        };
        let written = match id {
            Some(id) => {
                payload.id = Some(id.clone());
                payload.version = version;
                self.gateway.update(id, payload).await
            }
            None => {
                payload.id = None;
                payload.version = None;
                self.gateway.create(payload).await
            }
        };

        let (id, mut entity) = match written.and_then(|entity| with_id(entity, id)) {
            Ok(written) => written,
            Err(source) => {
                progress.advance(ReconcileState::Failed)?;
                tracing::error!(%mode, error = %source, "initial dnis write failed");
                return Err(SyncError::Gateway {
                    mode,
                    stage: Stage::Initial,
                    source,
                    compensation: None,
                });
            }
        };
        progress.advance(ReconcileState::InitialApplied)?;

        for (index, chunk) in pending.into_iter().enumerate() {
            let stage = Stage::Chunk {
                number: index + 2,
                total,
            };

            if !self.wait_for_turn().await {
                tracing::warn!(%id, %stage, "reconciliation cancelled");
                let compensation =
                    compensate(&self.gateway, &mut progress, compensation, &id).await?;
                return Err(SyncError::Cancelled {
                    mode,
                    stage,
                    compensation,
                });
            }

            progress.advance(ReconcileState::ChunkApplying)?;
            tracing::info!(%id, %stage, numbers = chunk.len(), "uploading block of dnis numbers");

            let mut next = entity.clone();
            next.dnis.extend(chunk);
            match self.gateway.update(&id, next).await {
                Ok(written) => entity = written,
                Err(source) => {
                    tracing::error!(%id, %mode, %stage, error = %source, "dnis chunk write failed");
                    let compensation =
                        compensate(&self.gateway, &mut progress, compensation, &id).await?;
                    return Err(SyncError::Gateway {
                        mode,
                        stage,
                        source,
                        compensation,
                    });
                }
            }
        }

        progress.advance(ReconcileState::Completed)?;
        tracing::info!(%id, numbers = entity.dnis.len(), writes = total, "dnis reconciliation completed");

        Ok(SyncOutcome {
            entity,
            writes: total,
            history: progress.into_history(),
        })
    }

    /// Pause before a chunk write; `false` if cancelled first
    async fn wait_for_turn(&self) -> bool {
        if self.cancel.is_cancelled() {
            return false;
        }
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => false,
            () = self.throttle.pause() => true,
        }
    }
}

impl<G> std::fmt::Debug for Reconciler<G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("config", &self.config)
            .field("has_directory", &self.directory.is_some())
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

/// Id to thread into chunk writes: the response's, else the one written to
fn with_id(
    mut entity: IvrConfig,
    id: Option<&EntityId>,
) -> Result<(EntityId, IvrConfig), GatewayFailure> {
    let id = match (&entity.id, id) {
        (Some(returned), _) => returned.clone(),
        (None, Some(id)) => {
            entity.id = Some(id.clone());
            id.clone()
        }
        (None, None) => {
            return Err(GatewayFailure::MalformedResponse(
                "create response carried no entity id".to_string(),
            ))
        }
    };
    Ok((id, entity))
}
