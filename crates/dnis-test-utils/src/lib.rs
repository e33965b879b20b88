//! Testing utilities for dnis-sync workspace
//!
//! Shared fixtures for reconciler tests.

#![allow(missing_docs)]

use async_trait::async_trait;
use dnis_core::{Dnis, InMemoryGateway, IvrConfig};
use dnis_sync::{NoDelay, Reconciler, SyncConfig, Throttle, ValidationConfig};
use parking_lot::Mutex;
use std::ops::Range;
use std::sync::Arc;

/// Test number `i`, e.g. `+19205550007`
pub fn n(i: usize) -> Dnis {
    Dnis::new(format!("+1920555{i:04}"))
}

pub fn numbers(range: Range<usize>) -> Vec<Dnis> {
    range.map(n).collect()
}

pub fn ivr(name: &str, dnis: Vec<Dnis>) -> IvrConfig {
    IvrConfig::new(name)
        .with_description("test ivr")
        .with_schedule_group("schedule-group-1")
        .with_dnis(dnis)
}

/// Config with no waiting anywhere
pub fn test_config(max: usize) -> SyncConfig {
    SyncConfig::new()
        .with_max_dnis_per_request(max)
        .with_inter_chunk_delay(std::time::Duration::ZERO)
        .with_validation(ValidationConfig {
            max_attempts: 3,
            retry_delay_ms: 0,
        })
}

pub fn setup_reconciler(max: usize) -> (Arc<InMemoryGateway>, Reconciler<Arc<InMemoryGateway>>) {
    setup_reconciler_with(InMemoryGateway::new(), max)
}

pub fn setup_reconciler_with(
    gateway: InMemoryGateway,
    max: usize,
) -> (Arc<InMemoryGateway>, Reconciler<Arc<InMemoryGateway>>) {
    let gateway = Arc::new(gateway);
    let reconciler = Reconciler::new(Arc::clone(&gateway), test_config(max)).with_throttle(NoDelay);
    (gateway, reconciler)
}

/// Throttle that records how often it was asked to pause
#[derive(Debug, Clone, Default)]
pub struct CountingThrottle {
    pauses: Arc<Mutex<usize>>,
}

impl CountingThrottle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pauses(&self) -> usize {
        *self.pauses.lock()
    }
}

#[async_trait]
impl Throttle for CountingThrottle {
    async fn pause(&self) {
        *self.pauses.lock() += 1;
    }
}
