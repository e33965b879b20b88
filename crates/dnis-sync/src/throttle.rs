//! Pacing between chunk writes

use async_trait::async_trait;
use std::time::Duration;

/// Courtesy pause taken before every chunk write after the first
#[async_trait]
pub trait Throttle: Send + Sync {
    /// Wait before the next write
    async fn pause(&self);
}

/// Fixed, non-blocking sleep
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedDelay(pub Duration);

#[async_trait]
impl Throttle for FixedDelay {
    async fn pause(&self) {
        tokio::time::sleep(self.0).await;
    }
}

/// No pause at all
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoDelay;

#[async_trait]
impl Throttle for NoDelay {
    async fn pause(&self) {}
}
