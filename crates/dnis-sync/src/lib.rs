//! DNIS Sync - chunked, compensating DNIS reconciliation
//!
//! Keeps the phone numbers on a remote IVR config in line with a desired
//! list when the remote only accepts a limited number per write:
//! - Plans the initial write and the follow-up chunk writes
//! - Sequences them with a courtesy delay and cancellation checks
//! - Deletes a half-created entity, or restores the pre-update snapshot,
//!   when a chunk write fails
//!
//! # Example
//!
//! ```rust,no_run
//! use dnis_core::{InMemoryGateway, IvrConfig};
//! use dnis_sync::{Reconciler, SyncConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SyncConfig::new().with_max_dnis_per_request(4);
//! let reconciler = Reconciler::new(InMemoryGateway::new(), config);
//!
//! let desired = IvrConfig::new("Main line").with_dnis(["+19205552902", "+19203215463"]);
//! let outcome = reconciler.create(desired).await?;
//!
//! println!("{} writes", outcome.writes);
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]

mod availability;
pub mod compensator;
pub mod config;
pub mod error;
pub mod sequencer;
pub mod state_machine;
pub mod throttle;

pub use compensator::Compensation;
pub use config::{ConfigError, SyncConfig, ValidationConfig};
pub use error::{CompensationAction, CompensationFailure, Stage, SyncError, Unavailable};
pub use sequencer::{Reconciler, SyncOutcome};
pub use state_machine::{allowed_transitions, validate_transition, Progress, ReconcileState, StateError};
pub use throttle::{FixedDelay, NoDelay, Throttle};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for running reconciliations
    pub use crate::{NoDelay, Reconciler, SyncConfig, SyncError, SyncOutcome};
    pub use dnis_core::{Dnis, EntityId, Gateway, IvrConfig};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
