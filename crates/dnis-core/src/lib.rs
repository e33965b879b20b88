//! DNIS Core - identifiers, upload plans and the remote gateway seam
//!
//! The pure half of DNIS reconciliation:
//! - Strongly-typed IVR configs and phone-number identifiers
//! - Ordered chunk partitioning
//! - Set difference between desired and current numbers
//! - Upload plans for the create and update paths
//! - The [`Gateway`] and [`NumberDirectory`] traits the sequencer talks to
//! - An in-memory gateway for simulation and tests
//!
//! # Example
//!
//! ```rust
//! use dnis_core::{plan_update, Dnis};
//!
//! let current: Vec<Dnis> = ["+1", "+2", "+3"].into_iter().map(Dnis::from).collect();
//! let desired: Vec<Dnis> = ["+1", "+2", "+3", "+4", "+5", "+6", "+7"]
//!     .into_iter()
//!     .map(Dnis::from)
//!     .collect();
//!
//! let plan = plan_update(&desired, &current, 3).unwrap();
//! assert_eq!(plan.initial_payload().len(), 6);
//! assert_eq!(plan.pending_chunks().len(), 1);
//! ```

#![warn(unreachable_pub)]

pub mod diff;
pub mod error;
pub mod gateway;
pub mod memory;
pub mod partition;
pub mod types;

pub use diff::{compute_additions, plan_create, plan_update, UploadPlan};
pub use error::{GatewayFailure, PlanError};
pub use gateway::{DidNumber, Gateway, NumberDirectory};
pub use memory::{CallCounts, InMemoryDirectory, InMemoryGateway, Operation};
pub use partition::partition;
pub use types::{Chunk, Dnis, EntityId, IvrConfig, Mode, Snapshot};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
