//! Remote collaborator traits
//!
//! The reconciler never talks to a transport directly. It is handed a
//! [`Gateway`] for IVR CRUD and, optionally, a [`NumberDirectory`] to check
//! that numbers can be attached before a long upload starts.

use crate::error::GatewayFailure;
use crate::types::{Dnis, EntityId, IvrConfig};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// IVR config CRUD against the remote system
///
/// `update` replaces the whole `dnis` list with the one in the payload.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Read an entity
    async fn fetch(&self, id: &EntityId) -> Result<IvrConfig, GatewayFailure>;

    /// Create an entity; the response carries its id and version
    async fn create(&self, ivr: IvrConfig) -> Result<IvrConfig, GatewayFailure>;

    /// Replace an entity
    async fn update(&self, id: &EntityId, ivr: IvrConfig) -> Result<IvrConfig, GatewayFailure>;

    /// Delete an entity
    async fn delete(&self, id: &EntityId) -> Result<(), GatewayFailure>;
}

#[async_trait]
impl<G: Gateway + ?Sized> Gateway for Arc<G> {
    async fn fetch(&self, id: &EntityId) -> Result<IvrConfig, GatewayFailure> {
        (**self).fetch(id).await
    }

    async fn create(&self, ivr: IvrConfig) -> Result<IvrConfig, GatewayFailure> {
        (**self).create(ivr).await
    }

    async fn update(&self, id: &EntityId, ivr: IvrConfig) -> Result<IvrConfig, GatewayFailure> {
        (**self).update(id, ivr).await
    }

    async fn delete(&self, id: &EntityId) -> Result<(), GatewayFailure> {
        (**self).delete(id).await
    }
}

/// Entry in a DID pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DidNumber {
    /// The number
    pub number: Dnis,
    /// Whether something already owns it
    pub assigned: bool,
    /// Kind of owner when assigned
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_type: Option<String>,
}

impl DidNumber {
    /// Unassigned pool entry
    #[inline]
    pub fn unassigned(number: impl Into<Dnis>) -> Self {
        Self {
            number: number.into(),
            assigned: false,
            owner_type: None,
        }
    }

    /// Pool entry owned by something of `owner_type`
    #[inline]
    pub fn assigned(number: impl Into<Dnis>, owner_type: impl Into<String>) -> Self {
        Self {
            number: number.into(),
            assigned: true,
            owner_type: Some(owner_type.into()),
        }
    }
}

/// Lookup of DID pool entries, assigned and unassigned
#[async_trait]
pub trait NumberDirectory: Send + Sync {
    /// Entries matching `number`; the match may be fuzzy
    async fn lookup(&self, number: &Dnis) -> Result<Vec<DidNumber>, GatewayFailure>;
}
