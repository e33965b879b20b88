//! Core types for DNIS reconciliation
//!
//! Defines:
//! - Phone-number identifiers and entity ids
//! - The IVR config entity exchanged with the gateway
//! - Snapshots used for rollback
//! - Reconciliation mode

use serde::{Deserialize, Serialize};

/// A phone-number identifier attached to an IVR config.
///
/// Opaque and already validated upstream; equality is exact string match.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dnis(String);

impl Dnis {
    /// Wrap a number
    #[inline]
    pub fn new(number: impl Into<String>) -> Self {
        Self(number.into())
    }

    /// Borrow the raw number
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Dnis {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Dnis {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for Dnis {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Dnis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Remote entity identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Wrap an id
    #[inline]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw id
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for EntityId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Bounded, ordered run of identifiers written in one request
pub type Chunk = Vec<Dnis>;

/// IVR configuration as exchanged with the remote system.
///
/// `dnis` has full-replace semantics on every write. `version` is the
/// optimistic concurrency token; a write without one is unconditional.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IvrConfig {
    /// Remote id, absent until created
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    /// Concurrency token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,
    /// Display name
    pub name: String,
    /// Free-form description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Attached phone numbers
    #[serde(default)]
    pub dnis: Vec<Dnis>,
    /// Flow used during open hours
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_hours_flow_id: Option<String>,
    /// Flow used during closed hours
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_hours_flow_id: Option<String>,
    /// Flow used on holidays
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub holiday_hours_flow_id: Option<String>,
    /// Schedule group driving the hours above
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule_group_id: Option<String>,
    /// Owning division
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub division_id: Option<String>,
}

impl IvrConfig {
    /// Create a config with just a name
    #[inline]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// With description
    #[inline]
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// With phone numbers
    #[inline]
    #[must_use]
    pub fn with_dnis<I, D>(mut self, dnis: I) -> Self
    where
        I: IntoIterator<Item = D>,
        D: Into<Dnis>,
    {
        self.dnis = dnis.into_iter().map(Into::into).collect();
        self
    }

    /// With schedule group
    #[inline]
    #[must_use]
    pub fn with_schedule_group(mut self, id: impl Into<String>) -> Self {
        self.schedule_group_id = Some(id.into());
        self
    }

    /// With division
    #[inline]
    #[must_use]
    pub fn with_division(mut self, id: impl Into<String>) -> Self {
        self.division_id = Some(id.into());
        self
    }
}

/// Copy of an entity taken before an update writes anything
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot(IvrConfig);

impl Snapshot {
    /// Capture the given entity
    #[inline]
    #[must_use]
    pub fn capture(entity: &IvrConfig) -> Self {
        Self(entity.clone())
    }

    /// The captured entity
    #[inline]
    #[must_use]
    pub fn entity(&self) -> &IvrConfig {
        &self.0
    }

    /// Payload that puts the entity back as captured.
    ///
    /// The version token is cleared so the remote concurrency check does not
    /// reject the rollback after the partial writes bumped it.
    #[must_use]
    pub fn restore_payload(&self) -> IvrConfig {
        IvrConfig {
            version: None,
            ..self.0.clone()
        }
    }
}

/// Whether the target entity is being created or already exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Entity is created by the first write
    Create,
    /// Entity exists and is rewritten
    Update,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Create => f.write_str("create"),
            Mode::Update => f.write_str("update"),
        }
    }
}
