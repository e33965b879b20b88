//! In-memory gateway and number directory
//!
//! Behaves like the remote system closely enough to drive the reconciler:
//! versioned writes with optimistic concurrency, an optional limit on how
//! many new numbers one write may attach, and scripted failures for a given
//! call of an operation.
//! All state is owned by the instance.

use crate::error::GatewayFailure;
use crate::gateway::{DidNumber, Gateway, NumberDirectory};
use crate::types::{Dnis, EntityId, IvrConfig};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};

/// Gateway operation, for failure injection and call counting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `fetch`
    Fetch,
    /// `create`
    Create,
    /// `update`
    Update,
    /// `delete`
    Delete,
}

/// Calls seen per operation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    /// Fetch calls
    pub fetch: usize,
    /// Create calls
    pub create: usize,
    /// Update calls
    pub update: usize,
    /// Delete calls
    pub delete: usize,
}

impl CallCounts {
    fn bump(&mut self, op: Operation) -> usize {
        let slot = match op {
            Operation::Fetch => &mut self.fetch,
            Operation::Create => &mut self.create,
            Operation::Update => &mut self.update,
            Operation::Delete => &mut self.delete,
        };
        *slot += 1;
        *slot
    }

    /// Create, update and delete calls together
    #[inline]
    #[must_use]
    pub fn writes(&self) -> usize {
        self.create + self.update + self.delete
    }
}

#[derive(Debug, Clone)]
struct Fault {
    op: Operation,
    call: usize,
    failure: GatewayFailure,
}

#[derive(Debug, Default)]
struct State {
    entities: HashMap<EntityId, IvrConfig>,
    faults: Vec<Fault>,
    calls: CallCounts,
    updates: Vec<(EntityId, IvrConfig)>,
}

/// Process-local stand-in for the remote IVR API
#[derive(Debug, Default)]
pub struct InMemoryGateway {
    state: Mutex<State>,
    max_additions_per_write: Option<usize>,
}

impl InMemoryGateway {
    /// Create an empty gateway
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject writes attaching more than `max` numbers the entity lacks
    #[inline]
    #[must_use]
    pub fn with_addition_limit(mut self, max: usize) -> Self {
        self.max_additions_per_write = Some(max);
        self
    }

    /// Fail the `call`-th invocation (1-based) of `op` with `failure`
    #[must_use]
    pub fn fail_on(self, op: Operation, call: usize, failure: GatewayFailure) -> Self {
        self.state.lock().faults.push(Fault { op, call, failure });
        self
    }

    /// Store an existing entity as version 1 under `id`
    pub fn seed(&self, id: impl Into<EntityId>, mut ivr: IvrConfig) -> IvrConfig {
        let id = id.into();
        ivr.id = Some(id.clone());
        ivr.version = Some(1);
        self.state.lock().entities.insert(id, ivr.clone());
        ivr
    }

    /// Current stored state of an entity
    #[must_use]
    pub fn get(&self, id: &EntityId) -> Option<IvrConfig> {
        self.state.lock().entities.get(id).cloned()
    }

    /// Number of stored entities
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().entities.len()
    }

    /// Whether nothing is stored
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Calls seen so far
    #[must_use]
    pub fn calls(&self) -> CallCounts {
        self.state.lock().calls
    }

    /// Every update payload received, in order, including rejected ones
    #[must_use]
    pub fn update_payloads(&self) -> Vec<(EntityId, IvrConfig)> {
        self.state.lock().updates.clone()
    }

    fn check_limit(&self, stored: Option<&IvrConfig>, ivr: &IvrConfig) -> Result<(), GatewayFailure> {
        let Some(max) = self.max_additions_per_write else {
            return Ok(());
        };
        let existing: HashSet<&Dnis> = stored.map(|e| e.dnis.iter().collect()).unwrap_or_default();
        let added = ivr.dnis.iter().filter(|n| !existing.contains(n)).count();
        if added > max {
            return Err(GatewayFailure::rejected(format!(
                "{added} new numbers exceed the limit of {max} per request"
            )));
        }
        Ok(())
    }
}

impl State {
    fn enter(&mut self, op: Operation) -> Result<(), GatewayFailure> {
        let call = self.calls.bump(op);
        match self.faults.iter().find(|f| f.op == op && f.call == call) {
            Some(fault) => Err(fault.failure.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Gateway for InMemoryGateway {
    async fn fetch(&self, id: &EntityId) -> Result<IvrConfig, GatewayFailure> {
        let mut state = self.state.lock();
        state.enter(Operation::Fetch)?;
        state
            .entities
            .get(id)
            .cloned()
            .ok_or_else(|| GatewayFailure::NotFound(id.clone()))
    }

    async fn create(&self, mut ivr: IvrConfig) -> Result<IvrConfig, GatewayFailure> {
        let mut state = self.state.lock();
        state.enter(Operation::Create)?;
        self.check_limit(None, &ivr)?;

        let id = EntityId::new(uuid::Uuid::new_v4().to_string());
        ivr.id = Some(id.clone());
        ivr.version = Some(1);
        state.entities.insert(id, ivr.clone());
        Ok(ivr)
    }

    async fn update(&self, id: &EntityId, mut ivr: IvrConfig) -> Result<IvrConfig, GatewayFailure> {
        let mut state = self.state.lock();
        state.updates.push((id.clone(), ivr.clone()));
        state.enter(Operation::Update)?;

        let stored = state
            .entities
            .get(id)
            .ok_or_else(|| GatewayFailure::NotFound(id.clone()))?;
        self.check_limit(Some(stored), &ivr)?;
        let remote = stored.version.unwrap_or_default();
        if let Some(requested) = ivr.version {
            if requested != remote {
                return Err(GatewayFailure::Conflict {
                    id: id.clone(),
                    remote,
                    requested,
                });
            }
        }

        ivr.id = Some(id.clone());
        ivr.version = Some(remote + 1);
        state.entities.insert(id.clone(), ivr.clone());
        Ok(ivr)
    }

    async fn delete(&self, id: &EntityId) -> Result<(), GatewayFailure> {
        let mut state = self.state.lock();
        state.enter(Operation::Delete)?;
        state
            .entities
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| GatewayFailure::NotFound(id.clone()))
    }
}

/// DID pool backed by a map, with scripted lookup failures
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    numbers: HashMap<Dnis, DidNumber>,
    failures_left: Mutex<usize>,
    lookups: Mutex<usize>,
}

impl InMemoryDirectory {
    /// Create an empty directory
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a pool entry
    #[must_use]
    pub fn with_number(mut self, entry: DidNumber) -> Self {
        self.numbers.insert(entry.number.clone(), entry);
        self
    }

    /// Add unassigned entries for every number
    #[must_use]
    pub fn with_unassigned<I: IntoIterator<Item = Dnis>>(self, numbers: I) -> Self {
        numbers
            .into_iter()
            .fold(self, |dir, n| dir.with_number(DidNumber::unassigned(n)))
    }

    /// Fail the next `count` lookups with a transport error
    #[must_use]
    pub fn failing_first(self, count: usize) -> Self {
        *self.failures_left.lock() = count;
        self
    }

    /// Lookups served so far, failed ones included
    #[must_use]
    pub fn lookups(&self) -> usize {
        *self.lookups.lock()
    }
}

#[async_trait]
impl NumberDirectory for InMemoryDirectory {
    async fn lookup(&self, number: &Dnis) -> Result<Vec<DidNumber>, GatewayFailure> {
        *self.lookups.lock() += 1;

        let mut failures_left = self.failures_left.lock();
        if *failures_left > 0 {
            *failures_left -= 1;
            return Err(GatewayFailure::transport("did pool lookup unavailable"));
        }

        Ok(self.numbers.get(number).cloned().into_iter().collect())
    }
}
