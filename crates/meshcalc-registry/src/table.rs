//! Member table — the single source of truth for reachable workers.

use std::collections::HashMap;
use std::sync::Mutex;

use rand::Rng;

use crate::descriptor::{ServiceDescriptor, ServiceKind};

/// A live registry entry for one reachable member.
///
/// Handles are created on join and dropped on leave/expiry, never mutated
/// in place. Within the broker a member is addressed by its descriptor,
/// so the handle carries everything a caller needs to target it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberHandle {
    descriptor: ServiceDescriptor,
    kind: ServiceKind,
}

impl MemberHandle {
    /// Create a handle for a classified member.
    pub fn new(descriptor: ServiceDescriptor, kind: ServiceKind) -> Self {
        Self { descriptor, kind }
    }

    /// The member's identity, used to address calls.
    pub fn descriptor(&self) -> &ServiceDescriptor {
        &self.descriptor
    }

    /// The member's classified kind.
    pub fn kind(&self) -> ServiceKind {
        self.kind
    }
}

/// Concurrency-safe mapping `service_type → service_id → handle`.
///
/// All mutation goes through one exclusive lock, making insert, remove and
/// pick linearizable with respect to each other. The lock is never held
/// across a network call. At most one handle exists per descriptor.
#[derive(Debug, Default)]
pub struct MemberTable {
    inner: Mutex<HashMap<String, HashMap<String, MemberHandle>>>,
}

impl MemberTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the entry for the handle's descriptor. Idempotent.
    pub fn upsert(&self, handle: MemberHandle) {
        let mut inner = self.inner.lock().expect("member table lock poisoned");
        inner
            .entry(handle.descriptor().service_type().to_string())
            .or_default()
            .insert(handle.descriptor().service_id().to_string(), handle);
    }

    /// Remove the entry for a descriptor.
    ///
    /// Returns whether anything was removed; removal of an absent
    /// descriptor is a no-op, not an error.
    pub fn remove(&self, descriptor: &ServiceDescriptor) -> bool {
        let mut inner = self.inner.lock().expect("member table lock poisoned");
        let Some(members) = inner.get_mut(descriptor.service_type()) else {
            return false;
        };
        let removed = members.remove(descriptor.service_id()).is_some();
        if members.is_empty() {
            inner.remove(descriptor.service_type());
        }
        removed
    }

    /// Pick a uniformly-random live member of the given type.
    ///
    /// Returns `None` when the type has zero members; never blocks waiting
    /// for one to appear. Uniformity holds at the instant of selection.
    pub fn pick_random(&self, service_type: &str) -> Option<MemberHandle> {
        let inner = self.inner.lock().expect("member table lock poisoned");
        let members = inner.get(service_type)?;
        if members.is_empty() {
            return None;
        }
        let idx = rand::thread_rng().gen_range(0..members.len());
        members.values().nth(idx).cloned()
    }

    /// Number of live members of the given type.
    pub fn count(&self, service_type: &str) -> usize {
        let inner = self.inner.lock().expect("member table lock poisoned");
        inner.get(service_type).map_or(0, HashMap::len)
    }

    /// Total number of live members across all types.
    pub fn len(&self) -> usize {
        let inner = self.inner.lock().expect("member table lock poisoned");
        inner.values().map(HashMap::len).sum()
    }

    /// Whether the table has no members at all.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
