//! Registry event handler — reacts to broker join/leave notifications.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::descriptor::{ServiceDescriptor, ServiceKind};
use crate::error::{RegistryError, RegistryResult};
use crate::table::{MemberHandle, MemberTable};

/// Applies join and leave/expire notifications to the member table.
///
/// Notifications arrive asynchronously from the broker, so both handlers
/// are safe to invoke concurrently; every mutation goes through the
/// table's lock. Unknown service types are reported back to the broker
/// layer as errors without touching shared state or terminating anything.
pub struct ServiceRegistry {
    table: Arc<MemberTable>,
}

impl ServiceRegistry {
    /// Create a registry mutating the given table.
    pub fn new(table: Arc<MemberTable>) -> Self {
        Self { table }
    }

    /// Handle a join notification.
    ///
    /// Known types get a handle upserted into the table (idempotent for a
    /// repeated join). Unknown types yield
    /// [`RegistryError::UnknownServiceType`].
    pub fn handle_join(&self, descriptor: &ServiceDescriptor) -> RegistryResult<()> {
        let Some(kind) = ServiceKind::from_tag(descriptor.service_type()) else {
            warn!(service = %descriptor, "unknown service type to register");
            return Err(RegistryError::UnknownServiceType(
                descriptor.service_type().to_string(),
            ));
        };

        self.table.upsert(MemberHandle::new(descriptor.clone(), kind));
        match kind {
            ServiceKind::Calculator => {
                info!(service = %descriptor, "calculator module registered");
            }
            ServiceKind::Linalg => {
                info!(service = %descriptor, "linalg module registered");
            }
        }
        Ok(())
    }

    /// Handle a leave or expiry notification.
    ///
    /// `zombie` marks an expiry (liveness timed out without an explicit
    /// unregister) and only changes the logged message. A leave for a
    /// member that is not registered is a benign no-op; an unknown type
    /// yields [`RegistryError::UnknownServiceType`].
    pub fn handle_leave(&self, descriptor: &ServiceDescriptor, zombie: bool) -> RegistryResult<()> {
        if ServiceKind::from_tag(descriptor.service_type()).is_none() {
            warn!(service = %descriptor, "unknown service type to unregister");
            return Err(RegistryError::UnknownServiceType(
                descriptor.service_type().to_string(),
            ));
        }

        if !self.table.remove(descriptor) {
            debug!(service = %descriptor, "leave for unregistered member ignored");
            return Ok(());
        }

        if zombie {
            info!(service = %descriptor, "member is not alive anymore, unregistered");
        } else {
            info!(service = %descriptor, "member unregistered");
        }
        Ok(())
    }
}
