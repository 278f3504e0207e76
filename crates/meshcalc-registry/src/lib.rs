//! meshcalc-registry — live membership tracking for the orchestrator.
//!
//! The orchestrator learns about workers through asynchronous join and
//! leave/expire notifications from the broker. This crate owns that state:
//!
//! - [`ServiceDescriptor`] identifies a participant (`svc:<type>:<id>`)
//! - [`MemberTable`] is the single source of truth for "is this member
//!   currently reachable", guarded by one exclusive lock
//! - [`ServiceRegistry`] reacts to join/leave events, classifying the
//!   service type and mutating the table
//!
//! The table is an owned, injectable component: it is passed explicitly to
//! the event handler and the scheduler so both can be unit tested against
//! a private instance.

pub mod descriptor;
pub mod error;
pub mod events;
pub mod table;

pub use descriptor::{ServiceDescriptor, ServiceKind, ORCHESTRATOR_TYPE};
pub use error::{RegistryError, RegistryResult};
pub use events::ServiceRegistry;
pub use table::{MemberHandle, MemberTable};
