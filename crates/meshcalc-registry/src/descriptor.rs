//! Service identity — descriptors and the closed set of worker kinds.

use std::fmt;

use crate::error::{RegistryError, RegistryResult};

/// Type tag of the orchestrator itself. There is only one orchestrator,
/// so its service id is the empty string.
pub const ORCHESTRATOR_TYPE: &str = "orc";

/// Identity of a participant: a short category tag plus an id unique
/// within that category (empty for singleton types).
///
/// Descriptors are immutable value objects; equality is by both fields.
/// The canonical string form `svc:<type>:<id>` is used for transport
/// addressing and logging.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServiceDescriptor {
    service_type: String,
    service_id: String,
}

impl ServiceDescriptor {
    /// Create a descriptor from its parts.
    pub fn new(service_type: impl Into<String>, service_id: impl Into<String>) -> Self {
        Self {
            service_type: service_type.into(),
            service_id: service_id.into(),
        }
    }

    /// Parse the canonical `svc:<type>:<id>` form.
    ///
    /// The id segment may be empty; the type segment may not.
    pub fn parse(full_id: &str) -> RegistryResult<Self> {
        let malformed = || RegistryError::MalformedServiceId(full_id.to_string());

        let rest = full_id.strip_prefix("svc:").ok_or_else(|| malformed())?;
        let (service_type, service_id) = rest.split_once(':').ok_or_else(|| malformed())?;
        if service_type.is_empty() || service_id.contains(':') {
            return Err(malformed());
        }
        Ok(Self::new(service_type, service_id))
    }

    /// The category tag, e.g. `"calc"`.
    pub fn service_type(&self) -> &str {
        &self.service_type
    }

    /// The id within the category. Empty for singleton types.
    pub fn service_id(&self) -> &str {
        &self.service_id
    }

    /// Canonical string form `svc:<type>:<id>`.
    pub fn encode(&self) -> String {
        format!("svc:{}:{}", self.service_type, self.service_id)
    }
}

impl fmt::Display for ServiceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "svc:{}:{}", self.service_type, self.service_id)
    }
}

/// The closed set of worker kinds the orchestrator knows how to track.
///
/// Registry dispatch matches on this enum rather than on raw tag strings,
/// so adding a kind is a compile-checked change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceKind {
    /// Scalar arithmetic worker (`calc`).
    Calculator,
    /// Linear algebra worker (`linalg`).
    Linalg,
}

impl ServiceKind {
    /// Classify a type tag, `None` for anything outside the closed set.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "calc" => Some(Self::Calculator),
            "linalg" => Some(Self::Linalg),
            _ => None,
        }
    }

    /// The wire tag for this kind.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Calculator => "calc",
            Self::Linalg => "linalg",
        }
    }
}
