//! Registry error types.

use thiserror::Error;

/// Result type alias for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Errors that can occur while handling registry events.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// A join or leave notification named a service type the registry
    /// does not track.
    #[error("unknown service type: {0}")]
    UnknownServiceType(String),

    /// A descriptor string did not match the `svc:<type>:<id>` form.
    #[error("malformed service id: {0:?}")]
    MalformedServiceId(String),
}
