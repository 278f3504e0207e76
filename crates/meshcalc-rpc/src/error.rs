//! RPC error types.

use thiserror::Error;

/// Result type alias for RPC operations.
pub type RpcResult<T> = Result<T, RpcError>;

/// Errors that can occur on either side of an RPC call.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RpcError {
    /// A handler received a malformed or missing positional argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// No handler is registered for the requested command name.
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// No response arrived within the caller's deadline.
    #[error("call timed out")]
    Timeout,

    /// The remote handler returned a structured error.
    #[error("remote error: {0}")]
    RemoteError(String),

    /// Selection found zero live members of the requested type.
    #[error("no available member of type {0:?}")]
    NoAvailableMember(String),

    /// Startup-time registration with the discovery service failed.
    #[error("registration failed: {0}")]
    Registration(String),

    /// The broker could not route or deliver the call.
    #[error("transport error: {0}")]
    Transport(String),
}
