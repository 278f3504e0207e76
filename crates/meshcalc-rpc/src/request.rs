//! RPC requests and the command → handler mapping.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{RpcError, RpcResult};

/// One positional field of a request or response.
///
/// Frames are binary-safe: arithmetic commands carry ASCII decimal text,
/// matrix commands carry raw payload bytes.
pub type Frame = Vec<u8>;

/// A handler for one command: positional frames in, response frames out.
///
/// Handlers return structured errors rather than panicking on malformed
/// input; the broker transports an `Err` back to the caller as an error
/// payload.
pub type RpcHandler = Arc<dyn Fn(&RpcRequest) -> RpcResult<Vec<Frame>> + Send + Sync>;

/// An inbound call as seen by a handler.
#[derive(Debug, Clone)]
pub struct RpcRequest {
    command: String,
    args: Vec<Frame>,
}

impl RpcRequest {
    /// Build a request for a command with positional arguments.
    pub fn new(command: impl Into<String>, args: Vec<Frame>) -> Self {
        Self {
            command: command.into(),
            args,
        }
    }

    /// The command name this request targets.
    pub fn command(&self) -> &str {
        &self.command
    }

    /// All positional arguments.
    pub fn args(&self) -> &[Frame] {
        &self.args
    }

    /// Positional argument by index.
    pub fn arg(&self, idx: usize) -> RpcResult<&[u8]> {
        self.args
            .get(idx)
            .map(Vec::as_slice)
            .ok_or_else(|| RpcError::InvalidArgument(format!("missing argument {idx}")))
    }

    /// Positional argument decoded as UTF-8 text.
    pub fn arg_str(&self, idx: usize) -> RpcResult<&str> {
        std::str::from_utf8(self.arg(idx)?)
            .map_err(|_| RpcError::InvalidArgument(format!("argument {idx} is not valid UTF-8")))
    }

    /// Positional argument parsed as a signed decimal integer.
    pub fn arg_i64(&self, idx: usize) -> RpcResult<i64> {
        let text = self.arg_str(idx)?;
        text.parse().map_err(|_| {
            RpcError::InvalidArgument(format!("argument {idx} is not an integer: {text:?}"))
        })
    }
}

/// Maps command names to handler functions.
///
/// Built once at worker startup and read-only afterwards; dispatch of an
/// unregistered name yields [`RpcError::UnknownCommand`]. Command matching
/// is exact-string, case- and spelling-sensitive.
#[derive(Default, Clone)]
pub struct HandlerRegistry {
    handlers: HashMap<String, RpcHandler>,
}

impl HandlerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under a command name, replacing any previous one.
    pub fn register(&mut self, command: impl Into<String>, handler: RpcHandler) {
        self.handlers.insert(command.into(), handler);
    }

    /// Dispatch a request to its handler.
    pub fn dispatch(&self, request: &RpcRequest) -> RpcResult<Vec<Frame>> {
        match self.handlers.get(request.command()) {
            Some(handler) => handler(request),
            None => Err(RpcError::UnknownCommand(request.command().to_string())),
        }
    }

    /// Registered command names, for startup logging.
    pub fn commands(&self) -> Vec<&str> {
        self.handlers.keys().map(String::as_str).collect()
    }

    /// Number of registered commands.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether no commands are registered.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
