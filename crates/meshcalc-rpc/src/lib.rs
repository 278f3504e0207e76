//! meshcalc-rpc — synchronous RPC over the broker boundary.
//!
//! The external system exposes a pub/sub + mailbox broker; this crate
//! realises that boundary in-process with [`LocalBroker`]:
//!
//! - workers [`serve`](LocalBroker::serve) a [`HandlerRegistry`] mapping
//!   command names to handler functions
//! - the orchestrator installs join/leave callbacks and workers announce
//!   themselves via
//!   [`register_with_discovery`](LocalBroker::register_with_discovery)
//! - [`RpcClient::call`] blocks the calling task until a response arrives
//!   or the deadline elapses
//!
//! Requests and responses are sequences of binary-safe [`Frame`]s; by
//! convention the first frame of a successful response identifies the
//! responding implementation and the rest are command-specific payload.

pub mod broker;
pub mod client;
pub mod error;
pub mod request;

pub use broker::{JoinHandler, LeaveHandler, LocalBroker};
pub use client::RpcClient;
pub use error::{RpcError, RpcResult};
pub use request::{Frame, HandlerRegistry, RpcHandler, RpcRequest};
