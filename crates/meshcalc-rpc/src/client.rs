//! RPC client — a cloneable handle for issuing synchronous calls.

use std::time::Duration;

use meshcalc_registry::ServiceDescriptor;

use crate::broker::LocalBroker;
use crate::error::RpcResult;
use crate::request::Frame;

/// Issues synchronous, timeout-bounded calls through the broker.
///
/// Only the issuing task is suspended while a call is in flight; clones
/// share the broker's routing table and can call concurrently. Retry
/// policy is the caller's responsibility.
#[derive(Clone)]
pub struct RpcClient {
    broker: LocalBroker,
}

impl RpcClient {
    /// Create a client over a broker.
    pub fn new(broker: LocalBroker) -> Self {
        Self { broker }
    }

    /// Call `command` on the member addressed by `target`.
    ///
    /// Returns the response frames, or a typed failure: `Timeout` when the
    /// deadline elapses, `RemoteError` when the handler returned a
    /// structured error, `Transport` when no route exists.
    pub async fn call(
        &self,
        target: &ServiceDescriptor,
        command: &str,
        args: Vec<Frame>,
        timeout: Duration,
    ) -> RpcResult<Vec<Frame>> {
        self.broker.call_sync(target, command, args, timeout).await
    }
}
