//! In-process broker — mailboxes, discovery callbacks, synchronous calls.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use meshcalc_registry::ServiceDescriptor;

use crate::error::{RpcError, RpcResult};
use crate::request::{Frame, HandlerRegistry, RpcRequest};

/// Callback invoked when a service registers with the discovery service.
///
/// An `Err` rejects the registration; the message travels back to the
/// registering side.
pub type JoinHandler = Arc<dyn Fn(&ServiceDescriptor) -> Result<(), String> + Send + Sync>;

/// Callback invoked when a service unregisters or expires.
///
/// The boolean flags an expiry ("zombie") rather than a graceful leave.
pub type LeaveHandler = Arc<dyn Fn(&ServiceDescriptor, bool) -> Result<(), String> + Send + Sync>;

/// One inbound call queued in a service's mailbox.
struct Invocation {
    request: RpcRequest,
    reply: oneshot::Sender<Result<Vec<Frame>, String>>,
}

/// An in-process stand-in for the external pub/sub + mailbox broker.
///
/// Each served descriptor gets a mailbox task that dispatches inbound
/// invocations through its [`HandlerRegistry`] and replies on a oneshot
/// channel. Calls are addressed by descriptor; the orchestrator observes
/// membership through the join/leave callbacks.
///
/// Cloning is cheap and all clones share one routing table.
#[derive(Clone, Default)]
pub struct LocalBroker {
    inner: Arc<BrokerInner>,
}

#[derive(Default)]
struct BrokerInner {
    /// Routing table: canonical descriptor → mailbox sender.
    mailboxes: Mutex<HashMap<String, mpsc::UnboundedSender<Invocation>>>,
    on_join: Mutex<Option<JoinHandler>>,
    on_leave: Mutex<Option<LeaveHandler>>,
}

impl LocalBroker {
    /// Create a broker with an empty routing table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the discovery-service join callback.
    pub fn set_on_join(&self, handler: JoinHandler) {
        *self.inner.on_join.lock().expect("broker lock poisoned") = Some(handler);
    }

    /// Install the discovery-service leave callback.
    pub fn set_on_leave(&self, handler: LeaveHandler) {
        *self.inner.on_leave.lock().expect("broker lock poisoned") = Some(handler);
    }

    /// Start serving a handler registry under a descriptor.
    ///
    /// Spawns the mailbox task; serving the same descriptor again replaces
    /// the previous mailbox. Handler errors are transported back to the
    /// caller as structured error payloads, never panics.
    pub fn serve(&self, descriptor: &ServiceDescriptor, registry: HandlerRegistry) {
        let (tx, mut rx) = mpsc::unbounded_channel::<Invocation>();
        {
            let mut mailboxes = self.inner.mailboxes.lock().expect("broker lock poisoned");
            mailboxes.insert(descriptor.encode(), tx);
        }

        info!(service = %descriptor, commands = ?registry.commands(), "serving RPC commands");

        let service = descriptor.encode();
        tokio::spawn(async move {
            while let Some(invocation) = rx.recv().await {
                let result = registry
                    .dispatch(&invocation.request)
                    .map_err(|e| e.to_string());
                // A send error means the caller timed out and dropped the
                // receiver; the late response is discarded.
                if invocation.reply.send(result).is_err() {
                    debug!(%service, "reply dropped, caller gave up");
                }
            }
            debug!(%service, "mailbox closed");
        });
    }

    /// Synchronous call: blocks the calling task until the target replies
    /// or `timeout` elapses.
    ///
    /// Timeouts are client-side only; the remote handler runs to
    /// completion regardless and its late reply is discarded.
    pub async fn call_sync(
        &self,
        target: &ServiceDescriptor,
        command: &str,
        args: Vec<Frame>,
        timeout: Duration,
    ) -> RpcResult<Vec<Frame>> {
        let tx = {
            let mailboxes = self.inner.mailboxes.lock().expect("broker lock poisoned");
            mailboxes.get(&target.encode()).cloned()
        };
        let tx = tx.ok_or_else(|| RpcError::Transport(format!("no route to {target}")))?;

        let (reply_tx, reply_rx) = oneshot::channel();
        tx.send(Invocation {
            request: RpcRequest::new(command, args),
            reply: reply_tx,
        })
        .map_err(|_| RpcError::Transport(format!("mailbox closed for {target}")))?;

        match tokio::time::timeout(timeout, reply_rx).await {
            Err(_) => Err(RpcError::Timeout),
            Ok(Err(_)) => Err(RpcError::Transport(format!("no reply from {target}"))),
            Ok(Ok(Ok(frames))) => Ok(frames),
            Ok(Ok(Err(message))) => Err(RpcError::RemoteError(message)),
        }
    }

    /// Announce a service to the discovery service, retrying until the
    /// orchestrator is listening.
    ///
    /// Tries up to `retries + 1` times, sleeping `retry_interval` between
    /// attempts, then fails with [`RpcError::Registration`]. A rejection
    /// from the join callback fails immediately.
    pub async fn register_with_discovery(
        &self,
        descriptor: &ServiceDescriptor,
        retries: u32,
        retry_interval: Duration,
    ) -> RpcResult<()> {
        for attempt in 0..=retries {
            let handler = {
                let on_join = self.inner.on_join.lock().expect("broker lock poisoned");
                on_join.clone()
            };

            if let Some(handler) = handler {
                return match handler(descriptor) {
                    Ok(()) => {
                        info!(service = %descriptor, "registered with discovery service");
                        Ok(())
                    }
                    Err(message) => Err(RpcError::Registration(message)),
                };
            }

            if attempt < retries {
                debug!(
                    service = %descriptor,
                    attempt = attempt + 1,
                    "discovery service not listening yet, retrying"
                );
                tokio::time::sleep(retry_interval).await;
            }
        }

        Err(RpcError::Registration(format!(
            "discovery service unavailable after {} attempts",
            retries + 1
        )))
    }

    /// Withdraw a service: removes its route and notifies the discovery
    /// service.
    ///
    /// `zombie` marks a simulated liveness expiry instead of a graceful
    /// leave. Callback errors are reported by the discovery side already,
    /// so they are only logged here.
    pub fn unregister(&self, descriptor: &ServiceDescriptor, zombie: bool) {
        {
            let mut mailboxes = self.inner.mailboxes.lock().expect("broker lock poisoned");
            mailboxes.remove(&descriptor.encode());
        }

        let handler = {
            let on_leave = self.inner.on_leave.lock().expect("broker lock poisoned");
            on_leave.clone()
        };
        if let Some(handler) = handler {
            if let Err(message) = handler(descriptor, zombie) {
                warn!(service = %descriptor, %message, "leave notification rejected");
            }
        }
    }

    /// Whether a route exists for a descriptor.
    pub fn has_route(&self, descriptor: &ServiceDescriptor) -> bool {
        let mailboxes = self.inner.mailboxes.lock().expect("broker lock poisoned");
        mailboxes.contains_key(&descriptor.encode())
    }
}
