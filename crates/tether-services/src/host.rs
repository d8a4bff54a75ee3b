//! Serializing host — runs a [`ServiceBridge`] inside one tokio task.
//!
//! Client requests and status-change callbacks are both turned into
//! [`Command`]s on a single unbounded queue, so the bridge sees them in one
//! total order and never needs a lock. Status flags are read inside the
//! callback, when the transition happens, and travel with the event.
//! Request tokens are oneshot senders; a client whose token is dropped
//! unanswered sees [`RequestError::Abandoned`].

use std::sync::{Arc, Weak};

use serde_json::Value;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;

use tether_core::{
    AttributeValue, PropertyError, RequestError, ServiceHandle, ServiceProperties, ServiceStatus,
    StatusFlags, TetherConfig,
};

use crate::backend::{ObjectBus, ServiceBackend};
use crate::bridge::ServiceBridge;

type ReplyTx = oneshot::Sender<Result<(), RequestError>>;

enum Command {
    Connect {
        handle: ServiceHandle,
        reply: ReplyTx,
    },
    Disconnect {
        handle: ServiceHandle,
        reply: ReplyTx,
    },
    Notify {
        handle: ServiceHandle,
        old: ServiceStatus,
        new: ServiceStatus,
        flags: StatusFlags,
    },
    Properties {
        handle: ServiceHandle,
        reply: oneshot::Sender<Result<ServiceProperties, PropertyError>>,
    },
    GetProperty {
        handle: ServiceHandle,
        name: String,
        reply: oneshot::Sender<Result<AttributeValue, PropertyError>>,
    },
    SetProperty {
        handle: ServiceHandle,
        name: String,
        value: Value,
        reply: oneshot::Sender<Result<(), PropertyError>>,
    },
}

pub struct BridgeHost {
    bridge: ServiceBridge<ReplyTx>,
    commands: mpsc::UnboundedReceiver<Command>,
    shutdown: broadcast::Receiver<()>,
}

impl BridgeHost {
    /// Build the bridge, subscribe it to status changes and spawn its task.
    ///
    /// Must be called from within a tokio runtime. The task ends when
    /// [`BridgeClient::shutdown`] is called. The status callback holds a
    /// queue sender, so dropping every client alone does not stop it.
    pub fn spawn(
        config: &TetherConfig,
        backend: Arc<dyn ServiceBackend>,
        bus: Arc<dyn ObjectBus>,
    ) -> (BridgeClient, JoinHandle<anyhow::Result<()>>) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        // Weak: the backend owns the callback, which must not keep it alive.
        let source: Weak<dyn ServiceBackend> = Arc::downgrade(&backend);
        let mut bridge = ServiceBridge::new(backend, bus, &config.bridge);
        let notify_tx = command_tx.clone();
        bridge.start(Box::new(move |handle, old, new| {
            let flags = source
                .upgrade()
                .map(|backend| backend.flags(handle))
                .unwrap_or_default();
            let cmd = Command::Notify {
                handle,
                old,
                new,
                flags,
            };
            if notify_tx.send(cmd).is_err() {
                tracing::debug!(%handle, "bridge host gone, state change dropped");
            }
        }));

        let host = BridgeHost {
            bridge,
            commands: command_rx,
            shutdown: shutdown_rx,
        };
        let task = tokio::spawn(host.run());

        let client = BridgeClient {
            commands: command_tx,
            shutdown: shutdown_tx,
        };
        (client, task)
    }

    async fn run(mut self) -> anyhow::Result<()> {
        tracing::info!(interface = self.bridge.registry().interface(), "service bridge started");
        loop {
            tokio::select! {
                _ = self.shutdown.recv() => {
                    tracing::info!("service bridge shutting down");
                    break;
                }

                cmd = self.commands.recv() => {
                    match cmd {
                        Some(cmd) => self.handle(cmd),
                        None => {
                            tracing::info!("command queue closed, service bridge exiting");
                            break;
                        }
                    }
                }
            }
        }
        self.bridge.shutdown();
        Ok(())
    }

    fn handle(&mut self, cmd: Command) {
        match cmd {
            Command::Connect { handle, reply } => {
                let _ = self.bridge.connect(handle, reply);
            }
            Command::Disconnect { handle, reply } => {
                let _ = self.bridge.disconnect(handle, reply);
            }
            Command::Notify {
                handle,
                old,
                new,
                flags,
            } => {
                tracing::trace!(%handle, ?old, ?new, ?flags, "service state change");
                self.bridge.on_notify(handle, new, flags);
            }
            Command::Properties { handle, reply } => {
                let _ = reply.send(self.bridge.properties(handle));
            }
            Command::GetProperty {
                handle,
                name,
                reply,
            } => {
                let _ = reply.send(self.bridge.get_property(handle, &name));
            }
            Command::SetProperty {
                handle,
                name,
                value,
                reply,
            } => {
                let _ = reply.send(self.bridge.set_property(handle, &name, &value));
            }
        }
    }
}

// ── Client ────────────────────────────────────────────────────────────────────

/// Cloneable front door to a running [`BridgeHost`].
#[derive(Clone)]
pub struct BridgeClient {
    commands: mpsc::UnboundedSender<Command>,
    shutdown: broadcast::Sender<()>,
}

/// A request already queued on the host, awaiting its single reply.
pub struct PendingRequest {
    reply: oneshot::Receiver<Result<(), RequestError>>,
}

impl PendingRequest {
    pub async fn outcome(self) -> Result<(), RequestError> {
        self.reply.await.unwrap_or(Err(RequestError::Abandoned))
    }

    /// Non-blocking check. `None` while the request is still outstanding.
    pub fn try_outcome(&mut self) -> Option<Result<(), RequestError>> {
        match self.reply.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => Some(Err(RequestError::Abandoned)),
        }
    }
}

impl BridgeClient {
    /// Queue a connect and wait for its reply.
    pub async fn connect(&self, handle: ServiceHandle) -> Result<(), RequestError> {
        self.submit_connect(handle).outcome().await
    }

    /// Queue a disconnect and wait for its reply.
    pub async fn disconnect(&self, handle: ServiceHandle) -> Result<(), RequestError> {
        self.submit_disconnect(handle).outcome().await
    }

    /// Queue a connect without waiting. Commands queued afterwards are seen
    /// by the bridge after this one.
    pub fn submit_connect(&self, handle: ServiceHandle) -> PendingRequest {
        self.submit(|reply| Command::Connect { handle, reply })
    }

    pub fn submit_disconnect(&self, handle: ServiceHandle) -> PendingRequest {
        self.submit(|reply| Command::Disconnect { handle, reply })
    }

    /// Inject a status change, as the status-source callback would. `flags`
    /// are the ones in effect at the transition.
    pub fn notify(
        &self,
        handle: ServiceHandle,
        old: ServiceStatus,
        new: ServiceStatus,
        flags: StatusFlags,
    ) {
        let cmd = Command::Notify {
            handle,
            old,
            new,
            flags,
        };
        if self.commands.send(cmd).is_err() {
            tracing::debug!(%handle, "bridge host gone, state change dropped");
        }
    }

    pub async fn properties(
        &self,
        handle: ServiceHandle,
    ) -> Result<ServiceProperties, PropertyError> {
        let (reply, rx) = oneshot::channel();
        self.query(Command::Properties { handle, reply }, rx).await
    }

    pub async fn get_property(
        &self,
        handle: ServiceHandle,
        name: &str,
    ) -> Result<AttributeValue, PropertyError> {
        let (reply, rx) = oneshot::channel();
        let name = name.to_string();
        self.query(Command::GetProperty { handle, name, reply }, rx)
            .await
    }

    pub async fn set_property(
        &self,
        handle: ServiceHandle,
        name: &str,
        value: Value,
    ) -> Result<(), PropertyError> {
        let (reply, rx) = oneshot::channel();
        let name = name.to_string();
        self.query(
            Command::SetProperty {
                handle,
                name,
                value,
                reply,
            },
            rx,
        )
        .await
    }

    /// Ask the host to stop. Remaining control blocks are discarded.
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(());
    }

    fn submit(&self, make: impl FnOnce(ReplyTx) -> Command) -> PendingRequest {
        let (reply, rx) = oneshot::channel();
        // A refused send drops `reply`, which the receiver reports as abandoned.
        let _ = self.commands.send(make(reply));
        PendingRequest { reply: rx }
    }

    async fn query<T>(
        &self,
        cmd: Command,
        rx: oneshot::Receiver<Result<T, PropertyError>>,
    ) -> Result<T, PropertyError> {
        if self.commands.send(cmd).is_err() {
            return Err(PropertyError::UnknownService);
        }
        rx.await.unwrap_or(Err(PropertyError::UnknownService))
    }
}
