use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use chatrelay_core::error::{ChatError, Result};
use chatrelay_core::BroadcastMessage;

use crate::observer::{ClientListChange, ServerObserver};
use crate::realtime::core::{ClientRegistry, RelayStats};
use crate::realtime::types::{PreparedFrame, SessionHandle};

/// Commands sessions send to the relay actor.
#[derive(Debug)]
pub enum RelayCommand {
    /// Handshake done: activate, register, announce.
    Join(SessionHandle),
    /// Session closed itself: unregister and announce, once.
    Leave(SessionHandle),
    /// Fan one message out to the current registry snapshot.
    Publish(BroadcastMessage),
    /// Drain nothing further and stop.
    Shutdown,
}

/// Broadcast relay: the only mutator of the client registry.
///
/// Commands are processed one at a time, so two messages read by the same
/// session reach every recipient queue in read order.
pub struct Relay {
    registry: Arc<ClientRegistry>,
    observer: Arc<dyn ServerObserver>,
    stats: Arc<RelayStats>,
    max_frame_len: usize,
}

impl Relay {
    pub fn new(
        registry: Arc<ClientRegistry>,
        observer: Arc<dyn ServerObserver>,
        stats: Arc<RelayStats>,
        max_frame_len: usize,
    ) -> Self {
        Self {
            registry,
            observer,
            stats,
            max_frame_len,
        }
    }

    /// Start the actor task.
    pub fn spawn(self, queue: usize) -> (RelayHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(queue.max(1));
        let task = tokio::spawn(self.run(rx));
        (RelayHandle { tx }, task)
    }

    async fn run(self, mut rx: mpsc::Receiver<RelayCommand>) {
        while let Some(cmd) = rx.recv().await {
            match cmd {
                RelayCommand::Join(session) => self.join(session),
                RelayCommand::Leave(session) => self.leave(&session),
                RelayCommand::Publish(msg) => self.broadcast(msg),
                RelayCommand::Shutdown => break,
            }
        }
        tracing::debug!(stats = ?self.stats.snapshot(), "relay stopped");
    }

    /// Register a session that finished its handshake and announce it.
    /// The new session is registered first, so it sees its own notice.
    pub fn join(&self, session: SessionHandle) {
        if !session.activate() {
            tracing::debug!(session_id = session.id(), "session closed before join");
            return;
        }
        self.registry.register(session.clone());

        let from = session
            .peer()
            .map(|p| p.ip().to_string())
            .unwrap_or_else(|| "unknown".into());
        self.observer
            .on_client_list_changed(ClientListChange::Added, session.name());
        self.observer
            .on_server_log(&format!("{} connected from {}", session.name(), from));
        tracing::info!(session_id = session.id(), name = %session.name(), %from, "session joined");

        self.broadcast(BroadcastMessage::joined(session.name_arc()));
    }

    /// Remove a closed session. Only an actual removal is announced.
    pub fn leave(&self, session: &SessionHandle) {
        session.close();
        if self.registry.unregister(session.id()).is_none() {
            return;
        }
        self.announce_removed(session);
        self.broadcast(BroadcastMessage::left(session.name_arc()));
    }

    /// Best-effort fan-out. Never fails to the caller.
    ///
    /// A recipient whose queue is full or gone is closed and removed here;
    /// its "left" notice goes out after the current message.
    pub fn broadcast(&self, msg: BroadcastMessage) {
        let mut pending = VecDeque::from([msg]);
        while let Some(msg) = pending.pop_front() {
            for session in self.fan_out(&msg) {
                if self.registry.unregister(session.id()).is_some() {
                    self.announce_removed(&session);
                    pending.push_back(BroadcastMessage::left(session.name_arc()));
                }
            }
        }
    }

    /// Returns the sessions this pass closed.
    fn fan_out(&self, msg: &BroadcastMessage) -> Vec<SessionHandle> {
        let prepared = match PreparedFrame::prepare(msg, self.max_frame_len) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(error = %e, "broadcast dropped: encode failed");
                return Vec::new();
            }
        };

        self.stats.record_broadcast();
        self.observer.on_server_log(prepared.line());

        let mut closed = Vec::new();
        for session in self.registry.snapshot() {
            if session.is_closed() {
                continue;
            }
            match session.try_deliver(prepared.wire()) {
                Ok(()) => self.stats.record_delivery(),
                Err(e) => {
                    self.stats.record_failure();
                    tracing::warn!(
                        session_id = session.id(),
                        name = %session.name(),
                        reason = ?e,
                        "delivery failed, closing session"
                    );
                    // Whoever else is closing it will send the Leave.
                    if session.close() {
                        closed.push(session);
                    }
                }
            }
        }
        closed
    }

    fn announce_removed(&self, session: &SessionHandle) {
        self.observer
            .on_client_list_changed(ClientListChange::Removed, session.name());
        self.observer
            .on_server_log(&format!("{} disconnected.", session.name()));
        tracing::info!(session_id = session.id(), name = %session.name(), "session left");
    }
}

/// Sender side of the relay command channel.
#[derive(Clone, Debug)]
pub struct RelayHandle {
    tx: mpsc::Sender<RelayCommand>,
}

impl RelayHandle {
    pub async fn join(&self, session: SessionHandle) -> Result<()> {
        self.send(RelayCommand::Join(session)).await
    }

    pub async fn leave(&self, session: SessionHandle) -> Result<()> {
        self.send(RelayCommand::Leave(session)).await
    }

    pub async fn publish(&self, msg: BroadcastMessage) -> Result<()> {
        self.send(RelayCommand::Publish(msg)).await
    }

    pub async fn shutdown(&self) {
        let _ = self.tx.send(RelayCommand::Shutdown).await;
    }

    async fn send(&self, cmd: RelayCommand) -> Result<()> {
        self.tx
            .send(cmd)
            .await
            .map_err(|_| ChatError::Internal("relay stopped".into()))
    }
}
