//! `ChatServer`: explicit start/stop control over the relay stack.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};
use tokio_util::task::TaskTracker;

use chatrelay_core::error::{ChatError, Result};

use crate::config::ServerSection;
use crate::observer::ServerObserver;
use crate::realtime::{ClientRegistry, Relay, RelayHandle, RelayStats, RelayStatsSnapshot};
use crate::transport::listener::{self, AcceptCtx};

/// A running relay server. Dropping it without `stop` still cancels every task.
pub struct ChatServer {
    local_addr: SocketAddr,
    registry: Arc<ClientRegistry>,
    relay: RelayHandle,
    stats: Arc<RelayStats>,
    observer: Arc<dyn ServerObserver>,
    shutdown: CancellationToken,
    tracker: TaskTracker,
    accept_task: JoinHandle<()>,
    relay_task: JoinHandle<()>,
    _guard: DropGuard,
}

impl ChatServer {
    /// Bind, then start the relay actor and the accept loop.
    /// A bind failure is reported once and nothing is started.
    pub async fn start(cfg: ServerSection, observer: Arc<dyn ServerObserver>) -> Result<Self> {
        cfg.validate()?;

        let addr = cfg.listen_addr();
        let listener = match listener::bind(&addr).await {
            Ok(l) => l,
            Err(e) => {
                observer.on_server_log(&format!("Error starting server: {e}"));
                return Err(e);
            }
        };
        let local_addr = listener
            .local_addr()
            .map_err(|source| ChatError::Bind { addr, source })?;

        let cfg = Arc::new(cfg);
        let registry = Arc::new(ClientRegistry::new());
        let stats = Arc::new(RelayStats::new());
        let (relay, relay_task) = Relay::new(
            Arc::clone(&registry),
            Arc::clone(&observer),
            Arc::clone(&stats),
            cfg.max_frame_bytes,
        )
        .spawn(cfg.relay_queue);

        let shutdown = CancellationToken::new();
        let tracker = TaskTracker::new();
        let accept_task = tokio::spawn(listener::accept_loop(
            listener,
            AcceptCtx {
                relay: relay.clone(),
                cfg: Arc::clone(&cfg),
                shutdown: shutdown.clone(),
                tracker: tracker.clone(),
            },
        ));

        observer.on_server_log(&format!("Server started on port {}", local_addr.port()));
        tracing::info!(%local_addr, "chatrelay server started");

        Ok(Self {
            local_addr,
            registry,
            relay,
            stats,
            observer,
            _guard: shutdown.clone().drop_guard(),
            shutdown,
            tracker,
            accept_task,
            relay_task,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Names of registered sessions, in join order.
    pub fn client_names(&self) -> Vec<String> {
        self.registry.names()
    }

    pub fn client_count(&self) -> usize {
        self.registry.len()
    }

    pub fn registry(&self) -> Arc<ClientRegistry> {
        Arc::clone(&self.registry)
    }

    pub fn stats(&self) -> RelayStatsSnapshot {
        self.stats.snapshot()
    }

    /// Close the listener, close every registered session once, wait for all
    /// session tasks, then stop the relay.
    pub async fn stop(self) {
        self.shutdown.cancel();
        let _ = self.accept_task.await;

        for session in self.registry.snapshot() {
            if session.close() {
                let _ = self.relay.leave(session).await;
            }
        }

        self.tracker.close();
        self.tracker.wait().await;

        self.relay.shutdown().await;
        let _ = self.relay_task.await;

        self.observer.on_server_log("Server stopped.");
        tracing::info!(stats = ?self.stats.snapshot(), "chatrelay server stopped");
    }
}
