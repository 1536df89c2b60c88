//! Accept loop.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use chatrelay_core::error::{ChatError, Result};

use crate::config::ServerSection;
use crate::realtime::{RelayHandle, SessionId};
use crate::transport::session::{run_session, SessionCtx};

// Backoff after a failed accept (e.g. EMFILE) so the loop does not spin.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(50);

/// Bind the listening socket. Fatal to server start, never retried.
pub async fn bind(addr: &str) -> Result<TcpListener> {
    TcpListener::bind(addr).await.map_err(|source| ChatError::Bind {
        addr: addr.to_owned(),
        source,
    })
}

pub(crate) struct AcceptCtx {
    pub relay: RelayHandle,
    pub cfg: Arc<ServerSection>,
    pub shutdown: CancellationToken,
    pub tracker: TaskTracker,
}

/// Accept until `shutdown` fires, spawning one session task per socket.
/// The listener is dropped (closed) on the way out.
pub(crate) async fn accept_loop(listener: TcpListener, ctx: AcceptCtx) {
    let mut next_id: SessionId = 0;

    loop {
        let (stream, peer) = tokio::select! {
            biased;
            _ = ctx.shutdown.cancelled() => break,
            res = listener.accept() => match res {
                Ok(pair) => pair,
                Err(e) => {
                    tracing::warn!(error = %e, "accept failed");
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                    continue;
                }
            },
        };

        next_id += 1;
        tracing::debug!(session_id = next_id, %peer, "connection accepted");

        let sctx = SessionCtx {
            relay: ctx.relay.clone(),
            cfg: Arc::clone(&ctx.cfg),
            shutdown: ctx.shutdown.clone(),
            tracker: ctx.tracker.clone(),
        };
        ctx.tracker.spawn(run_session(stream, peer, next_id, sctx));
    }

    drop(listener);
    tracing::debug!("accept loop ended");
}
