//! Server-side connection session.
//!
//! Responsibilities:
//! - Handshake: exactly one frame, the join name (bounded by a timeout)
//! - Writer task: drain the bounded outbound queue with a per-write timeout
//! - Read loop: every frame becomes `"<name>: <body>"` on the relay
//! - Cleanup: one `close()` winner sends the single `Leave`
//!
//! Decode errors, peer close and cancellation all end the session the same
//! way; none of them are reported beyond this task.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_util::codec::FramedRead;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::Instrument;

use chatrelay_core::{BroadcastMessage, FrameCodec};

use crate::config::ServerSection;
use crate::realtime::{RelayHandle, SessionHandle, SessionId};

type FrameReader = FramedRead<OwnedReadHalf, FrameCodec>;

pub(crate) struct SessionCtx {
    pub relay: RelayHandle,
    pub cfg: Arc<ServerSection>,
    /// Server-wide token; the session's own token is a child of it.
    pub shutdown: CancellationToken,
    pub tracker: TaskTracker,
}

pub(crate) async fn run_session(stream: TcpStream, peer: SocketAddr, id: SessionId, ctx: SessionCtx) {
    let span = tracing::info_span!("session", session_id = id, %peer, name = tracing::field::Empty);
    session_main(stream, peer, id, ctx).instrument(span).await
}

async fn session_main(stream: TcpStream, peer: SocketAddr, id: SessionId, ctx: SessionCtx) {
    let _ = stream.set_nodelay(true);
    let (read_half, write_half) = stream.into_split();
    let mut reader = FramedRead::new(read_half, FrameCodec::new(ctx.cfg.max_frame_bytes));

    // ---- Handshaking
    let Some(name) = handshake(&mut reader, ctx.cfg.handshake_timeout(), &ctx.shutdown).await else {
        // Never registered, never announced; dropping the halves closes the socket.
        return;
    };
    tracing::Span::current().record("name", name.as_str());

    // ---- outbound queue + writer
    let token = ctx.shutdown.child_token();
    let (out_tx, out_rx) = mpsc::channel::<Bytes>(ctx.cfg.outbound_queue);
    let session = SessionHandle::new(id, name, Some(peer), out_tx, token.clone());

    let writer = ctx.tracker.spawn(
        write_loop(write_half, out_rx, token.clone(), ctx.cfg.write_timeout())
            .instrument(tracing::Span::current()),
    );

    // ---- Active
    if ctx.relay.join(session.clone()).await.is_ok() {
        read_loop(&mut reader, &session, &ctx.relay, &token).await;
    }

    // ---- Closed
    if session.close() {
        let _ = ctx.relay.leave(session.clone()).await;
    }
    let _ = writer.await;
    drop(reader);
    tracing::debug!("session closed");
}

async fn handshake(
    reader: &mut FrameReader,
    limit: Duration,
    shutdown: &CancellationToken,
) -> Option<String> {
    tokio::select! {
        biased;
        _ = shutdown.cancelled() => None,
        res = tokio::time::timeout(limit, reader.next()) => match res {
            Ok(Some(Ok(name))) => Some(name),
            Ok(Some(Err(e))) => {
                tracing::debug!(error = %e, code = e.code(), "handshake frame rejected");
                None
            }
            Ok(None) => {
                tracing::debug!("peer closed before handshake");
                None
            }
            Err(_) => {
                tracing::debug!(?limit, "handshake timed out");
                None
            }
        },
    }
}

async fn read_loop(
    reader: &mut FrameReader,
    session: &SessionHandle,
    relay: &RelayHandle,
    token: &CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            frame = reader.next() => match frame {
                Some(Ok(body)) => {
                    let msg = BroadcastMessage::chat(session.name_arc(), body);
                    if relay.publish(msg).await.is_err() {
                        break;
                    }
                }
                Some(Err(e)) => {
                    tracing::debug!(error = %e, code = e.code(), "read loop ended");
                    break;
                }
                None => {
                    tracing::debug!("peer closed");
                    break;
                }
            },
        }
    }
}

/// Drain pre-encoded frames to the socket. A failed or stalled write cancels
/// the session token, which ends the read loop and runs cleanup.
async fn write_loop(
    mut writer: OwnedWriteHalf,
    mut rx: mpsc::Receiver<Bytes>,
    token: CancellationToken,
    write_timeout: Duration,
) {
    loop {
        let wire = tokio::select! {
            biased;
            _ = token.cancelled() => break,
            next = rx.recv() => match next {
                Some(wire) => wire,
                None => break,
            },
        };

        match tokio::time::timeout(write_timeout, writer.write_all(&wire)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::debug!(error = %e, "write failed");
                token.cancel();
                break;
            }
            Err(_) => {
                tracing::warn!(?write_timeout, "write timed out, peer stalled");
                token.cancel();
                break;
            }
        }
    }
    let _ = writer.shutdown().await;
}
