//! Client-side connection session.
//!
//! Lifecycle: connect -> send name frame -> Connected -> receive loop ->
//! Disconnected. The receive loop ending, a failed send and a local
//! `disconnect` all funnel through one guarded `finish`, so the collaborator
//! hears "disconnected" exactly once.

use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use rand::Rng;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::codec::{FramedRead, FramedWrite};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use chatrelay_core::error::{ChatError, FrameError, Result};
use chatrelay_core::FrameCodec;

use crate::config::ClientSection;
use crate::observer::{ClientObserver, ConnectionState};

type FrameWriter = FramedWrite<OwnedWriteHalf, FrameCodec>;

/// Use `input` if it has visible characters, else a generated `User<n>`.
pub fn resolve_display_name(input: Option<&str>) -> String {
    match input.map(str::trim) {
        Some(name) if !name.is_empty() => name.to_owned(),
        _ => format!("User{}", rand::thread_rng().gen_range(0..1000)),
    }
}

struct ClientShared {
    connected: AtomicBool,
    writer: Mutex<Option<FrameWriter>>,
    token: CancellationToken,
    observer: Arc<dyn ClientObserver>,
}

impl ClientShared {
    /// First caller wins: closes the write half and notifies the observer.
    ///
    /// The token is cancelled before taking the writer lock; a `send` stuck on
    /// a full socket releases the lock as soon as it sees the cancellation.
    async fn finish(&self, reason: &str) {
        if !self.connected.swap(false, Ordering::AcqRel) {
            return;
        }
        self.token.cancel();
        drop(self.writer.lock().await.take());
        tracing::info!(%reason, "disconnected");
        self.observer
            .on_connection_state_changed(ConnectionState::Disconnected, reason);
    }
}

/// A connected chat client. Dropping it disconnects.
pub struct ChatClient {
    name: String,
    server: SocketAddr,
    write_timeout: Duration,
    shared: Arc<ClientShared>,
    recv_task: Mutex<Option<JoinHandle<()>>>,
}

impl ChatClient {
    /// Connect and perform the handshake.
    ///
    /// Fails with `ChatError::Connect` if the server is unreachable; in that
    /// case the observer is never called.
    pub async fn connect(
        cfg: &ClientSection,
        name: &str,
        observer: Arc<dyn ClientObserver>,
    ) -> Result<Self> {
        let addr = cfg.connect_addr();
        let stream = match tokio::time::timeout(cfg.connect_timeout(), TcpStream::connect(&addr)).await
        {
            Ok(Ok(s)) => s,
            Ok(Err(source)) => return Err(ChatError::Connect { addr, source }),
            Err(_) => {
                return Err(ChatError::Connect {
                    addr,
                    source: io::Error::new(io::ErrorKind::TimedOut, "connect timed out"),
                })
            }
        };
        let _ = stream.set_nodelay(true);
        let server = stream
            .peer_addr()
            .map_err(|source| ChatError::Connect {
                addr: addr.clone(),
                source,
            })?;

        let codec = FrameCodec::new(cfg.max_frame_bytes);
        let (read_half, write_half) = stream.into_split();
        let mut writer = FramedWrite::new(write_half, codec);

        // ---- handshake: the first frame is the display name
        writer.send(name).await.map_err(|e| match e {
            FrameError::Io(source) => ChatError::Connect {
                addr: addr.clone(),
                source,
            },
            other => ChatError::Frame(other),
        })?;

        let shared = Arc::new(ClientShared {
            connected: AtomicBool::new(true),
            writer: Mutex::new(Some(writer)),
            token: CancellationToken::new(),
            observer,
        });

        tracing::info!(%server, %name, "connected");
        shared
            .observer
            .on_connection_state_changed(ConnectionState::Connected, &format!("connected to {addr}"));

        let reader = FramedRead::new(read_half, codec);
        let span = tracing::info_span!("client", %server, %name);
        let recv_task = tokio::spawn(receive_loop(reader, Arc::clone(&shared)).instrument(span));

        Ok(Self {
            name: name.to_owned(),
            server,
            write_timeout: cfg.write_timeout(),
            shared,
            recv_task: Mutex::new(Some(recv_task)),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn server_addr(&self) -> SocketAddr {
        self.server
    }

    pub fn is_connected(&self) -> bool {
        self.shared.connected.load(Ordering::Acquire)
    }

    /// Encode and write one message frame.
    ///
    /// `NotConnected` after the connection ended, including while this call
    /// was waiting. An over-limit message is rejected locally and leaves the
    /// connection usable. A write that fails or exceeds `write_timeout_ms`
    /// ends the connection.
    pub async fn send(&self, text: &str) -> Result<()> {
        let token = &self.shared.token;
        let mut guard = tokio::select! {
            biased;
            _ = token.cancelled() => return Err(ChatError::NotConnected),
            guard = self.shared.writer.lock() => guard,
        };
        let Some(writer) = guard.as_mut() else {
            return Err(ChatError::NotConnected);
        };

        let written = tokio::select! {
            biased;
            _ = token.cancelled() => return Err(ChatError::NotConnected),
            res = tokio::time::timeout(self.write_timeout, writer.send(text)) => res,
        };

        match written {
            Ok(Ok(())) => Ok(()),
            Ok(Err(FrameError::Io(e))) => {
                drop(guard);
                let reason = format!("send failed: {e}");
                self.shared.finish(&reason).await;
                Err(ChatError::Frame(FrameError::Io(e)))
            }
            Ok(Err(e)) => Err(ChatError::Frame(e)),
            Err(_) => {
                drop(guard);
                tracing::warn!(write_timeout = ?self.write_timeout, "send timed out, server stalled");
                self.shared.finish("send timed out").await;
                Err(ChatError::Frame(FrameError::Io(io::Error::new(
                    io::ErrorKind::TimedOut,
                    "send timed out",
                ))))
            }
        }
    }

    /// Close the connection and wait for the receive loop. Idempotent.
    pub async fn disconnect(&self) {
        self.shared.token.cancel();
        let task = self.recv_task.lock().await.take();
        if let Some(task) = task {
            let _ = task.await;
        }
        self.shared.finish("disconnected by user").await;
    }

    /// Resolves once the connection has ended for any reason.
    pub async fn closed(&self) {
        self.shared.token.cancelled().await
    }
}

impl Drop for ChatClient {
    fn drop(&mut self) {
        self.shared.token.cancel();
    }
}

async fn receive_loop(mut reader: FramedRead<OwnedReadHalf, FrameCodec>, shared: Arc<ClientShared>) {
    let reason = loop {
        tokio::select! {
            biased;
            _ = shared.token.cancelled() => break "disconnected by user".to_owned(),
            frame = reader.next() => match frame {
                Some(Ok(line)) => shared.observer.on_message_received(&line),
                Some(Err(e)) => break format!("connection error: {e}"),
                None => break "connection closed by server".to_owned(),
            },
        }
    };
    drop(reader);
    shared.finish(&reason).await;
}
