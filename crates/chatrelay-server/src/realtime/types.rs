use std::fmt;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_util::sync::CancellationToken;

use chatrelay_core::error::Result;
use chatrelay_core::protocol::frame;
use chatrelay_core::BroadcastMessage;

/// Server-assigned session identity. Monotonic per server, never reused.
pub type SessionId = u64;

/// Session lifecycle: `Handshaking -> Active -> Closed` (terminal).
///
/// A handle is built once the join name has arrived, so `Handshaking` only
/// marks "not yet accepted by the relay": `activate` moves it to `Active`,
/// and a session closed before that is never registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SessionState {
    Handshaking = 0,
    Active = 1,
    Closed = 2,
}

impl SessionState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => SessionState::Handshaking,
            1 => SessionState::Active,
            _ => SessionState::Closed,
        }
    }
}

/// Why a relay delivery did not reach a session's outbound queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryError {
    /// Queue full: the peer is not draining fast enough.
    Full,
    /// Writer already gone.
    Closed,
}

/// Registry-side view of one session.
///
/// Cheap to clone. The session task owns the socket; the handle only carries
/// the outbound queue sender and the shutdown token.
#[derive(Clone)]
pub struct SessionHandle {
    inner: Arc<SessionShared>,
}

struct SessionShared {
    id: SessionId,
    name: Arc<str>,
    peer: Option<SocketAddr>,
    tx: mpsc::Sender<Bytes>,
    shutdown: CancellationToken,
    state: AtomicU8,
}

impl SessionHandle {
    pub fn new(
        id: SessionId,
        name: impl Into<Arc<str>>,
        peer: Option<SocketAddr>,
        tx: mpsc::Sender<Bytes>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            inner: Arc::new(SessionShared {
                id,
                name: name.into(),
                peer,
                tx,
                shutdown,
                state: AtomicU8::new(SessionState::Handshaking as u8),
            }),
        }
    }

    pub fn id(&self) -> SessionId {
        self.inner.id
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn name_arc(&self) -> Arc<str> {
        Arc::clone(&self.inner.name)
    }

    pub fn peer(&self) -> Option<SocketAddr> {
        self.inner.peer
    }

    pub fn state(&self) -> SessionState {
        SessionState::from_u8(self.inner.state.load(Ordering::Acquire))
    }

    pub fn is_closed(&self) -> bool {
        self.state() == SessionState::Closed
    }

    /// `Handshaking -> Active`. Fails if the session was closed first.
    pub fn activate(&self) -> bool {
        self.inner
            .state
            .compare_exchange(
                SessionState::Handshaking as u8,
                SessionState::Active as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// Transition to `Closed` and cancel the session's tasks.
    ///
    /// Returns true only for the first caller; that caller owns the single
    /// registry removal and "left" notice.
    pub fn close(&self) -> bool {
        let prev = self
            .inner
            .state
            .swap(SessionState::Closed as u8, Ordering::AcqRel);
        if prev == SessionState::Closed as u8 {
            return false;
        }
        self.inner.shutdown.cancel();
        true
    }

    /// Non-blocking enqueue of one pre-encoded frame.
    pub fn try_deliver(&self, wire: &Bytes) -> std::result::Result<(), DeliveryError> {
        self.inner.tx.try_send(wire.clone()).map_err(|e| match e {
            TrySendError::Full(_) => DeliveryError::Full,
            TrySendError::Closed(_) => DeliveryError::Closed,
        })
    }
}

impl fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionHandle")
            .field("id", &self.inner.id)
            .field("name", &self.inner.name)
            .field("peer", &self.inner.peer)
            .field("state", &self.state())
            .finish()
    }
}

/// Broadcast line serialized once, sent N times.
#[derive(Debug, Clone)]
pub struct PreparedFrame {
    line: String,
    wire: Bytes,
}

impl PreparedFrame {
    /// Render and encode. Lines longer than one frame are cut on a char
    /// boundary rather than dropped.
    pub fn prepare(msg: &BroadcastMessage, max_frame_len: usize) -> Result<Self> {
        let mut line = msg.render();
        if frame::truncate_to_frame(&mut line, max_frame_len) {
            tracing::debug!(max_frame_len, "broadcast line truncated to frame limit");
        }
        let wire = frame::encode_frame(&line, max_frame_len)?;
        Ok(Self { line, wire })
    }

    pub fn line(&self) -> &str {
        &self.line
    }

    pub fn wire(&self) -> &Bytes {
        &self.wire
    }
}
