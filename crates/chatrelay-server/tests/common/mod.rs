//! Shared fixtures: a recording observer and a raw framed TCP peer.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Mutex;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio_util::codec::{FramedRead, FramedWrite};

use chatrelay_core::FrameCodec;
use chatrelay_server::{ClientListChange, ServerObserver, ServerSection};

pub const WAIT: Duration = Duration::from_secs(5);

pub fn local_cfg() -> ServerSection {
    ServerSection {
        host: "127.0.0.1".into(),
        port: 0,
        ..ServerSection::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Added(String),
    Removed(String),
    Log(String),
}

#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<Event>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn logs(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Log(l) => Some(l),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, ev: &Event) -> usize {
        self.events().iter().filter(|e| *e == ev).count()
    }

    pub async fn wait_for(&self, ev: Event) {
        let deadline = tokio::time::Instant::now() + WAIT;
        while tokio::time::Instant::now() < deadline {
            if self.count(&ev) > 0 {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("observer never saw {ev:?}; got {:?}", self.events());
    }
}

impl ServerObserver for RecordingObserver {
    fn on_client_list_changed(&self, change: ClientListChange, name: &str) {
        let ev = match change {
            ClientListChange::Added => Event::Added(name.to_owned()),
            ClientListChange::Removed => Event::Removed(name.to_owned()),
        };
        self.events.lock().unwrap().push(ev);
    }

    fn on_server_log(&self, line: &str) {
        self.events.lock().unwrap().push(Event::Log(line.to_owned()));
    }
}

/// Bare protocol peer, independent of the client crate.
pub struct Peer {
    reader: FramedRead<OwnedReadHalf, FrameCodec>,
    writer: FramedWrite<OwnedWriteHalf, FrameCodec>,
}

impl Peer {
    pub async fn connect(addr: SocketAddr, name: &str) -> Peer {
        let mut peer = Peer::connect_silent(addr).await;
        peer.send(name).await;
        peer
    }

    /// Connect without sending the handshake frame.
    pub async fn connect_silent(addr: SocketAddr) -> Peer {
        let stream = TcpStream::connect(addr).await.unwrap();
        let (r, w) = stream.into_split();
        Peer {
            reader: FramedRead::new(r, FrameCodec::default()),
            writer: FramedWrite::new(w, FrameCodec::default()),
        }
    }

    pub async fn send(&mut self, text: &str) {
        self.writer.send(text).await.unwrap();
    }

    pub async fn send_raw(&mut self, bytes: &[u8]) {
        self.writer.get_mut().write_all(bytes).await.unwrap();
    }

    pub async fn recv(&mut self) -> String {
        tokio::time::timeout(WAIT, self.reader.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("stream closed")
            .expect("bad frame")
    }

    /// Skip remaining frames; true once the server has closed this connection.
    pub async fn closed_by_server(&mut self) -> bool {
        let deadline = tokio::time::Instant::now() + WAIT;
        loop {
            match tokio::time::timeout_at(deadline, self.reader.next()).await {
                Ok(None) | Ok(Some(Err(_))) => return true,
                Ok(Some(Ok(_))) => continue,
                Err(_) => return false,
            }
        }
    }
}
