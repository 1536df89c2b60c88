//! chatrelay server library entry.
//!
//! Wires the accept loop, per-connection sessions, the client registry and
//! the broadcast relay into a `ChatServer` with explicit start/stop control.
//! Consumed by the binary (`main.rs`) and by integration tests.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod config;
pub mod observer;
pub mod realtime;
pub mod server;
pub mod transport;

pub use config::{ServerConfig, ServerSection};
pub use observer::{ClientListChange, ServerObserver, TracingObserver};
pub use server::ChatServer;
