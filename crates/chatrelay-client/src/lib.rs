//! chatrelay client library.
//!
//! `ChatClient` owns one TCP connection: it sends the display name as the
//! first frame, forwards every received line to a `ClientObserver`, and
//! reports the end of the connection exactly once.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod config;
pub mod observer;
pub mod session;

pub use config::{ClientConfig, ClientSection};
pub use observer::{ClientObserver, ConnectionState};
pub use session::{resolve_display_name, ChatClient};
