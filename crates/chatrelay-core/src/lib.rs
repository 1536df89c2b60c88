//! chatrelay core: wire-level contracts shared by the relay server and client.
//!
//! This crate defines the length-prefixed frame format, the broadcast line
//! grammar, and the error surface. It carries no runtime; the only async-facing
//! piece is the `tokio_util` codec adapter, which is plain trait impls.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here. A hostile peer can
//! only ever produce a `FrameError`, never a crash.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod codec;
pub mod error;
pub mod protocol;

pub use codec::FrameCodec;
pub use error::{ChatError, ErrorCode, FrameError, Result};
pub use protocol::notice::BroadcastMessage;
