//! Transport layer (TCP).
//!
//! `listener` binds and runs the accept loop; `session` owns one accepted
//! socket from handshake to close.

pub mod listener;
pub mod session;

pub use listener::bind;
