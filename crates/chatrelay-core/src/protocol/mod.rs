//! Protocol modules.
//!
//! - `frame`: the only wire contract, a big-endian u16 byte length followed
//!   by that many bytes of UTF-8.
//! - `notice`: the broadcast line grammar (`"<name>: <body>"` and the
//!   `SERVER:` join/leave notices).
//!
//! Parsers are panic-free: malformed input is reported as `FrameError`.

pub mod frame;
pub mod notice;
