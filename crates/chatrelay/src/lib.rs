//! Top-level facade crate for chatrelay.
//!
//! Re-exports the frame codec, the relay server and the terminal client so
//! users can depend on a single crate.

pub mod core {
    pub use chatrelay_core::*;
}

pub mod server {
    pub use chatrelay_server::*;
}

pub mod client {
    pub use chatrelay_client::*;
}
