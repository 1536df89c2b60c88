//! Realtime runtime for the relay server.
//!
//! Client registry, the broadcast relay actor and the session handle shared
//! between them.

pub mod core;
pub mod types;

pub use core::{ClientRegistry, Relay, RelayCommand, RelayHandle, RelayStats, RelayStatsSnapshot};
pub use types::{DeliveryError, PreparedFrame, SessionHandle, SessionId, SessionState};
