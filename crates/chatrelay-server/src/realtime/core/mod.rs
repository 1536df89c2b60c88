//! Realtime core components: registry, relay actor and relay counters.

mod registry;
mod relay;
mod stats;

pub use registry::ClientRegistry;
pub use relay::{Relay, RelayCommand, RelayHandle};
pub use stats::{RelayStats, RelayStatsSnapshot};
