//! Collaborator interface for whatever renders the server (GUI, terminal, tests).
//!
//! Callbacks run on relay/accept tasks and must not block.

/// Direction of a client list change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientListChange {
    Added,
    Removed,
}

pub trait ServerObserver: Send + Sync + 'static {
    /// A session entered or left the registry.
    fn on_client_list_changed(&self, change: ClientListChange, name: &str);

    /// Operator-facing log line (lifecycle events and every broadcast line).
    fn on_server_log(&self, line: &str);
}

/// Default observer: everything goes to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl ServerObserver for TracingObserver {
    fn on_client_list_changed(&self, change: ClientListChange, name: &str) {
        tracing::info!(?change, %name, "client list changed");
    }

    fn on_server_log(&self, line: &str) {
        tracing::info!(target: "chatrelay::console", "{line}");
    }
}
