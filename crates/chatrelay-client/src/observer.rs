//! Collaborator interface for the excluded UI layer.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connected,
    Disconnected,
}

/// Callbacks run on the client's receive task and must not block.
pub trait ClientObserver: Send + Sync + 'static {
    /// One broadcast line from the server.
    fn on_message_received(&self, line: &str);

    /// `Connected` once after the handshake, `Disconnected` once at the end.
    fn on_connection_state_changed(&self, state: ConnectionState, reason: &str);
}
