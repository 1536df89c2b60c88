//! Broadcast line grammar.
//!
//! Every server->client frame is one fully formatted line:
//! - chat: `"<name>: <body>"`
//! - notices: `"SERVER: <name> joined the chat."` / `"SERVER: <name> left the chat."`

use std::fmt;
use std::sync::Arc;

/// Sender label used for system notices.
pub const SYSTEM_SENDER: &str = "SERVER";

/// Immutable broadcast value, produced once and fanned out to a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BroadcastMessage {
    /// A line typed by a connected peer.
    Chat { from: Arc<str>, body: String },
    /// A peer completed its handshake.
    Joined { name: Arc<str> },
    /// A peer's session closed.
    Left { name: Arc<str> },
}

impl BroadcastMessage {
    pub fn chat(from: impl Into<Arc<str>>, body: impl Into<String>) -> Self {
        BroadcastMessage::Chat {
            from: from.into(),
            body: body.into(),
        }
    }

    pub fn joined(name: impl Into<Arc<str>>) -> Self {
        BroadcastMessage::Joined { name: name.into() }
    }

    pub fn left(name: impl Into<Arc<str>>) -> Self {
        BroadcastMessage::Left { name: name.into() }
    }

    /// Render the wire line.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for BroadcastMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BroadcastMessage::Chat { from, body } => write!(f, "{from}: {body}"),
            BroadcastMessage::Joined { name } => {
                write!(f, "{SYSTEM_SENDER}: {name} joined the chat.")
            }
            BroadcastMessage::Left { name } => write!(f, "{SYSTEM_SENDER}: {name} left the chat."),
        }
    }
}
