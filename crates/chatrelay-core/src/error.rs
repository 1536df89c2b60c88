//! Shared error types across chatrelay crates.

use std::io;

use thiserror::Error;

/// Stable error codes surfaced to collaborators (UI layers, logs, tests).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Listening socket could not be bound.
    BindFailed,
    /// Malformed, truncated or oversized frame.
    BadFrame,
    /// Outbound connection could not be established.
    ConnectFailed,
    /// Operation needs a live connection.
    NotConnected,
    /// Invalid configuration.
    BadConfig,
    /// Internal error.
    Internal,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::BindFailed => "BIND_FAILED",
            ErrorCode::BadFrame => "BAD_FRAME",
            ErrorCode::ConnectFailed => "CONNECT_FAILED",
            ErrorCode::NotConnected => "NOT_CONNECTED",
            ErrorCode::BadConfig => "BAD_CONFIG",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, ChatError>;

/// Unified error type used by core, server and client.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },
    #[error("bad frame: {0}")]
    Frame(#[from] FrameError),
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: io::Error,
    },
    #[error("not connected")]
    NotConnected,
    #[error("bad config: {0}")]
    Config(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl ChatError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ChatError::Bind { .. } => ErrorCode::BindFailed,
            ChatError::Frame(_) => ErrorCode::BadFrame,
            ChatError::Connect { .. } => ErrorCode::ConnectFailed,
            ChatError::NotConnected => ErrorCode::NotConnected,
            ChatError::Config(_) => ErrorCode::BadConfig,
            ChatError::Internal(_) => ErrorCode::Internal,
        }
    }
}

/// Framing failures. Terminates the offending session only.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("truncated frame: expected {expected} bytes, got {available}")]
    Truncated { expected: usize, available: usize },
    #[error("frame length {len} exceeds limit {max}")]
    TooLarge { len: usize, max: usize },
    #[error("frame payload is not valid utf-8")]
    InvalidUtf8(#[from] std::str::Utf8Error),
    #[error("io: {0}")]
    Io(#[from] io::Error),
}

impl FrameError {
    /// Stable code for test vectors and logs.
    pub fn code(&self) -> &'static str {
        match self {
            FrameError::Truncated { .. } => "TRUNCATED",
            FrameError::TooLarge { .. } => "TOO_LARGE",
            FrameError::InvalidUtf8(_) => "INVALID_UTF8",
            FrameError::Io(_) => "IO",
        }
    }
}
