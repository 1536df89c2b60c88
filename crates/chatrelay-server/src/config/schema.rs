use std::time::Duration;

use serde::Deserialize;

use chatrelay_core::error::{ChatError, Result};
use chatrelay_core::protocol::frame::MAX_FRAME_LEN;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    pub version: u32,

    #[serde(default)]
    pub server: ServerSection,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            version: 1,
            server: ServerSection::default(),
        }
    }
}

impl ServerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(ChatError::Config(format!(
                "unsupported config version {}",
                self.version
            )));
        }
        self.server.validate()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Largest accepted frame payload, in bytes.
    #[serde(default = "default_max_frame_bytes")]
    pub max_frame_bytes: usize,

    /// Per-session outbound queue depth. A full queue counts as a failed write.
    #[serde(default = "default_outbound_queue")]
    pub outbound_queue: usize,

    /// Depth of the sessions -> relay command channel.
    #[serde(default = "default_relay_queue")]
    pub relay_queue: usize,

    #[serde(default = "default_write_timeout_ms")]
    pub write_timeout_ms: u64,

    #[serde(default = "default_handshake_timeout_ms")]
    pub handshake_timeout_ms: u64,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_frame_bytes: default_max_frame_bytes(),
            outbound_queue: default_outbound_queue(),
            relay_queue: default_relay_queue(),
            write_timeout_ms: default_write_timeout_ms(),
            handshake_timeout_ms: default_handshake_timeout_ms(),
        }
    }
}

impl ServerSection {
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(ChatError::Config("server.host must not be empty".into()));
        }
        if !(1..=MAX_FRAME_LEN).contains(&self.max_frame_bytes) {
            return Err(ChatError::Config(format!(
                "server.max_frame_bytes must be between 1 and {MAX_FRAME_LEN}"
            )));
        }
        if !(1..=65536).contains(&self.outbound_queue) {
            return Err(ChatError::Config(
                "server.outbound_queue must be between 1 and 65536".into(),
            ));
        }
        if !(1..=65536).contains(&self.relay_queue) {
            return Err(ChatError::Config(
                "server.relay_queue must be between 1 and 65536".into(),
            ));
        }
        if !(100..=60000).contains(&self.write_timeout_ms) {
            return Err(ChatError::Config(
                "server.write_timeout_ms must be between 100 and 60000".into(),
            ));
        }
        if !(100..=600000).contains(&self.handshake_timeout_ms) {
            return Err(ChatError::Config(
                "server.handshake_timeout_ms must be between 100 and 600000".into(),
            ));
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }

    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_millis(self.handshake_timeout_ms)
    }
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    5000
}
fn default_max_frame_bytes() -> usize {
    MAX_FRAME_LEN
}
fn default_outbound_queue() -> usize {
    256
}
fn default_relay_queue() -> usize {
    1024
}
fn default_write_timeout_ms() -> u64 {
    2000
}
fn default_handshake_timeout_ms() -> u64 {
    10000
}
