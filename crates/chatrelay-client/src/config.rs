//! Client config (strict YAML, same conventions as the server).

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use chatrelay_core::error::{ChatError, Result};
use chatrelay_core::protocol::frame::MAX_FRAME_LEN;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    pub version: u32,

    #[serde(default)]
    pub client: ClientSection,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            version: 1,
            client: ClientSection::default(),
        }
    }
}

impl ClientConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(ChatError::Config(format!(
                "unsupported config version {}",
                self.version
            )));
        }
        self.client.validate()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientSection {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_max_frame_bytes")]
    pub max_frame_bytes: usize,

    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Upper bound on one outgoing frame write.
    #[serde(default = "default_write_timeout_ms")]
    pub write_timeout_ms: u64,
}

impl Default for ClientSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_frame_bytes: default_max_frame_bytes(),
            connect_timeout_ms: default_connect_timeout_ms(),
            write_timeout_ms: default_write_timeout_ms(),
        }
    }
}

impl ClientSection {
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(ChatError::Config("client.host must not be empty".into()));
        }
        if !(1..=MAX_FRAME_LEN).contains(&self.max_frame_bytes) {
            return Err(ChatError::Config(format!(
                "client.max_frame_bytes must be between 1 and {MAX_FRAME_LEN}"
            )));
        }
        if !(100..=120000).contains(&self.connect_timeout_ms) {
            return Err(ChatError::Config(
                "client.connect_timeout_ms must be between 100 and 120000".into(),
            ));
        }
        if !(100..=60000).contains(&self.write_timeout_ms) {
            return Err(ChatError::Config(
                "client.write_timeout_ms must be between 100 and 60000".into(),
            ));
        }
        Ok(())
    }

    pub fn connect_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }
}

fn default_host() -> String {
    "localhost".into()
}
fn default_port() -> u16 {
    5000
}
fn default_max_frame_bytes() -> usize {
    MAX_FRAME_LEN
}
fn default_connect_timeout_ms() -> u64 {
    5000
}
fn default_write_timeout_ms() -> u64 {
    2000
}

pub fn load_from_file(path: impl AsRef<Path>) -> Result<ClientConfig> {
    let path = path.as_ref();
    let s = fs::read_to_string(path)
        .map_err(|e| ChatError::Config(format!("read {} failed: {e}", path.display())))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<ClientConfig> {
    let cfg: ClientConfig =
        serde_yaml::from_str(s).map_err(|e| ChatError::Config(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
