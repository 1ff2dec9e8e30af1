use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use hkv_hash::HashConfig;
use hkv_protocol::MAX_MESSAGE_SIZE;

use crate::error::{ServerError, ServerResult};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Deadline applied to each RPC's context.
    pub request_timeout_ms: u64,
    /// Largest accepted request body, framing included.
    pub max_message_size: usize,
    pub hash: HashConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 6390)),
            request_timeout_ms: 5_000,
            max_message_size: MAX_MESSAGE_SIZE + 5,
            hash: HashConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load a TOML configuration file. Missing keys take their defaults.
    pub fn load(path: &Path) -> ServerResult<Self> {
        let text = std::fs::read_to_string(path)?;
        toml::from_str(&text).map_err(|e| ServerError::Config(format!("{}: {e}", path.display())))
    }

    pub fn to_toml(&self) -> ServerResult<String> {
        toml::to_string_pretty(self).map_err(|e| ServerError::Config(e.to_string()))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}
