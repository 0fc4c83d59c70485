use std::net::SocketAddr;
use std::path::PathBuf;

use crate::store::{FileStore, DEFAULT_MAX_DEPTH};

/// Request bodies above this size are refused unless configured otherwise.
pub const DEFAULT_MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Runtime settings for the HTTP service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address the listener binds to.
    pub bind_addr: SocketAddr,
    /// Location of the config file that submissions replace.
    pub config_path: PathBuf,
    /// Deepest nesting a submitted document may have.
    pub max_depth: usize,
    /// Largest accepted request body, in bytes.
    pub max_body_bytes: usize,
    /// Answer cross-origin requests from any origin.
    pub cors: bool,
}

impl ServerConfig {
    pub fn store(&self) -> FileStore {
        FileStore::new(&self.config_path).with_max_depth(self.max_depth)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 5000)),
            config_path: PathBuf::from("config.yaml"),
            max_depth: DEFAULT_MAX_DEPTH,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            cors: true,
        }
    }
}
