mod defaults;
mod types;

pub use types::*;

use crate::error::ConfigError;
use std::net::SocketAddr;
use std::path::Path;
use tracing::{debug, warn};

impl Config {
    /// Load config from a YAML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Like [`Config::load`], but a missing file yields the defaults
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            debug!("No config at {:?}, using defaults", path);
            Ok(Self::default())
        }
    }

    /// Validate the config
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.socket_addr()?;

        if self.owners.source == OwnersSourceKind::Local && self.owners.local_root.is_none() {
            return Err(ConfigError::MissingLocalRoot);
        }

        let policy = &self.blunderbuss;
        if let Some(count) = policy.request_count {
            if policy.max_request_count > 0 && count > policy.max_request_count {
                warn!(
                    "request_count {} exceeds max_request_count {}; requests will always be truncated",
                    count, policy.max_request_count
                );
            }
        }

        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.server
            .address
            .parse()
            .map_err(|_| ConfigError::InvalidAddress(self.server.address.clone()))
    }
}

/// Read a secret file, trimming surrounding whitespace
pub fn read_secret(path: &Path) -> Result<String, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadSecret {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(raw.trim().to_string())
}
