//! # Configuration Management Module
//!
//! Centralized configuration for the Homestead room server: type-safe TOML
//! sections with serde, sensible defaults, and validation on load.
//!
//! ## Configuration Structure
//!
//! - [`ServerConfig`] - Listener address and room/grid settings
//! - [`StorageConfig`] - Data persistence settings (sled directory)
//! - [`LoggingConfig`] - Logging and debugging settings
//!
//! ## Configuration File Format
//!
//! ```toml
//! [server]
//! bind = "0.0.0.0:2567"
//! grid_width = 10
//! grid_height = 10
//! max_clients_per_room = 16
//!
//! [storage]
//! data_dir = "./data"
//!
//! [logging]
//! level = "info"
//! file = "homestead.log"
//! ```

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// TCP listen address, e.g. "0.0.0.0:2567"
    pub bind: String,
    /// Room grid width in cells
    #[serde(default = "default_grid_dim")]
    pub grid_width: i32,
    /// Room grid height in cells
    #[serde(default = "default_grid_dim")]
    pub grid_height: i32,
    /// Hard cap on simultaneous clients in one room
    #[serde(default = "default_max_clients")]
    pub max_clients_per_room: usize,
}

fn default_grid_dim() -> i32 {
    10
}

fn default_max_clients() -> usize {
    16
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory for the sled database
    pub data_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    /// Optional log file; when set, log lines are appended there in addition
    /// to the console (console echo only when stdout is a TTY).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;

        config.validate()?;
        Ok(config)
    }

    /// Create a default configuration file
    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }

    /// Validate configuration values loaded from disk.
    pub fn validate(&self) -> Result<()> {
        if self.server.bind.parse::<std::net::SocketAddr>().is_err() {
            return Err(anyhow!("server.bind is not a valid socket address: {}", self.server.bind));
        }
        if self.server.grid_width < 1 || self.server.grid_height < 1 {
            return Err(anyhow!(
                "grid dimensions must be positive (got {}x{})",
                self.server.grid_width,
                self.server.grid_height
            ));
        }
        if self.server.max_clients_per_room == 0 {
            return Err(anyhow!("server.max_clients_per_room must be at least 1"));
        }
        if self.storage.data_dir.trim().is_empty() {
            return Err(anyhow!("storage.data_dir must not be empty"));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                bind: "0.0.0.0:2567".to_string(),
                grid_width: 10,
                grid_height: 10,
                max_clients_per_room: 16,
            },
            storage: StorageConfig {
                data_dir: "./data".to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file: Some("homestead.log".to_string()),
            },
        }
    }
}
