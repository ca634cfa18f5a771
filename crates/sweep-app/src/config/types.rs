//! Configuration types for storage-sweep
//!
//! Defines:
//! - `Settings` - Everything read from `storage-sweep.toml`
//! - `StorageSettings` / `EmulatorSettings` - The two tables of that file

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use sweep_core::prelude::*;
use sweep_emulator::{SupervisorConfig, DEFAULT_EMULATOR_PATH};
use sweep_storage::StorageAccount;
use tokio::time::Duration;

/// Application settings (storage-sweep.toml)
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub storage: StorageSettings,

    #[serde(default)]
    pub emulator: EmulatorSettings,
}

/// `[storage]`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct StorageSettings {
    /// Account to sweep; the emulator's development account by default
    #[serde(default = "default_connection_string")]
    pub connection_string: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            connection_string: default_connection_string(),
        }
    }
}

impl StorageSettings {
    pub fn account(&self) -> Result<StorageAccount> {
        StorageAccount::from_connection_string(&self.connection_string)
    }
}

/// `[emulator]`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EmulatorSettings {
    /// Emulator executable
    #[serde(default = "default_emulator_path")]
    pub path: PathBuf,

    /// Delay between status polls while starting or stopping (ms)
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Give up on a start or stop after this long (seconds)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmulatorSettings {
    fn default() -> Self {
        Self {
            path: default_emulator_path(),
            poll_interval_ms: default_poll_interval_ms(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl EmulatorSettings {
    /// Supervisor inputs; a zero interval or timeout falls back to the default
    pub fn supervisor_config(&self) -> SupervisorConfig {
        let poll_interval_ms = if self.poll_interval_ms == 0 {
            warn!("emulator.poll_interval_ms must be positive, using default");
            default_poll_interval_ms()
        } else {
            self.poll_interval_ms
        };

        let timeout_secs = if self.timeout_secs == 0 {
            warn!("emulator.timeout_secs must be positive, using default");
            default_timeout_secs()
        } else {
            self.timeout_secs
        };

        SupervisorConfig {
            executable: self.path.clone(),
            poll_interval: Duration::from_millis(poll_interval_ms),
            timeout: Duration::from_secs(timeout_secs),
        }
    }
}

fn default_connection_string() -> String {
    "UseDevelopmentStorage=true".to_string()
}

fn default_emulator_path() -> PathBuf {
    PathBuf::from(DEFAULT_EMULATOR_PATH)
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_timeout_secs() -> u64 {
    30
}
