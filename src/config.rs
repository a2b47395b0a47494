// Copyright 2026 BEM Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Configuration module.
//!
//! Handles loading and saving application settings.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::bluetooth::{BEM_RFCOMM_CHANNEL, BEM_SERVICE_NAME, BEM_SERVICE_UUID};
use crate::session::SessionConfig;

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Bluetooth settings.
    pub bluetooth: BluetoothConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BluetoothConfig {
    /// Local device alias advertised over Bluetooth.
    pub device_name: String,

    /// RFCOMM channel for the rendezvous service.
    pub channel: u8,

    /// How many seconds a listen call keeps the device discoverable.
    pub discoverable_secs: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bluetooth: BluetoothConfig {
                device_name: BEM_SERVICE_NAME.to_string(),
                channel: BEM_RFCOMM_CHANNEL,
                discoverable_secs: 60,
            },
        }
    }
}

impl Config {
    /// Load configuration from the platform config directory, writing the
    /// defaults there on first run.
    pub fn load() -> Result<Self> {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("bem");
        std::fs::create_dir_all(&config_dir)?;
        Self::load_from(&config_dir.join("config.toml"))
    }

    /// Load configuration from an explicit path, writing the defaults
    /// there if the file does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Ok(toml::from_str(&content)?)
        } else {
            let config = Self::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    /// Save configuration to an explicit path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Session settings derived from this configuration.
    pub fn session(&self) -> SessionConfig {
        SessionConfig {
            service_uuid: BEM_SERVICE_UUID,
            discoverable_window: Duration::from_secs(u64::from(
                self.bluetooth.discoverable_secs,
            )),
        }
    }
}
