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

//! Device model and registry.
//!
//! Pure data: the set of known (paired) devices and the set of currently
//! visible (discovered) devices. No I/O happens here.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Placeholder name for a found device whose payload could not be resolved.
pub const NULL_DEVICE_NAME: &str = "null device";
/// Placeholder address for a found device whose payload could not be resolved.
pub const NULL_DEVICE_MAC: &str = "null MAC";

/// A Bluetooth peer.
///
/// The MAC address is the identity key: two records with the same address
/// refer to the same peer regardless of name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Device {
    /// Human-readable name, or a placeholder when unknown.
    pub name: String,
    /// Hardware address (stable identity key).
    pub mac: String,
}

impl Device {
    pub fn new(name: impl Into<String>, mac: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mac: mac.into(),
        }
    }

    /// Sentinel returned when the bonded-device query yields nothing,
    /// so a list-rendering consumer always has something to show.
    pub fn default_placeholder() -> Self {
        Self::new("default device", "default MAC")
    }

    /// Sentinel returned when the bonded-device query is not authorized.
    pub fn unauthorized_placeholder() -> Self {
        Self::new("exception device", "exception MAC")
    }

    /// Sentinel for a found-device notification with an unresolvable payload.
    pub fn null_placeholder() -> Self {
        Self::new(NULL_DEVICE_NAME, NULL_DEVICE_MAC)
    }
}

/// Holds the paired-device snapshot and the available-device set.
///
/// The available set is deduplicated by MAC address; inserting a device with
/// an already-known address replaces the previous record, so the most
/// recently observed name wins.
#[derive(Debug, Clone, Default)]
pub struct DeviceRegistry {
    paired: Vec<Device>,
    available: HashMap<String, Device>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the paired-device snapshot wholesale.
    ///
    /// An empty result degrades to a single placeholder entry rather than
    /// an empty list.
    pub fn replace_paired(&mut self, devices: Vec<Device>) {
        self.paired = if devices.is_empty() {
            vec![Device::default_placeholder()]
        } else {
            devices
        };
    }

    /// Insert or update a discovered device, keyed by MAC address.
    pub fn insert_available(&mut self, device: Device) {
        self.available.insert(device.mac.clone(), device);
    }

    /// Forget all discovered devices. Called when a new discovery phase
    /// begins.
    pub fn clear_available(&mut self) {
        self.available.clear();
    }

    pub fn paired(&self) -> &[Device] {
        &self.paired
    }

    /// Discovered devices, sorted by MAC for deterministic output.
    pub fn available(&self) -> Vec<Device> {
        let mut devices: Vec<Device> = self.available.values().cloned().collect();
        devices.sort_by(|a, b| a.mac.cmp(&b.mac));
        devices
    }

    pub fn available_len(&self) -> usize {
        self.available.len()
    }

    /// Look up a device by MAC, preferring the discovered record (it carries
    /// the most recently observed name) over the paired snapshot.
    pub fn find(&self, mac: &str) -> Option<Device> {
        self.available
            .get(mac)
            .cloned()
            .or_else(|| self.paired.iter().find(|d| d.mac == mac).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_available_dedupes_by_mac() {
        let mut registry = DeviceRegistry::new();
        registry.insert_available(Device::new("A", "11:11"));
        registry.insert_available(Device::new("B", "22:22"));
        registry.insert_available(Device::new("A", "11:11"));

        assert_eq!(registry.available_len(), 2);
        let available = registry.available();
        assert!(available.contains(&Device::new("A", "11:11")));
        assert!(available.contains(&Device::new("B", "22:22")));
    }

    #[test]
    fn most_recent_name_wins() {
        let mut registry = DeviceRegistry::new();
        registry.insert_available(Device::new("old name", "11:11"));
        registry.insert_available(Device::new("new name", "11:11"));

        assert_eq!(registry.available(), vec![Device::new("new name", "11:11")]);
    }

    #[test]
    fn clear_available_empties_the_set() {
        let mut registry = DeviceRegistry::new();
        registry.insert_available(Device::new("A", "11:11"));
        registry.clear_available();
        assert_eq!(registry.available_len(), 0);
    }

    #[test]
    fn empty_paired_query_degrades_to_placeholder() {
        let mut registry = DeviceRegistry::new();
        registry.replace_paired(Vec::new());
        assert_eq!(registry.paired(), &[Device::default_placeholder()]);
    }

    #[test]
    fn paired_snapshot_is_replaced_wholesale() {
        let mut registry = DeviceRegistry::new();
        registry.replace_paired(vec![Device::new("A", "11:11")]);
        registry.replace_paired(vec![Device::new("B", "22:22")]);
        assert_eq!(registry.paired(), &[Device::new("B", "22:22")]);
    }

    #[test]
    fn find_prefers_discovered_record() {
        let mut registry = DeviceRegistry::new();
        registry.replace_paired(vec![Device::new("paired name", "11:11")]);
        registry.insert_available(Device::new("fresh name", "11:11"));
        assert_eq!(
            registry.find("11:11"),
            Some(Device::new("fresh name", "11:11"))
        );
        assert_eq!(registry.find("33:33"), None);
    }
}
