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

//! Event bridge: platform notifications to state-machine transitions.
//!
//! The sole entry point for asynchronous platform notifications. Each
//! notification becomes exactly one transition call on the session, with
//! defensive handling of unusable payloads.

use serde::Serialize;
use tracing::warn;

use crate::device::{Device, NULL_DEVICE_MAC, NULL_DEVICE_NAME};
use crate::session::Session;

/// Scan-mode values the radio can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScanMode {
    /// Neither connectable nor discoverable.
    None,
    /// Accepts connections but is invisible to scanning peers.
    Connectable,
    /// Accepts connections and is visible to scanning peers.
    ConnectableDiscoverable,
}

/// Payload of a found-device notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FoundDevice {
    /// The peer's fields, as far as they could be resolved. Missing fields
    /// are filled with placeholders rather than dropping the event.
    Resolved {
        name: Option<String>,
        mac: Option<String>,
    },
    /// Resolving the peer's name/address was not authorized; the single
    /// event is dropped and discovery continues.
    Unauthorized,
}

/// Asynchronous notifications emitted by the platform.
#[derive(Debug, Clone, PartialEq)]
pub enum PlatformNotification {
    DeviceFound(FoundDevice),
    DiscoveryStarted,
    DiscoveryFinished,
    ScanModeChanged(ScanMode),
    AdapterStateChanged(bool),
}

/// Resolve a found-device payload into a registry record.
///
/// `None` means the event must be dropped (unauthorized). An unresolvable
/// field is replaced by its sentinel so the available set stays visibly
/// non-empty for diagnostics.
fn resolve_found(payload: FoundDevice) -> Option<Device> {
    match payload {
        FoundDevice::Unauthorized => None,
        FoundDevice::Resolved { name, mac } => Some(Device::new(
            name.unwrap_or_else(|| NULL_DEVICE_NAME.to_string()),
            mac.unwrap_or_else(|| NULL_DEVICE_MAC.to_string()),
        )),
    }
}

/// Translates platform notifications into session transitions.
#[derive(Debug, Default)]
pub struct EventBridge {
    dropped: u64,
}

impl EventBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one notification as exactly one transition.
    pub async fn dispatch(&mut self, session: &mut Session, note: PlatformNotification) {
        match note {
            PlatformNotification::DeviceFound(payload) => match resolve_found(payload) {
                Some(device) => session.device_found(device),
                None => {
                    self.dropped += 1;
                    warn!("found-device event dropped: name/address not authorized");
                }
            },
            PlatformNotification::DiscoveryStarted => session.discovery_started(),
            PlatformNotification::DiscoveryFinished => session.discovery_finished(),
            PlatformNotification::ScanModeChanged(mode) => session.scan_mode_changed(mode),
            PlatformNotification::AdapterStateChanged(enabled) => {
                session.adapter_state_changed(enabled).await
            }
        }
    }

    /// Number of notifications dropped for lack of authorization.
    pub fn dropped_events(&self) -> u64 {
        self.dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_payload_resolves_to_none() {
        assert_eq!(resolve_found(FoundDevice::Unauthorized), None);
    }

    #[test]
    fn fully_resolved_payload_passes_through() {
        let device = resolve_found(FoundDevice::Resolved {
            name: Some("headset".into()),
            mac: Some("11:22:33:44:55:66".into()),
        })
        .unwrap();
        assert_eq!(device, Device::new("headset", "11:22:33:44:55:66"));
    }

    #[test]
    fn missing_fields_get_sentinels() {
        let device = resolve_found(FoundDevice::Resolved {
            name: None,
            mac: None,
        })
        .unwrap();
        assert_eq!(device, Device::null_placeholder());

        let device = resolve_found(FoundDevice::Resolved {
            name: None,
            mac: Some("11:22:33:44:55:66".into()),
        })
        .unwrap();
        assert_eq!(device.name, NULL_DEVICE_NAME);
        assert_eq!(device.mac, "11:22:33:44:55:66");
    }
}
