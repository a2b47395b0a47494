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

//! Session state snapshots.

use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;

use crate::device::Device;

/// Discovery lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DiscoveryPhase {
    Idle,
    Discovering,
}

/// Connection lifecycle.
///
/// `Failed` is transient: a transport failure publishes one `Failed`
/// snapshot for observers and the machine then settles in `Idle`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ConnectionPhase {
    Idle,
    Listening,
    Connecting,
    Connected,
    Failed(String),
}

impl ConnectionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionPhase::Idle => "Idle",
            ConnectionPhase::Listening => "Listening",
            ConnectionPhase::Connecting => "Connecting...",
            ConnectionPhase::Connected => "Connected",
            ConnectionPhase::Failed(_) => "Failed",
        }
    }
}

/// Read-only projection of the session state, published to observers after
/// every transition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub adapter_supported: bool,
    pub adapter_enabled: bool,
    pub discovery: DiscoveryPhase,
    pub discoverable: bool,
    pub paired_devices: Vec<Device>,
    pub available_devices: Vec<Device>,
    pub connection: ConnectionPhase,
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self {
            adapter_supported: false,
            adapter_enabled: false,
            discovery: DiscoveryPhase::Idle,
            discoverable: false,
            paired_devices: Vec::new(),
            available_devices: Vec::new(),
            connection: ConnectionPhase::Idle,
        }
    }
}

impl SessionSnapshot {
    pub fn is_searching(&self) -> bool {
        self.discovery == DiscoveryPhase::Discovering
    }

    pub fn is_connected(&self) -> bool {
        self.connection == ConnectionPhase::Connected
    }
}

/// Shared cell holding the latest snapshot.
///
/// The presentation side reads from here; only the session's owning loop
/// writes to it.
#[derive(Debug, Default)]
pub struct SharedState {
    snapshot: RwLock<SessionSnapshot>,
}

impl SharedState {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn update(&self, snapshot: SessionSnapshot) {
        *self.snapshot.write() = snapshot;
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot.read().clone()
    }

    pub fn connection(&self) -> ConnectionPhase {
        self.snapshot.read().connection.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_state_serves_latest_snapshot() {
        let shared = SharedState::new();
        assert_eq!(shared.connection(), ConnectionPhase::Idle);

        let snapshot = SessionSnapshot {
            connection: ConnectionPhase::Connected,
            adapter_enabled: true,
            ..SessionSnapshot::default()
        };
        shared.update(snapshot);

        assert!(shared.snapshot().is_connected());
        assert!(shared.snapshot().adapter_enabled);
    }
}
