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

//! BEM desktop: classic Bluetooth session core.
//!
//! The session state machine, device registry, adapter gateway, and event
//! bridge for the BEM RFCOMM rendezvous service. The binary in `main.rs`
//! wires these to the BlueZ-backed gateway; tests drive them through mock
//! gateways.

pub mod bluetooth;
pub mod config;
pub mod device;
pub mod events;
pub mod gateway;
pub mod session;
pub mod state;

pub use config::Config;
pub use device::{Device, DeviceRegistry};
pub use events::{EventBridge, FoundDevice, PlatformNotification, ScanMode};
pub use gateway::{AdapterGateway, GatewayError, InboundListener, PeerLink};
pub use session::{LinkEvent, Session, SessionConfig};
pub use state::{ConnectionPhase, DiscoveryPhase, SessionSnapshot, SharedState};
