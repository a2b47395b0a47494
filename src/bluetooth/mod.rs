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

//! BlueZ-backed adapter gateway.
//!
//! Classic BR/EDR via the `bluer` crate: adapter queries, discovery, and
//! RFCOMM listen/connect for the BEM rendezvous service.

mod adapter;
mod monitor;

pub use adapter::BluerGateway;

use uuid::Uuid;

/// Service identity peers use to locate the BEM rendezvous channel.
pub const BEM_SERVICE_UUID: Uuid = uuid::uuid!("e3bee544-4ddb-4768-a5f9-0eb7111a0a23");

/// Human-readable service name advertised to peers.
pub const BEM_SERVICE_NAME: &str = "BEM";

/// RFCOMM channel for the BEM service. Peers resolving the service UUID via
/// SDP land here; direct connections use the fixed channel.
pub const BEM_RFCOMM_CHANNEL: u8 = 3;
