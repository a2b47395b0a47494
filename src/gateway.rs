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

//! Adapter gateway seam.
//!
//! Narrow, testable interface over the platform radio. The session state
//! machine only ever talks to the radio through these traits; the
//! BlueZ-backed implementation lives in [`crate::bluetooth`].

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use crate::device::Device;

/// Failures crossing the gateway boundary.
///
/// None of these is fatal to the session: `Unauthorized` degrades to a
/// sentinel or a dropped event, `AdapterUnavailable` makes queries report
/// false/empty, and `Transport`/`Closed` abort the current connection
/// attempt only.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    #[error("operation not authorized")]
    Unauthorized,

    #[error("bluetooth adapter unavailable")]
    AdapterUnavailable,

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("endpoint closed")]
    Closed,
}

impl From<std::io::Error> for GatewayError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::PermissionDenied => GatewayError::Unauthorized,
            _ => GatewayError::Transport(err.to_string()),
        }
    }
}

/// An established RFCOMM channel to a peer.
///
/// The session stops at "channel established": the handle exists so the
/// connection sub-machine can own and close it, not for payload exchange.
/// Dropping the handle closes the underlying socket.
pub trait PeerLink: Send {
    /// The peer on the other end of the channel.
    fn peer(&self) -> Device;
}

/// Server-side rendezvous point.
///
/// Accepts exactly one inbound connection per [`AdapterGateway::begin_listening`]
/// call; after a peer connects (or the accept fails) the endpoint is
/// discarded. Dropping the listener while an accept is pending unblocks it.
#[async_trait]
pub trait InboundListener: Send {
    async fn accept(&mut self) -> Result<Box<dyn PeerLink>, GatewayError>;
}

/// Façade over the platform radio.
///
/// Queries degrade rather than fail: an absent or unauthorized radio yields
/// `false`/empty/sentinel results, never an error the caller has to handle.
/// Discovery start/cancel are fire-and-observe; their outcomes arrive later
/// as platform notifications.
#[async_trait]
pub trait AdapterGateway: Send + Sync {
    /// True iff the platform exposes a usable radio.
    async fn is_supported(&self) -> bool;

    /// True iff the radio is currently powered on.
    async fn is_enabled(&self) -> bool;

    /// Previously paired devices. Unauthorized callers get a single
    /// sentinel entry; an absent adapter yields an empty list.
    async fn bonded_devices(&self) -> Vec<Device>;

    /// Ask the radio to start a discovery scan. Best-effort: failures are
    /// logged and swallowed, and the caller learns of them only through the
    /// absence of subsequent found-device notifications.
    async fn start_discovery(&self);

    /// Ask the radio to stop an in-progress scan. Best-effort and advisory;
    /// the confirming finished notification may still take a moment.
    async fn cancel_discovery(&self);

    /// Make the local device visible to scanning peers for a bounded
    /// window. Best-effort.
    async fn request_discoverable(&self, duration: Duration);

    /// Open a server-side rendezvous point for the given service identity.
    async fn begin_listening(&self, service: Uuid)
        -> Result<Box<dyn InboundListener>, GatewayError>;

    /// Open an outbound connection to a peer advertising the given service
    /// identity. Blocks until the transport-level handshake completes or
    /// fails.
    async fn open_connection(
        &self,
        device: &Device,
        service: Uuid,
    ) -> Result<Box<dyn PeerLink>, GatewayError>;
}
