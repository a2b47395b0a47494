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

//! BlueZ implementation of the adapter gateway.

use async_trait::async_trait;
use bluer::rfcomm::{Listener, SocketAddr, Stream};
use bluer::{Adapter, Address};
use std::str::FromStr;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::monitor::{AdapterMonitor, MonitorCommand};
use super::BEM_SERVICE_NAME;
use crate::device::Device;
use crate::events::PlatformNotification;
use crate::gateway::{AdapterGateway, GatewayError, InboundListener, PeerLink};

impl From<bluer::Error> for GatewayError {
    fn from(err: bluer::Error) -> Self {
        match err.kind {
            bluer::ErrorKind::NotAuthorized | bluer::ErrorKind::NotPermitted => {
                GatewayError::Unauthorized
            }
            bluer::ErrorKind::NotReady => GatewayError::AdapterUnavailable,
            _ => GatewayError::Transport(err.to_string()),
        }
    }
}

/// Gateway over the default BlueZ adapter.
///
/// Construction never fails: a missing BlueZ session or adapter leaves the
/// gateway in an unsupported state where every query degrades per policy.
/// Discovery is owned by the [`AdapterMonitor`] task (holding the discovery
/// stream is what keeps the scan alive), so start/cancel are commands sent
/// to it.
pub struct BluerGateway {
    adapter: Option<Adapter>,
    channel: u8,
    monitor_tx: mpsc::UnboundedSender<MonitorCommand>,
}

impl BluerGateway {
    /// Connect to BlueZ and spawn the notification monitor. Returns the
    /// gateway together with the platform-notification stream.
    pub async fn new(
        device_name: &str,
        channel: u8,
    ) -> (Self, mpsc::UnboundedReceiver<PlatformNotification>) {
        let (note_tx, note_rx) = mpsc::unbounded_channel();
        let (monitor_tx, monitor_rx) = mpsc::unbounded_channel();

        let adapter = match Self::default_adapter().await {
            Ok(adapter) => {
                info!(name = %adapter.name(), "bluetooth adapter found");
                if let Err(err) = adapter.set_alias(device_name.to_string()).await {
                    warn!("could not set adapter alias: {err}");
                }
                AdapterMonitor::spawn(adapter.clone(), monitor_rx, note_tx);
                Some(adapter)
            }
            Err(err) => {
                warn!("no usable bluetooth adapter: {err}");
                None
            }
        };

        (
            Self {
                adapter,
                channel,
                monitor_tx,
            },
            note_rx,
        )
    }

    async fn default_adapter() -> bluer::Result<Adapter> {
        let session = bluer::Session::new().await?;
        session.default_adapter().await
    }
}

#[async_trait]
impl AdapterGateway for BluerGateway {
    async fn is_supported(&self) -> bool {
        self.adapter.is_some()
    }

    async fn is_enabled(&self) -> bool {
        match &self.adapter {
            Some(adapter) => adapter.is_powered().await.unwrap_or(false),
            None => false,
        }
    }

    async fn bonded_devices(&self) -> Vec<Device> {
        let Some(adapter) = &self.adapter else {
            return Vec::new();
        };

        let addresses = match adapter.device_addresses().await {
            Ok(addresses) => addresses,
            Err(err) => {
                return match GatewayError::from(err) {
                    GatewayError::Unauthorized => vec![Device::unauthorized_placeholder()],
                    other => {
                        debug!("bonded-device query failed: {other}");
                        Vec::new()
                    }
                };
            }
        };

        let mut bonded = Vec::new();
        for address in addresses {
            let Ok(device) = adapter.device(address) else {
                continue;
            };
            match device.is_paired().await {
                Ok(true) => {
                    let name = device
                        .alias()
                        .await
                        .unwrap_or_else(|_| address.to_string());
                    bonded.push(Device::new(name, address.to_string()));
                }
                Ok(false) => {}
                Err(err) => {
                    if let GatewayError::Unauthorized = GatewayError::from(err) {
                        return vec![Device::unauthorized_placeholder()];
                    }
                }
            }
        }
        bonded
    }

    async fn start_discovery(&self) {
        if self.monitor_tx.send(MonitorCommand::StartDiscovery).is_err() {
            warn!("start discovery: notification monitor is gone");
        }
    }

    async fn cancel_discovery(&self) {
        if self.monitor_tx.send(MonitorCommand::CancelDiscovery).is_err() {
            warn!("cancel discovery: notification monitor is gone");
        }
    }

    async fn request_discoverable(&self, duration: Duration) {
        let Some(adapter) = &self.adapter else {
            return;
        };
        let result = async {
            adapter
                .set_discoverable_timeout(duration.as_secs() as u32)
                .await?;
            adapter.set_discoverable(true).await
        }
        .await;
        match result {
            Ok(()) => info!(secs = duration.as_secs(), "device made discoverable"),
            // Non-fatal: peers simply will not see us.
            Err(err) => warn!("discoverable request failed: {err}"),
        }
    }

    async fn begin_listening(
        &self,
        service: Uuid,
    ) -> Result<Box<dyn InboundListener>, GatewayError> {
        let Some(adapter) = &self.adapter else {
            return Err(GatewayError::AdapterUnavailable);
        };

        let local = SocketAddr::new(adapter.address().await?, self.channel);
        let listener = Listener::bind(local).await?;
        // BlueZ registers an SDP record for the bound channel; the service
        // UUID is what peers resolve with createRfcommSocketToServiceRecord.
        info!(
            service = %service,
            name = BEM_SERVICE_NAME,
            channel = self.channel,
            "RFCOMM rendezvous open"
        );
        Ok(Box::new(BluerListener { listener }))
    }

    async fn open_connection(
        &self,
        device: &Device,
        service: Uuid,
    ) -> Result<Box<dyn PeerLink>, GatewayError> {
        if self.adapter.is_none() {
            return Err(GatewayError::AdapterUnavailable);
        }

        let address = Address::from_str(&device.mac)
            .map_err(|err| GatewayError::Transport(format!("bad address {}: {err}", device.mac)))?;
        debug!(peer = %address, service = %service, "opening RFCOMM connection");
        let stream = Stream::connect(SocketAddr::new(address, self.channel)).await?;
        Ok(Box::new(BluerLink {
            peer: device.clone(),
            _stream: stream,
        }))
    }
}

/// One-shot RFCOMM accept endpoint.
struct BluerListener {
    listener: Listener,
}

#[async_trait]
impl InboundListener for BluerListener {
    async fn accept(&mut self) -> Result<Box<dyn PeerLink>, GatewayError> {
        let (stream, peer) = self.listener.accept().await?;
        let mac = peer.addr.to_string();
        Ok(Box::new(BluerLink {
            peer: Device::new(mac.clone(), mac),
            _stream: stream,
        }))
    }
}

/// An established RFCOMM channel. Dropping it closes the socket.
struct BluerLink {
    peer: Device,
    _stream: Stream,
}

impl PeerLink for BluerLink {
    fn peer(&self) -> Device {
        self.peer.clone()
    }
}
