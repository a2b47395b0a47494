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

//! Bluetooth session state machine.
//!
//! Tracks the discovery lifecycle (idle -> discovering -> idle) and the
//! connection lifecycle (idle -> listening/connecting -> connected) and owns
//! every piece of session state. All transitions run on the single context
//! that owns the `Session`; the accept worker is the only auxiliary task and
//! reports back through the [`LinkEvent`] channel.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Notify};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::device::{Device, DeviceRegistry};
use crate::gateway::{AdapterGateway, GatewayError, PeerLink};
use crate::state::{ConnectionPhase, DiscoveryPhase, SessionSnapshot};

/// Session-level settings, usually taken from [`crate::config::Config`].
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Service identity peers use to locate the rendezvous channel.
    pub service_uuid: Uuid,
    /// How long a `listen` call keeps the local device discoverable.
    pub discoverable_window: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            service_uuid: crate::bluetooth::BEM_SERVICE_UUID,
            discoverable_window: Duration::from_secs(60),
        }
    }
}

/// Result of the one-shot accept worker, delivered to the session owner.
///
/// Carries the epoch of the listening attempt that produced it, so a late
/// event from an abandoned attempt can never be mistaken for the current
/// one.
pub struct LinkEvent {
    epoch: u64,
    outcome: LinkOutcome,
}

pub enum LinkOutcome {
    /// A peer connected to our listening endpoint.
    Accepted(Box<dyn PeerLink>),
    /// The accept call failed; the listening attempt is over.
    Failed(GatewayError),
    /// The listening endpoint was closed while the accept was pending.
    Closed,
}

impl LinkEvent {
    fn kind(&self) -> &'static str {
        match self.outcome {
            LinkOutcome::Accepted(_) => "inbound accepted",
            LinkOutcome::Failed(_) => "inbound failed",
            LinkOutcome::Closed => "listener closed",
        }
    }
}

struct SessionState {
    adapter_supported: bool,
    adapter_enabled: bool,
    discovery: DiscoveryPhase,
    discoverable: bool,
    registry: DeviceRegistry,
    connection: ConnectionPhase,
}

/// The session state machine.
///
/// Exclusively owns [`SessionState`]; the event bridge and the presentation
/// surface both mutate state only through the methods here. A snapshot is
/// published to every subscribed observer after each transition.
pub struct Session {
    gateway: Arc<dyn AdapterGateway>,
    config: SessionConfig,
    state: SessionState,
    observers: Vec<mpsc::UnboundedSender<SessionSnapshot>>,
    link_tx: mpsc::UnboundedSender<LinkEvent>,
    link_rx: Option<mpsc::UnboundedReceiver<LinkEvent>>,
    listener_stop: Option<Arc<Notify>>,
    listen_epoch: u64,
    link: Option<Box<dyn PeerLink>>,
}

impl Session {
    /// Create a session and take the initial adapter/bonded-device
    /// snapshot.
    pub async fn new(gateway: Arc<dyn AdapterGateway>, config: SessionConfig) -> Self {
        let adapter_supported = gateway.is_supported().await;
        let adapter_enabled = gateway.is_enabled().await;
        let mut registry = DeviceRegistry::new();
        registry.replace_paired(gateway.bonded_devices().await);

        let (link_tx, link_rx) = mpsc::unbounded_channel();
        Self {
            gateway,
            config,
            state: SessionState {
                adapter_supported,
                adapter_enabled,
                discovery: DiscoveryPhase::Idle,
                discoverable: false,
                registry,
                connection: ConnectionPhase::Idle,
            },
            observers: Vec::new(),
            link_tx,
            link_rx: Some(link_rx),
            listener_stop: None,
            listen_epoch: 0,
            link: None,
        }
    }

    /// Take the link-event receiver (can only be called once). The owner
    /// must drain it and feed each event to [`Session::apply_link_event`].
    pub fn take_link_events(&mut self) -> Option<mpsc::UnboundedReceiver<LinkEvent>> {
        self.link_rx.take()
    }

    /// Register an observer. The current snapshot is delivered immediately,
    /// then one snapshot per transition.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<SessionSnapshot> {
        let (tx, rx) = mpsc::unbounded_channel();
        let _ = tx.send(self.snapshot());
        self.observers.push(tx);
        rx
    }

    /// Current state, as observers see it.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            adapter_supported: self.state.adapter_supported,
            adapter_enabled: self.state.adapter_enabled,
            discovery: self.state.discovery,
            discoverable: self.state.discoverable,
            paired_devices: self.state.registry.paired().to_vec(),
            available_devices: self.state.registry.available(),
            connection: self.state.connection.clone(),
        }
    }

    fn publish(&mut self) {
        let snapshot = self.snapshot();
        self.observers.retain(|tx| tx.send(snapshot.clone()).is_ok());
    }

    // ---- caller surface -------------------------------------------------

    /// Ask the radio to start discovering peers. The phase flips to
    /// `Discovering` only when the started notification arrives.
    pub async fn search_for_devices(&mut self) {
        if self.state.discovery == DiscoveryPhase::Discovering {
            debug!("search requested while already discovering, ignoring");
            return;
        }
        self.gateway.start_discovery().await;
    }

    /// Ask the radio to stop discovering. Advisory: the phase returns to
    /// `Idle` only when the finished notification confirms it.
    pub async fn cancel_search(&mut self) {
        if self.state.discovery != DiscoveryPhase::Discovering {
            return;
        }
        self.gateway.cancel_discovery().await;
    }

    /// Refresh the paired-device snapshot on demand.
    pub async fn lookup_paired_devices(&mut self) {
        let bonded = self.gateway.bonded_devices().await;
        self.state.registry.replace_paired(bonded);
        self.publish();
    }

    /// Open the rendezvous endpoint and wait (on a worker task) for one
    /// inbound peer. Any existing link or listener is closed first.
    pub async fn listen(&mut self) {
        self.drop_link();
        self.cancel_listener();

        self.gateway
            .request_discoverable(self.config.discoverable_window)
            .await;

        match self.gateway.begin_listening(self.config.service_uuid).await {
            Ok(mut listener) => {
                self.listen_epoch += 1;
                let epoch = self.listen_epoch;
                let stop = Arc::new(Notify::new());
                self.listener_stop = Some(stop.clone());
                let tx = self.link_tx.clone();
                tokio::spawn(async move {
                    // One-shot: whichever way this resolves, the listener is
                    // dropped and the endpoint closed.
                    let outcome = tokio::select! {
                        result = listener.accept() => match result {
                            Ok(link) => LinkOutcome::Accepted(link),
                            Err(err) => LinkOutcome::Failed(err),
                        },
                        _ = stop.notified() => LinkOutcome::Closed,
                    };
                    let _ = tx.send(LinkEvent { epoch, outcome });
                });
                self.state.connection = ConnectionPhase::Listening;
                self.publish();
            }
            Err(err) => {
                // Teardown above already closed the old link/listener, so
                // whatever phase we were in no longer exists.
                warn!("could not open listening endpoint: {err}");
                self.state.connection = ConnectionPhase::Failed(err.to_string());
                self.publish();
                self.state.connection = ConnectionPhase::Idle;
                self.publish();
            }
        }
    }

    /// Close the listening endpoint. Unblocks a pending accept.
    pub fn stop_listening(&mut self) {
        self.cancel_listener();
        if self.state.connection == ConnectionPhase::Listening {
            self.state.connection = ConnectionPhase::Idle;
            self.publish();
        }
    }

    /// Connect to a peer by MAC address. Blocks until the handshake
    /// completes or fails; no automatic retry.
    pub async fn connect(&mut self, mac: &str) {
        // Scanning degrades socket throughput, and any existing handle must
        // be closed before a new one is opened.
        self.gateway.cancel_discovery().await;
        self.cancel_listener();
        self.drop_link();

        let device = self
            .state
            .registry
            .find(mac)
            .unwrap_or_else(|| Device::new(mac, mac));

        self.state.connection = ConnectionPhase::Connecting;
        self.publish();

        match self
            .gateway
            .open_connection(&device, self.config.service_uuid)
            .await
        {
            Ok(link) => {
                info!(peer = %device.mac, "connected to peer");
                self.link = Some(link);
                self.state.connection = ConnectionPhase::Connected;
                self.publish();
            }
            Err(err) => {
                warn!(peer = %device.mac, "connect failed: {err}");
                self.state.connection = ConnectionPhase::Failed(err.to_string());
                self.publish();
                self.state.connection = ConnectionPhase::Idle;
                self.publish();
            }
        }
    }

    /// Close the current connection, if any.
    pub fn disconnect(&mut self) {
        if self.link.take().is_some() {
            info!("connection closed");
            self.state.connection = ConnectionPhase::Idle;
            self.publish();
        }
    }

    // ---- event-driven transitions ---------------------------------------

    /// A discovery phase began: forget the previous available set.
    pub fn discovery_started(&mut self) {
        self.state.registry.clear_available();
        self.state.discovery = DiscoveryPhase::Discovering;
        self.publish();
    }

    pub fn discovery_finished(&mut self) {
        self.state.discovery = DiscoveryPhase::Idle;
        self.publish();
    }

    /// A peer became visible. Set semantics: a record with a known MAC
    /// replaces the previous one.
    pub fn device_found(&mut self, device: Device) {
        debug!(name = %device.name, mac = %device.mac, "device found");
        self.state.registry.insert_available(device);
        self.publish();
    }

    /// Scan-mode notification: only the connectable+discoverable value
    /// means we are visible to scanning peers.
    pub fn scan_mode_changed(&mut self, mode: crate::events::ScanMode) {
        self.state.discoverable = mode == crate::events::ScanMode::ConnectableDiscoverable;
        self.publish();
    }

    /// Adapter powered on or off. Powering on re-issues the bonded-device
    /// query automatically.
    pub async fn adapter_state_changed(&mut self, enabled: bool) {
        self.state.adapter_enabled = enabled;
        if enabled {
            let bonded = self.gateway.bonded_devices().await;
            self.state.registry.replace_paired(bonded);
        }
        self.publish();
    }

    /// Outcome of the accept worker. Stale events (from an abandoned
    /// listening attempt, or arriving after the phase moved on) are
    /// discarded.
    pub fn apply_link_event(&mut self, event: LinkEvent) {
        if event.epoch != self.listen_epoch
            || self.state.connection != ConnectionPhase::Listening
        {
            debug!("stale link event ({}) ignored", event.kind());
            return;
        }
        match event.outcome {
            LinkOutcome::Accepted(link) => {
                info!(peer = %link.peer().mac, "accepted inbound connection");
                self.link = Some(link);
                self.listener_stop = None;
                self.state.connection = ConnectionPhase::Connected;
                self.publish();
            }
            LinkOutcome::Failed(err) => {
                warn!("accept failed: {err}");
                self.listener_stop = None;
                self.state.connection = ConnectionPhase::Failed(err.to_string());
                self.publish();
                self.state.connection = ConnectionPhase::Idle;
                self.publish();
            }
            LinkOutcome::Closed => {
                // Reachable when the worker observed the stop signal before
                // the phase flipped; treat like a caller-initiated stop.
                self.listener_stop = None;
                self.state.connection = ConnectionPhase::Idle;
                self.publish();
            }
        }
    }

    // ---- internals ------------------------------------------------------

    /// Signal the accept worker to stop. Does not touch the phase; callers
    /// decide what the next state is.
    fn cancel_listener(&mut self) {
        if let Some(stop) = self.listener_stop.take() {
            stop.notify_one();
        }
    }

    /// Drop (and thereby close) the current link, if any.
    fn drop_link(&mut self) {
        if self.link.take().is_some() {
            debug!("closing existing connection handle");
        }
    }
}
