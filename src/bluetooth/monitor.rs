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

//! Platform notification source.
//!
//! A dedicated task that watches BlueZ adapter events and translates them
//! into [`PlatformNotification`]s for the event bridge. It also owns the
//! discovery stream: BlueZ keeps a scan alive only while the stream handle
//! exists, so starting and cancelling discovery are commands to this task.

use bluer::{Adapter, AdapterEvent, AdapterProperty, Address};
use futures::stream::{Stream, StreamExt};
use std::pin::Pin;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::events::{FoundDevice, PlatformNotification, ScanMode};
use crate::gateway::GatewayError;

/// Commands the gateway sends to the monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorCommand {
    StartDiscovery,
    CancelDiscovery,
}

type EventStream = Pin<Box<dyn Stream<Item = AdapterEvent> + Send>>;

/// Watches one adapter and feeds the notification channel.
pub struct AdapterMonitor {
    adapter: Adapter,
    commands: mpsc::UnboundedReceiver<MonitorCommand>,
    notes: mpsc::UnboundedSender<PlatformNotification>,
}

impl AdapterMonitor {
    pub fn spawn(
        adapter: Adapter,
        commands: mpsc::UnboundedReceiver<MonitorCommand>,
        notes: mpsc::UnboundedSender<PlatformNotification>,
    ) -> JoinHandle<()> {
        let monitor = Self {
            adapter,
            commands,
            notes,
        };
        tokio::spawn(monitor.run())
    }

    async fn run(self) {
        let Self {
            adapter,
            mut commands,
            notes,
        } = self;

        let mut events: EventStream = match adapter.events().await {
            Ok(events) => Box::pin(events),
            Err(err) => {
                warn!("cannot watch adapter events: {err}");
                return;
            }
        };

        // Present only while a scan is active; dropping it stops the scan
        // and BlueZ confirms with a Discovering(false) property change.
        let mut discovery: Option<EventStream> = None;

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(MonitorCommand::StartDiscovery) => {
                        if discovery.is_none() {
                            match adapter.discover_devices().await {
                                Ok(stream) => discovery = Some(Box::pin(stream)),
                                // Swallowed: the caller learns of failure
                                // through the absence of found events.
                                Err(err) => warn!("start discovery failed: {err}"),
                            }
                        }
                    }
                    Some(MonitorCommand::CancelDiscovery) => {
                        discovery = None;
                    }
                    None => break,
                },
                Some(event) = events.next() => {
                    forward(&adapter, &notes, event).await;
                }
                event = next_discovery_event(&mut discovery) => match event {
                    Some(event) => forward(&adapter, &notes, event).await,
                    // Stream ended: the scan is over regardless of what we
                    // asked for.
                    None => discovery = None,
                },
            }
        }
        debug!("adapter monitor stopped");
    }
}

/// Next event from the discovery stream, or pending forever while no scan
/// is active (so the select arm simply never fires).
async fn next_discovery_event(discovery: &mut Option<EventStream>) -> Option<AdapterEvent> {
    match discovery {
        Some(stream) => stream.next().await,
        None => std::future::pending().await,
    }
}

async fn forward(
    adapter: &Adapter,
    notes: &mpsc::UnboundedSender<PlatformNotification>,
    event: AdapterEvent,
) {
    let note = match event {
        AdapterEvent::DeviceAdded(address) => Some(PlatformNotification::DeviceFound(
            resolve_found(adapter, address).await,
        )),
        AdapterEvent::DeviceRemoved(_) => None,
        AdapterEvent::PropertyChanged(property) => match property {
            AdapterProperty::Discovering(true) => Some(PlatformNotification::DiscoveryStarted),
            AdapterProperty::Discovering(false) => Some(PlatformNotification::DiscoveryFinished),
            AdapterProperty::Powered(on) => Some(PlatformNotification::AdapterStateChanged(on)),
            AdapterProperty::Discoverable(visible) => {
                // BlueZ adapters are connectable whenever powered; the
                // discoverable flag decides the scan-mode value.
                let mode = if visible {
                    ScanMode::ConnectableDiscoverable
                } else {
                    ScanMode::Connectable
                };
                Some(PlatformNotification::ScanModeChanged(mode))
            }
            _ => None,
        },
    };
    if let Some(note) = note {
        let _ = notes.send(note);
    }
}

/// Resolve a found peer's name and address, degrading per policy instead of
/// erroring.
async fn resolve_found(adapter: &Adapter, address: Address) -> FoundDevice {
    let Ok(device) = adapter.device(address) else {
        return FoundDevice::Resolved {
            name: None,
            mac: None,
        };
    };
    match device.name().await {
        Ok(name) => FoundDevice::Resolved {
            name,
            mac: Some(address.to_string()),
        },
        Err(err) => match GatewayError::from(err) {
            GatewayError::Unauthorized => FoundDevice::Unauthorized,
            other => {
                debug!(peer = %address, "name lookup failed: {other}");
                FoundDevice::Resolved {
                    name: None,
                    mac: Some(address.to_string()),
                }
            }
        },
    }
}
