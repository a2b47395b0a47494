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

//! BEM Desktop session service.

use anyhow::Result;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bem_desktop::bluetooth::BluerGateway;
use bem_desktop::{Config, EventBridge, Session, SharedState};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("bem_desktop=info".parse().unwrap()),
        )
        .init();

    info!("Starting BEM Desktop v{}...", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = Config::load()?;
    info!("Configuration loaded");

    // Bring up the BlueZ gateway and the platform notification stream
    let (gateway, mut notifications) =
        BluerGateway::new(&config.bluetooth.device_name, config.bluetooth.channel).await;
    let gateway = Arc::new(gateway);

    // Create the session and its event plumbing
    let mut session = Session::new(gateway, config.session()).await;
    let mut link_events = session
        .take_link_events()
        .expect("link events taken exactly once at startup");
    let mut snapshots = session.subscribe();
    let mut bridge = EventBridge::new();
    let shared = SharedState::new();

    let initial = session.snapshot();
    info!(
        supported = initial.adapter_supported,
        enabled = initial.adapter_enabled,
        paired = initial.paired_devices.len(),
        "session ready"
    );

    // Open the rendezvous endpoint and start looking for peers
    session.listen().await;
    session.search_for_devices().await;

    // Single serialized context: every state transition happens here.
    loop {
        tokio::select! {
            Some(note) = notifications.recv() => {
                bridge.dispatch(&mut session, note).await;
            }
            Some(event) = link_events.recv() => {
                session.apply_link_event(event);
            }
            Some(snapshot) = snapshots.recv() => {
                info!(
                    connection = snapshot.connection.as_str(),
                    searching = snapshot.is_searching(),
                    discoverable = snapshot.discoverable,
                    available = snapshot.available_devices.len(),
                    "state changed"
                );
                shared.update(snapshot);
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    session.stop_listening();
    session.cancel_search().await;
    info!(
        "BEM Desktop stopped ({} events dropped)",
        bridge.dropped_events()
    );
    Ok(())
}
