/*
 * Copyright 2025 Security Union LLC
 *
 * Licensed under either of
 *
 * * Apache License, Version 2.0
 *   (http://www.apache.org/licenses/LICENSE-2.0)
 * * MIT license
 *   (http://opensource.org/licenses/MIT)
 *
 * at your option.
 *
 * Unless you explicitly state otherwise, any contribution intentionally
 * submitted for inclusion in the work by you, as defined in the Apache-2.0
 * license, shall be dual licensed as above, without any additional terms or
 * conditions.
 */

//! Native (non-WASM) dashboard client.
//!
//! Owns the [`Dashboard`] and a view, and drives them from one tokio task:
//! frames are processed strictly in arrival order and the state is never
//! shared, so no locking is involved.
//!
//! # Example
//!
//! ```no_run
//! use laser_dashboard_client::{NativeClientOptions, NativeDashboardClient, SubscriptionMode};
//! # use laser_dashboard_client::{ApplyOutcome, DashboardState, DashboardView, RenderError};
//! # struct Stdout;
//! # impl DashboardView for Stdout {
//! #     fn render(&mut self, _: &DashboardState, o: &ApplyOutcome) -> Result<(), RenderError> {
//! #         println!("{:?}", o); Ok(())
//! #     }
//! # }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let options = NativeClientOptions::new("http://10.0.4.11:1916", SubscriptionMode::Dashboard);
//!     let mut client = NativeDashboardClient::new(options, Stdout)?;
//!     client.run().await
//! }
//! ```

use crate::constants::DEFAULT_LIVENESS_MS;
use crate::dashboard::{received_at_now, Dashboard, DashboardView};
use crate::event_bus::emit_client_event;
use crate::events::ClientEvent;
use crate::listener::SubscriptionMode;
use crate::reconnect::Backoff;
use crate::session::{SessionAction, SocketSession};
use crate::state::DashboardState;
use anyhow::Result;
use laser_transport::native_websocket::{NativeWebSocketClient, WebSocketConnectError};
use laser_transport::socketio;
use log::{error, info, warn};
use std::time::Duration;

const TRANSPORT_CLOSED: &str = "transport closed";

/// Configuration for [`NativeDashboardClient`].
#[derive(Clone, Debug)]
pub struct NativeClientOptions {
    /// Server base address, e.g. `http://10.0.4.11:1916`.
    pub server_url: String,
    pub mode: SubscriptionMode,
    /// Lasers with an indicator; empty accepts any id.
    pub devices: Vec<String>,
    pub backoff: Backoff,
}

impl NativeClientOptions {
    pub fn new(server_url: impl Into<String>, mode: SubscriptionMode) -> Self {
        Self {
            server_url: server_url.into(),
            mode,
            devices: Vec::new(),
            backoff: Backoff::default(),
        }
    }
}

pub struct NativeDashboardClient<V: DashboardView> {
    url: String,
    backoff: Backoff,
    dashboard: Dashboard,
    view: V,
}

impl<V: DashboardView> NativeDashboardClient<V> {
    /// Validates the server address; does not connect yet.
    pub fn new(options: NativeClientOptions, view: V) -> Result<Self> {
        let url = socketio::websocket_url(&options.server_url)?;
        let state = if options.devices.is_empty() {
            DashboardState::new()
        } else {
            DashboardState::with_devices(options.devices)
        };
        Ok(Self {
            url,
            backoff: options.backoff,
            dashboard: Dashboard::new(options.mode, state),
            view,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn dashboard(&self) -> &Dashboard {
        &self.dashboard
    }

    /// Connects and keeps reconnecting until the future is dropped.
    pub async fn run(&mut self) -> Result<()> {
        loop {
            match self.run_session().await {
                Ok(reason) => {
                    info!(
                        "Connection closed for {}: {reason}",
                        self.dashboard.subscription().mode()
                    );
                    emit_client_event(ClientEvent::ConnectionLost(reason));
                }
                Err(e) => {
                    error!("Connection failed: {e}");
                    emit_client_event(ClientEvent::ConnectError(e.to_string()));
                }
            }
            let delay = self.backoff.next_delay();
            info!(
                "Reconnecting in {} ms (attempt {})",
                delay.as_millis(),
                self.backoff.attempts()
            );
            tokio::time::sleep(delay).await;
        }
    }

    /// Runs one connection to completion. `Ok` carries the reason it ended.
    pub async fn run_session(&mut self) -> Result<String> {
        let mut session = SocketSession::new(self.dashboard.subscription())?;
        let (client, mut inbound) = NativeWebSocketClient::connect(&self.url).await?;

        loop {
            let liveness = session
                .handshake()
                .map(|h| h.liveness_timeout())
                .unwrap_or(Duration::from_millis(DEFAULT_LIVENESS_MS));

            let frame = match tokio::time::timeout(liveness, inbound.recv()).await {
                Ok(Some(frame)) => frame,
                Ok(None) => return Ok(TRANSPORT_CLOSED.to_string()),
                Err(_) => {
                    client.close().await?;
                    return Ok(format!("no ping within {} ms", liveness.as_millis()));
                }
            };

            let actions = match session.handle_frame(&frame) {
                Ok(actions) => actions,
                Err(e) => {
                    warn!("Dropping frame: {e}");
                    continue;
                }
            };

            for action in actions {
                match action {
                    SessionAction::Send(text) => {
                        if let Err(e) = client.send(text).await {
                            return lost_when_closed(e);
                        }
                    }
                    SessionAction::Connected => {
                        info!(
                            "Connected to server for {}",
                            self.dashboard.subscription().mode()
                        );
                        self.backoff.reset();
                        emit_client_event(ClientEvent::Connected);
                    }
                    SessionAction::Event { name, payload } => {
                        self.dashboard
                            .dispatch(&name, &payload, &received_at_now(), &mut self.view);
                    }
                    SessionAction::ConnectError(message) => {
                        error!("Connection failed: {message}");
                        emit_client_event(ClientEvent::ConnectError(message));
                    }
                    SessionAction::Disconnected(reason) => {
                        client.close().await?;
                        return Ok(reason);
                    }
                }
            }
        }
    }
}

/// A socket the peer already closed ends the session like any other drop;
/// other write errors are connection failures.
fn lost_when_closed(err: WebSocketConnectError) -> Result<String> {
    match err {
        WebSocketConnectError::Closed => Ok(TRANSPORT_CLOSED.to_string()),
        other => Err(other.into()),
    }
}

impl<V: DashboardView> std::fmt::Debug for NativeDashboardClient<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeDashboardClient")
            .field("url", &self.url)
            .field("mode", self.dashboard.subscription().mode())
            .finish()
    }
}
