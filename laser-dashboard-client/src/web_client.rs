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

//! Browser dashboard client.
//!
//! All work happens in WebSocket and timer callbacks on the page's event
//! loop. The callbacks share the client through a `Weak` reference, so
//! dropping the [`DashboardClient`] closes the socket and silences any
//! pending reconnect.

use crate::config;
use crate::dashboard::{received_at_now, Dashboard};
use crate::dom::DomView;
use crate::event_bus::emit_client_event;
use crate::events::ClientEvent;
use crate::listener::SubscriptionMode;
use crate::reconnect::Backoff;
use crate::session::{SessionAction, SessionState, SocketSession};
use crate::state::DashboardState;
use gloo_timers::callback::Timeout;
use laser_transport::socketio;
use laser_transport::websocket::{WebSocketService, WebSocketStatus, WebSocketTask};
use laser_types::{Callback, Text};
use log::{debug, error, info, warn};
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use wasm_bindgen::prelude::*;

struct Inner {
    url: String,
    dashboard: Dashboard,
    view: DomView,
    session: Option<SocketSession>,
    task: Option<WebSocketTask>,
    backoff: Backoff,
    reconnect_pending: bool,
}

/// A live subscription rendering into the current document.
pub struct DashboardClient {
    inner: Rc<RefCell<Inner>>,
}

impl std::fmt::Debug for DashboardClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DashboardClient")
    }
}

impl DashboardClient {
    /// Starts the subscription. Connection failures after this point are
    /// logged and retried; only an unusable address or a missing document
    /// is returned as an error.
    pub fn connect(
        server_url: &str,
        mode: SubscriptionMode,
        devices: Vec<String>,
    ) -> anyhow::Result<Self> {
        let url = socketio::websocket_url(server_url)?;
        let view = DomView::new()?;
        let state = if devices.is_empty() {
            DashboardState::new()
        } else {
            DashboardState::with_devices(devices)
        };
        let inner = Rc::new(RefCell::new(Inner {
            url,
            dashboard: Dashboard::new(mode, state),
            view,
            session: None,
            task: None,
            backoff: Backoff::default(),
            reconnect_pending: false,
        }));
        open(&inner);
        Ok(Self { inner })
    }

    pub fn is_connected(&self) -> bool {
        self.inner
            .try_borrow()
            .map(|inner| {
                inner.session.as_ref().map(SocketSession::state) == Some(SessionState::Connected)
            })
            .unwrap_or(false)
    }
}

fn open(rc: &Rc<RefCell<Inner>>) {
    let weak = Rc::downgrade(rc);
    let Ok(mut guard) = rc.try_borrow_mut() else {
        warn!("dashboard client busy, skipping connect");
        return;
    };
    let inner = &mut *guard;
    if let Err(e) = start_session(inner, &weak) {
        error!("Connection failed: {e}");
        emit_client_event(ClientEvent::ConnectError(e.to_string()));
        reconnect_later(inner, weak);
    }
}

fn start_session(inner: &mut Inner, weak: &Weak<RefCell<Inner>>) -> anyhow::Result<()> {
    inner.session = Some(SocketSession::new(inner.dashboard.subscription())?);

    let frames = weak.clone();
    let statuses = weak.clone();
    let task = WebSocketService::connect_text(
        &inner.url,
        Callback::from(move |frame: Text| on_frame(&frames, frame)),
        Callback::from(move |status: WebSocketStatus| on_status(&statuses, status)),
    )?;
    // Replacing the task closes the previous socket, if any.
    inner.task = Some(task);
    Ok(())
}

fn on_frame(weak: &Weak<RefCell<Inner>>, frame: Text) {
    let Some(rc) = weak.upgrade() else {
        return;
    };
    let frame = match frame {
        Ok(frame) => frame,
        Err(e) => {
            warn!("Dropping frame: {e}");
            return;
        }
    };
    let Ok(mut guard) = rc.try_borrow_mut() else {
        warn!("dashboard client busy, dropping frame");
        return;
    };
    let inner = &mut *guard;
    let Some(session) = inner.session.as_mut() else {
        return;
    };
    let actions = match session.handle_frame(&frame) {
        Ok(actions) => actions,
        Err(e) => {
            warn!("Dropping frame: {e}");
            return;
        }
    };

    for action in actions {
        match action {
            SessionAction::Send(text) => {
                if let Some(task) = inner.task.as_ref() {
                    task.send(&text);
                }
            }
            SessionAction::Connected => {
                info!(
                    "Connected to server for {}",
                    inner.dashboard.subscription().mode()
                );
                inner.backoff.reset();
                emit_client_event(ClientEvent::Connected);
            }
            SessionAction::Event { name, payload } => {
                inner
                    .dashboard
                    .dispatch(&name, &payload, &received_at_now(), &mut inner.view);
            }
            SessionAction::ConnectError(message) => {
                error!("Connection failed: {message}");
                emit_client_event(ClientEvent::ConnectError(message));
            }
            SessionAction::Disconnected(reason) => {
                info!(
                    "Connection closed for {}: {reason}",
                    inner.dashboard.subscription().mode()
                );
                emit_client_event(ClientEvent::ConnectionLost(reason));
                reconnect_later(inner, weak.clone());
            }
        }
    }
}

fn on_status(weak: &Weak<RefCell<Inner>>, status: WebSocketStatus) {
    let Some(rc) = weak.upgrade() else {
        return;
    };
    match status {
        WebSocketStatus::Opened => debug!("WebSocket opened"),
        WebSocketStatus::Error => {
            // The browser follows every error with a close event.
            error!("Connection failed: WebSocket error");
            emit_client_event(ClientEvent::ConnectError("WebSocket error".to_string()));
        }
        WebSocketStatus::Closed { code } => {
            let Ok(mut guard) = rc.try_borrow_mut() else {
                return;
            };
            let inner = &mut *guard;
            info!(
                "Connection closed for {} (code {code})",
                inner.dashboard.subscription().mode()
            );
            emit_client_event(ClientEvent::ConnectionLost(format!(
                "socket closed with code {code}"
            )));
            reconnect_later(inner, weak.clone());
        }
    }
}

/// Schedules one reconnect. The old task is dropped by the next
/// `start_session`, outside of its own event listeners.
fn reconnect_later(inner: &mut Inner, weak: Weak<RefCell<Inner>>) {
    if inner.reconnect_pending {
        return;
    }
    inner.reconnect_pending = true;
    let delay = inner.backoff.next_delay();
    info!(
        "Reconnecting in {} ms (attempt {})",
        delay.as_millis(),
        inner.backoff.attempts()
    );
    Timeout::new(delay.as_millis() as u32, move || {
        if let Some(rc) = weak.upgrade() {
            if let Ok(mut inner) = rc.try_borrow_mut() {
                inner.reconnect_pending = false;
            }
            open(&rc);
        }
    })
    .forget();
}

thread_local! {
    static ACTIVE: RefCell<Option<DashboardClient>> = const { RefCell::new(None) };
}

fn install(server_url: &str, laser_id: Option<String>, lasers: Vec<String>) -> anyhow::Result<()> {
    let mode = SubscriptionMode::from_laser_id(laser_id);
    info!("Connecting to {server_url} for {mode}");
    let client = DashboardClient::connect(server_url, mode, lasers)?;
    // Replacing the active client closes the previous connection.
    ACTIVE.with(|active| *active.borrow_mut() = Some(client));
    Ok(())
}

/// Connects the page to `server_url`. With a `laser_id` the page follows
/// that laser's full runtime; without one it shows the dashboard.
#[wasm_bindgen]
pub fn connect_socket(server_url: String, laser_id: Option<String>) -> Result<(), JsValue> {
    install(&server_url, laser_id, Vec::new()).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Closes the active connection, if any.
#[wasm_bindgen]
pub fn disconnect_socket() {
    ACTIVE.with(|active| active.borrow_mut().take());
}

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        web_sys::console::warn_1(&JsValue::from_str("logger already initialised"));
    }

    let config = match config::app_config() {
        Ok(Some(config)) => config,
        Ok(None) => {
            debug!("No page configuration, waiting for connect_socket()");
            return;
        }
        Err(e) => {
            error!("{e}");
            return;
        }
    };
    let server_url = match config.server_url {
        Some(url) => url,
        None => match config::page_origin() {
            Ok(origin) => origin,
            Err(e) => {
                error!("{e}");
                return;
            }
        },
    };
    if let Err(e) = install(&server_url, config.laser_id, config.lasers) {
        error!("Connection failed: {e}");
    }
}
