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

//! Browser WebSocket carrying Engine.IO text frames.
//!
//! Follows the shape of the yew-websocket service (MIT licensed, Copyright
//! (c) 2017 Denis Kolodin): a task owns the socket and its listeners, and
//! dropping the task closes the socket.

use gloo::events::EventListener;
use laser_types::{Callback, Text};
use std::fmt;
use wasm_bindgen::JsCast;
use web_sys::{CloseEvent, Event, MessageEvent, WebSocket};

/// Close code sent when the task is dropped.
const NORMAL_CLOSURE: u16 = 1000;

#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("received a binary frame, Engine.IO over WebSocket is text only")]
    ReceivedBinaryForText,
}

/// Connection state changes reported next to the frames.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WebSocketStatus {
    Opened,
    /// `code` is the WebSocket close code, 1006 for an abnormal drop.
    Closed { code: u16 },
    Error,
}

#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum WebSocketError {
    #[error("cannot open WebSocket: {0}")]
    CreationError(String),
}

/// An open socket. Dropping it closes the connection and detaches every
/// listener, so no callback fires afterwards.
#[must_use = "the connection is closed when the task is dropped"]
pub struct WebSocketTask {
    ws: WebSocket,
    notification: Callback<WebSocketStatus>,
    _listeners: Vec<EventListener>,
}

impl fmt::Debug for WebSocketTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebSocketTask")
            .field("url", &self.ws.url())
            .field("ready_state", &self.ws.ready_state())
            .finish()
    }
}

/// Opens browser WebSockets.
#[derive(Default, Debug)]
pub struct WebSocketService {}

impl WebSocketService {
    /// Connects to `url`. Text frames go to `on_frame`, state changes to
    /// `on_status`.
    pub fn connect_text(
        url: &str,
        on_frame: Callback<Text>,
        on_status: Callback<WebSocketStatus>,
    ) -> Result<WebSocketTask, WebSocketError> {
        let ws = WebSocket::new(url).map_err(|err| {
            let reason = err
                .dyn_into::<js_sys::Error>()
                .ok()
                .and_then(|e| e.message().as_string())
                .unwrap_or_else(|| url.to_string());
            WebSocketError::CreationError(reason)
        })?;

        let mut listeners = Vec::with_capacity(4);
        listeners.push(EventListener::new(&ws, "message", move |event: &Event| {
            let Some(event) = event.dyn_ref::<MessageEvent>() else {
                return;
            };
            let frame = match event.data().as_string() {
                Some(text) => Ok(text),
                None => Err(FormatError::ReceivedBinaryForText.into()),
            };
            on_frame.emit(frame);
        }));

        let status = on_status.clone();
        listeners.push(EventListener::new(&ws, "open", move |_| {
            status.emit(WebSocketStatus::Opened);
        }));
        let status = on_status.clone();
        listeners.push(EventListener::new(&ws, "close", move |event: &Event| {
            let code = event.dyn_ref::<CloseEvent>().map_or(1006, CloseEvent::code);
            status.emit(WebSocketStatus::Closed { code });
        }));
        let status = on_status.clone();
        listeners.push(EventListener::new(&ws, "error", move |_| {
            status.emit(WebSocketStatus::Error);
        }));

        Ok(WebSocketTask {
            ws,
            notification: on_status,
            _listeners: listeners,
        })
    }
}

impl WebSocketTask {
    /// Sends a text frame. A failed send is reported as
    /// [`WebSocketStatus::Error`] on the status callback.
    pub fn send(&self, data: &str) {
        if self.ws.send_with_str(data).is_err() {
            self.notification.emit(WebSocketStatus::Error);
        }
    }

    /// True while connecting or open.
    pub fn is_active(&self) -> bool {
        matches!(
            self.ws.ready_state(),
            WebSocket::CONNECTING | WebSocket::OPEN
        )
    }
}

impl Drop for WebSocketTask {
    fn drop(&mut self) {
        if self.is_active() {
            let _ = self.ws.close_with_code(NORMAL_CLOSURE);
        }
    }
}
