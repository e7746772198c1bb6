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

//! Socket.IO session state machine.
//!
//! Sans-IO: both the browser and the native client feed it inbound text
//! frames and carry out the [`SessionAction`]s it returns. One session
//! covers one WebSocket connection; a reconnect starts a fresh one.

use crate::listener::Subscription;
use laser_transport::socketio::{
    self, EnginePacket, Handshake, ProtocolError, SocketPacket, DEFAULT_NAMESPACE,
};
use laser_types::JOIN_EVENT;
use log::debug;
use serde_json::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// Socket open, waiting for the Engine.IO handshake.
    Opening,
    /// Handshake done, namespace connect requested.
    Connecting,
    Connected,
    Closed,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SessionAction {
    /// Write this text frame to the socket.
    Send(String),
    /// Namespace connected and `join` queued.
    Connected,
    /// An application event arrived.
    Event { name: String, payload: Value },
    ConnectError(String),
    Disconnected(String),
}

#[derive(Debug)]
pub struct SocketSession {
    join_frame: String,
    state: SessionState,
    handshake: Option<Handshake>,
}

impl SocketSession {
    pub fn new(subscription: &Subscription) -> Result<Self, ProtocolError> {
        let join = SocketPacket::event(JOIN_EVENT, &subscription.join_request())?;
        Ok(Self {
            join_frame: socketio::frame(&join),
            state: SessionState::Opening,
            handshake: None,
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn handshake(&self) -> Option<&Handshake> {
        self.handshake.as_ref()
    }

    pub fn handle_frame(&mut self, frame: &str) -> Result<Vec<SessionAction>, ProtocolError> {
        match EnginePacket::decode(frame)? {
            EnginePacket::Open(handshake) => {
                debug!("engine.io session {} opened", handshake.sid);
                self.handshake = Some(handshake);
                self.state = SessionState::Connecting;
                Ok(vec![SessionAction::Send(socketio::frame(
                    &SocketPacket::connect(),
                ))])
            }
            EnginePacket::Ping(data) => Ok(vec![SessionAction::Send(
                EnginePacket::Pong(data).encode(),
            )]),
            EnginePacket::Close => {
                self.state = SessionState::Closed;
                Ok(vec![SessionAction::Disconnected(
                    "server closed the session".to_string(),
                )])
            }
            EnginePacket::Message(body) => self.handle_packet(SocketPacket::decode(&body)?),
            EnginePacket::Pong(_) | EnginePacket::Upgrade | EnginePacket::Noop => Ok(Vec::new()),
        }
    }

    fn handle_packet(&mut self, packet: SocketPacket) -> Result<Vec<SessionAction>, ProtocolError> {
        if packet.namespace() != DEFAULT_NAMESPACE {
            debug!("ignoring packet for namespace {}", packet.namespace());
            return Ok(Vec::new());
        }
        Ok(match packet {
            SocketPacket::Connect { .. } => {
                self.state = SessionState::Connected;
                vec![
                    SessionAction::Connected,
                    SessionAction::Send(self.join_frame.clone()),
                ]
            }
            SocketPacket::ConnectError { data, .. } => {
                vec![SessionAction::ConnectError(connect_error_message(data))]
            }
            SocketPacket::Disconnect { .. } => {
                self.state = SessionState::Closed;
                vec![SessionAction::Disconnected(
                    "server disconnected the namespace".to_string(),
                )]
            }
            SocketPacket::Event { name, args, .. } => {
                let payload = args.into_iter().next().unwrap_or(Value::Null);
                vec![SessionAction::Event { name, payload }]
            }
            SocketPacket::Ack { .. } => Vec::new(),
        })
    }
}

fn connect_error_message(data: Option<Value>) -> String {
    match data {
        Some(Value::Object(map)) => map
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| Value::Object(map).to_string()),
        Some(Value::String(s)) => s,
        Some(other) => other.to_string(),
        None => "connection refused".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listener::SubscriptionMode;
    use serde_json::json;

    const OPEN: &str =
        r#"0{"sid":"abc","upgrades":[],"pingInterval":25000,"pingTimeout":20000}"#;

    fn session(mode: SubscriptionMode) -> SocketSession {
        SocketSession::new(&Subscription::new(mode)).unwrap()
    }

    #[test]
    fn handshake_then_join_for_device() {
        let mut s = session(SubscriptionMode::Device("ipgD".into()));
        assert_eq!(s.state(), SessionState::Opening);

        let actions = s.handle_frame(OPEN).unwrap();
        assert_eq!(actions, vec![SessionAction::Send("40".into())]);
        assert_eq!(s.state(), SessionState::Connecting);
        assert_eq!(s.handshake().unwrap().ping_interval, 25_000);

        let actions = s.handle_frame(r#"40{"sid":"xyz"}"#).unwrap();
        assert_eq!(
            actions,
            vec![
                SessionAction::Connected,
                SessionAction::Send(r#"42["join",{"laser_id":"ipgD"}]"#.into()),
            ]
        );
        assert_eq!(s.state(), SessionState::Connected);
    }

    #[test]
    fn dashboard_joins_with_null_id() {
        let mut s = session(SubscriptionMode::Dashboard);
        s.handle_frame(OPEN).unwrap();
        let actions = s.handle_frame("40").unwrap();
        assert_eq!(
            actions[1],
            SessionAction::Send(r#"42["join",{"laser_id":null}]"#.into())
        );
    }

    #[test]
    fn answers_ping_with_pong() {
        let mut s = session(SubscriptionMode::Dashboard);
        assert_eq!(
            s.handle_frame("2").unwrap(),
            vec![SessionAction::Send("3".into())]
        );
    }

    #[test]
    fn surfaces_events_with_first_argument() {
        let mut s = session(SubscriptionMode::Dashboard);
        let actions = s
            .handle_frame(r#"42["runtime_message",{"laser":"L1","status":"idle"}]"#)
            .unwrap();
        assert_eq!(
            actions,
            vec![SessionAction::Event {
                name: "runtime_message".into(),
                payload: json!({"laser": "L1", "status": "idle"}),
            }]
        );
        let actions = s.handle_frame(r#"42["heartbeat"]"#).unwrap();
        assert_eq!(
            actions,
            vec![SessionAction::Event {
                name: "heartbeat".into(),
                payload: Value::Null,
            }]
        );
    }

    #[test]
    fn connect_error_and_disconnect() {
        let mut s = session(SubscriptionMode::Dashboard);
        assert_eq!(
            s.handle_frame(r#"44{"message":"Invalid namespace"}"#).unwrap(),
            vec![SessionAction::ConnectError("Invalid namespace".into())]
        );
        assert!(matches!(
            s.handle_frame("41").unwrap()[..],
            [SessionAction::Disconnected(_)]
        ));
        assert_eq!(s.state(), SessionState::Closed);
    }

    #[test]
    fn engine_close_ends_session() {
        let mut s = session(SubscriptionMode::Dashboard);
        assert!(matches!(
            s.handle_frame("1").unwrap()[..],
            [SessionAction::Disconnected(_)]
        ));
        assert_eq!(s.state(), SessionState::Closed);
    }

    #[test]
    fn other_namespaces_and_noise_are_ignored() {
        let mut s = session(SubscriptionMode::Dashboard);
        assert!(s
            .handle_frame(r#"42/admin,["runtime_message",{}]"#)
            .unwrap()
            .is_empty());
        assert!(s.handle_frame("6").unwrap().is_empty());
        assert!(s.handle_frame("3").unwrap().is_empty());
        assert!(s.handle_frame("x").is_err());
    }
}
