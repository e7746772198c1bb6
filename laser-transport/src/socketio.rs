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

//! Engine.IO v4 / Socket.IO v5 text framing.
//!
//! A WebSocket text frame carries exactly one Engine.IO packet. Engine.IO
//! `message` packets in turn carry one Socket.IO packet:
//!
//! ```text
//! 42["runtime_message",{"laser":"ipgA","runtime":[...]}]
//! ││└ JSON payload
//! │└ Socket.IO EVENT
//! └ Engine.IO MESSAGE
//! ```
//!
//! Binary attachments (Socket.IO types 5 and 6) are rejected.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Engine.IO protocol revision requested in the connection URL.
pub const ENGINE_IO_VERSION: u8 = 4;

/// The default namespace.
pub const DEFAULT_NAMESPACE: &str = "/";

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    #[error("empty packet")]
    Empty,
    #[error("unknown engine.io packet type {0:?}")]
    UnknownEngineType(char),
    #[error("unknown socket.io packet type {0:?}")]
    UnknownSocketType(char),
    #[error("binary socket.io packets are not supported")]
    BinaryUnsupported,
    #[error("invalid open handshake: {0}")]
    Handshake(String),
    #[error("invalid packet payload: {0}")]
    Payload(String),
    #[error("event packet has no name")]
    MissingEventName,
    #[error("unsupported server url {0:?}")]
    Url(String),
}

/// Server handshake carried by the Engine.IO `open` packet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Handshake {
    pub sid: String,
    #[serde(default)]
    pub upgrades: Vec<String>,
    pub ping_interval: u64,
    pub ping_timeout: u64,
    #[serde(default)]
    pub max_payload: Option<u64>,
}

impl Handshake {
    /// How long the connection may stay silent before it is considered dead.
    /// Both values come from the server, so the sum saturates.
    pub fn liveness_timeout(&self) -> Duration {
        Duration::from_millis(self.ping_interval.saturating_add(self.ping_timeout))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EnginePacket {
    Open(Handshake),
    Close,
    Ping(String),
    Pong(String),
    Message(String),
    Upgrade,
    Noop,
}

impl EnginePacket {
    pub fn decode(frame: &str) -> Result<Self, ProtocolError> {
        let mut chars = frame.chars();
        let kind = chars.next().ok_or(ProtocolError::Empty)?;
        let rest = chars.as_str();
        Ok(match kind {
            '0' => EnginePacket::Open(
                serde_json::from_str(rest).map_err(|e| ProtocolError::Handshake(e.to_string()))?,
            ),
            '1' => EnginePacket::Close,
            '2' => EnginePacket::Ping(rest.to_string()),
            '3' => EnginePacket::Pong(rest.to_string()),
            '4' => EnginePacket::Message(rest.to_string()),
            '5' => EnginePacket::Upgrade,
            '6' => EnginePacket::Noop,
            other => return Err(ProtocolError::UnknownEngineType(other)),
        })
    }

    pub fn encode(&self) -> String {
        match self {
            EnginePacket::Open(handshake) => {
                // Handshake only holds strings and integers.
                format!("0{}", serde_json::to_string(handshake).unwrap_or_default())
            }
            EnginePacket::Close => "1".to_string(),
            EnginePacket::Ping(data) => format!("2{data}"),
            EnginePacket::Pong(data) => format!("3{data}"),
            EnginePacket::Message(data) => format!("4{data}"),
            EnginePacket::Upgrade => "5".to_string(),
            EnginePacket::Noop => "6".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum SocketPacket {
    Connect {
        namespace: String,
        data: Option<Value>,
    },
    Disconnect {
        namespace: String,
    },
    Event {
        namespace: String,
        id: Option<u64>,
        name: String,
        args: Vec<Value>,
    },
    Ack {
        namespace: String,
        id: u64,
        args: Vec<Value>,
    },
    ConnectError {
        namespace: String,
        data: Option<Value>,
    },
}

impl SocketPacket {
    /// Namespace connect request for the default namespace.
    pub fn connect() -> Self {
        SocketPacket::Connect {
            namespace: DEFAULT_NAMESPACE.to_string(),
            data: None,
        }
    }

    /// Event on the default namespace with a single JSON argument.
    pub fn event<T: Serialize>(name: &str, arg: &T) -> Result<Self, ProtocolError> {
        let arg = serde_json::to_value(arg).map_err(|e| ProtocolError::Payload(e.to_string()))?;
        Ok(SocketPacket::Event {
            namespace: DEFAULT_NAMESPACE.to_string(),
            id: None,
            name: name.to_string(),
            args: vec![arg],
        })
    }

    pub fn namespace(&self) -> &str {
        match self {
            SocketPacket::Connect { namespace, .. }
            | SocketPacket::Disconnect { namespace }
            | SocketPacket::Event { namespace, .. }
            | SocketPacket::Ack { namespace, .. }
            | SocketPacket::ConnectError { namespace, .. } => namespace,
        }
    }

    pub fn decode(packet: &str) -> Result<Self, ProtocolError> {
        let mut chars = packet.chars();
        let kind = chars.next().ok_or(ProtocolError::Empty)?;
        match kind {
            '0'..='4' => {}
            '5' | '6' => return Err(ProtocolError::BinaryUnsupported),
            other => return Err(ProtocolError::UnknownSocketType(other)),
        }
        let mut rest = chars.as_str();

        let mut namespace = DEFAULT_NAMESPACE.to_string();
        if rest.starts_with('/') {
            match rest.find(',') {
                Some(idx) => {
                    namespace = rest[..idx].to_string();
                    rest = &rest[idx + 1..];
                }
                None => {
                    namespace = rest.to_string();
                    rest = "";
                }
            }
        }

        let digits = rest.chars().take_while(|c| c.is_ascii_digit()).count();
        let id = if digits > 0 {
            let id = rest[..digits]
                .parse::<u64>()
                .map_err(|e| ProtocolError::Payload(e.to_string()))?;
            rest = &rest[digits..];
            Some(id)
        } else {
            None
        };

        let payload = if rest.is_empty() {
            None
        } else {
            Some(
                serde_json::from_str::<Value>(rest)
                    .map_err(|e| ProtocolError::Payload(e.to_string()))?,
            )
        };

        match kind {
            '0' => Ok(SocketPacket::Connect {
                namespace,
                data: payload,
            }),
            '1' => Ok(SocketPacket::Disconnect { namespace }),
            '2' => {
                let (name, args) = split_event(payload)?;
                Ok(SocketPacket::Event {
                    namespace,
                    id,
                    name,
                    args,
                })
            }
            '3' => {
                let id = id.ok_or_else(|| ProtocolError::Payload("ack without id".into()))?;
                let args = match payload {
                    Some(Value::Array(args)) => args,
                    Some(other) => vec![other],
                    None => Vec::new(),
                };
                Ok(SocketPacket::Ack {
                    namespace,
                    id,
                    args,
                })
            }
            '4' => Ok(SocketPacket::ConnectError {
                namespace,
                data: payload,
            }),
            other => Err(ProtocolError::UnknownSocketType(other)),
        }
    }

    pub fn encode(&self) -> String {
        let mut out = String::new();
        let (kind, namespace, id, payload) = match self {
            SocketPacket::Connect { namespace, data } => ('0', namespace, None, data.clone()),
            SocketPacket::Disconnect { namespace } => ('1', namespace, None, None),
            SocketPacket::Event {
                namespace,
                id,
                name,
                args,
            } => {
                let mut array = Vec::with_capacity(args.len() + 1);
                array.push(Value::String(name.clone()));
                array.extend(args.iter().cloned());
                ('2', namespace, *id, Some(Value::Array(array)))
            }
            SocketPacket::Ack {
                namespace,
                id,
                args,
            } => ('3', namespace, Some(*id), Some(Value::Array(args.clone()))),
            SocketPacket::ConnectError { namespace, data } => ('4', namespace, None, data.clone()),
        };
        out.push(kind);
        if namespace != DEFAULT_NAMESPACE {
            out.push_str(namespace);
            out.push(',');
        }
        if let Some(id) = id {
            out.push_str(&id.to_string());
        }
        if let Some(payload) = payload {
            out.push_str(&payload.to_string());
        }
        out
    }
}

fn split_event(payload: Option<Value>) -> Result<(String, Vec<Value>), ProtocolError> {
    let Some(Value::Array(mut items)) = payload else {
        return Err(ProtocolError::Payload("event payload is not an array".into()));
    };
    if items.is_empty() {
        return Err(ProtocolError::MissingEventName);
    }
    match items.remove(0) {
        Value::String(name) => Ok((name, items)),
        _ => Err(ProtocolError::MissingEventName),
    }
}

/// Wraps a Socket.IO packet into a WebSocket text frame.
pub fn frame(packet: &SocketPacket) -> String {
    EnginePacket::Message(packet.encode()).encode()
}

/// Builds the WebSocket URL for a server base address such as
/// `http://10.0.4.11:1916`.
pub fn websocket_url(base: &str) -> Result<String, ProtocolError> {
    let base = base.trim().trim_end_matches('/');
    let (scheme, rest) = base
        .split_once("://")
        .ok_or_else(|| ProtocolError::Url(base.to_string()))?;
    let scheme = match scheme.to_ascii_lowercase().as_str() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        _ => return Err(ProtocolError::Url(base.to_string())),
    };
    if rest.is_empty() {
        return Err(ProtocolError::Url(base.to_string()));
    }
    Ok(format!(
        "{scheme}://{rest}{}?EIO={ENGINE_IO_VERSION}&transport=websocket",
        laser_types::SOCKET_IO_PATH
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_open_handshake() {
        let frame = r#"0{"sid":"lv_VI97HAXpY6yYWAAAC","upgrades":[],"pingInterval":25000,"pingTimeout":20000,"maxPayload":1000000}"#;
        let EnginePacket::Open(handshake) = EnginePacket::decode(frame).unwrap() else {
            panic!("expected open packet");
        };
        assert_eq!(handshake.sid, "lv_VI97HAXpY6yYWAAAC");
        assert_eq!(handshake.liveness_timeout(), Duration::from_millis(45_000));
    }

    #[test]
    fn oversized_ping_interval_saturates() {
        let frame = r#"0{"sid":"a","upgrades":[],"pingInterval":18446744073709551615,"pingTimeout":1}"#;
        let EnginePacket::Open(handshake) = EnginePacket::decode(frame).unwrap() else {
            panic!("expected open packet");
        };
        assert_eq!(handshake.ping_interval, u64::MAX);
        assert_eq!(handshake.liveness_timeout(), Duration::from_millis(u64::MAX));
    }

    #[test]
    fn rejects_bad_engine_frames() {
        assert_eq!(EnginePacket::decode(""), Err(ProtocolError::Empty));
        assert_eq!(
            EnginePacket::decode("9"),
            Err(ProtocolError::UnknownEngineType('9'))
        );
        assert!(matches!(
            EnginePacket::decode("0{not json"),
            Err(ProtocolError::Handshake(_))
        ));
    }

    #[test]
    fn ping_is_answered_with_matching_pong() {
        let ping = EnginePacket::decode("2probe").unwrap();
        assert_eq!(ping, EnginePacket::Ping("probe".into()));
        assert_eq!(EnginePacket::Pong("probe".into()).encode(), "3probe");
        assert_eq!(EnginePacket::Pong(String::new()).encode(), "3");
    }

    #[test]
    fn decodes_runtime_event() {
        let EnginePacket::Message(body) =
            EnginePacket::decode(r#"42["runtime_message",{"laser":"ipgA","runtime":[]}]"#)
                .unwrap()
        else {
            panic!("expected message packet");
        };
        let packet = SocketPacket::decode(&body).unwrap();
        assert_eq!(
            packet,
            SocketPacket::Event {
                namespace: "/".into(),
                id: None,
                name: "runtime_message".into(),
                args: vec![json!({"laser": "ipgA", "runtime": []})],
            }
        );
    }

    #[test]
    fn decodes_namespace_and_ack_id() {
        let packet = SocketPacket::decode(r#"2/lasers,12["runtime_update",{"laser":"L1"}]"#).unwrap();
        let SocketPacket::Event {
            namespace, id, name, ..
        } = packet
        else {
            panic!("expected event");
        };
        assert_eq!(namespace, "/lasers");
        assert_eq!(id, Some(12));
        assert_eq!(name, "runtime_update");
    }

    #[test]
    fn decodes_connect_and_connect_error() {
        assert_eq!(
            SocketPacket::decode(r#"0{"sid":"abc"}"#).unwrap(),
            SocketPacket::Connect {
                namespace: "/".into(),
                data: Some(json!({"sid": "abc"})),
            }
        );
        assert_eq!(
            SocketPacket::decode(r#"4{"message":"Not authorized"}"#).unwrap(),
            SocketPacket::ConnectError {
                namespace: "/".into(),
                data: Some(json!({"message": "Not authorized"})),
            }
        );
        assert_eq!(
            SocketPacket::decode("1/admin").unwrap(),
            SocketPacket::Disconnect {
                namespace: "/admin".into()
            }
        );
    }

    #[test]
    fn rejects_malformed_socket_packets() {
        assert_eq!(
            SocketPacket::decode("2[]"),
            Err(ProtocolError::MissingEventName)
        );
        assert_eq!(
            SocketPacket::decode("2[42]"),
            Err(ProtocolError::MissingEventName)
        );
        assert!(matches!(
            SocketPacket::decode(r#"2{"laser":"L1"}"#),
            Err(ProtocolError::Payload(_))
        ));
        assert_eq!(
            SocketPacket::decode(r#"51-["x",{"_placeholder":true,"num":0}]"#),
            Err(ProtocolError::BinaryUnsupported)
        );
        assert_eq!(
            SocketPacket::decode("7"),
            Err(ProtocolError::UnknownSocketType('7'))
        );
    }

    #[test]
    fn encodes_join_frame() {
        let packet = SocketPacket::event("join", &json!({"laser_id": "ipgD"})).unwrap();
        assert_eq!(frame(&packet), r#"42["join",{"laser_id":"ipgD"}]"#);
        assert_eq!(frame(&SocketPacket::connect()), "40");
    }

    #[test]
    fn encodes_foreign_namespace_with_separator() {
        let packet = SocketPacket::Event {
            namespace: "/lasers".into(),
            id: Some(3),
            name: "join".into(),
            args: vec![Value::Null],
        };
        assert_eq!(packet.encode(), r#"2/lasers,3["join",null]"#);
    }

    #[test]
    fn builds_websocket_urls() {
        assert_eq!(
            websocket_url("http://10.0.4.11:1916").unwrap(),
            "ws://10.0.4.11:1916/socket.io/?EIO=4&transport=websocket"
        );
        assert_eq!(
            websocket_url("https://lasers.example.com/").unwrap(),
            "wss://lasers.example.com/socket.io/?EIO=4&transport=websocket"
        );
        assert!(websocket_url("10.0.4.11:1916").is_err());
        assert!(websocket_url("ftp://host").is_err());
        assert!(websocket_url("http://").is_err());
    }
}
