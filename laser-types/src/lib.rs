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

//! Wire types shared by the laser dashboard crates.
//!
//! Everything here mirrors the JSON the status server pushes over Socket.IO.
//! Fields the server may omit are `Option`s; presentation defaults (such as
//! `"Ongoing"` or `"N/A"`) are applied by the render layer, not here.

pub mod callback;
pub mod status;

pub use callback::Callback;
pub use status::{Details, JoinRequest, RuntimeMessage, StatusRecord};

/// A representation of a value which can be stored and restored as a text.
pub type Text = Result<String, anyhow::Error>;

/// Socket.IO mount point on the status server.
pub const SOCKET_IO_PATH: &str = "/socket.io/";

/// Event emitted by the client to subscribe to a device or to the dashboard feed.
pub const JOIN_EVENT: &str = "join";

/// Full-runtime event the server relays to subscribed rooms.
pub const RUNTIME_MESSAGE_EVENT: &str = "runtime_message";

/// Alternate name used by older servers for the same payload.
pub const RUNTIME_UPDATE_EVENT: &str = "runtime_update";

/// Returns true when `name` is one of the status events the dashboard renders.
pub fn is_status_event(name: &str) -> bool {
    name == RUNTIME_MESSAGE_EVENT || name == RUNTIME_UPDATE_EVENT
}

/// Splits a comma separated list of device ids, dropping blanks.
pub fn split_ids(s: Option<&str>) -> Vec<String> {
    if let Some(s) = s {
        s.split(',')
            .filter_map(|s| {
                let s = s.trim().to_string();
                if s.is_empty() {
                    None
                } else {
                    Some(s)
                }
            })
            .collect::<Vec<String>>()
    } else {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_ids_trims_and_skips_blanks() {
        assert_eq!(
            split_ids(Some(" ipgA, ipgB,,ipgD ")),
            vec!["ipgA".to_string(), "ipgB".to_string(), "ipgD".to_string()]
        );
        assert!(split_ids(None).is_empty());
        assert!(split_ids(Some(" , ")).is_empty());
    }

    #[test]
    fn both_status_event_names_are_recognised() {
        assert!(is_status_event("runtime_message"));
        assert!(is_status_event("runtime_update"));
        assert!(!is_status_event("join"));
    }
}
