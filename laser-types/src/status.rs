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

//! Status payloads pushed by the server.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One status session of a device, as produced by the log monitor.
///
/// `end_time` is either a timestamp or the literal `"Ongoing"` while the
/// session is still open.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub laser: Option<String>,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_part_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Details>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub part_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tech_data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_part_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shift_type: Option<String>,
}

impl StatusRecord {
    pub fn new(laser: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            laser: Some(laser.into()),
            status: status.into(),
            ..Default::default()
        }
    }

    /// Device this record belongs to, falling back to the enclosing message's id.
    pub fn device_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.laser.as_deref().unwrap_or(fallback)
    }
}

/// Alarm details attached to a session.
///
/// Older monitors send a single string, newer ones a list of alarm lines.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Details {
    Text(String),
    Lines(Vec<String>),
}

impl Details {
    pub fn is_empty(&self) -> bool {
        match self {
            Details::Text(s) => s.is_empty(),
            Details::Lines(lines) => lines.iter().all(|l| l.is_empty()),
        }
    }
}

impl fmt::Display for Details {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Details::Text(s) => f.write_str(s),
            Details::Lines(lines) => f.write_str(&lines.join("; ")),
        }
    }
}

/// Payload of `runtime_message` / `runtime_update`.
///
/// Carries either a full `runtime` history or, for live ticks, a bare
/// `status`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeMessage {
    pub laser: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime: Option<Vec<StatusRecord>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_cutting_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_idle_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub part_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tech_data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_part_count: Option<u64>,
}

/// Body of the `join` event. `None` subscribes to the dashboard-wide room.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinRequest {
    pub laser_id: Option<String>,
}

impl JoinRequest {
    pub fn device(laser_id: impl Into<String>) -> Self {
        Self {
            laser_id: Some(laser_id.into()),
        }
    }

    pub fn dashboard() -> Self {
        Self { laser_id: None }
    }
}
