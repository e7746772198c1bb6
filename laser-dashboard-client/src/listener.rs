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

//! Channel listener: turns raw status events into typed updates.
//!
//! One [`Subscription`] serves both pages of the dashboard. In
//! [`SubscriptionMode::Device`] it follows a single laser and asks for full
//! replays; in [`SubscriptionMode::Dashboard`] it follows every laser but only
//! keeps the latest status of each.

use laser_types::{JoinRequest, RuntimeMessage, StatusRecord};
use serde::Deserialize;
use serde_json::Value;
use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubscriptionMode {
    /// Detail page of one laser: indicator, log table and summaries.
    Device(String),
    /// Overview page: one indicator per laser.
    Dashboard,
}

impl SubscriptionMode {
    pub fn from_laser_id(laser_id: Option<String>) -> Self {
        match laser_id {
            Some(id) if !id.trim().is_empty() => SubscriptionMode::Device(id.trim().to_string()),
            _ => SubscriptionMode::Dashboard,
        }
    }
}

impl fmt::Display for SubscriptionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubscriptionMode::Device(id) => write!(f, "laser {id}"),
            SubscriptionMode::Dashboard => f.write_str("dashboard"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    #[error("malformed status payload: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("runtime for {laser} is empty")]
    EmptyRuntime { laser: String },
    #[error("payload for {laser} carries neither runtime nor status")]
    MissingStatus { laser: String },
}

/// A full history for one laser. Never empty: the newest record is kept
/// apart from the older ones.
#[derive(Clone, Debug, PartialEq)]
pub struct RuntimeReplay {
    pub laser: String,
    history: Vec<StatusRecord>,
    latest: StatusRecord,
    pub avg_cutting_time: Option<String>,
    pub avg_idle_time: Option<String>,
    pub part_file: Option<String>,
    pub tech_data: Option<String>,
    pub total_part_count: Option<u64>,
}

impl RuntimeReplay {
    pub fn from_message(message: RuntimeMessage) -> Result<Self, ListenerError> {
        let mut history = message.runtime.unwrap_or_default();
        let Some(latest) = history.pop() else {
            return Err(ListenerError::EmptyRuntime {
                laser: message.laser,
            });
        };
        Ok(Self {
            laser: message.laser,
            history,
            latest,
            avg_cutting_time: message.avg_cutting_time,
            avg_idle_time: message.avg_idle_time,
            part_file: message.part_file,
            tech_data: message.tech_data,
            total_part_count: message.total_part_count,
        })
    }

    /// The most recent record.
    pub fn latest(&self) -> &StatusRecord {
        &self.latest
    }

    /// All records, oldest first.
    pub fn records(&self) -> impl Iterator<Item = &StatusRecord> {
        self.history.iter().chain(std::iter::once(&self.latest))
    }

    pub fn len(&self) -> usize {
        self.history.len() + 1
    }

    /// Always false, a replay holds at least one record.
    pub fn is_empty(&self) -> bool {
        false
    }
}

/// Input of the render step.
#[derive(Clone, Debug, PartialEq)]
pub enum ChannelUpdate {
    /// Only the indicator changes. The record's `laser` is always set.
    SingleStatus(StatusRecord),
    /// Reset, replay every record, then update the indicator.
    FullRuntime(RuntimeReplay),
}

impl ChannelUpdate {
    pub fn laser(&self) -> &str {
        match self {
            ChannelUpdate::SingleStatus(record) => record.laser.as_deref().unwrap_or_default(),
            ChannelUpdate::FullRuntime(replay) => replay.laser.as_str(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Subscription {
    mode: SubscriptionMode,
}

impl Subscription {
    pub fn new(mode: SubscriptionMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> &SubscriptionMode {
        &self.mode
    }

    /// Body of the `join` event sent after every (re)connect.
    pub fn join_request(&self) -> JoinRequest {
        match &self.mode {
            SubscriptionMode::Device(id) => JoinRequest::device(id.clone()),
            SubscriptionMode::Dashboard => JoinRequest::dashboard(),
        }
    }

    /// Classifies one status event payload.
    ///
    /// Returns `Ok(None)` for payloads about other lasers on a device page.
    pub fn classify(&self, payload: &Value) -> Result<Option<ChannelUpdate>, ListenerError> {
        let message = RuntimeMessage::deserialize(payload)?;
        if let SubscriptionMode::Device(id) = &self.mode {
            if &message.laser != id {
                return Ok(None);
            }
        }

        if message.runtime.is_some() {
            let replay = RuntimeReplay::from_message(message)?;
            return Ok(Some(match self.mode {
                SubscriptionMode::Device(_) => ChannelUpdate::FullRuntime(replay),
                SubscriptionMode::Dashboard => {
                    let mut latest = replay.latest().clone();
                    if latest.laser.is_none() {
                        latest.laser = Some(replay.laser.clone());
                    }
                    ChannelUpdate::SingleStatus(latest)
                }
            }));
        }

        match message.status {
            Some(status) if !status.is_empty() => Ok(Some(ChannelUpdate::SingleStatus(
                StatusRecord::new(message.laser, status),
            ))),
            _ => Err(ListenerError::MissingStatus {
                laser: message.laser,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn device(id: &str) -> Subscription {
        Subscription::new(SubscriptionMode::Device(id.to_string()))
    }

    #[test]
    fn mode_from_optional_laser_id() {
        assert_eq!(
            SubscriptionMode::from_laser_id(Some("ipgA".into())),
            SubscriptionMode::Device("ipgA".into())
        );
        assert_eq!(
            SubscriptionMode::from_laser_id(Some("  ".into())),
            SubscriptionMode::Dashboard
        );
        assert_eq!(SubscriptionMode::from_laser_id(None), SubscriptionMode::Dashboard);
    }

    #[test]
    fn join_request_follows_mode() {
        assert_eq!(device("ipgA").join_request(), JoinRequest::device("ipgA"));
        assert_eq!(
            Subscription::new(SubscriptionMode::Dashboard).join_request(),
            JoinRequest::dashboard()
        );
    }

    #[test]
    fn device_mode_yields_full_runtime() {
        let payload = json!({
            "laser": "L1",
            "runtime": [
                {"status": "running", "start_time": "T1"},
                {"status": "idle", "start_time": "T2"}
            ],
            "avg_idle_time": "0:05:00"
        });
        let Some(ChannelUpdate::FullRuntime(replay)) = device("L1").classify(&payload).unwrap()
        else {
            panic!("expected a full runtime");
        };
        assert_eq!(replay.len(), 2);
        assert_eq!(replay.latest().status, "idle");
        let statuses: Vec<_> = replay.records().map(|r| r.status.as_str()).collect();
        assert_eq!(statuses, vec!["running", "idle"]);
        assert_eq!(replay.avg_idle_time.as_deref(), Some("0:05:00"));
    }

    #[test]
    fn device_mode_ignores_other_lasers() {
        let payload = json!({"laser": "L2", "runtime": [{"status": "idle"}]});
        assert!(device("L1").classify(&payload).unwrap().is_none());
    }

    #[test]
    fn dashboard_mode_keeps_only_latest_status() {
        let payload = json!({
            "laser": "L3",
            "runtime": [{"status": "running"}, {"status": "error"}]
        });
        let update = Subscription::new(SubscriptionMode::Dashboard)
            .classify(&payload)
            .unwrap()
            .unwrap();
        let ChannelUpdate::SingleStatus(record) = update else {
            panic!("expected a single status");
        };
        assert_eq!(record.status, "error");
        assert_eq!(record.laser.as_deref(), Some("L3"));
    }

    #[test]
    fn bare_status_takes_the_single_update_path() {
        let payload = json!({"laser": "L1", "status": "running"});
        for sub in [device("L1"), Subscription::new(SubscriptionMode::Dashboard)] {
            let update = sub.classify(&payload).unwrap().unwrap();
            assert_eq!(
                update,
                ChannelUpdate::SingleStatus(StatusRecord::new("L1", "running"))
            );
        }
    }

    #[test]
    fn empty_runtime_is_an_error() {
        let payload = json!({"laser": "L1", "status": "idle", "runtime": []});
        assert!(matches!(
            device("L1").classify(&payload),
            Err(ListenerError::EmptyRuntime { laser }) if laser == "L1"
        ));
    }

    #[test]
    fn malformed_payloads_are_errors() {
        let sub = Subscription::new(SubscriptionMode::Dashboard);
        assert!(matches!(
            sub.classify(&json!({"runtime": [{"status": "idle"}]})),
            Err(ListenerError::Malformed(_))
        ));
        assert!(matches!(
            sub.classify(&json!({"laser": "L1", "runtime": "idle"})),
            Err(ListenerError::Malformed(_))
        ));
        assert!(matches!(
            sub.classify(&json!({"laser": "L1"})),
            Err(ListenerError::MissingStatus { .. })
        ));
    }
}
