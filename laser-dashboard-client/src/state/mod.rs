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

//! In-memory dashboard state and the pure step that applies updates to it.
//!
//! Front ends never mutate the state directly: they feed
//! [`ChannelUpdate`]s through [`DashboardState::apply`] and then render what
//! the state holds.

mod log_table;

pub use log_table::{capitalize, LogRow, LogTable, Upsert};

use crate::listener::{ChannelUpdate, RuntimeReplay};
use laser_types::StatusRecord;
use std::collections::{BTreeMap, BTreeSet};

/// Visual state of one laser box.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Indicator {
    pub status: String,
}

impl Indicator {
    pub fn class_name(&self) -> String {
        format!("box {}", self.status)
    }
}

/// Text of the summary fields above the log table. `None` renders empty.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Summary {
    pub part_file: Option<String>,
    pub tech_data: Option<String>,
    pub total_part_count: Option<u64>,
    pub avg_cutting_time: Option<String>,
    pub avg_idle_time: Option<String>,
}

impl Summary {
    fn absorb_record(&mut self, record: &StatusRecord) {
        set_if_present(&mut self.part_file, &record.part_file);
        set_if_present(&mut self.tech_data, &record.tech_data);
        if record.total_part_count.is_some() {
            self.total_part_count = record.total_part_count;
        }
    }

    fn absorb_replay(&mut self, replay: &RuntimeReplay) {
        set_if_present(&mut self.part_file, &replay.part_file);
        set_if_present(&mut self.tech_data, &replay.tech_data);
        if replay.total_part_count.is_some() {
            self.total_part_count = replay.total_part_count;
        }
        set_if_present(&mut self.avg_cutting_time, &replay.avg_cutting_time);
        set_if_present(&mut self.avg_idle_time, &replay.avg_idle_time);
    }
}

fn set_if_present(field: &mut Option<String>, value: &Option<String>) {
    if let Some(v) = value.as_ref().filter(|v| !v.is_empty()) {
        *field = Some(v.clone());
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IndicatorOutcome {
    Updated { laser: String, class_name: String },
    /// No indicator exists for this laser; nothing was changed.
    MissingTarget { laser: String },
}

/// What one [`DashboardState::apply`] call did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApplyOutcome {
    pub laser: String,
    /// True when the table and summaries were rebuilt.
    pub replayed: bool,
    pub rows_inserted: usize,
    pub rows_updated: usize,
    pub indicator: IndicatorOutcome,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DashboardState {
    /// Lasers that have an indicator. `None` accepts any id.
    devices: Option<BTreeSet<String>>,
    indicators: BTreeMap<String, Indicator>,
    log: LogTable,
    summary: Summary,
}

impl DashboardState {
    pub fn new() -> Self {
        Self::default()
    }

    /// State that only knows indicators for `devices`, like a page with a
    /// fixed set of boxes.
    pub fn with_devices<I, S>(devices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            devices: Some(devices.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    pub fn indicator(&self, laser: &str) -> Option<&Indicator> {
        self.indicators.get(laser)
    }

    pub fn indicators(&self) -> impl Iterator<Item = (&String, &Indicator)> {
        self.indicators.iter()
    }

    pub fn log(&self) -> &LogTable {
        &self.log
    }

    pub fn summary(&self) -> &Summary {
        &self.summary
    }

    /// Clears the log table and every summary field. Indicators are kept.
    pub fn reset(&mut self) {
        self.log.clear();
        self.summary = Summary::default();
    }

    /// Applies one update. `received_at` is used as the start time of
    /// records that lack one.
    pub fn apply(&mut self, update: &ChannelUpdate, received_at: &str) -> ApplyOutcome {
        match update {
            ChannelUpdate::SingleStatus(record) => {
                let laser = update.laser().to_string();
                let indicator = self.update_indicator(&laser, record);
                ApplyOutcome {
                    laser,
                    replayed: false,
                    rows_inserted: 0,
                    rows_updated: 0,
                    indicator,
                }
            }
            ChannelUpdate::FullRuntime(replay) => self.replay(replay, received_at),
        }
    }

    fn replay(&mut self, replay: &RuntimeReplay, received_at: &str) -> ApplyOutcome {
        self.reset();
        let mut rows_inserted = 0;
        let mut rows_updated = 0;
        for record in replay.records() {
            self.summary.absorb_record(record);
            match self.log.upsert(record, received_at) {
                Upsert::Inserted => rows_inserted += 1,
                Upsert::Updated => rows_updated += 1,
            }
        }
        self.summary.absorb_replay(replay);

        let latest = replay.latest();
        let laser = latest.device_or(&replay.laser).to_string();
        let indicator = self.update_indicator(&laser, latest);
        ApplyOutcome {
            laser: replay.laser.clone(),
            replayed: true,
            rows_inserted,
            rows_updated,
            indicator,
        }
    }

    fn update_indicator(&mut self, laser: &str, record: &StatusRecord) -> IndicatorOutcome {
        let known = self
            .devices
            .as_ref()
            .map_or(!laser.is_empty(), |devices| devices.contains(laser));
        if !known {
            return IndicatorOutcome::MissingTarget {
                laser: laser.to_string(),
            };
        }
        let indicator = Indicator {
            status: record.status.clone(),
        };
        let class_name = indicator.class_name();
        self.indicators.insert(laser.to_string(), indicator);
        IndicatorOutcome::Updated {
            laser: laser.to_string(),
            class_name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listener::{Subscription, SubscriptionMode};
    use serde_json::{json, Value};

    fn classify(mode: SubscriptionMode, payload: Value) -> ChannelUpdate {
        Subscription::new(mode).classify(&payload).unwrap().unwrap()
    }

    fn device(payload: Value) -> ChannelUpdate {
        classify(SubscriptionMode::Device("L1".into()), payload)
    }

    #[test]
    fn single_running_record_scenario() {
        let mut state = DashboardState::new();
        let outcome = state.apply(
            &device(json!({"laser": "L1", "runtime": [{"status": "running", "start_time": "T1"}]})),
            "R",
        );
        assert_eq!(state.indicator("L1").unwrap().class_name(), "box running");
        assert_eq!(state.log().len(), 1);
        assert_eq!(state.log().rows()[0].status, "Running");
        assert!(outcome.replayed);
        assert_eq!(outcome.rows_inserted, 1);
    }

    #[test]
    fn second_message_adds_idle_row_scenario() {
        let mut state = DashboardState::new();
        state.apply(
            &device(json!({"laser": "L1", "runtime": [{"status": "running", "start_time": "T1"}]})),
            "R",
        );
        let before = state.log().rows()[0].clone();

        state.apply(
            &device(json!({"laser": "L1", "runtime": [
                {"status": "running", "start_time": "T1"},
                {"status": "idle", "start_time": "T1", "end_time": "T2"}
            ]})),
            "R",
        );
        assert_eq!(state.log().len(), 2);
        assert_eq!(state.log().rows()[0].status, "Idle");
        assert_eq!(state.log().rows()[0].end_time, "T2");
        assert_eq!(state.log().rows()[1], before);
        assert_eq!(state.indicator("L1").unwrap().class_name(), "box idle");
    }

    #[test]
    fn replaying_twice_is_idempotent() {
        let update = device(json!({"laser": "L1", "runtime": [
            {"status": "setup", "start_time": "T0", "end_time": "T1", "part_file": "a.nc"},
            {"status": "cutting", "start_time": "T1", "session_part_count": 3},
            {"status": "cutting", "start_time": "T1", "end_time": "T2", "session_part_count": 5}
        ], "avg_cutting_time": "0:20:00"}));
        let mut state = DashboardState::new();
        state.apply(&update, "R");
        let first = state.clone();
        state.apply(&update, "R");
        assert_eq!(state, first);
        assert_eq!(state.log().len(), 2);
    }

    #[test]
    fn repeated_key_mutates_existing_row() {
        let mut state = DashboardState::new();
        let outcome = state.apply(
            &device(json!({"laser": "L1", "runtime": [
                {"status": "idle", "start_time": "T1", "end_time": "Ongoing"},
                {"status": "idle", "start_time": "T1", "end_time": "T3"}
            ]})),
            "R",
        );
        assert_eq!(outcome.rows_inserted, 1);
        assert_eq!(outcome.rows_updated, 1);
        assert_eq!(state.log().len(), 1);
        assert_eq!(state.log().rows()[0].end_time, "T3");
    }

    #[test]
    fn indicator_depends_only_on_latest_record() {
        let mut a = DashboardState::new();
        let mut b = DashboardState::new();
        a.apply(
            &device(json!({"laser": "L1", "runtime": [
                {"status": "error", "start_time": "T0"},
                {"status": "running", "start_time": "T1"}
            ]})),
            "R",
        );
        b.apply(
            &device(json!({"laser": "L1", "runtime": [
                {"status": "idle", "start_time": "T5"},
                {"status": "setup", "start_time": "T6"},
                {"status": "running", "start_time": "T7"}
            ]})),
            "R",
        );
        assert_eq!(a.indicator("L1"), b.indicator("L1"));
    }

    #[test]
    fn full_runtime_resets_summary_then_fills_it() {
        let mut state = DashboardState::new();
        state.apply(
            &device(json!({"laser": "L1", "runtime": [{"status": "setup", "part_file": "old.nc"}],
                "avg_idle_time": "0:01:00"})),
            "R",
        );
        state.apply(
            &device(json!({"laser": "L1", "runtime": [
                {"status": "setup", "start_time": "T1", "tech_data": "MS 10mm", "total_part_count": 7},
                {"status": "cutting", "start_time": "T2", "part_file": ""}
            ], "avg_cutting_time": "0:12:30"})),
            "R",
        );
        let summary = state.summary();
        assert_eq!(summary.part_file, None);
        assert_eq!(summary.tech_data.as_deref(), Some("MS 10mm"));
        assert_eq!(summary.total_part_count, Some(7));
        assert_eq!(summary.avg_cutting_time.as_deref(), Some("0:12:30"));
        assert_eq!(summary.avg_idle_time, None);
    }

    #[test]
    fn single_status_leaves_table_alone() {
        let mut state = DashboardState::new();
        state.apply(
            &device(json!({"laser": "L1", "runtime": [{"status": "running", "start_time": "T1"}]})),
            "R",
        );
        let log = state.log().clone();
        let outcome = state.apply(&device(json!({"laser": "L1", "status": "idle"})), "R");
        assert!(!outcome.replayed);
        assert_eq!(state.log(), &log);
        assert_eq!(state.indicator("L1").unwrap().class_name(), "box idle");
    }

    #[test]
    fn unknown_device_is_a_missing_target() {
        let mut state = DashboardState::with_devices(["ipgA", "ipgB"]);
        let outcome = state.apply(
            &classify(SubscriptionMode::Dashboard, json!({"laser": "ipgZ", "status": "idle"})),
            "R",
        );
        assert_eq!(
            outcome.indicator,
            IndicatorOutcome::MissingTarget {
                laser: "ipgZ".into()
            }
        );
        assert_eq!(state.indicators().count(), 0);

        let outcome = state.apply(
            &classify(SubscriptionMode::Dashboard, json!({"laser": "ipgA", "status": "idle"})),
            "R",
        );
        assert_eq!(
            outcome.indicator,
            IndicatorOutcome::Updated {
                laser: "ipgA".into(),
                class_name: "box idle".into()
            }
        );
    }

    #[test]
    fn record_laser_overrides_message_laser_for_indicator() {
        let mut state = DashboardState::new();
        state.apply(
            &device(json!({"laser": "L1", "runtime": [{"laser": "L1-head2", "status": "running"}]})),
            "R",
        );
        assert!(state.indicator("L1").is_none());
        assert_eq!(
            state.indicator("L1-head2").unwrap().class_name(),
            "box running"
        );
    }
}
