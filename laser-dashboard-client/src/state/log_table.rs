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

//! Session log of one laser.
//!
//! Rows are keyed by `(status, start_time)`. A record whose key is already
//! present rewrites that row in place (the monitor resends an open session
//! each time it changes); any other record is inserted at the top.

use crate::constants::{NOT_AVAILABLE, ONGOING};
use laser_types::StatusRecord;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogRow {
    pub status: String,
    pub start_time: String,
    pub end_time: String,
    pub total_time: String,
    pub part_count: u64,
    pub details: String,
}

impl LogRow {
    fn from_record(record: &StatusRecord, received_at: &str) -> Self {
        let mut row = LogRow {
            status: capitalize(&record.status),
            start_time: record
                .start_time
                .clone()
                .unwrap_or_else(|| received_at.to_string()),
            end_time: String::new(),
            total_time: String::new(),
            part_count: 0,
            details: String::new(),
        };
        row.refresh(record);
        row
    }

    /// Rewrites every column except the key.
    fn refresh(&mut self, record: &StatusRecord) {
        self.end_time = record
            .end_time
            .clone()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| ONGOING.to_string());
        self.total_time = record
            .total_time
            .clone()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| NOT_AVAILABLE.to_string());
        self.part_count = record.session_part_count.unwrap_or(0);
        self.details = match &record.details {
            Some(details) if !details.is_empty() => details.to_string(),
            _ => NOT_AVAILABLE.to_string(),
        };
    }

    /// Cell texts in column order.
    pub fn cells(&self) -> [String; 6] {
        [
            self.status.clone(),
            self.start_time.clone(),
            self.end_time.clone(),
            self.total_time.clone(),
            self.part_count.to_string(),
            self.details.clone(),
        ]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Upsert {
    Inserted,
    Updated,
}

/// Rows in display order: index 0 is the top of the table.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LogTable {
    rows: Vec<LogRow>,
}

impl LogTable {
    pub fn rows(&self) -> &[LogRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }

    /// `received_at` stands in for a missing start time.
    pub fn upsert(&mut self, record: &StatusRecord, received_at: &str) -> Upsert {
        let candidate = LogRow::from_record(record, received_at);
        match self
            .rows
            .iter_mut()
            .find(|row| row.status == candidate.status && row.start_time == candidate.start_time)
        {
            Some(existing) => {
                existing.refresh(record);
                Upsert::Updated
            }
            None => {
                self.rows.insert(0, candidate);
                Upsert::Inserted
            }
        }
    }
}

/// Uppercases the first character, leaves the rest untouched.
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
