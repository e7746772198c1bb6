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

//! Plain-text rendering of the dashboard.

use laser_dashboard_client::constants::{EMPTY_TABLE_TEXT, LOG_COLUMNS};
use laser_dashboard_client::state::{LogTable, Summary};
use laser_dashboard_client::{
    ApplyOutcome, DashboardState, DashboardView, IndicatorOutcome, RenderError,
};
use std::io::Write;

const HEADERS: [&str; LOG_COLUMNS] = [
    "Status",
    "Start Time",
    "End Time",
    "Total Time",
    "Parts",
    "Details",
];

/// Writes every update to `out`, e.g. stdout.
#[derive(Debug)]
pub struct TerminalView<W: Write> {
    out: W,
}

impl<W: Write> TerminalView<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> DashboardView for TerminalView<W> {
    fn render(&mut self, state: &DashboardState, outcome: &ApplyOutcome) -> Result<(), RenderError> {
        let text = format_update(state, outcome);
        self.out
            .write_all(text.as_bytes())
            .and_then(|_| self.out.flush())
            .map_err(|e| RenderError::Output(e.to_string()))
    }
}

/// Everything one update changes: the indicator line, plus the summary and
/// the table after a replay.
pub fn format_update(state: &DashboardState, outcome: &ApplyOutcome) -> String {
    let mut text = String::new();
    if outcome.replayed {
        text.push_str(&format_summary(state.summary()));
        text.push_str(&format_table(state.log()));
    }
    match &outcome.indicator {
        IndicatorOutcome::Updated { laser, class_name } => {
            text.push_str(&format!("[{laser}] {class_name}\n"));
        }
        IndicatorOutcome::MissingTarget { laser } => {
            text.push_str(&format!("[{laser}] unknown laser\n"));
        }
    }
    text
}

pub fn format_summary(summary: &Summary) -> String {
    let total = summary.total_part_count.map(|n| n.to_string());
    let fields = [
        ("Part File", summary.part_file.as_deref()),
        ("Tech Data", summary.tech_data.as_deref()),
        ("Total Part Count", total.as_deref()),
        ("Avg Cutting Time", summary.avg_cutting_time.as_deref()),
        ("Avg Idle Time", summary.avg_idle_time.as_deref()),
    ];
    fields
        .iter()
        .map(|(label, value)| format!("{label}: {}\n", value.unwrap_or("-")))
        .collect()
}

/// Column-aligned log table, newest row first.
pub fn format_table(table: &LogTable) -> String {
    let rows: Vec<[String; LOG_COLUMNS]> = table.rows().iter().map(|row| row.cells()).collect();

    let mut widths = HEADERS.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut text = format_line(&HEADERS.map(String::from), &widths);
    if rows.is_empty() {
        text.push_str(EMPTY_TABLE_TEXT);
        text.push('\n');
    }
    for row in &rows {
        text.push_str(&format_line(row, &widths));
    }
    text
}

fn format_line(cells: &[String; LOG_COLUMNS], widths: &[usize; LOG_COLUMNS]) -> String {
    let line = cells
        .iter()
        .zip(widths.iter())
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join(" | ");
    format!("{}\n", line.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;
    use laser_types::StatusRecord;

    fn outcome(laser: &str, status: &str, replayed: bool) -> ApplyOutcome {
        ApplyOutcome {
            laser: laser.into(),
            replayed,
            rows_inserted: 0,
            rows_updated: 0,
            indicator: IndicatorOutcome::Updated {
                laser: laser.into(),
                class_name: format!("box {status}"),
            },
        }
    }

    #[test]
    fn empty_table_shows_placeholder() {
        let text = format_table(&LogTable::default());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("Status"));
        assert_eq!(lines[1], EMPTY_TABLE_TEXT);
    }

    #[test]
    fn columns_are_aligned() {
        let mut table = LogTable::default();
        table.upsert(
            &StatusRecord::new("ipgD", "running"),
            "2026-10-18 09:00:00",
        );
        let text = format_table(&table);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].find("| Start"), lines[1].find("| 2026"));
        assert!(lines[1].starts_with("Running"));
        assert!(lines[1].contains("Ongoing"));
    }

    #[test]
    fn single_status_prints_indicator_only() {
        let text = format_update(&DashboardState::new(), &outcome("ipgD", "idle", false));
        assert_eq!(text, "[ipgD] box idle\n");
    }

    #[test]
    fn summary_uses_dash_for_missing_values() {
        let summary = Summary {
            part_file: Some("bracket.nc".into()),
            total_part_count: Some(12),
            ..Summary::default()
        };
        let text = format_summary(&summary);
        assert!(text.contains("Part File: bracket.nc\n"));
        assert!(text.contains("Total Part Count: 12\n"));
        assert!(text.contains("Tech Data: -\n"));
    }

    #[test]
    fn view_writes_to_its_sink() {
        let mut view = TerminalView::new(Vec::new());
        view.render(&DashboardState::new(), &outcome("ipgE", "running", false))
            .unwrap();
        assert_eq!(view.into_inner(), b"[ipgE] box running\n");
    }
}
