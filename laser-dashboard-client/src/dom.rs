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

//! Renders a [`DashboardState`] into the dashboard's HTML page.
//!
//! The page owns the markup; this view only looks elements up by id and
//! rewrites their class or text. Cells are written as text, never as HTML.

use crate::constants::{
    AVG_CUTTING_TIME_ID, AVG_IDLE_TIME_ID, EMPTY_TABLE_TEXT, LOG_COLUMNS, LOG_TABLE_ID,
    PART_FILE_ID, TECH_DATA_ID, TOTAL_PART_COUNT_ID,
};
use crate::dashboard::{DashboardView, RenderError};
use crate::state::{ApplyOutcome, DashboardState, IndicatorOutcome, LogTable, Summary};
use log::error;
use wasm_bindgen::JsValue;
use web_sys::{Document, Element};

fn dom_error(e: JsValue) -> RenderError {
    RenderError::Dom(format!("{e:?}"))
}

#[derive(Debug, Clone)]
pub struct DomView {
    document: Document,
}

impl DomView {
    /// View over the current window's document.
    pub fn new() -> Result<Self, RenderError> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| RenderError::Dom("no document available".to_string()))?;
        Ok(Self { document })
    }

    pub fn with_document(document: Document) -> Self {
        Self { document }
    }

    fn element(&self, id: &str) -> Result<Element, RenderError> {
        self.document
            .get_element_by_id(id)
            .ok_or_else(|| RenderError::MissingElement(id.to_string()))
    }

    fn render_indicator(&self, outcome: &ApplyOutcome) {
        if let IndicatorOutcome::Updated { laser, class_name } = &outcome.indicator {
            match self.document.get_element_by_id(laser) {
                Some(element) => element.set_class_name(class_name),
                None => error!("No element found with ID: {laser}"),
            }
        }
    }

    fn render_log(&self, log: &LogTable) -> Result<(), RenderError> {
        let tbody = self
            .element(LOG_TABLE_ID)?
            .query_selector("tbody")
            .map_err(dom_error)?
            .ok_or_else(|| RenderError::MissingElement(format!("{LOG_TABLE_ID} tbody")))?;
        tbody.set_inner_html("");

        if log.is_empty() {
            let tr = self.document.create_element("tr").map_err(dom_error)?;
            let td = self.document.create_element("td").map_err(dom_error)?;
            td.set_attribute("colspan", &LOG_COLUMNS.to_string())
                .map_err(dom_error)?;
            td.set_text_content(Some(EMPTY_TABLE_TEXT));
            tr.append_child(&td).map_err(dom_error)?;
            tbody.append_child(&tr).map_err(dom_error)?;
            return Ok(());
        }

        for row in log.rows() {
            let tr = self.document.create_element("tr").map_err(dom_error)?;
            for cell in row.cells() {
                let td = self.document.create_element("td").map_err(dom_error)?;
                td.set_text_content(Some(&cell));
                tr.append_child(&td).map_err(dom_error)?;
            }
            tbody.append_child(&tr).map_err(dom_error)?;
        }
        Ok(())
    }

    fn render_summary(&self, summary: &Summary) {
        let total = summary.total_part_count.map(|n| n.to_string());
        let fields = [
            (PART_FILE_ID, summary.part_file.as_deref()),
            (TECH_DATA_ID, summary.tech_data.as_deref()),
            (TOTAL_PART_COUNT_ID, total.as_deref()),
            (AVG_CUTTING_TIME_ID, summary.avg_cutting_time.as_deref()),
            (AVG_IDLE_TIME_ID, summary.avg_idle_time.as_deref()),
        ];
        for (id, text) in fields {
            match self.element(id) {
                Ok(element) => element.set_text_content(Some(text.unwrap_or_default())),
                Err(e) => error!("{e}"),
            }
        }
    }
}

impl DashboardView for DomView {
    fn render(&mut self, state: &DashboardState, outcome: &ApplyOutcome) -> Result<(), RenderError> {
        let table = if outcome.replayed {
            self.render_summary(state.summary());
            self.render_log(state.log())
        } else {
            Ok(())
        };
        self.render_indicator(outcome);
        table
    }
}
