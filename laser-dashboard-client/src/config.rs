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

//! Page configuration for the browser front end.
//!
//! The HTML page may define
//!
//! ```js
//! window.__LASER_CONFIG = {
//!   serverUrl: "http://10.0.4.11:1916",
//!   laserId: "ipgD",
//!   lasers: ["ipgD", "ipgE", "trumpf"],
//! };
//! ```
//!
//! Every key is optional: the server defaults to the page origin, a missing
//! `laserId` selects the dashboard feed and a missing `lasers` list accepts
//! any device id.

use serde::Deserialize;
use serde_wasm_bindgen::from_value as from_js_value;
use wasm_bindgen::JsValue;
use web_sys::window;

const CONFIG_KEY: &str = "__LASER_CONFIG";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RuntimeConfig {
    #[serde(rename = "serverUrl")]
    #[serde(default)]
    pub server_url: Option<String>,
    #[serde(rename = "laserId")]
    #[serde(default)]
    pub laser_id: Option<String>,
    #[serde(default)]
    pub lasers: Vec<String>,
}

/// Reads `window.__LASER_CONFIG`. `Ok(None)` when the page does not define it.
pub fn app_config() -> Result<Option<RuntimeConfig>, String> {
    let win = window().ok_or_else(|| "no window available".to_string())?;
    let config =
        js_sys::Reflect::get(&win, &JsValue::from_str(CONFIG_KEY)).unwrap_or(JsValue::UNDEFINED);
    if config.is_undefined() || config.is_null() {
        return Ok(None);
    }
    from_js_value::<RuntimeConfig>(config)
        .map(Some)
        .map_err(|e| format!("Failed to parse {CONFIG_KEY}: {e:?}"))
}

/// Origin of the current page, e.g. `https://lasers.example.com`.
pub fn page_origin() -> Result<String, String> {
    window()
        .ok_or_else(|| "no window available".to_string())?
        .location()
        .origin()
        .map_err(|e| format!("Failed to read window.location.origin: {e:?}"))
}
