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

//! Transport layer for the laser dashboard.
//!
//! The status server speaks Socket.IO v5 on top of Engine.IO v4. This crate
//! only carries the WebSocket flavour of Engine.IO; long-polling is not
//! supported.
//!
//! # Features
//!
//! - **`wasm`**: Browser WebSocket using `web-sys` APIs
//! - **`native`**: Native WebSocket using `tokio-tungstenite`

pub mod socketio;

// ── WASM transports ───────────────────────────────────────────────────────────

#[cfg(feature = "wasm")]
pub mod websocket;

// ── Native transports ─────────────────────────────────────────────────────────

#[cfg(feature = "native")]
pub mod native_websocket;
