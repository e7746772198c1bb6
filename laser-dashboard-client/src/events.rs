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

//! Framework-agnostic events emitted by the dashboard client.

/// Lifecycle and update events any front end can subscribe to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClientEvent {
    // === Connection Events ===
    /// Namespace connect acknowledged and `join` sent.
    Connected,

    /// Connection to the server was lost.
    ConnectionLost(String),

    /// The transport or the server refused the connection.
    ConnectError(String),

    // === Status Events ===
    /// A status update for this laser was applied.
    Updated { laser: String },

    /// A status payload was dropped, with the reason.
    Dropped(String),
}
