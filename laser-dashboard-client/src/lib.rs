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

//! Laser status dashboard client.
//!
//! Subscribes to a Socket.IO channel, classifies each `runtime_message` or
//! `runtime_update` payload and folds it into a [`DashboardState`]. Views
//! render from that state: the DOM view in the browser (`wasm` feature) and
//! any [`DashboardView`] on native targets (`native` feature).
//!
//! # Outline of usage
//!
//! ## Browser
//!
//! Either define `window.__LASER_CONFIG` before loading the module, or call
//! the exported function yourself:
//!
//! ```js
//! import init, { connect_socket } from "./laser_dashboard_client.js";
//! await init();
//! connect_socket("http://10.0.4.11:1916", "ipgD"); // one laser
//! connect_socket("http://10.0.4.11:1916", null);   // every laser
//! ```
//!
//! ## Native
//!
//! ```ignore
//! # use laser_dashboard_client::*;
//! # struct MyView;
//! # impl DashboardView for MyView {
//! #     fn render(&mut self, _: &DashboardState, _: &ApplyOutcome) -> Result<(), RenderError> { Ok(()) }
//! # }
//! # async fn run() -> anyhow::Result<()> {
//! let options = NativeClientOptions::new("http://10.0.4.11:1916", SubscriptionMode::Dashboard);
//! NativeDashboardClient::new(options, MyView)?.run().await
//! # }
//! ```
//!
//! ## Lifecycle events
//!
//! ```no_run
//! let mut events = laser_dashboard_client::subscribe_client_events();
//! // events.recv().await yields ClientEvent::Connected, ClientEvent::Updated { .. }, ...
//! ```

pub mod constants;
mod dashboard;
mod event_bus;
mod events;
mod listener;
mod reconnect;
mod session;
pub mod state;

#[cfg(feature = "wasm")]
mod config;
#[cfg(feature = "wasm")]
mod dom;
#[cfg(feature = "wasm")]
mod web_client;

#[cfg(feature = "native")]
mod native_client;

pub use dashboard::{received_at_now, Dashboard, DashboardView, RenderError};
pub use event_bus::{emit_client_event, subscribe_client_events};
pub use events::ClientEvent;
pub use listener::{ChannelUpdate, ListenerError, RuntimeReplay, Subscription, SubscriptionMode};
pub use reconnect::Backoff;
pub use session::{SessionAction, SessionState, SocketSession};
pub use state::{ApplyOutcome, DashboardState, IndicatorOutcome};

#[cfg(feature = "wasm")]
pub use config::{app_config, RuntimeConfig};
#[cfg(feature = "wasm")]
pub use dom::DomView;
#[cfg(feature = "wasm")]
pub use web_client::{connect_socket, disconnect_socket, DashboardClient};

#[cfg(feature = "native")]
pub use native_client::{NativeClientOptions, NativeDashboardClient};
