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

//! Glue between the listener, the state and a view.
//!
//! [`Dashboard::handle_event`] is the single message handler shared by the
//! browser and native clients. Every failure is logged and reported on the
//! event bus; none of them stops the dashboard.

use crate::constants::RECEIVED_AT_FORMAT;
use crate::event_bus::emit_client_event;
use crate::events::ClientEvent;
use crate::listener::{Subscription, SubscriptionMode};
use crate::state::{ApplyOutcome, DashboardState, IndicatorOutcome};
use log::{debug, error, info};
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("no element found with ID: {0}")]
    MissingElement(String),
    #[error("DOM operation failed: {0}")]
    Dom(String),
    #[error("failed to write output: {0}")]
    Output(String),
}

/// Anything that can show a [`DashboardState`].
pub trait DashboardView {
    /// Called after every applied update.
    fn render(&mut self, state: &DashboardState, outcome: &ApplyOutcome) -> Result<(), RenderError>;
}

/// Local time used in place of a missing start time.
pub fn received_at_now() -> String {
    chrono::Local::now().format(RECEIVED_AT_FORMAT).to_string()
}

#[derive(Debug)]
pub struct Dashboard {
    subscription: Subscription,
    state: DashboardState,
}

impl Dashboard {
    pub fn new(mode: SubscriptionMode, state: DashboardState) -> Self {
        Self {
            subscription: Subscription::new(mode),
            state,
        }
    }

    pub fn subscription(&self) -> &Subscription {
        &self.subscription
    }

    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    /// Handles one inbound event. Returns the outcome when the state changed:
    /// a single status for an unknown laser changes nothing and yields `None`.
    pub fn handle_event(
        &mut self,
        name: &str,
        payload: &Value,
        received_at: &str,
    ) -> Option<ApplyOutcome> {
        if !laser_types::is_status_event(name) {
            debug!("ignoring event {name}");
            return None;
        }
        debug!("Received {name}: {payload}");

        let update = match self.subscription.classify(payload) {
            Ok(Some(update)) => update,
            Ok(None) => {
                debug!(
                    "ignoring {name} not meant for {}",
                    self.subscription.mode()
                );
                return None;
            }
            Err(e) => {
                error!("Invalid runtime data: {e}");
                emit_client_event(ClientEvent::Dropped(e.to_string()));
                return None;
            }
        };

        let outcome = self.state.apply(&update, received_at);
        if let IndicatorOutcome::MissingTarget { laser } = &outcome.indicator {
            error!("No element found with ID: {laser}");
            if !outcome.replayed {
                return None;
            }
        }
        if outcome.replayed {
            info!(
                "Replayed runtime for {}: {} inserted, {} updated",
                outcome.laser, outcome.rows_inserted, outcome.rows_updated
            );
        }
        emit_client_event(ClientEvent::Updated {
            laser: outcome.laser.clone(),
        });
        Some(outcome)
    }

    /// Handles an event and hands the result to `view`.
    pub fn dispatch<V: DashboardView + ?Sized>(
        &mut self,
        name: &str,
        payload: &Value,
        received_at: &str,
        view: &mut V,
    ) -> Option<ApplyOutcome> {
        let outcome = self.handle_event(name, payload, received_at)?;
        if let Err(e) = view.render(&self.state, &outcome) {
            error!("Failed to render update for {}: {e}", outcome.laser);
        }
        Some(outcome)
    }
}
