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

//! Global event bus for client events.
//!
//! A broadcast channel: every subscriber sees every event emitted after it
//! subscribed. Emitting never blocks; with no active subscriber the event is
//! discarded, and a full channel drops its oldest event.
//!
//! ```ignore
//! let mut rx = subscribe_client_events();
//! while let Ok(event) = rx.recv().await {
//!     if let ClientEvent::Updated { laser } = event {
//!         // refresh the view of `laser`
//!     }
//! }
//! ```

use crate::events::ClientEvent;
use async_broadcast::{broadcast, InactiveReceiver, Receiver, Sender};
use once_cell::sync::Lazy;

/// Capacity of the event bus channel
const EVENT_BUS_CAPACITY: usize = 256;

struct EventBus {
    sender: Sender<ClientEvent>,
    // Keeps the channel open while nobody is subscribed.
    _keepalive: InactiveReceiver<ClientEvent>,
}

static BUS: Lazy<EventBus> = Lazy::new(|| {
    let (mut sender, receiver) = broadcast(EVENT_BUS_CAPACITY);
    sender.set_overflow(true);
    EventBus {
        sender,
        _keepalive: receiver.deactivate(),
    }
});

/// Subscribe to client events.
pub fn subscribe_client_events() -> Receiver<ClientEvent> {
    BUS.sender.new_receiver()
}

/// Emit a client event to all subscribers.
pub fn emit_client_event(event: ClientEvent) {
    let _ = BUS.sender.try_broadcast(event);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emit_without_subscribers_is_harmless() {
        emit_client_event(ClientEvent::Connected);
    }

    #[test]
    fn subscribers_receive_later_events() {
        let mut rx = subscribe_client_events();
        emit_client_event(ClientEvent::Updated {
            laser: "bus-test-laser".into(),
        });

        let mut found = false;
        while let Ok(event) = rx.try_recv() {
            if event
                == (ClientEvent::Updated {
                    laser: "bus-test-laser".into(),
                })
            {
                found = true;
            }
        }
        assert!(found, "subscriber should see the emitted event");
    }
}
