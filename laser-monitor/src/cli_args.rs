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

use clap::Parser;
use laser_dashboard_client::constants::{RECONNECT_MAX_MS, RECONNECT_MIN_MS};
use laser_dashboard_client::{Backoff, NativeClientOptions, SubscriptionMode};
use laser_types::split_ids;
use url::Url;

/// Laser Monitor
///
/// Connects to the laser status server and prints every update.
///
/// With `--laser-id` the monitor follows one laser and prints its full
/// runtime log; without it, it prints the status of every laser.
#[derive(Parser, Debug, Clone)]
#[clap(name = "laser-monitor")]
pub struct Opt {
    /// Status server to connect to.
    #[clap(long = "server-url", env = "LASER_SERVER_URL", default_value = "http://localhost:1916")]
    pub server_url: Url,

    /// Follow a single laser, e.g. `ipgD`.
    #[clap(long = "laser-id", env = "LASER_ID")]
    pub laser_id: Option<String>,

    /// Known laser ids, comma separated. Updates for other ids are reported
    /// as missing. Accepts any id when omitted.
    #[clap(long = "lasers", env = "LASERS")]
    pub lasers: Option<String>,

    /// First reconnect delay in milliseconds.
    #[clap(long = "reconnect-min-ms", default_value_t = RECONNECT_MIN_MS)]
    pub reconnect_min_ms: u64,

    /// Upper bound for the reconnect delay in milliseconds.
    #[clap(long = "reconnect-max-ms", default_value_t = RECONNECT_MAX_MS)]
    pub reconnect_max_ms: u64,
}

impl Opt {
    pub fn mode(&self) -> SubscriptionMode {
        SubscriptionMode::from_laser_id(self.laser_id.clone())
    }

    pub fn client_options(&self) -> NativeClientOptions {
        let mut options = NativeClientOptions::new(self.server_url.as_str(), self.mode());
        options.devices = split_ids(self.lasers.as_deref());
        options.backoff = Backoff::new(self.reconnect_min_ms, self.reconnect_max_ms);
        options
    }
}
