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
use laser_dashboard_client::{subscribe_client_events, ClientEvent, NativeDashboardClient};
use laser_monitor::cli_args::Opt;
use laser_monitor::terminal::TerminalView;
use tracing::level_filters::LevelFilter;
use tracing::{debug, info, warn};

/// Mirrors lifecycle events into the log until the bus closes.
async fn watch_events() {
    let mut events = subscribe_client_events();
    loop {
        let event = match events.recv().await {
            Ok(event) => event,
            Err(_) if events.is_closed() => break,
            Err(e) => {
                debug!("event bus: {e}");
                continue;
            }
        };
        match event {
            ClientEvent::Connected => info!("connected"),
            ClientEvent::ConnectionLost(reason) => warn!("connection lost: {reason}"),
            ClientEvent::ConnectError(reason) => warn!("connect error: {reason}"),
            ClientEvent::Updated { laser } => debug!("updated {laser}"),
            ClientEvent::Dropped(reason) => warn!("dropped message: {reason}"),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))?;

    let opt = Opt::parse();
    let mut client =
        NativeDashboardClient::new(opt.client_options(), TerminalView::new(std::io::stdout()))?;
    info!("Watching {} at {}", opt.mode(), client.url());

    tokio::spawn(watch_events());
    tokio::select! {
        result = client.run() => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down");
            Ok(())
        }
    }
}
