//! Drink Tally Relay
//!
//! Runs the room relay. One canonical game state per room; any client
//! that knows the room code may join and propose actions.

use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use drink_tally::{RelayConfig, RelayServer, VERSION};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut config = RelayConfig::default();

    if let Ok(addr) = std::env::var("DRINK_TALLY_ADDR") {
        config.bind_addr = addr
            .parse()
            .with_context(|| format!("invalid DRINK_TALLY_ADDR: {addr}"))?;
    }
    if let Ok(secs) = std::env::var("DRINK_TALLY_ROOM_TTL_SECS") {
        let secs: u64 = secs
            .parse()
            .with_context(|| format!("invalid DRINK_TALLY_ROOM_TTL_SECS: {secs}"))?;
        // 0 disables eviction entirely.
        config.room_idle_timeout = (secs > 0).then(|| Duration::from_secs(secs));
    }

    tracing::info!("drink-tally-server v{}", VERSION);

    let server = RelayServer::new(config);
    server.run().await?;
    Ok(())
}
