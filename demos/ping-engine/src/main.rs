//! Connects to a running engine, pings it and prints what it reports.
//!
//! ```text
//! ping-engine [host] [port]
//! ```
//!
//! Host and port fall back to `SC2_HOST` / `SC2_PORT`, then to
//! `127.0.0.1:5000`. Log verbosity follows `RUST_LOG` (default `info`).

use std::time::Duration;

use sc2link::prelude::*;
use tracing_subscriber::EnvFilter;

fn target() -> Result<(String, u16), Box<dyn std::error::Error>> {
    let defaults = ChannelConfig::default();
    let mut args = std::env::args().skip(1);

    let host = args
        .next()
        .or_else(|| std::env::var("SC2_HOST").ok())
        .unwrap_or(defaults.host);
    let port = match args.next().or_else(|| std::env::var("SC2_PORT").ok()) {
        Some(p) => p.parse().map_err(|e| format!("invalid port {p:?}: {e}"))?,
        None => defaults.port,
    };
    Ok((host, port))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let (host, port) = target()?;
    tracing::info!(%host, port, "pinging engine");

    let client = S2Client::builder()
        .host(host)
        .port(port)
        .retry_attempts(5)
        .connect_timeout(Duration::from_secs(2))
        .build();

    let ping = client.ping().await?;
    println!("game version: {}", ping.game_version);
    println!("data version: {}", ping.data_version);
    println!("data build:   {}", ping.data_build);
    println!("base build:   {}", ping.base_build);

    // Only answered while a game is running.
    match client.game_info().await {
        Ok(info) => {
            println!("map:          {}", info.map_name);
            for player in &info.players_info {
                println!(
                    "player {}:     {:?} {:?}",
                    player.player_id, player.player_type, player.race_actual
                );
            }
        }
        Err(e) => tracing::warn!(error = %e, "no game info"),
    }

    client.shutdown().await;
    Ok(())
}
