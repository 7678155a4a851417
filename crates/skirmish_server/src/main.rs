//! Skirmish match host.
//!
//! Usage: `skirmish_server [server.ron]`

use skirmish_core::factions::Faction;
use skirmish_server::{MatchHost, ServerConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => match ServerConfig::load(&path) {
            Ok(config) => config,
            Err(e) => {
                tracing::error!(error = %e, path = %path, "Failed to load server config");
                std::process::exit(1);
            }
        },
        None => ServerConfig::default(),
    };

    tracing::info!(
        tick_rate = config.tick_rate,
        snapshot_interval = config.snapshot_interval,
        "Starting skirmish match host"
    );

    // Peers stay connected but idle until a transport is attached.
    let (host, _peers, mut snapshots) = MatchHost::new(config);

    let observer = tokio::spawn(async move {
        while snapshots.changed().await.is_ok() {
            let snapshot = snapshots.borrow_and_update().clone();
            let minerals = |faction| snapshot.pool(faction).map_or(0, |p| p.minerals);
            tracing::debug!(
                tick = snapshot.tick,
                entities = snapshot.entities.len(),
                player_minerals = minerals(Faction::Player),
                opponent_minerals = minerals(Faction::Opponent),
                "Snapshot"
            );
        }
    });

    let summary = host.run().await;
    observer.abort();
    tracing::info!(
        ticks = summary.ticks,
        outcome = ?summary.outcome,
        hash = summary.state_hash,
        "Match over"
    );
}
