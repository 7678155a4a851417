//! Match host: the tick loop behind the relay.

use serde::{Deserialize, Serialize};
use skirmish_core::simulation::{MatchOutcome, Simulation, TickEvents};
use skirmish_core::snapshot::WorldSnapshot;
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};

use crate::relay::{CommandRelay, PeerHandle};
use crate::ServerConfig;

/// How a hosted match ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSummary {
    /// Ticks played.
    pub ticks: u64,
    /// Outcome, or `None` if the tick limit ran out first.
    pub outcome: Option<MatchOutcome>,
    /// Final state hash.
    pub state_hash: u64,
}

/// Owns the simulation and feeds it from the relay.
#[derive(Debug)]
pub struct MatchHost {
    config: ServerConfig,
    sim: Simulation,
    relay: CommandRelay,
    snapshots: watch::Sender<WorldSnapshot>,
}

impl MatchHost {
    /// A host on the standard layout, its peer handles (player, opponent),
    /// and a receiver that sees every published snapshot.
    #[must_use]
    pub fn new(config: ServerConfig) -> (Self, [PeerHandle; 2], watch::Receiver<WorldSnapshot>) {
        let sim = Simulation::standard(config.sim.clone());
        Self::with_simulation(config, sim)
    }

    /// Host an already-built simulation.
    #[must_use]
    pub fn with_simulation(
        config: ServerConfig,
        sim: Simulation,
    ) -> (Self, [PeerHandle; 2], watch::Receiver<WorldSnapshot>) {
        let (relay, peers) = CommandRelay::new(config.command_buffer);
        let (snapshots, observer) = watch::channel(sim.snapshot());
        let host = Self {
            config,
            sim,
            relay,
            snapshots,
        };
        (host, peers, observer)
    }

    /// The simulation.
    #[must_use]
    pub const fn simulation(&self) -> &Simulation {
        &self.sim
    }

    /// Another receiver for published snapshots.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<WorldSnapshot> {
        self.snapshots.subscribe()
    }

    /// Drain peer commands, advance one tick, report rejections and
    /// publish a snapshot when one is due.
    pub fn step(&mut self) -> TickEvents {
        let drained = self.relay.drain_into(&mut self.sim);
        if drained.forwarded > 0 {
            tracing::trace!(tick = self.sim.get_tick(), commands = drained.forwarded, "Commands relayed");
        }

        let events = self.sim.tick();
        self.relay.report_rejections(&events.rejected);

        let due = events.tick % self.config.snapshot_interval.max(1) == 0;
        if due || events.outcome.is_some() {
            self.snapshots.send_replace(self.sim.snapshot());
        }
        events
    }

    fn finished(&self) -> bool {
        self.sim.is_over() || self.config.tick_limit.is_some_and(|limit| self.sim.get_tick() >= limit)
    }

    /// Step at the configured tick rate until the match is decided or the
    /// tick limit is reached.
    pub async fn run(mut self) -> MatchSummary {
        let mut ticker = interval(self.config.tick_duration());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::info!(
            tick_rate = self.config.tick_rate,
            seed = self.config.sim.seed,
            "Match host running"
        );

        while !self.finished() {
            ticker.tick().await;
            self.step();
        }

        self.snapshots.send_replace(self.sim.snapshot());
        let summary = MatchSummary {
            ticks: self.sim.get_tick(),
            outcome: self.sim.outcome(),
            state_hash: self.sim.state_hash(),
        };
        tracing::info!(ticks = summary.ticks, outcome = ?summary.outcome, "Match host stopped");
        summary
    }
}
