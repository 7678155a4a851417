//! Command relay between peers and the simulation.
//!
//! Each faction gets a bounded channel. Peers push commands whenever they
//! like; the host drains every channel once per tick, so commands land at
//! tick boundaries in arrival order. A channel whose senders are all
//! dropped marks its faction disconnected for the rest of the match.

use skirmish_core::commands::{Command, RejectedCommand};
use skirmish_core::factions::Faction;
use skirmish_core::simulation::Simulation;
use tokio::sync::mpsc::{self, error::TryRecvError};

use crate::{Result, ServerError};

/// A peer's end of the relay.
#[derive(Debug)]
pub struct PeerHandle {
    faction: Faction,
    commands: mpsc::Sender<Command>,
    rejections: mpsc::UnboundedReceiver<RejectedCommand>,
}

impl PeerHandle {
    /// The faction this peer plays.
    #[must_use]
    pub const fn faction(&self) -> Faction {
        self.faction
    }

    /// Send a command, waiting if the buffer is full.
    pub async fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| ServerError::HostClosed)
    }

    /// Send a command without waiting. Fails if the buffer is full or the
    /// host is gone.
    pub fn try_send(&self, command: Command) -> Result<()> {
        self.commands
            .try_send(command)
            .map_err(|_| ServerError::HostClosed)
    }

    /// Wait for the next rejected command. `None` once the host is gone.
    pub async fn next_rejection(&mut self) -> Option<RejectedCommand> {
        self.rejections.recv().await
    }

    /// Rejections already delivered, without waiting.
    pub fn pending_rejections(&mut self) -> Vec<RejectedCommand> {
        let mut rejected = Vec::new();
        while let Ok(r) = self.rejections.try_recv() {
            rejected.push(r);
        }
        rejected
    }
}

/// Per-faction channel ends held by the host.
#[derive(Debug)]
struct Inbox {
    commands: Option<mpsc::Receiver<Command>>,
    rejections: mpsc::UnboundedSender<RejectedCommand>,
}

/// What one drain moved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainStats {
    /// Commands forwarded into the simulation.
    pub forwarded: usize,
    /// Factions newly found disconnected.
    pub disconnected: usize,
}

/// The host's end of the relay.
#[derive(Debug)]
pub struct CommandRelay {
    inboxes: [Inbox; 2],
}

impl CommandRelay {
    /// A relay with one channel of `buffer` slots per faction, plus the
    /// peer handles, indexed by [`Faction::index`].
    #[must_use]
    pub fn new(buffer: usize) -> (Self, [PeerHandle; 2]) {
        let make = |faction: Faction| {
            let (command_tx, command_rx) = mpsc::channel(buffer.max(1));
            let (reject_tx, reject_rx) = mpsc::unbounded_channel();
            let inbox = Inbox {
                commands: Some(command_rx),
                rejections: reject_tx,
            };
            let peer = PeerHandle {
                faction,
                commands: command_tx,
                rejections: reject_rx,
            };
            (inbox, peer)
        };
        let (player_inbox, player) = make(Faction::Player);
        let (opponent_inbox, opponent) = make(Faction::Opponent);
        (
            Self {
                inboxes: [player_inbox, opponent_inbox],
            },
            [player, opponent],
        )
    }

    /// Whether `faction` still has a live channel.
    #[must_use]
    pub fn is_connected(&self, faction: Faction) -> bool {
        self.inboxes[faction.index()].commands.is_some()
    }

    /// Move every buffered command into `sim`'s command queue.
    pub fn drain_into(&mut self, sim: &mut Simulation) -> DrainStats {
        let mut stats = DrainStats::default();
        for faction in Faction::ALL {
            let inbox = &mut self.inboxes[faction.index()];
            let Some(rx) = inbox.commands.as_mut() else {
                continue;
            };
            loop {
                match rx.try_recv() {
                    Ok(command) => {
                        if sim.submit(faction, command) {
                            stats.forwarded += 1;
                        }
                    }
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        tracing::warn!(%faction, tick = sim.get_tick(), "Peer channel closed");
                        inbox.commands = None;
                        sim.disconnect(faction);
                        stats.disconnected += 1;
                        break;
                    }
                }
            }
        }
        stats
    }

    /// Route rejected commands back to their issuing peers.
    pub fn report_rejections(&self, rejected: &[RejectedCommand]) {
        for r in rejected {
            // A peer that stopped listening is not an error
            let _ = self.inboxes[r.faction.index()].rejections.send(r.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skirmish_core::config::SimConfig;

    fn quiet_sim() -> Simulation {
        let mut config = SimConfig::default();
        config.planner.enabled = false;
        Simulation::standard(config)
    }

    #[test]
    fn test_drain_forwards_in_order() {
        let (mut relay, [player, _opponent]) = CommandRelay::new(8);
        let mut sim = quiet_sim();
        player.try_send(Command::Stop { units: vec![1] }).unwrap();
        player.try_send(Command::Stop { units: vec![2] }).unwrap();

        let stats = relay.drain_into(&mut sim);
        assert_eq!(stats.forwarded, 2);
        assert_eq!(sim.commands().len(), 2);
    }

    #[test]
    fn test_dropped_handle_disconnects_faction() {
        let (mut relay, [player, opponent]) = CommandRelay::new(8);
        let mut sim = quiet_sim();
        opponent.try_send(Command::Stop { units: vec![] }).unwrap();
        drop(opponent);

        let stats = relay.drain_into(&mut sim);
        assert_eq!(stats.forwarded, 1, "buffered commands still arrive");
        assert_eq!(stats.disconnected, 1);
        assert!(!relay.is_connected(Faction::Opponent));
        assert!(relay.is_connected(Faction::Player));
        assert!(!sim.commands().is_connected(Faction::Opponent));

        player.try_send(Command::Stop { units: vec![] }).unwrap();
        assert_eq!(relay.drain_into(&mut sim).disconnected, 0);
    }

    #[test]
    fn test_full_buffer_refuses() {
        let (_relay, [player, _]) = CommandRelay::new(1);
        player.try_send(Command::Stop { units: vec![] }).unwrap();
        assert!(player.try_send(Command::Stop { units: vec![] }).is_err());
    }

    #[test]
    fn test_rejections_reach_their_peer() {
        let (mut relay, [mut player, mut opponent]) = CommandRelay::new(8);
        let mut sim = quiet_sim();
        player.try_send(Command::Stop { units: vec![9999] }).unwrap();
        relay.drain_into(&mut sim);
        let events = sim.tick();
        relay.report_rejections(&events.rejected);

        assert_eq!(player.pending_rejections().len(), 1);
        assert!(opponent.pending_rejections().is_empty());
    }
}
