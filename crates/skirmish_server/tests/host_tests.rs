//! Match host tests with peers on separate tasks.

use skirmish_core::commands::Command;
use skirmish_core::error::CommandError;
use skirmish_core::scenario::standard_match;
use skirmish_core::simulation::Simulation;
use skirmish_server::{MatchHost, ServerConfig};
use skirmish_test_utils::fixtures::{pos, quiet_config};

fn fast_config(tick_limit: u64) -> ServerConfig {
    ServerConfig {
        tick_rate: 1000,
        snapshot_interval: 4,
        tick_limit: Some(tick_limit),
        sim: quiet_config(),
        ..ServerConfig::default()
    }
}

#[tokio::test]
async fn peer_commands_reach_the_simulation() {
    let config = fast_config(20);
    let worker = standard_match(&config.sim).workers[0][0];
    let (host, [player, _opponent], observer) = MatchHost::new(config);

    player
        .send(Command::Move {
            units: vec![worker],
            to: pos(1000, 1000),
        })
        .await
        .unwrap();

    let summary = host.run().await;
    assert_eq!(summary.ticks, 20);

    let snapshot = observer.borrow().clone();
    let entity = snapshot.entity(worker).expect("worker in snapshot");
    assert_eq!(entity.state.as_deref(), Some("moving"));
}

#[tokio::test]
async fn disconnected_peer_does_not_stop_the_match() {
    let config = fast_config(12);
    let (host, [player, opponent], _observer) = MatchHost::new(config);
    drop(opponent);

    let sender = tokio::spawn(async move {
        player.send(Command::Stop { units: vec![] }).await.is_ok()
    });
    let summary = host.run().await;
    assert_eq!(summary.ticks, 12);
    assert!(sender.await.unwrap());
}

#[tokio::test]
async fn rejected_commands_come_back_to_the_sender() {
    let (host, [mut player, _opponent], _observer) = MatchHost::new(fast_config(5));
    player
        .send(Command::Stop { units: vec![555_555] })
        .await
        .unwrap();

    host.run().await;
    let rejected = player.next_rejection().await.expect("one rejection");
    assert_eq!(rejected.error, CommandError::UnknownEntity(555_555));
    assert!(player.next_rejection().await.is_none(), "host is gone");
}

#[tokio::test]
async fn hosted_match_hashes_like_a_local_one() {
    let config = fast_config(40);
    let sim_config = config.sim.clone();
    let (host, _peers, _observer) = MatchHost::new(config);
    let summary = host.run().await;

    let mut local = Simulation::standard(sim_config);
    local.run(40);
    assert_eq!(summary.state_hash, local.state_hash());
}

#[tokio::test]
async fn send_after_shutdown_fails() {
    let (host, [player, _opponent], _observer) = MatchHost::new(fast_config(1));
    host.run().await;
    assert!(player.send(Command::Stop { units: vec![] }).await.is_err());
}
