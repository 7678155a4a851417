//! End-to-end tests for the headless runner.

use skirmish_core::config::SimConfig;
use skirmish_core::factions::Faction;
use skirmish_core::simulation::Simulation;
use skirmish_headless::{run_batch, run_match, BatchConfig, MatchReport, RunConfig};
use skirmish_test_utils::determinism::verify_simulation_determinism;

#[test]
fn batch_reports_match_single_runs() {
    let results = run_batch(BatchConfig::new(3, 40).with_tick_limit(800));
    for report in &results.reports {
        let mut single = RunConfig::with_seed(report.seed);
        single.tick_limit = 800;
        assert_eq!(&run_match(&single).unwrap(), report);
    }
}

#[test]
fn report_hash_matches_a_plain_simulation() {
    let mut config = RunConfig::with_seed(11);
    config.tick_limit = 600;
    let report = run_match(&config).unwrap();

    let mut sim = Simulation::standard(SimConfig::with_seed(11));
    sim.run(600);
    assert_eq!(report.final_state_hash, sim.state_hash());
    assert!(verify_simulation_determinism(
        || Simulation::standard(SimConfig::with_seed(11)),
        600
    ));
}

#[test]
fn passive_player_still_mines() {
    let mut config = RunConfig::with_seed(2);
    config.tick_limit = 1200;
    let report = run_match(&config).unwrap();

    let player = report.faction(Faction::Player).unwrap();
    assert!(player.deposited_minerals > 0);
    assert_eq!(player.minerals, 50 + player.deposited_minerals);
    assert_eq!(player.units_produced, 0);

    let opponent = report.faction(Faction::Opponent).unwrap();
    assert!(opponent.units_produced > 0, "opponent trains workers from the start");
    assert!(opponent.spent_minerals > 0);
}

#[test]
fn report_serializes_to_json() {
    let mut config = RunConfig::with_seed(6);
    config.tick_limit = 100;
    let report = run_match(&config).unwrap();

    let json = serde_json::to_string(&report).unwrap();
    let back: MatchReport = serde_json::from_str(&json).unwrap();
    assert_eq!(back, report);
    assert!(json.contains("\"faction\":\"player\""));
}
