//! Match-level integration tests: production, combat to the last
//! building, the opponent's waves, command handling and replay.

use skirmish_core::prelude::*;
use skirmish_core::combat::CombatEvent;
use skirmish_core::targeting::{acquire_target, rank_candidates, TargetQuery};
use skirmish_test_utils::determinism::{
    find_first_divergence, run_parallel_simulations, verify_simulation_determinism,
    verify_snapshot_encoding,
};
use skirmish_test_utils::fixtures::{fixed, pos, quiet_config, run_ticks, skirmish_simulation, two_bases};

// =============================================================================
// Production
// =============================================================================

#[test]
fn queued_worker_spawns_beside_the_hq() {
    let config = quiet_config();
    let bases = two_bases(&config, 200);
    let hq = bases.player_hq;
    let mut sim = Simulation::new(config, bases.world);

    for _ in 0..2 {
        sim.submit(Faction::Player, Command::Enqueue { building: hq, unit: UnitKind::Worker });
    }
    let first = sim.tick();
    assert_eq!(first.production.len(), 2);
    assert_eq!(sim.world().pool(Faction::Player).minerals, 100);

    let events = run_ticks(&mut sim, 210);
    let spawned: Vec<EntityId> = events.iter().flat_map(|e| e.spawned.clone()).collect();
    assert_eq!(spawned.len(), 1, "only the head order completes first");

    let worker = sim.world().unit(spawned[0]).expect("spawned worker exists");
    assert_eq!(worker.kind, UnitKind::Worker);
    assert_eq!(worker.faction, Faction::Player);
    assert!(worker.position.within(pos(100, 100), fixed(70)));

    sim.run(200);
    assert_eq!(sim.world().unit_count(Faction::Player, UnitKind::Worker), 2);
}

#[test]
fn sixth_order_is_refused_without_charge() {
    let config = quiet_config();
    let bases = two_bases(&config, 1000);
    let hq = bases.player_hq;
    let mut sim = Simulation::new(config, bases.world);

    for _ in 0..6 {
        sim.submit(Faction::Player, Command::Enqueue { building: hq, unit: UnitKind::Worker });
    }
    let events = sim.tick();
    assert_eq!(events.production.len(), 5);
    assert_eq!(events.rejected.len(), 1);
    assert!(matches!(events.rejected[0].error, CommandError::QueueFull { capacity: 5, .. }));
    assert_eq!(sim.world().pool(Faction::Player).minerals, 750);
}

#[test]
fn hq_cannot_train_infantry() {
    let config = quiet_config();
    let bases = two_bases(&config, 1000);
    let hq = bases.player_hq;
    let mut sim = Simulation::new(config, bases.world);
    sim.submit(Faction::Player, Command::Enqueue { building: hq, unit: UnitKind::Infantry });
    let events = sim.tick();
    assert!(matches!(
        events.rejected[0].error,
        CommandError::CannotProduce { building: BuildingKind::Hq, unit: UnitKind::Infantry }
    ));
    assert_eq!(sim.world().pool(Faction::Player).minerals, 1000);
}

// =============================================================================
// Combat and the win condition
// =============================================================================

fn siege_world(config: &SimConfig) -> (World, EntityId, Vec<EntityId>) {
    let mut world = World::new(0);
    world.add_completed_building(BuildingKind::Hq, Faction::Player, pos(100, 100), config);
    let target =
        world.add_completed_building(BuildingKind::Barracks, Faction::Opponent, pos(1000, 1000), config);
    let squad = (0..6)
        .map(|i| world.add_unit(UnitKind::Infantry, Faction::Player, pos(940, 970 + i * 10), config))
        .collect();
    (world, target, squad)
}

#[test]
fn destroying_last_building_wins() {
    let config = quiet_config();
    let (world, target, squad) = siege_world(&config);
    let mut sim = Simulation::new(config, world);
    sim.submit(Faction::Player, Command::Attack { units: squad, target });

    let outcome = sim.run(2000);
    assert_eq!(outcome, Some(MatchOutcome::Victory(Faction::Player)));
    assert!(sim.world().building(target).is_none());

    let tick = sim.get_tick();
    sim.run(100);
    assert_eq!(sim.get_tick(), tick, "a decided match stops advancing");
}

#[test]
fn attack_move_finds_the_building_on_its_own() {
    let config = quiet_config();
    let (world, target, squad) = siege_world(&config);
    let mut sim = Simulation::new(config, world);
    sim.submit(Faction::Player, Command::AttackMove { units: squad, to: pos(1000, 1000) });

    let events = run_ticks(&mut sim, 200);
    let hits = events
        .iter()
        .flat_map(|e| e.combat.iter())
        .filter(|e| matches!(e, CombatEvent::Damaged { target: t, .. } if *t == target))
        .count();
    assert!(hits > 0);
}

#[test]
fn even_squads_trade_damage() {
    let mut sim = skirmish_simulation(quiet_config(), UnitKind::Infantry, 5);
    let events = run_ticks(&mut sim, 200);
    let dealt: u64 = events.iter().map(TickEvents::damage_dealt).sum();
    assert!(dealt > 0, "squads within acquisition range should engage");
    assert!(events.iter().any(|e| !e.removed.units.is_empty()));
}

#[test]
fn remove_dead_is_idempotent() {
    let config = quiet_config();
    let mut bases = two_bases(&config, 0);
    let doomed = bases
        .world
        .add_unit(UnitKind::Infantry, Faction::Player, pos(500, 500), &config);
    bases.world.damage(doomed, 10_000);

    let first = bases.world.remove_dead();
    assert_eq!(first.units, vec![doomed]);
    assert!(bases.world.remove_dead().is_empty());
    assert!(bases.world.unit(doomed).is_none());
}

// =============================================================================
// Targeting
// =============================================================================

#[test]
fn combat_units_are_shot_before_workers_and_structures() {
    let config = quiet_config();
    let mut world = World::new(0);
    let bunker = world.add_completed_building(BuildingKind::Bunker, Faction::Opponent, pos(510, 500), &config);
    let worker = world.add_unit(UnitKind::Worker, Faction::Opponent, pos(505, 500), &config);
    let far_marine = world.add_unit(UnitKind::Infantry, Faction::Opponent, pos(560, 500), &config);
    let near_marine = world.add_unit(UnitKind::Infantry, Faction::Opponent, pos(540, 500), &config);
    let plane = world.add_unit(UnitKind::Aircraft, Faction::Opponent, pos(501, 500), &config);
    world.add_unit(UnitKind::Infantry, Faction::Player, pos(502, 500), &config);

    let mut query = TargetQuery {
        origin: pos(500, 500),
        faction: Faction::Player,
        range: fixed(100),
        hits_air: true,
    };
    let ranked: Vec<EntityId> = rank_candidates(&world, &query, &config.priorities)
        .iter()
        .map(|c| c.id)
        .collect();
    assert_eq!(ranked, vec![plane, near_marine, far_marine, worker, bunker]);

    query.hits_air = false;
    assert_eq!(acquire_target(&world, &query, &config.priorities), Some(near_marine));

    query.range = fixed(8);
    assert_eq!(acquire_target(&world, &query, &config.priorities), Some(worker));
}

// =============================================================================
// Opponent
// =============================================================================

#[test]
fn opponent_launches_wave_at_threshold() {
    let config = SimConfig::default();
    let mut bases = two_bases(&config, 0);
    bases
        .world
        .add_completed_building(BuildingKind::Barracks, Faction::Opponent, pos(1800, 1900), &config);
    let troops: Vec<EntityId> = (0..12)
        .map(|i| {
            bases
                .world
                .add_unit(UnitKind::Infantry, Faction::Opponent, pos(1700 + i * 10, 1800), &config)
        })
        .collect();
    let mut sim = Simulation::new(config, bases.world);

    let events = sim.tick();
    let waves: Vec<&PlannerEvent> = events.waves().collect();
    assert_eq!(
        waves,
        vec![&PlannerEvent::WaveLaunched { wave: 1, units: 12, target: pos(100, 100) }]
    );
    assert_eq!(sim.planner().threshold(), 16);
    assert!(sim.planner().cooldown_remaining() > 0);
    for id in troops {
        assert!(matches!(
            sim.world().unit(id).unwrap().state,
            UnitState::AttackMove { destination } if destination == pos(100, 100)
        ));
    }

    let later = run_ticks(&mut sim, 100);
    assert_eq!(later.iter().map(|e| e.waves().count()).sum::<usize>(), 0);
}

#[test]
fn opponent_builds_up_over_a_standard_match() {
    let mut sim = Simulation::standard(SimConfig::with_seed(8));
    let events = run_ticks(&mut sim, 4000);
    let queued = events
        .iter()
        .flat_map(|e| e.planner.iter())
        .filter(|e| matches!(e, PlannerEvent::Queued { .. }))
        .count();
    assert!(queued > 0, "opponent should train workers");
    assert!(sim.world().unit_count(Faction::Opponent, UnitKind::Worker) > 4);
}

// =============================================================================
// Commands
// =============================================================================

#[test]
fn cannot_order_enemy_units() {
    let mut sim = skirmish_simulation(quiet_config(), UnitKind::Infantry, 1);
    let enemy = sim
        .world()
        .units()
        .find(|u| u.faction == Faction::Opponent)
        .map(|u| u.id)
        .unwrap();
    sim.submit(Faction::Player, Command::Stop { units: vec![enemy] });
    let events = sim.tick();
    assert_eq!(events.rejected[0].error, CommandError::NotOwned(enemy));
}

#[test]
fn disconnected_side_is_ignored() {
    let mut sim = Simulation::standard(quiet_config());
    sim.disconnect(Faction::Player);
    assert!(!sim.submit(Faction::Player, Command::Stop { units: vec![] }));
    assert!(sim.commands().is_empty());
    assert!(sim.submit(Faction::Opponent, Command::Stop { units: vec![] }));
}

// =============================================================================
// Determinism
// =============================================================================

#[test]
fn standard_match_is_reproducible() {
    assert!(verify_simulation_determinism(
        || Simulation::standard(SimConfig::with_seed(1234)),
        2000
    ));
}

#[test]
fn battles_never_diverge() {
    assert_eq!(
        find_first_divergence(|| skirmish_simulation(quiet_config(), UnitKind::Vehicle, 4), 400),
        None
    );
}

#[test]
fn parallel_runs_agree() {
    run_parallel_simulations(|| Simulation::standard(SimConfig::with_seed(77)), 4, 1500)
        .assert_agree();
}

#[test]
fn snapshots_survive_both_encodings() {
    assert!(verify_snapshot_encoding(
        || skirmish_simulation(quiet_config(), UnitKind::Infantry, 3),
        60
    ));
}
