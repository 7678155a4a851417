//! Worker behavior: the gather loop, construction, repair and retreat.
//!
//! ```text
//! Idle -> MovingToResource -> Gathering -> MovingToDepot -> (deposit)
//!   ^                                                          |
//!   +---------------- (node gone or empty) <-------------------+
//! ```
//!
//! A worker keeps its gather slot for the whole loop and gives it up the
//! moment it leaves the loop. Any target that disappears sends the worker
//! back to Idle, which immediately looks for new work.

use crate::components::{
    Building, BuildingKind, Cargo, EntityId, ResourceKind, ResourceNode, Unit, UnitState,
};
use crate::config::SimConfig;
use crate::economy::EconomyEvent;
use crate::factions::Faction;
use crate::math::Fixed;
use crate::units::{set_state, step_engagement, Motion, UnitEvents, MAX_TRANSITIONS};
use crate::world::World;

/// Whether `faction` may gather from `node` right now.
pub(crate) fn is_usable(world: &World, node: &ResourceNode, faction: Faction) -> bool {
    if node.is_depleted() {
        return false;
    }
    match node.kind {
        ResourceKind::Minerals => true,
        ResourceKind::Gas => node
            .refinery
            .and_then(|id| world.building(id))
            .is_some_and(|r| r.faction == faction && r.is_complete() && !r.health.is_dead()),
    }
}

/// Nearest usable node with a free slot within the gather radius.
fn find_node(world: &World, worker: &Unit, config: &SimConfig) -> Option<EntityId> {
    let radius = Fixed::from_num(config.worker.gather_radius);
    world
        .nodes()
        .filter(|n| n.has_free_slot() && is_usable(world, n, worker.faction))
        .filter(|n| n.position.within(worker.position, radius))
        .min_by_key(|n| (n.position.distance_squared(worker.position), n.id))
        .map(|n| n.id)
}

/// Node still valid for a worker holding a slot on it.
fn held_node<'w>(world: &'w World, worker: &Unit, node: EntityId) -> Option<&'w ResourceNode> {
    world
        .node(node)
        .filter(|n| n.is_assigned(worker.id) && is_usable(world, n, worker.faction))
}

fn nearest_depot(world: &World, worker: &Unit) -> Option<EntityId> {
    world
        .nearest_building(BuildingKind::Hq, worker.faction, worker.position)
        .map(|b| b.id)
}

fn is_depot(world: &World, faction: Faction, depot: EntityId) -> bool {
    world.building(depot).is_some_and(|b| {
        b.kind == BuildingKind::Hq && b.faction == faction && b.is_complete() && !b.health.is_dead()
    })
}

/// Cargo of another resource kind has to reach a depot before the worker
/// may mine `kind`.
fn carries_other(worker: &Unit, kind: ResourceKind) -> bool {
    worker.cargo.is_some_and(|c| c.kind != kind && c.amount > 0)
}

/// Where a worker goes to unload before it works `node`.
fn unload_first(world: &World, worker: &Unit, node: EntityId) -> UnitState {
    match nearest_depot(world, worker) {
        Some(depot) => UnitState::MovingToDepot {
            node: Some(node),
            depot,
        },
        None => UnitState::Idle,
    }
}

fn friendly_building<'w>(world: &'w World, worker: &Unit, id: EntityId) -> Option<&'w Building> {
    world
        .building(id)
        .filter(|b| b.faction == worker.faction && !b.health.is_dead())
}

/// Whether a worker at this health should fall back to base.
fn should_retreat(worker: &Unit, config: &SimConfig) -> bool {
    !matches!(worker.state, UnitState::Retreating { .. })
        && worker.health.percentage() < config.worker.retreat_threshold_percent
}

/// Step a worker by one tick.
pub(crate) fn step_worker(
    unit: &mut Unit,
    world: &mut World,
    config: &SimConfig,
    events: &mut UnitEvents,
) {
    if should_retreat(unit, config) {
        tracing::debug!(worker = unit.id, health = unit.health.current, "Worker retreating");
        set_state(unit, world, UnitState::Retreating { regen_timer: 0 });
    }

    let cfg = &config.worker;
    let step = config.units.worker.step();
    let arrival = Fixed::from_num(cfg.arrival_radius);
    let depot_radius = Fixed::from_num(cfg.depot_radius);
    let interaction = Fixed::from_num(cfg.interaction_radius);
    let mut motion = Motion::default();

    for _ in 0..MAX_TRANSITIONS {
        match unit.state {
            UnitState::Idle => {
                if unit.cargo_amount() > 0 {
                    if let Some(depot) = nearest_depot(world, unit) {
                        unit.state = UnitState::MovingToDepot { node: None, depot };
                        continue;
                    }
                    return;
                }
                let Some(node) = find_node(world, unit, config) else {
                    return;
                };
                if let Some(n) = world.node_mut(node) {
                    if n.assign(unit.id) {
                        unit.state = UnitState::MovingToResource { node };
                        continue;
                    }
                }
                return;
            }

            UnitState::MovingToResource { node } => {
                let Some((target, kind)) = held_node(world, unit, node).map(|n| (n.position, n.kind))
                else {
                    set_state(unit, world, UnitState::Idle);
                    continue;
                };
                if carries_other(unit, kind) {
                    let next = unload_first(world, unit, node);
                    set_state(unit, world, next);
                    if unit.state == UnitState::Idle {
                        return;
                    }
                    continue;
                }
                if motion.approach(unit, target, arrival, step) {
                    unit.state = UnitState::Gathering { node, elapsed: 0 };
                    continue;
                }
                return;
            }

            UnitState::Gathering { node, elapsed } => {
                let Some(kind) = held_node(world, unit, node).map(|n| n.kind) else {
                    set_state(unit, world, UnitState::Idle);
                    continue;
                };
                if carries_other(unit, kind) {
                    let next = unload_first(world, unit, node);
                    set_state(unit, world, next);
                    if unit.state == UnitState::Idle {
                        return;
                    }
                    continue;
                }
                let elapsed = elapsed + 1;
                if elapsed < cfg.mining_cycle_ticks {
                    unit.state = UnitState::Gathering { node, elapsed };
                    return;
                }
                gather(unit, world, config, node, events);
                match nearest_depot(world, unit) {
                    Some(depot) => {
                        unit.state = UnitState::MovingToDepot {
                            node: Some(node),
                            depot,
                        };
                    }
                    None => set_state(unit, world, UnitState::Idle),
                }
                return;
            }

            UnitState::MovingToDepot { node, depot } => {
                let depot = if is_depot(world, unit.faction, depot) {
                    depot
                } else if let Some(other) = nearest_depot(world, unit) {
                    unit.state = UnitState::MovingToDepot { node, depot: other };
                    other
                } else {
                    set_state(unit, world, UnitState::Idle);
                    return;
                };
                let Some(target) = world.building(depot).map(|b| b.position) else {
                    return;
                };
                if !motion.approach(unit, target, depot_radius, step) {
                    return;
                }
                if let Some(cargo) = unit.cargo.take() {
                    world.pool_mut(unit.faction).deposit(cargo);
                    events.economy.push(EconomyEvent::Deposited {
                        worker: unit.id,
                        depot,
                        faction: unit.faction,
                        kind: cargo.kind,
                        amount: cargo.amount,
                    });
                }
                let next = match node {
                    Some(node) if held_node(world, unit, node).is_some() => {
                        UnitState::MovingToResource { node }
                    }
                    _ => UnitState::Idle,
                };
                set_state(unit, world, next);
                return;
            }

            UnitState::Building { site } => {
                let target = friendly_building(world, unit, site)
                    .filter(|b| !b.is_complete() && b.builder == Some(unit.id))
                    .map(|b| b.position);
                match target {
                    Some(target) => {
                        motion.approach(unit, target, interaction, step);
                    }
                    None => unit.state = UnitState::Idle,
                }
                return;
            }

            UnitState::Repairing { target } => {
                let Some(building) = friendly_building(world, unit, target)
                    .filter(|b| !b.health.is_full())
                    .map(|b| b.position)
                else {
                    unit.state = UnitState::Idle;
                    return;
                };
                if motion.approach(unit, building, interaction, step) {
                    let done = world.building_mut(target).is_some_and(|b| {
                        b.health.heal(cfg.repair_per_tick);
                        b.health.is_full()
                    });
                    if done {
                        unit.state = UnitState::Idle;
                    }
                }
                return;
            }

            UnitState::Retreating { regen_timer } => {
                let mut regen_timer = regen_timer + 1;
                if regen_timer >= cfg.retreat_regen_interval_ticks {
                    regen_timer = 0;
                    unit.health.heal(cfg.retreat_regen_amount);
                }
                if unit.health.is_full() {
                    unit.state = UnitState::Idle;
                    return;
                }
                unit.state = UnitState::Retreating { regen_timer };
                if let Some(hq) = world
                    .nearest_building(BuildingKind::Hq, unit.faction, unit.position)
                    .map(|b| b.position)
                {
                    motion.approach(unit, hq, depot_radius, step);
                }
                return;
            }

            UnitState::Moving { .. } | UnitState::AttackMove { .. } | UnitState::Attacking { .. } => {
                step_engagement(unit, world, config, &mut motion, &mut events.combat);
                return;
            }
        }
    }
}

/// Finish a gather cycle: extract from the node into the worker's cargo.
fn gather(unit: &mut Unit, world: &mut World, config: &SimConfig, node: EntityId, events: &mut UnitEvents) {
    let Some(n) = world.node_mut(node) else {
        return;
    };
    let kind = n.kind;
    let amount = n.extract(config.worker.yield_for(kind));
    let depleted = n.is_depleted();

    let carried = match unit.cargo {
        Some(c) if c.kind == kind => c.amount,
        _ => 0,
    };
    unit.cargo = Some(Cargo {
        kind,
        amount: carried + amount,
    });
    events.economy.push(EconomyEvent::Gathered {
        worker: unit.id,
        node,
        amount,
    });
    if depleted {
        tracing::debug!(node, "Resource node depleted");
        events.economy.push(EconomyEvent::NodeDepleted { node });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::UnitKind;
    use crate::math::Vec2Fixed;
    use crate::units::step_units;

    fn pos(x: i32, y: i32) -> Vec2Fixed {
        Vec2Fixed::from_ints(x, y)
    }

    fn base(config: &SimConfig) -> (World, EntityId, EntityId, EntityId) {
        let mut world = World::new(0);
        let hq = world.add_completed_building(BuildingKind::Hq, Faction::Player, pos(100, 100), config);
        let node = world.add_node(ResourceKind::Minerals, pos(200, 100), config);
        let worker = world.add_unit(UnitKind::Worker, Faction::Player, pos(200, 100), config);
        (world, hq, node, worker)
    }

    fn tick(world: &mut World, config: &SimConfig, n: u32) {
        for _ in 0..n {
            step_units(world, config);
        }
    }

    #[test]
    fn test_one_gather_cycle_fills_cargo() {
        let config = SimConfig::default();
        let (mut world, hq, node, worker) = base(&config);

        tick(&mut world, &config, config.worker.mining_cycle_ticks);

        let unit = world.unit(worker).unwrap();
        assert_eq!(unit.cargo_amount(), config.worker.mineral_yield);
        assert_eq!(
            unit.state,
            UnitState::MovingToDepot {
                node: Some(node),
                depot: hq
            }
        );
        assert_eq!(unit.state.label(), "returning_to_depot");
    }

    #[test]
    fn test_full_loop_deposits_and_returns() {
        let config = SimConfig::default();
        let (mut world, _hq, node, worker) = base(&config);
        // cycle + walk 70 units to the depot radius at 5/tick + walk back
        tick(&mut world, &config, config.worker.mining_cycle_ticks + 20);
        assert_eq!(world.pool(Faction::Player).minerals, config.worker.mineral_yield);
        assert!(world.pool(Faction::Player).is_balanced());
        assert_eq!(world.unit(worker).unwrap().state.gather_node(), Some(node));
    }

    #[test]
    fn test_slot_cap_respected() {
        let config = SimConfig::default();
        let mut world = World::new(0);
        world.add_completed_building(BuildingKind::Hq, Faction::Player, pos(100, 100), &config);
        let node = world.add_node(ResourceKind::Minerals, pos(200, 100), &config);
        for i in 0..4 {
            world.add_unit(UnitKind::Worker, Faction::Player, pos(190, 100 + i), &config);
        }
        for _ in 0..200 {
            step_units(&mut world, &config);
            assert!(world.node(node).unwrap().gatherers.len() <= config.nodes.mineral_cap);
        }
    }

    #[test]
    fn test_gas_requires_own_refinery() {
        let config = SimConfig::default();
        let mut world = World::new(0);
        world.add_completed_building(BuildingKind::Hq, Faction::Player, pos(100, 100), &config);
        let geyser = world.add_node(ResourceKind::Gas, pos(150, 100), &config);
        let worker = world.add_unit(UnitKind::Worker, Faction::Player, pos(150, 100), &config);

        tick(&mut world, &config, 3);
        assert_eq!(world.unit(worker).unwrap().state, UnitState::Idle);

        let refinery =
            world.add_completed_building(BuildingKind::Refinery, Faction::Player, pos(150, 100), &config);
        world.node_mut(geyser).unwrap().refinery = Some(refinery);
        tick(&mut world, &config, 1);
        assert_eq!(world.unit(worker).unwrap().state.gather_node(), Some(geyser));
    }

    #[test]
    fn test_foreign_cargo_is_unloaded_before_mining() {
        let config = SimConfig::default();
        let (mut world, hq, node, worker) = base(&config);
        world.unit_mut(worker).unwrap().cargo = Some(Cargo {
            kind: ResourceKind::Gas,
            amount: 8,
        });
        world.node_mut(node).unwrap().assign(worker);
        world.unit_mut(worker).unwrap().state = UnitState::MovingToResource { node };

        tick(&mut world, &config, 1);
        let unit = world.unit(worker).unwrap();
        assert_eq!(
            unit.state,
            UnitState::MovingToDepot {
                node: Some(node),
                depot: hq
            }
        );
        assert_eq!(unit.cargo.map(|c| c.kind), Some(ResourceKind::Gas));
        assert!(world.node(node).unwrap().is_assigned(worker));

        tick(&mut world, &config, config.worker.mining_cycle_ticks + 60);
        let pool = world.pool(Faction::Player);
        assert_eq!(pool.gas, 8);
        assert!(pool.minerals > 0);
        assert!(pool.is_balanced());
    }

    #[test]
    fn test_foreign_cargo_kept_without_depot() {
        let config = SimConfig::default();
        let (mut world, hq, node, worker) = base(&config);
        world.damage(hq, 10_000);
        world.remove_dead();
        world.unit_mut(worker).unwrap().cargo = Some(Cargo {
            kind: ResourceKind::Gas,
            amount: 8,
        });
        world.node_mut(node).unwrap().assign(worker);
        world.unit_mut(worker).unwrap().state = UnitState::Gathering { node, elapsed: 0 };

        tick(&mut world, &config, config.worker.mining_cycle_ticks * 2);
        let unit = world.unit(worker).unwrap();
        assert_eq!(
            unit.cargo,
            Some(Cargo {
                kind: ResourceKind::Gas,
                amount: 8
            })
        );
        assert_eq!(unit.state, UnitState::Idle);
        assert!(world.node(node).unwrap().gatherers.is_empty());
    }

    #[test]
    fn test_node_destroyed_mid_transit_falls_back() {
        let config = SimConfig::default();
        let (mut world, _hq, node, worker) = base(&config);
        world.unit_mut(worker).unwrap().position = pos(110, 100);
        tick(&mut world, &config, 1);
        assert_eq!(
            world.unit(worker).unwrap().state,
            UnitState::MovingToResource { node }
        );

        let remaining = world.node(node).unwrap().remaining;
        world.node_mut(node).unwrap().extract(remaining);
        tick(&mut world, &config, 1);
        assert_eq!(world.unit(worker).unwrap().state, UnitState::Idle);
        assert!(world.node(node).unwrap().gatherers.is_empty());
    }

    #[test]
    fn test_depot_destroyed_redirects_to_other_hq() {
        let config = SimConfig::default();
        let (mut world, hq, node, worker) = base(&config);
        let backup = world.add_completed_building(BuildingKind::Hq, Faction::Player, pos(400, 100), &config);
        world.unit_mut(worker).unwrap().cargo = Some(Cargo {
            kind: ResourceKind::Minerals,
            amount: 8,
        });
        world.node_mut(node).unwrap().assign(worker);
        world.unit_mut(worker).unwrap().state = UnitState::MovingToDepot {
            node: Some(node),
            depot: hq,
        };
        world.damage(hq, 10_000);
        world.remove_dead();

        tick(&mut world, &config, 1);
        assert_eq!(
            world.unit(worker).unwrap().state,
            UnitState::MovingToDepot {
                node: Some(node),
                depot: backup
            }
        );
    }

    #[test]
    fn test_low_health_retreats_and_recovers() {
        let mut config = SimConfig::default();
        config.worker.retreat_regen_interval_ticks = 1;
        config.worker.retreat_regen_amount = 5;
        let (mut world, _hq, node, worker) = base(&config);
        tick(&mut world, &config, 2);
        assert!(world.node(node).unwrap().is_assigned(worker));

        world.damage(worker, 40);
        tick(&mut world, &config, 1);
        assert!(matches!(
            world.unit(worker).unwrap().state,
            UnitState::Retreating { .. }
        ));
        assert!(!world.node(node).unwrap().is_assigned(worker));

        tick(&mut world, &config, 10);
        let unit = world.unit(worker).unwrap();
        assert!(unit.health.is_full());
        assert_ne!(unit.state.label(), "retreating");
    }

    #[test]
    fn test_repair_restores_to_full() {
        let config = SimConfig::default();
        let (mut world, hq, _node, worker) = base(&config);
        world.damage(hq, 10);
        world.unit_mut(worker).unwrap().position = pos(100, 100);
        world.unit_mut(worker).unwrap().state = UnitState::Repairing { target: hq };
        tick(&mut world, &config, 5);
        assert!(world.building(hq).unwrap().health.is_full());
        assert_ne!(world.unit(worker).unwrap().state, UnitState::Repairing { target: hq });
    }

    #[test]
    fn test_builder_walks_to_site() {
        let config = SimConfig::default();
        let (mut world, _hq, _node, worker) = base(&config);
        let site = world.add_building(BuildingKind::Barracks, Faction::Player, pos(200, 300), &config);
        world.building_mut(site).unwrap().builder = Some(worker);
        world.unit_mut(worker).unwrap().state = UnitState::Building { site };
        tick(&mut world, &config, 60);
        let unit = world.unit(worker).unwrap();
        assert!(unit.position.within(pos(200, 300), Fixed::from_num(config.worker.interaction_radius)));
        assert_eq!(unit.state, UnitState::Building { site });
    }
}
