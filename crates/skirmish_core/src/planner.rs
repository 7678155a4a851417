//! Scripted opponent.
//!
//! Runs once per tick for the opponent faction. In order it keeps the
//! worker count up, founds the next building tier, rolls for combat unit
//! production, and either launches an attack wave or sends idle troops on
//! patrol around its HQ.
//!
//! All orders go through the same entry points player commands use, so
//! the planner pays for everything and is bound by the same caps.

use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::components::{BuildingKind, EntityId, UnitKind, UnitState};
use crate::config::{BuildRule, PlannerConfig, SimConfig};
use crate::economy::found_building;
use crate::factions::Faction;
use crate::math::{Fixed, Vec2Fixed};
use crate::production::enqueue;
use crate::world::World;

/// Build-site directions around the HQ, at a radius of 100.
const COMPASS: [(i32, i32); 8] = [
    (100, 0),
    (71, 71),
    (0, 100),
    (-71, 71),
    (-100, 0),
    (-71, -71),
    (0, -100),
    (71, -71),
];

/// Planner decisions worth reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlannerEvent {
    /// A unit was queued.
    Queued {
        /// Producing building.
        building: EntityId,
        /// Unit type.
        unit: UnitKind,
    },
    /// A building was founded.
    Founded {
        /// The new site.
        building: EntityId,
        /// Its type.
        kind: BuildingKind,
    },
    /// An attack wave was sent at the enemy base.
    WaveLaunched {
        /// 1-based wave counter.
        wave: u32,
        /// Units ordered forward.
        units: usize,
        /// Attack-move destination.
        target: Vec2Fixed,
    },
}

/// Aggressiveness in per mille: 0 at the start of the match, 1000 once the
/// ramp window has elapsed.
#[must_use]
pub fn aggressiveness(tick: u64, config: &PlannerConfig) -> u32 {
    let ramp = u64::from(config.aggressiveness_ramp_ticks);
    if ramp == 0 {
        return 1000;
    }
    u32::try_from(tick.min(ramp) * 1000 / ramp).unwrap_or(1000)
}

/// Opponent planner state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OpponentPlanner {
    faction: Faction,
    wave_number: u32,
    threshold: u32,
    cooldown_remaining: u32,
    patrol_timer: u32,
}

impl OpponentPlanner {
    /// A planner for `faction` that has launched no waves yet.
    #[must_use]
    pub fn new(faction: Faction, config: &PlannerConfig) -> Self {
        Self {
            faction,
            wave_number: 0,
            threshold: config.wave_threshold,
            cooldown_remaining: 0,
            patrol_timer: 0,
        }
    }

    /// Faction the planner plays.
    #[must_use]
    pub const fn faction(&self) -> Faction {
        self.faction
    }

    /// Waves launched so far.
    #[must_use]
    pub const fn wave_number(&self) -> u32 {
        self.wave_number
    }

    /// Combat units needed for the next wave.
    #[must_use]
    pub const fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Ticks until a wave may launch.
    #[must_use]
    pub const fn cooldown_remaining(&self) -> u32 {
        self.cooldown_remaining
    }

    /// Run one planning step.
    pub fn step(
        &mut self,
        world: &mut World,
        config: &SimConfig,
        rng: &mut StdRng,
        tick: u64,
    ) -> Vec<PlannerEvent> {
        let mut events = Vec::new();
        if !config.planner.enabled {
            return events;
        }
        let aggression = aggressiveness(tick, &config.planner);

        self.produce_workers(world, config, &mut events);
        self.expand(world, config, rng, &mut events);
        self.produce_combat(world, config, rng, aggression, &mut events);

        self.cooldown_remaining = self.cooldown_remaining.saturating_sub(1);
        let combat = u32::try_from(world.combat_unit_count(self.faction)).unwrap_or(u32::MAX);
        if combat >= self.threshold {
            if self.cooldown_remaining == 0 {
                if let Some(event) = self.launch_wave(world, config, aggression) {
                    events.push(event);
                }
            }
        } else {
            self.patrol(world, config, rng);
        }
        events
    }

    fn worker_cap(&self, world: &World, config: &PlannerConfig) -> u32 {
        if world.find_building(BuildingKind::Barracks, self.faction).is_some() {
            config.worker_cap_with_barracks
        } else {
            config.worker_cap
        }
    }

    /// Workers alive plus workers already queued.
    fn worker_count(&self, world: &World) -> u32 {
        let queued: usize = world
            .buildings()
            .filter(|b| b.faction == self.faction)
            .filter_map(|b| b.production.as_ref())
            .map(|q| q.count_of(UnitKind::Worker))
            .sum();
        let alive = world.unit_count(self.faction, UnitKind::Worker);
        u32::try_from(alive + queued).unwrap_or(u32::MAX)
    }

    fn produce_workers(&self, world: &mut World, config: &SimConfig, events: &mut Vec<PlannerEvent>) {
        if self.worker_count(world) >= self.worker_cap(world, &config.planner) {
            return;
        }
        let hq = world
            .buildings()
            .filter(|b| b.faction == self.faction && b.kind == BuildingKind::Hq && b.is_complete())
            .find(|b| b.production.as_ref().is_some_and(|q| q.len() < config.planner.queue_depth))
            .map(|b| b.id);
        if let Some(hq) = hq {
            self.try_enqueue(world, config, hq, UnitKind::Worker, events);
        }
    }

    fn try_enqueue(
        &self,
        world: &mut World,
        config: &SimConfig,
        building: EntityId,
        unit: UnitKind,
        events: &mut Vec<PlannerEvent>,
    ) {
        match enqueue(world, config, self.faction, building, unit) {
            Ok(_) => events.push(PlannerEvent::Queued { building, unit }),
            Err(e) => tracing::trace!(building, ?unit, error = %e, "Planner could not queue"),
        }
    }

    fn rule_ready(&self, world: &World, config: &SimConfig, rule: &BuildRule, workers: u32) -> bool {
        let existing = u32::try_from(world.building_count(self.faction, rule.kind)).unwrap_or(u32::MAX);
        let needed = rule
            .base_workers
            .saturating_add(rule.workers_per_existing.saturating_mul(existing));
        workers >= needed
            && rule
                .requires
                .map_or(true, |req| world.find_building(req, self.faction).is_some())
            && world
                .pool(self.faction)
                .can_afford(config.buildings.get(rule.kind).cost)
    }

    /// First ready rule in tier order. A tier with no completed building
    /// holds back every tier after it.
    fn next_tier(&self, world: &World, config: &SimConfig, workers: u32) -> Option<BuildingKind> {
        for rule in &config.planner.build_rules {
            if self.rule_ready(world, config, rule, workers) {
                return Some(rule.kind);
            }
            if world.find_building(rule.kind, self.faction).is_none() {
                return None;
            }
        }
        None
    }

    /// A worker free to leave its current job, lowest id first.
    fn available_builder(&self, world: &World) -> Option<EntityId> {
        world
            .units()
            .filter(|u| u.faction == self.faction && u.kind == UnitKind::Worker && !u.health.is_dead())
            .find(|u| {
                !matches!(
                    u.state,
                    UnitState::Building { .. } | UnitState::Retreating { .. } | UnitState::Repairing { .. }
                )
            })
            .map(|u| u.id)
    }

    fn expand(
        &self,
        world: &mut World,
        config: &SimConfig,
        rng: &mut StdRng,
        events: &mut Vec<PlannerEvent>,
    ) {
        let under_construction = world
            .buildings()
            .filter(|b| b.faction == self.faction && !b.is_complete())
            .count();
        if under_construction >= config.planner.max_concurrent_construction {
            return;
        }
        let Some(hq) = world
            .find_building(BuildingKind::Hq, self.faction)
            .map(|b| b.position)
        else {
            return;
        };
        let workers = u32::try_from(world.unit_count(self.faction, UnitKind::Worker)).unwrap_or(u32::MAX);

        let Some(kind) = self.next_tier(world, config, workers) else {
            return;
        };
        let Some(worker) = self.available_builder(world) else {
            return;
        };

        let distance = i32::try_from(config.planner.build_site_distance).unwrap_or(i32::MAX);
        let (dx, dy) = COMPASS[rng.gen_range(0..COMPASS.len())];
        let offset = Vec2Fixed::from_ints(dx.saturating_mul(distance) / 100, dy.saturating_mul(distance) / 100);
        let site = (hq + offset).clamp_to(Fixed::from_num(config.world_size));

        match found_building(world, config, self.faction, worker, kind, site) {
            Ok(building) => {
                tracing::info!(building, ?kind, faction = %self.faction, "Opponent expanding");
                events.push(PlannerEvent::Founded { building, kind });
            }
            Err(e) => tracing::debug!(?kind, error = %e, "Opponent expansion rejected"),
        }
    }

    fn produce_combat(
        &self,
        world: &mut World,
        config: &SimConfig,
        rng: &mut StdRng,
        aggression: u32,
        events: &mut Vec<PlannerEvent>,
    ) {
        let planner = &config.planner;
        let spread = planner
            .production_chance_max_permille
            .saturating_sub(planner.production_chance_min_permille);
        let chance = planner.production_chance_min_permille + spread * aggression / 1000;

        let lines: Vec<(EntityId, UnitKind)> = world
            .buildings()
            .filter(|b| b.faction == self.faction && b.is_complete() && !b.kind.is_command())
            .filter(|b| b.production.as_ref().is_some_and(|q| q.len() < planner.queue_depth))
            .filter_map(|b| {
                config
                    .buildings
                    .get(b.kind)
                    .produces
                    .iter()
                    .copied()
                    .find(|u| u.is_combat())
                    .map(|u| (b.id, u))
            })
            .collect();

        for (building, unit) in lines {
            if rng.gen_range(0..1000) < chance {
                self.try_enqueue(world, config, building, unit, events);
            }
        }
    }

    /// Send every idle or attack-moving combat unit at the enemy base. A
    /// wave that would move no one is not counted.
    fn launch_wave(&mut self, world: &mut World, config: &SimConfig, aggression: u32) -> Option<PlannerEvent> {
        let enemy = self.faction.enemy();
        let target = world
            .find_building(BuildingKind::Hq, enemy)
            .or_else(|| world.buildings().find(|b| b.faction == enemy))
            .map(|b| b.position)?;

        let mut units = 0;
        for id in world.unit_ids() {
            let Some(unit) = world.unit_mut(id) else {
                continue;
            };
            if unit.faction != self.faction || !unit.kind.is_combat() {
                continue;
            }
            if matches!(unit.state, UnitState::Idle | UnitState::AttackMove { .. }) {
                unit.state = UnitState::AttackMove { destination: target };
                units += 1;
            }
        }
        if units == 0 {
            return None;
        }

        let planner = &config.planner;
        self.wave_number += 1;
        self.threshold = self.threshold.saturating_add(planner.wave_threshold_increment);
        let reduction = (100 - planner.min_cooldown_percent.min(100)) * aggression / 1000;
        self.cooldown_remaining = planner.wave_cooldown_ticks * (100 - reduction) / 100;
        self.patrol_timer = 0;

        tracing::info!(
            wave = self.wave_number,
            units,
            next_threshold = self.threshold,
            cooldown = self.cooldown_remaining,
            "Opponent launching attack wave"
        );
        Some(PlannerEvent::WaveLaunched {
            wave: self.wave_number,
            units,
            target,
        })
    }

    fn patrol(&mut self, world: &mut World, config: &SimConfig, rng: &mut StdRng) {
        let planner = &config.planner;
        self.patrol_timer += 1;
        if self.patrol_timer < planner.patrol_interval_ticks {
            return;
        }
        self.patrol_timer = 0;
        let Some(hq) = world
            .find_building(BuildingKind::Hq, self.faction)
            .map(|b| b.position)
        else {
            return;
        };

        let radius = i32::try_from(planner.patrol_radius).unwrap_or(i32::MAX);
        let limit = Fixed::from_num(config.world_size);
        for id in world.unit_ids() {
            let Some(unit) = world.unit_mut(id) else {
                continue;
            };
            if unit.faction != self.faction || !unit.kind.is_combat() || unit.state != UnitState::Idle {
                continue;
            }
            let mut offset = Vec2Fixed::from_ints(
                rng.gen_range(-radius..=radius),
                rng.gen_range(-radius..=radius),
            );
            if !offset.within(Vec2Fixed::ZERO, Fixed::from_num(radius)) {
                offset = offset.scale(Fixed::from_num(0.5));
            }
            unit.state = UnitState::AttackMove {
                destination: (hq + offset).clamp_to(limit),
            };
        }
    }
}
