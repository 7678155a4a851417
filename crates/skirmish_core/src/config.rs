//! Match configuration: every tunable number the simulation reads.
//!
//! Loaded once before a match (usually from RON) and treated as read-only
//! afterwards. Durations are whole ticks at [`TICK_RATE`]; speeds are world
//! units per second and converted to per-tick fixed-point steps on use.
//!
//! ```
//! use skirmish_core::config::SimConfig;
//!
//! let config = SimConfig::from_ron_str("(seed: 7, max_ticks: Some(12000))").unwrap();
//! assert_eq!(config.seed, 7);
//! assert_eq!(config.production.max_queue_depth, 5);
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::components::{BuildingKind, ResourceKind, UnitKind};
use crate::error::{GameError, Result};
use crate::math::Fixed;
use crate::simulation::TICK_RATE;

/// Upper bound for the playfield side and every configured distance.
/// Points on the field and their offsets stay well inside `I32F32`.
pub const MAX_DISTANCE: u32 = 1 << 20;

/// Whole seconds expressed in ticks.
#[must_use]
pub const fn seconds(s: u32) -> u32 {
    s * TICK_RATE
}

/// Convert a per-second rate into a per-tick fixed-point step.
#[must_use]
pub fn per_tick(units_per_second: u32) -> Fixed {
    Fixed::from_num(units_per_second) / Fixed::from_num(TICK_RATE)
}

/// Price of a unit or building.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cost {
    /// Mineral cost.
    pub minerals: u32,
    /// Gas cost.
    #[serde(default)]
    pub gas: u32,
}

impl Cost {
    /// Mineral-only cost.
    #[must_use]
    pub const fn minerals(minerals: u32) -> Self {
        Self { minerals, gas: 0 }
    }
}

/// Weapon parameters shared by units and static defenses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeaponStats {
    /// Firing range in world units.
    pub range: u32,
    /// Ticks between shots.
    pub cooldown_ticks: u32,
    /// Damage per hit.
    pub damage: u32,
    /// Projectile speed in units per second; 0 hits instantly.
    pub projectile_speed: u32,
    /// Whether aircraft are valid targets.
    pub hits_air: bool,
}

impl WeaponStats {
    /// Range as a fixed-point distance.
    #[must_use]
    pub fn range_fixed(&self) -> Fixed {
        Fixed::from_num(self.range)
    }

    /// Per-tick projectile step, or `None` for instant hits.
    #[must_use]
    pub fn projectile_step(&self) -> Option<Fixed> {
        (self.projectile_speed > 0).then(|| per_tick(self.projectile_speed))
    }
}

/// Per unit-kind statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitStats {
    /// Enqueue cost.
    pub cost: Cost,
    /// Max health.
    pub max_health: u32,
    /// Movement speed in units per second.
    pub speed: u32,
    /// Ticks from start of production to spawn.
    pub production_ticks: u32,
    /// Weapon, if armed.
    pub weapon: Option<WeaponStats>,
    /// Radius for automatic target acquisition.
    pub acquisition_range: u32,
}

impl UnitStats {
    /// Per-tick movement step.
    #[must_use]
    pub fn step(&self) -> Fixed {
        per_tick(self.speed)
    }
}

/// Unit statistics keyed by kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitTable {
    /// Worker stats.
    pub worker: UnitStats,
    /// Infantry stats.
    pub infantry: UnitStats,
    /// Vehicle stats.
    pub vehicle: UnitStats,
    /// Aircraft stats.
    pub aircraft: UnitStats,
}

impl UnitTable {
    /// Stats for `kind`.
    #[must_use]
    pub const fn get(&self, kind: UnitKind) -> &UnitStats {
        match kind {
            UnitKind::Worker => &self.worker,
            UnitKind::Infantry => &self.infantry,
            UnitKind::Vehicle => &self.vehicle,
            UnitKind::Aircraft => &self.aircraft,
        }
    }
}

impl Default for UnitTable {
    fn default() -> Self {
        Self {
            worker: UnitStats {
                cost: Cost::minerals(50),
                max_health: 50,
                speed: 100,
                production_ticks: seconds(10),
                weapon: Some(WeaponStats {
                    range: 12,
                    cooldown_ticks: seconds(1),
                    damage: 5,
                    projectile_speed: 0,
                    hits_air: false,
                }),
                acquisition_range: 80,
            },
            infantry: UnitStats {
                cost: Cost::minerals(50),
                max_health: 50,
                speed: 60,
                production_ticks: seconds(10),
                weapon: Some(WeaponStats {
                    range: 30,
                    cooldown_ticks: 10,
                    damage: 15,
                    projectile_speed: 300,
                    hits_air: true,
                }),
                acquisition_range: 80,
            },
            vehicle: UnitStats {
                cost: Cost::minerals(100),
                max_health: 150,
                speed: 50,
                production_ticks: seconds(25),
                weapon: Some(WeaponStats {
                    range: 60,
                    cooldown_ticks: 30,
                    damage: 30,
                    projectile_speed: 300,
                    hits_air: false,
                }),
                acquisition_range: 80,
            },
            aircraft: UnitStats {
                cost: Cost::minerals(150),
                max_health: 100,
                speed: 80,
                production_ticks: seconds(30),
                weapon: Some(WeaponStats {
                    range: 40,
                    cooldown_ticks: 20,
                    damage: 15,
                    projectile_speed: 300,
                    hits_air: true,
                }),
                acquisition_range: 80,
            },
        }
    }
}

/// Per building-kind statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildingStats {
    /// Founding cost.
    pub cost: Cost,
    /// Max health.
    pub max_health: u32,
    /// Unit kinds this building can queue; empty means no production queue.
    #[serde(default)]
    pub produces: Vec<UnitKind>,
    /// Weapon, for static defenses.
    #[serde(default)]
    pub weapon: Option<WeaponStats>,
    /// Ticks between target scans when idle.
    #[serde(default)]
    pub scan_interval_ticks: u32,
}

/// Building statistics keyed by kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildingTable {
    /// HQ stats.
    pub hq: BuildingStats,
    /// Barracks stats.
    pub barracks: BuildingStats,
    /// Vehicle factory stats.
    pub vehicle_factory: BuildingStats,
    /// Air factory stats.
    pub air_factory: BuildingStats,
    /// Turret stats.
    pub turret: BuildingStats,
    /// Bunker stats.
    pub bunker: BuildingStats,
    /// Refinery stats.
    pub refinery: BuildingStats,
}

impl BuildingTable {
    /// Stats for `kind`.
    #[must_use]
    pub const fn get(&self, kind: BuildingKind) -> &BuildingStats {
        match kind {
            BuildingKind::Hq => &self.hq,
            BuildingKind::Barracks => &self.barracks,
            BuildingKind::VehicleFactory => &self.vehicle_factory,
            BuildingKind::AirFactory => &self.air_factory,
            BuildingKind::Turret => &self.turret,
            BuildingKind::Bunker => &self.bunker,
            BuildingKind::Refinery => &self.refinery,
        }
    }
}

impl Default for BuildingTable {
    fn default() -> Self {
        let plain = |minerals: u32, max_health: u32| BuildingStats {
            cost: Cost::minerals(minerals),
            max_health,
            produces: Vec::new(),
            weapon: None,
            scan_interval_ticks: 0,
        };
        Self {
            hq: BuildingStats {
                produces: vec![UnitKind::Worker],
                ..plain(400, 2500)
            },
            barracks: BuildingStats {
                produces: vec![UnitKind::Infantry],
                ..plain(150, 1000)
            },
            vehicle_factory: BuildingStats {
                produces: vec![UnitKind::Vehicle],
                ..plain(200, 1000)
            },
            air_factory: BuildingStats {
                produces: vec![UnitKind::Aircraft],
                ..plain(250, 1000)
            },
            turret: BuildingStats {
                weapon: Some(WeaponStats {
                    range: 100,
                    cooldown_ticks: 15,
                    damage: 20,
                    projectile_speed: 300,
                    hits_air: true,
                }),
                scan_interval_ticks: 10,
                ..plain(100, 600)
            },
            bunker: BuildingStats {
                weapon: Some(WeaponStats {
                    range: 70,
                    cooldown_ticks: 10,
                    damage: 12,
                    projectile_speed: 300,
                    hits_air: false,
                }),
                scan_interval_ticks: 10,
                ..plain(100, 1000)
            },
            refinery: plain(100, 500),
        }
    }
}

/// Worker behavior parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Idle workers look for nodes this close.
    pub gather_radius: u32,
    /// Distance at which a worker counts as at its node.
    pub arrival_radius: u32,
    /// Distance at which a worker can deposit at an HQ.
    pub depot_radius: u32,
    /// Distance at which a worker can build or repair.
    pub interaction_radius: u32,
    /// Ticks per gather cycle.
    pub mining_cycle_ticks: u32,
    /// Minerals per gather cycle.
    pub mineral_yield: u32,
    /// Gas per gather cycle.
    pub gas_yield: u32,
    /// Health percentage below which a worker retreats.
    pub retreat_threshold_percent: u32,
    /// Health restored per regeneration step while retreating.
    pub retreat_regen_amount: u32,
    /// Ticks between regeneration steps.
    pub retreat_regen_interval_ticks: u32,
    /// Health restored per tick while repairing.
    pub repair_per_tick: u32,
    /// Construction progress per tick with a builder in range.
    pub builder_rate: u32,
    /// Construction progress per tick with no builder assigned.
    pub passive_rate: u32,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            gather_radius: 300,
            arrival_radius: 5,
            depot_radius: 30,
            interaction_radius: 20,
            mining_cycle_ticks: seconds(4),
            mineral_yield: 8,
            gas_yield: 8,
            retreat_threshold_percent: 30,
            retreat_regen_amount: 1,
            retreat_regen_interval_ticks: 5,
            repair_per_tick: 2,
            builder_rate: 100,
            passive_rate: 25,
        }
    }
}

impl WorkerConfig {
    /// Yield for a resource kind.
    #[must_use]
    pub const fn yield_for(&self, kind: ResourceKind) -> u32 {
        match kind {
            ResourceKind::Minerals => self.mineral_yield,
            ResourceKind::Gas => self.gas_yield,
        }
    }
}

/// Resource node parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Concurrent gatherers on a mineral patch.
    pub mineral_cap: usize,
    /// Concurrent gatherers on a gas geyser.
    pub gas_cap: usize,
    /// Starting amount of a mineral patch.
    pub mineral_amount: u32,
    /// Starting amount of a gas geyser.
    pub gas_amount: u32,
    /// A refinery must be founded this close to a geyser.
    pub refinery_placement_radius: u32,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            mineral_cap: 2,
            gas_cap: 3,
            mineral_amount: 1500,
            gas_amount: 2000,
            refinery_placement_radius: 20,
        }
    }
}

impl NodeConfig {
    /// Gatherer cap for a resource kind.
    #[must_use]
    pub const fn cap_for(&self, kind: ResourceKind) -> usize {
        match kind {
            ResourceKind::Minerals => self.mineral_cap,
            ResourceKind::Gas => self.gas_cap,
        }
    }
}

/// Production queue parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductionConfig {
    /// Maximum pending orders per building.
    pub max_queue_depth: usize,
    /// Distance from the building centre at which units appear.
    pub spawn_distance: u32,
    /// Maximum random offset added to each spawn axis.
    pub spawn_jitter: u32,
}

impl Default for ProductionConfig {
    fn default() -> Self {
        Self {
            max_queue_depth: 5,
            spawn_distance: 40,
            spawn_jitter: 20,
        }
    }
}

/// Priority class per target category; lower is attacked first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetPriorities {
    /// Infantry class.
    pub infantry: u8,
    /// Vehicle class.
    pub vehicle: u8,
    /// Aircraft class.
    pub aircraft: u8,
    /// Worker class.
    pub worker: u8,
    /// Non-command buildings.
    pub structure: u8,
    /// Command buildings (HQ).
    pub command: u8,
}

impl Default for TargetPriorities {
    fn default() -> Self {
        Self {
            infantry: 1,
            vehicle: 1,
            aircraft: 1,
            worker: 2,
            structure: 3,
            command: 4,
        }
    }
}

impl TargetPriorities {
    /// Class for a unit kind.
    #[must_use]
    pub const fn for_unit(&self, kind: UnitKind) -> u8 {
        match kind {
            UnitKind::Worker => self.worker,
            UnitKind::Infantry => self.infantry,
            UnitKind::Vehicle => self.vehicle,
            UnitKind::Aircraft => self.aircraft,
        }
    }

    /// Class for a building kind.
    #[must_use]
    pub const fn for_building(&self, kind: BuildingKind) -> u8 {
        if kind.is_command() {
            self.command
        } else {
            self.structure
        }
    }
}

/// One step of the opponent's building tiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildRule {
    /// Building to found.
    pub kind: BuildingKind,
    /// Worker count needed for the first one.
    pub base_workers: u32,
    /// Extra workers needed per building of this kind already standing.
    pub workers_per_existing: u32,
    /// A completed building of this kind must exist first.
    pub requires: Option<BuildingKind>,
}

/// Opponent planner (difficulty) parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Whether the opponent planner runs at all.
    pub enabled: bool,
    /// Worker soft cap before a Barracks is complete.
    pub worker_cap: u32,
    /// Worker soft cap once a Barracks is complete.
    pub worker_cap_with_barracks: u32,
    /// Building tiers in priority order.
    pub build_rules: Vec<BuildRule>,
    /// Buildings the opponent may have under construction at once.
    pub max_concurrent_construction: usize,
    /// Distance from the HQ at which new buildings are founded.
    pub build_site_distance: u32,
    /// Ticks for aggressiveness to ramp from 0 to 1.
    pub aggressiveness_ramp_ticks: u32,
    /// Per-tick chance (per mille) to queue a combat unit at zero aggressiveness.
    pub production_chance_min_permille: u32,
    /// Per-tick chance (per mille) at full aggressiveness.
    pub production_chance_max_permille: u32,
    /// The planner keeps each queue at most this deep.
    pub queue_depth: usize,
    /// Combat units needed for the first wave.
    pub wave_threshold: u32,
    /// Threshold increase after each wave.
    pub wave_threshold_increment: u32,
    /// Ticks between waves at zero aggressiveness.
    pub wave_cooldown_ticks: u32,
    /// Cooldown percentage remaining at full aggressiveness.
    pub min_cooldown_percent: u32,
    /// Patrol waypoints are drawn within this radius of the HQ.
    pub patrol_radius: u32,
    /// Ticks between patrol orders.
    pub patrol_interval_ticks: u32,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            worker_cap: 9,
            worker_cap_with_barracks: 21,
            build_rules: vec![
                BuildRule {
                    kind: BuildingKind::Barracks,
                    base_workers: 9,
                    workers_per_existing: 6,
                    requires: None,
                },
                BuildRule {
                    kind: BuildingKind::VehicleFactory,
                    base_workers: 12,
                    workers_per_existing: 8,
                    requires: Some(BuildingKind::Barracks),
                },
                BuildRule {
                    kind: BuildingKind::AirFactory,
                    base_workers: 14,
                    workers_per_existing: 8,
                    requires: Some(BuildingKind::VehicleFactory),
                },
                BuildRule {
                    kind: BuildingKind::Turret,
                    base_workers: 10,
                    workers_per_existing: 4,
                    requires: Some(BuildingKind::AirFactory),
                },
            ],
            max_concurrent_construction: 1,
            build_site_distance: 100,
            aggressiveness_ramp_ticks: seconds(600),
            production_chance_min_permille: 5,
            production_chance_max_permille: 40,
            queue_depth: 2,
            wave_threshold: 12,
            wave_threshold_increment: 4,
            wave_cooldown_ticks: seconds(30),
            min_cooldown_percent: 50,
            patrol_radius: 150,
            patrol_interval_ticks: seconds(5),
        }
    }
}

impl PlannerConfig {
    /// A slower opponent: fewer workers, rarer production, bigger waves.
    #[must_use]
    pub fn easy() -> Self {
        Self {
            worker_cap_with_barracks: 14,
            production_chance_max_permille: 15,
            wave_threshold: 16,
            wave_cooldown_ticks: seconds(60),
            ..Self::default()
        }
    }

    /// A faster opponent: quicker ramp, frequent small waves.
    #[must_use]
    pub fn hard() -> Self {
        Self {
            aggressiveness_ramp_ticks: seconds(300),
            production_chance_min_permille: 15,
            production_chance_max_permille: 80,
            queue_depth: 3,
            wave_threshold: 8,
            wave_threshold_increment: 2,
            min_cooldown_percent: 30,
            ..Self::default()
        }
    }
}

/// Complete match configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Seed for every random draw in the match.
    pub seed: u64,
    /// Optional elapsed-time cap in ticks.
    pub max_ticks: Option<u64>,
    /// Side length of the square playfield.
    pub world_size: u32,
    /// Minerals each faction starts with.
    pub starting_minerals: u32,
    /// Projectiles hit once this close to their target.
    pub projectile_hit_radius: u32,
    /// Unit statistics.
    pub units: UnitTable,
    /// Building statistics.
    pub buildings: BuildingTable,
    /// Worker behavior.
    pub worker: WorkerConfig,
    /// Resource nodes.
    pub nodes: NodeConfig,
    /// Production queues.
    pub production: ProductionConfig,
    /// Targeting priority classes.
    pub priorities: TargetPriorities,
    /// Opponent difficulty.
    pub planner: PlannerConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            max_ticks: None,
            world_size: 2000,
            starting_minerals: 50,
            projectile_hit_radius: 10,
            units: UnitTable::default(),
            buildings: BuildingTable::default(),
            worker: WorkerConfig::default(),
            nodes: NodeConfig::default(),
            production: ProductionConfig::default(),
            priorities: TargetPriorities::default(),
            planner: PlannerConfig::default(),
        }
    }
}

impl SimConfig {
    /// Default configuration with a specific seed.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    /// Parse and validate a RON document.
    pub fn from_ron_str(text: &str) -> Result<Self> {
        let config: Self = ron::from_str(text).map_err(|e| GameError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| GameError::ConfigRead {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_ron_str(&text)
    }

    /// Render as pretty RON.
    pub fn to_ron_string(&self) -> Result<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| GameError::Serialization(e.to_string()))
    }

    fn distances(&self) -> Vec<(String, u32)> {
        let mut distances = vec![
            ("world_size".to_string(), self.world_size),
            ("projectile_hit_radius".to_string(), self.projectile_hit_radius),
            ("production.spawn_distance".to_string(), self.production.spawn_distance),
            ("worker.gather_radius".to_string(), self.worker.gather_radius),
            ("worker.arrival_radius".to_string(), self.worker.arrival_radius),
            ("worker.depot_radius".to_string(), self.worker.depot_radius),
            ("worker.interaction_radius".to_string(), self.worker.interaction_radius),
            (
                "nodes.refinery_placement_radius".to_string(),
                self.nodes.refinery_placement_radius,
            ),
            ("planner.build_site_distance".to_string(), self.planner.build_site_distance),
            ("planner.patrol_radius".to_string(), self.planner.patrol_radius),
        ];
        for kind in UnitKind::ALL {
            let stats = self.units.get(kind);
            distances.push((format!("{kind:?} acquisition_range"), stats.acquisition_range));
            if let Some(weapon) = stats.weapon {
                distances.push((format!("{kind:?} weapon range"), weapon.range));
            }
        }
        for kind in BuildingKind::ALL {
            if let Some(weapon) = self.buildings.get(kind).weapon {
                distances.push((format!("{kind:?} weapon range"), weapon.range));
            }
        }
        distances
    }

    /// Reject values the simulation cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.worker.mining_cycle_ticks == 0 {
            return Err(GameError::InvalidConfig(
                "worker.mining_cycle_ticks must be positive".into(),
            ));
        }
        if self.nodes.mineral_cap == 0 || self.nodes.gas_cap == 0 {
            return Err(GameError::InvalidConfig(
                "gatherer caps must be at least 1".into(),
            ));
        }
        if self.production.max_queue_depth == 0 {
            return Err(GameError::InvalidConfig(
                "production.max_queue_depth must be at least 1".into(),
            ));
        }
        if self.world_size == 0 {
            return Err(GameError::InvalidConfig("world_size must be positive".into()));
        }
        for (name, value) in self.distances() {
            if value > MAX_DISTANCE {
                return Err(GameError::InvalidConfig(format!(
                    "{name} must be at most {MAX_DISTANCE}, got {value}"
                )));
            }
        }
        for kind in UnitKind::ALL {
            if self.units.get(kind).production_ticks == 0 {
                return Err(GameError::InvalidConfig(format!(
                    "{kind:?} production_ticks must be positive"
                )));
            }
        }
        if self.planner.production_chance_min_permille > self.planner.production_chance_max_permille
        {
            return Err(GameError::InvalidConfig(
                "planner production chance min exceeds max".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(SimConfig::default().validate().is_ok());
    }

    #[test]
    fn test_per_tick_conversion() {
        assert_eq!(per_tick(100), Fixed::from_num(5));
        assert_eq!(per_tick(50), Fixed::from_num(2.5));
    }

    #[test]
    fn test_partial_ron_fills_defaults() {
        let config = SimConfig::from_ron_str("(seed: 42, worker: (mineral_yield: 10))").unwrap();
        assert_eq!(config.seed, 42);
        assert_eq!(config.worker.mineral_yield, 10);
        assert_eq!(config.worker.mining_cycle_ticks, seconds(4));
        assert_eq!(config.nodes.mineral_cap, 2);
    }

    #[test]
    fn test_ron_round_trip() {
        let config = SimConfig::with_seed(9);
        let text = config.to_ron_string().unwrap();
        assert_eq!(SimConfig::from_ron_str(&text).unwrap(), config);
    }

    #[test]
    fn test_invalid_queue_depth_rejected() {
        let err = SimConfig::from_ron_str("(production: (max_queue_depth: 0))").unwrap_err();
        assert!(matches!(err, GameError::InvalidConfig(_)));
    }

    #[test]
    fn test_oversized_distances_rejected() {
        let err = SimConfig::from_ron_str("(world_size: 4000000000)").unwrap_err();
        assert!(matches!(err, GameError::InvalidConfig(_)));

        let mut config = SimConfig::default();
        config.production.spawn_distance = MAX_DISTANCE + 1;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("spawn_distance"));

        config.production.spawn_distance = MAX_DISTANCE;
        config.world_size = MAX_DISTANCE;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_garbage_is_parse_error() {
        let err = SimConfig::from_ron_str("(seed: \"nope\")").unwrap_err();
        assert!(matches!(err, GameError::ConfigParse(_)));
    }

    #[test]
    fn test_priority_defaults() {
        let priorities = TargetPriorities::default();
        assert_eq!(priorities.for_unit(UnitKind::Infantry), 1);
        assert_eq!(priorities.for_unit(UnitKind::Worker), 2);
        assert_eq!(priorities.for_building(BuildingKind::Barracks), 3);
        assert_eq!(priorities.for_building(BuildingKind::Hq), 4);
    }

    #[test]
    fn test_presets_stay_valid() {
        for planner in [PlannerConfig::easy(), PlannerConfig::hard()] {
            let config = SimConfig {
                planner,
                ..SimConfig::default()
            };
            assert!(config.validate().is_ok());
        }
    }
}
