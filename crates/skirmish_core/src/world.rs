//! Authoritative registry of every entity and both resource pools.
//!
//! The world is pure data plus lookups. All registries are ordered maps
//! keyed by [`EntityId`], so every scan visits entities in ascending id
//! order regardless of insertion history. Queries are linear scans; the
//! match scale is a few dozen entities per side.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::components::{
    Building, BuildingKind, EntityId, Health, Projectile, ResourceKind, ResourceNode, Unit,
    UnitKind, WeaponMount, CONSTRUCTION_COMPLETE,
};
use crate::config::SimConfig;
use crate::economy::ResourcePool;
use crate::factions::Faction;
use crate::math::{Fixed, Vec2Fixed};
use crate::production::ProductionQueue;

/// Borrowed view of any entity a spatial query can return.
#[derive(Debug, Clone, Copy)]
pub enum EntityRef<'a> {
    /// A unit.
    Unit(&'a Unit),
    /// A building.
    Building(&'a Building),
    /// A resource node.
    Node(&'a ResourceNode),
}

impl EntityRef<'_> {
    /// Entity id.
    #[must_use]
    pub fn id(&self) -> EntityId {
        match self {
            Self::Unit(u) => u.id,
            Self::Building(b) => b.id,
            Self::Node(n) => n.id,
        }
    }

    /// World position.
    #[must_use]
    pub fn position(&self) -> Vec2Fixed {
        match self {
            Self::Unit(u) => u.position,
            Self::Building(b) => b.position,
            Self::Node(n) => n.position,
        }
    }

    /// Owning faction; resource nodes are neutral.
    #[must_use]
    pub fn faction(&self) -> Option<Faction> {
        match self {
            Self::Unit(u) => Some(u.faction),
            Self::Building(b) => Some(b.faction),
            Self::Node(_) => None,
        }
    }

    /// Health, for damageable entities.
    #[must_use]
    pub fn health(&self) -> Option<Health> {
        match self {
            Self::Unit(u) => Some(u.health),
            Self::Building(b) => Some(b.health),
            Self::Node(_) => None,
        }
    }
}

/// Entities removed by a [`World::remove_dead`] pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Removed {
    /// Units purged, in id order.
    pub units: Vec<EntityId>,
    /// Buildings purged, in id order.
    pub buildings: Vec<EntityId>,
    /// Depleted nodes purged, in id order.
    pub nodes: Vec<EntityId>,
}

impl Removed {
    /// Nothing was removed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty() && self.buildings.is_empty() && self.nodes.is_empty()
    }
}

/// The single owned value holding the whole match state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct World {
    next_id: EntityId,
    units: BTreeMap<EntityId, Unit>,
    buildings: BTreeMap<EntityId, Building>,
    nodes: BTreeMap<EntityId, ResourceNode>,
    projectiles: BTreeMap<EntityId, Projectile>,
    pools: [ResourcePool; 2],
}

impl Default for World {
    fn default() -> Self {
        Self::new(0)
    }
}

impl World {
    /// Empty world; both factions start with `starting_minerals`.
    #[must_use]
    pub fn new(starting_minerals: u32) -> Self {
        Self {
            next_id: 1,
            units: BTreeMap::new(),
            buildings: BTreeMap::new(),
            nodes: BTreeMap::new(),
            projectiles: BTreeMap::new(),
            pools: [
                ResourcePool::new(starting_minerals),
                ResourcePool::new(starting_minerals),
            ],
        }
    }

    fn allocate_id(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    // ------------------------------------------------------------------
    // Insertion
    // ------------------------------------------------------------------

    /// Add an unfinished building with stats from `config`.
    pub fn add_building(
        &mut self,
        kind: BuildingKind,
        faction: Faction,
        position: Vec2Fixed,
        config: &SimConfig,
    ) -> EntityId {
        let id = self.allocate_id();
        let stats = config.buildings.get(kind);
        let production = (!stats.produces.is_empty())
            .then(|| ProductionQueue::new(config.production.max_queue_depth));
        let weapon = stats.weapon.map(|_| WeaponMount::default());
        self.buildings.insert(
            id,
            Building {
                id,
                kind,
                faction,
                position,
                health: Health::new(stats.max_health),
                progress: 0,
                builder: None,
                production,
                weapon,
                geyser: None,
            },
        );
        id
    }

    /// Add a building that is already complete (match setup).
    pub fn add_completed_building(
        &mut self,
        kind: BuildingKind,
        faction: Faction,
        position: Vec2Fixed,
        config: &SimConfig,
    ) -> EntityId {
        let id = self.add_building(kind, faction, position, config);
        if let Some(building) = self.buildings.get_mut(&id) {
            building.progress = CONSTRUCTION_COMPLETE;
        }
        id
    }

    /// Add an idle unit with stats from `config`.
    pub fn add_unit(
        &mut self,
        kind: UnitKind,
        faction: Faction,
        position: Vec2Fixed,
        config: &SimConfig,
    ) -> EntityId {
        let id = self.allocate_id();
        let max_health = config.units.get(kind).max_health;
        self.units
            .insert(id, Unit::new(id, kind, faction, position, max_health));
        id
    }

    /// Add a full resource node.
    pub fn add_node(&mut self, kind: ResourceKind, position: Vec2Fixed, config: &SimConfig) -> EntityId {
        let amount = match kind {
            ResourceKind::Minerals => config.nodes.mineral_amount,
            ResourceKind::Gas => config.nodes.gas_amount,
        };
        let id = self.allocate_id();
        self.nodes.insert(
            id,
            ResourceNode {
                id,
                kind,
                position,
                remaining: amount,
                gatherers: Vec::new(),
                cap: config.nodes.cap_for(kind),
                refinery: None,
            },
        );
        id
    }

    /// Launch a projectile.
    pub fn add_projectile(
        &mut self,
        faction: Faction,
        position: Vec2Fixed,
        target: EntityId,
        speed: Fixed,
        damage: u32,
    ) -> EntityId {
        let id = self.allocate_id();
        self.projectiles.insert(
            id,
            Projectile {
                id,
                faction,
                position,
                target,
                speed,
                damage,
            },
        );
        id
    }

    // ------------------------------------------------------------------
    // Lookup
    // ------------------------------------------------------------------

    /// Unit by id.
    #[must_use]
    pub fn unit(&self, id: EntityId) -> Option<&Unit> {
        self.units.get(&id)
    }

    /// Mutable unit by id.
    pub fn unit_mut(&mut self, id: EntityId) -> Option<&mut Unit> {
        self.units.get_mut(&id)
    }

    /// Building by id.
    #[must_use]
    pub fn building(&self, id: EntityId) -> Option<&Building> {
        self.buildings.get(&id)
    }

    /// Mutable building by id.
    pub fn building_mut(&mut self, id: EntityId) -> Option<&mut Building> {
        self.buildings.get_mut(&id)
    }

    /// Resource node by id.
    #[must_use]
    pub fn node(&self, id: EntityId) -> Option<&ResourceNode> {
        self.nodes.get(&id)
    }

    /// Mutable resource node by id.
    pub fn node_mut(&mut self, id: EntityId) -> Option<&mut ResourceNode> {
        self.nodes.get_mut(&id)
    }

    /// Projectile by id.
    #[must_use]
    pub fn projectile(&self, id: EntityId) -> Option<&Projectile> {
        self.projectiles.get(&id)
    }

    /// All units in id order.
    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.units.values()
    }

    /// All buildings in id order.
    pub fn buildings(&self) -> impl Iterator<Item = &Building> {
        self.buildings.values()
    }

    /// All resource nodes in id order.
    pub fn nodes(&self) -> impl Iterator<Item = &ResourceNode> {
        self.nodes.values()
    }

    /// All projectiles in id order.
    pub fn projectiles(&self) -> impl Iterator<Item = &Projectile> {
        self.projectiles.values()
    }

    /// Unit ids in ascending order.
    #[must_use]
    pub fn unit_ids(&self) -> Vec<EntityId> {
        self.units.keys().copied().collect()
    }

    /// Building ids in ascending order.
    #[must_use]
    pub fn building_ids(&self) -> Vec<EntityId> {
        self.buildings.keys().copied().collect()
    }

    /// Projectile ids in ascending order.
    #[must_use]
    pub fn projectile_ids(&self) -> Vec<EntityId> {
        self.projectiles.keys().copied().collect()
    }

    /// Any live-or-dying unit or building with this id.
    #[must_use]
    pub fn entity(&self, id: EntityId) -> Option<EntityRef<'_>> {
        if let Some(unit) = self.units.get(&id) {
            return Some(EntityRef::Unit(unit));
        }
        if let Some(building) = self.buildings.get(&id) {
            return Some(EntityRef::Building(building));
        }
        self.nodes.get(&id).map(EntityRef::Node)
    }

    /// Whether a unit or building with this id exists and has health left.
    #[must_use]
    pub fn is_alive(&self, id: EntityId) -> bool {
        match self.entity(id) {
            Some(EntityRef::Unit(u)) => !u.health.is_dead(),
            Some(EntityRef::Building(b)) => !b.health.is_dead(),
            _ => false,
        }
    }

    /// First completed building of `kind` owned by `faction`, by id.
    #[must_use]
    pub fn find_building(&self, kind: BuildingKind, faction: Faction) -> Option<&Building> {
        self.buildings
            .values()
            .find(|b| b.kind == kind && b.faction == faction && b.is_complete())
    }

    /// Nearest completed, living building of `kind` owned by `faction`.
    ///
    /// Ties go to the lower id.
    #[must_use]
    pub fn nearest_building(
        &self,
        kind: BuildingKind,
        faction: Faction,
        point: Vec2Fixed,
    ) -> Option<&Building> {
        self.buildings
            .values()
            .filter(|b| {
                b.kind == kind && b.faction == faction && b.is_complete() && !b.health.is_dead()
            })
            .min_by_key(|b| (b.position.distance_squared(point), b.id))
    }

    /// Units and buildings (and, without a filter, resource nodes) within
    /// `radius` of `point`, paired with their distance.
    ///
    /// Order: units by id, then buildings by id, then nodes by id.
    pub fn query_in_radius(
        &self,
        point: Vec2Fixed,
        radius: Fixed,
        faction_filter: Option<Faction>,
    ) -> impl Iterator<Item = (EntityRef<'_>, Fixed)> + '_ {
        let units = self.units.values().map(EntityRef::Unit);
        let buildings = self.buildings.values().map(EntityRef::Building);
        let nodes = self
            .nodes
            .values()
            .filter(move |_| faction_filter.is_none())
            .map(EntityRef::Node);
        units
            .chain(buildings)
            .chain(nodes)
            .filter(move |e| faction_filter.map_or(true, |f| e.faction() == Some(f)))
            .filter(move |e| e.position().within(point, radius))
            .map(move |e| {
                let dist = e.position().distance(point);
                (e, dist)
            })
    }

    /// Living units of `kind` owned by `faction`.
    #[must_use]
    pub fn unit_count(&self, faction: Faction, kind: UnitKind) -> usize {
        self.units
            .values()
            .filter(|u| u.faction == faction && u.kind == kind && !u.health.is_dead())
            .count()
    }

    /// Living combat units owned by `faction`.
    #[must_use]
    pub fn combat_unit_count(&self, faction: Faction) -> usize {
        self.units
            .values()
            .filter(|u| u.faction == faction && u.kind.is_combat() && !u.health.is_dead())
            .count()
    }

    /// Buildings of `kind` owned by `faction`, finished or not.
    #[must_use]
    pub fn building_count(&self, faction: Faction, kind: BuildingKind) -> usize {
        self.buildings
            .values()
            .filter(|b| b.faction == faction && b.kind == kind)
            .count()
    }

    /// All buildings owned by `faction`, finished or not.
    #[must_use]
    pub fn total_buildings(&self, faction: Faction) -> usize {
        self.buildings.values().filter(|b| b.faction == faction).count()
    }

    // ------------------------------------------------------------------
    // Pools
    // ------------------------------------------------------------------

    /// Resource pool of `faction`.
    #[must_use]
    pub fn pool(&self, faction: Faction) -> &ResourcePool {
        &self.pools[faction.index()]
    }

    /// Mutable resource pool of `faction`.
    pub fn pool_mut(&mut self, faction: Faction) -> &mut ResourcePool {
        &mut self.pools[faction.index()]
    }

    // ------------------------------------------------------------------
    // Mutation helpers
    // ------------------------------------------------------------------

    /// Apply damage to a unit or building. Returns damage dealt, or `None`
    /// when the id is not damageable.
    pub fn damage(&mut self, id: EntityId, amount: u32) -> Option<u32> {
        if let Some(unit) = self.units.get_mut(&id) {
            return Some(unit.health.apply_damage(amount));
        }
        self.buildings
            .get_mut(&id)
            .map(|b| b.health.apply_damage(amount))
    }

    /// Release `worker`'s slot on `node`, tolerating either being gone.
    pub fn release_gather_slot(&mut self, worker: EntityId, node: Option<EntityId>) {
        if let Some(node) = node.and_then(|id| self.nodes.get_mut(&id)) {
            node.release(worker);
        }
    }

    /// Temporarily remove a unit so it can be stepped against the rest of
    /// the world. Must be followed by [`World::restore_unit`].
    pub(crate) fn take_unit(&mut self, id: EntityId) -> Option<Unit> {
        self.units.remove(&id)
    }

    /// Put back a unit removed with [`World::take_unit`].
    pub(crate) fn restore_unit(&mut self, unit: Unit) {
        self.units.insert(unit.id, unit);
    }

    /// Remove a projectile.
    pub(crate) fn remove_projectile(&mut self, id: EntityId) -> Option<Projectile> {
        self.projectiles.remove(&id)
    }

    /// Mutable projectile by id.
    pub(crate) fn projectile_mut(&mut self, id: EntityId) -> Option<&mut Projectile> {
        self.projectiles.get_mut(&id)
    }

    /// Purge dead units and buildings, drop stale back-references, and
    /// remove depleted nodes nobody holds a slot on.
    ///
    /// Idempotent: a second call with no damage in between removes nothing.
    pub fn remove_dead(&mut self) -> Removed {
        let mut removed = Removed::default();

        self.units.retain(|&id, unit| {
            let dead = unit.health.is_dead();
            if dead {
                removed.units.push(id);
            }
            !dead
        });
        self.buildings.retain(|&id, building| {
            let dead = building.health.is_dead();
            if dead {
                removed.buildings.push(id);
            }
            !dead
        });

        let units = &self.units;
        let buildings = &self.buildings;
        for node in self.nodes.values_mut() {
            let node_id = node.id;
            node.gatherers.retain(|worker| {
                units
                    .get(worker)
                    .is_some_and(|u| u.state.gather_node() == Some(node_id))
            });
            if node
                .refinery
                .is_some_and(|r| !buildings.contains_key(&r))
            {
                node.refinery = None;
            }
        }

        self.nodes.retain(|&id, node| {
            let spent = node.is_depleted() && node.gatherers.is_empty();
            if spent {
                removed.nodes.push(id);
            }
            !spent
        });

        for building in self.buildings.values_mut() {
            if building.builder.is_some_and(|b| !units.contains_key(&b)) {
                building.builder = None;
            }
        }

        removed
    }
}
