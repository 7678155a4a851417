//! Read-only projection of the world for observers.
//!
//! A snapshot carries enough to redraw or resynchronize a remote view
//! without replaying history. It is a copy; nothing in it refers back into
//! the live world.

use serde::{Deserialize, Serialize};

use crate::components::{BuildingKind, EntityId, ResourceKind, UnitKind};
use crate::error::{GameError, Result};
use crate::factions::Faction;
use crate::math::Vec2Fixed;
use crate::world::World;

/// What an entity is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    /// A unit of the given type.
    Unit(UnitKind),
    /// A building of the given type.
    Building(BuildingKind),
    /// A resource node.
    Resource(ResourceKind),
    /// A projectile in flight.
    Projectile,
}

/// One entity as seen from outside.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    /// Entity id.
    pub id: EntityId,
    /// Entity type.
    pub kind: EntityKind,
    /// Owner; resources are unowned.
    pub faction: Option<Faction>,
    /// Position.
    pub position: Vec2Fixed,
    /// Current health.
    pub health: Option<u32>,
    /// Maximum health.
    pub max_health: Option<u32>,
    /// Construction progress percent, buildings only.
    pub completion: Option<u32>,
    /// Behavioral state label, units only.
    pub state: Option<String>,
    /// Pending production orders.
    pub queue_len: Option<usize>,
    /// Amount left in a resource node.
    pub remaining: Option<u32>,
}

/// A faction's stockpile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSnapshot {
    /// Owner.
    pub faction: Faction,
    /// Minerals on hand.
    pub minerals: u32,
    /// Gas on hand.
    pub gas: u32,
}

/// The whole world at one tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    /// Tick the snapshot was taken after.
    pub tick: u64,
    /// Pools for both factions.
    pub pools: Vec<PoolSnapshot>,
    /// Every entity, ordered by id.
    pub entities: Vec<EntitySnapshot>,
}

impl WorldSnapshot {
    /// Capture `world` as of `tick`.
    #[must_use]
    pub fn capture(tick: u64, world: &World) -> Self {
        let pools = Faction::ALL
            .iter()
            .map(|&faction| {
                let pool = world.pool(faction);
                PoolSnapshot {
                    faction,
                    minerals: pool.minerals,
                    gas: pool.gas,
                }
            })
            .collect();

        let mut entities: Vec<EntitySnapshot> = Vec::new();
        entities.extend(world.units().map(|u| EntitySnapshot {
            id: u.id,
            kind: EntityKind::Unit(u.kind),
            faction: Some(u.faction),
            position: u.position,
            health: Some(u.health.current),
            max_health: Some(u.health.max),
            completion: None,
            state: Some(u.state.label().to_string()),
            queue_len: None,
            remaining: None,
        }));
        entities.extend(world.buildings().map(|b| EntitySnapshot {
            id: b.id,
            kind: EntityKind::Building(b.kind),
            faction: Some(b.faction),
            position: b.position,
            health: Some(b.health.current),
            max_health: Some(b.health.max),
            completion: Some(b.completion_percent()),
            state: None,
            queue_len: b.production.as_ref().map(|q| q.len()),
            remaining: None,
        }));
        entities.extend(world.nodes().map(|n| EntitySnapshot {
            id: n.id,
            kind: EntityKind::Resource(n.kind),
            faction: None,
            position: n.position,
            health: None,
            max_health: None,
            completion: None,
            state: None,
            queue_len: None,
            remaining: Some(n.remaining),
        }));
        entities.extend(world.projectiles().map(|p| EntitySnapshot {
            id: p.id,
            kind: EntityKind::Projectile,
            faction: Some(p.faction),
            position: p.position,
            health: None,
            max_health: None,
            completion: None,
            state: None,
            queue_len: None,
            remaining: None,
        }));
        entities.sort_by_key(|e| e.id);

        Self {
            tick,
            pools,
            entities,
        }
    }

    /// Entity by id.
    #[must_use]
    pub fn entity(&self, id: EntityId) -> Option<&EntitySnapshot> {
        self.entities
            .binary_search_by_key(&id, |e| e.id)
            .ok()
            .map(|i| &self.entities[i])
    }

    /// Pool of `faction`.
    #[must_use]
    pub fn pool(&self, faction: Faction) -> Option<&PoolSnapshot> {
        self.pools.iter().find(|p| p.faction == faction)
    }

    /// Encode as JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| GameError::Serialization(e.to_string()))
    }

    /// Decode from JSON.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| GameError::Serialization(e.to_string()))
    }

    /// Encode as compact binary.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| GameError::Serialization(e.to_string()))
    }

    /// Decode from compact binary.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        bincode::deserialize(data).map_err(|e| GameError::Serialization(e.to_string()))
    }
}
