//! Per-building production queues.
//!
//! Orders are paid for when queued, never on completion. A building works
//! on the head of its queue one tick at a time; when the head's production
//! time is reached the unit spawns beside the building and the timer starts
//! over for the next order on the following tick.

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::components::{EntityId, UnitKind};
use crate::config::{Cost, SimConfig};
use crate::error::CommandError;
use crate::factions::Faction;
use crate::math::{Fixed, Vec2Fixed};
use crate::world::World;

/// A queued unit with the price already paid for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductionOrder {
    /// Unit to produce.
    pub unit: UnitKind,
    /// Cost deducted at enqueue time.
    pub paid: Cost,
}

/// Bounded FIFO of orders plus the timer for the head order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductionQueue {
    orders: VecDeque<ProductionOrder>,
    capacity: usize,
    timer: u32,
}

impl ProductionQueue {
    /// Empty queue holding at most `capacity` orders.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            orders: VecDeque::with_capacity(capacity),
            capacity,
            timer: 0,
        }
    }

    /// Maximum number of pending orders.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Pending orders.
    #[must_use]
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    /// No pending orders.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// At capacity.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.orders.len() >= self.capacity
    }

    /// Ticks spent on the head order.
    #[must_use]
    pub const fn timer(&self) -> u32 {
        self.timer
    }

    /// Order currently in production.
    #[must_use]
    pub fn current(&self) -> Option<&ProductionOrder> {
        self.orders.front()
    }

    /// Pending orders, head first.
    pub fn orders(&self) -> impl Iterator<Item = &ProductionOrder> {
        self.orders.iter()
    }

    /// How many pending orders are for `kind`.
    #[must_use]
    pub fn count_of(&self, kind: UnitKind) -> usize {
        self.orders.iter().filter(|o| o.unit == kind).count()
    }

    /// Append an order. Returns `false` (and drops nothing) when full.
    #[must_use]
    pub fn push(&mut self, order: ProductionOrder) -> bool {
        if self.is_full() {
            return false;
        }
        self.orders.push_back(order);
        true
    }

    /// Advance the head order by one tick. Returns the order once its
    /// duration, looked up through `duration_of`, is reached.
    pub fn tick(&mut self, duration_of: impl Fn(UnitKind) -> u32) -> Option<ProductionOrder> {
        let head = *self.orders.front()?;
        self.timer += 1;
        if self.timer < duration_of(head.unit) {
            return None;
        }
        self.timer = 0;
        self.orders.pop_front()
    }
}

/// Production events emitted during a tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductionEvent {
    /// An order was accepted and paid for.
    Queued {
        /// Producing building.
        building: EntityId,
        /// Unit type.
        unit: UnitKind,
        /// Owning faction.
        faction: Faction,
    },
    /// A unit finished and was placed in the world.
    Completed {
        /// Producing building.
        building: EntityId,
        /// The new unit.
        unit_id: EntityId,
        /// Unit type.
        unit: UnitKind,
        /// Owning faction.
        faction: Faction,
    },
}

/// Queue `unit` at `building` for `faction`.
///
/// Fails, without touching the pool, if the building is missing, foreign,
/// unfinished, cannot make that unit, has a full queue, or the pool is
/// short.
pub fn enqueue(
    world: &mut World,
    config: &SimConfig,
    faction: Faction,
    building_id: EntityId,
    unit: UnitKind,
) -> Result<ProductionEvent, CommandError> {
    let building = world
        .building(building_id)
        .filter(|b| !b.health.is_dead())
        .ok_or(CommandError::UnknownEntity(building_id))?;
    if building.faction != faction {
        return Err(CommandError::NotOwned(building_id));
    }
    if !building.is_complete() {
        return Err(CommandError::NotConstructed(building_id));
    }
    let kind = building.kind;
    if !config.buildings.get(kind).produces.contains(&unit) {
        return Err(CommandError::CannotProduce {
            building: kind,
            unit,
        });
    }
    let queue = building
        .production
        .as_ref()
        .ok_or(CommandError::CannotProduce {
            building: kind,
            unit,
        })?;
    if queue.is_full() {
        return Err(CommandError::QueueFull {
            building: building_id,
            capacity: queue.capacity(),
        });
    }

    let cost = config.units.get(unit).cost;
    world.pool_mut(faction).spend(cost)?;

    let order = ProductionOrder { unit, paid: cost };
    let pushed = world
        .building_mut(building_id)
        .and_then(|b| b.production.as_mut())
        .is_some_and(|q| q.push(order));
    debug_assert!(pushed, "queue capacity checked above");

    tracing::debug!(building = building_id, ?unit, %faction, "Production queued");
    Ok(ProductionEvent::Queued {
        building: building_id,
        unit,
        faction,
    })
}

/// Random spawn point beside a building.
fn spawn_point(center: Vec2Fixed, config: &SimConfig, rng: &mut StdRng) -> Vec2Fixed {
    let jitter = i32::try_from(config.production.spawn_jitter).unwrap_or(i32::MAX);
    let distance = i32::try_from(config.production.spawn_distance).unwrap_or(i32::MAX);
    let dx = rng.gen_range(-jitter..=jitter);
    let dy = rng.gen_range(-jitter..=jitter);
    let offset = Vec2Fixed::from_ints(distance.saturating_add(dx), dy);
    (center + offset).clamp_to(Fixed::from_num(config.world_size))
}

/// Advance one building's queue by a tick, spawning a unit when the head
/// order completes.
pub fn advance(
    world: &mut World,
    config: &SimConfig,
    rng: &mut StdRng,
    building_id: EntityId,
) -> Option<ProductionEvent> {
    let building = world.building_mut(building_id)?;
    if !building.is_complete() || building.health.is_dead() {
        return None;
    }
    let (faction, center) = (building.faction, building.position);
    let order = building
        .production
        .as_mut()?
        .tick(|kind| config.units.get(kind).production_ticks)?;

    let position = spawn_point(center, config, rng);
    let unit_id = world.add_unit(order.unit, faction, position, config);
    tracing::debug!(building = building_id, unit_id, unit = ?order.unit, %faction, "Unit produced");
    Some(ProductionEvent::Completed {
        building: building_id,
        unit_id,
        unit: order.unit,
        faction,
    })
}
