//! Per-building tick: construction, production and static defense.

use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::combat::{step_defense, CombatEvent};
use crate::components::{BuildingKind, EntityId, UnitState, CONSTRUCTION_COMPLETE};
use crate::config::SimConfig;
use crate::factions::Faction;
use crate::math::Fixed;
use crate::production::{advance, ProductionEvent};
use crate::world::World;

/// A building finished construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstructionEvent {
    /// The building.
    pub building: EntityId,
    /// Its type.
    pub kind: BuildingKind,
    /// Owning faction.
    pub faction: Faction,
}

/// Events produced while stepping buildings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildingEvents {
    /// Completed constructions.
    pub construction: Vec<ConstructionEvent>,
    /// Units that came off a production line.
    pub production: Vec<ProductionEvent>,
    /// Shots fired by defenses.
    pub combat: Vec<CombatEvent>,
}

/// Step every building once, in id order.
pub fn step_buildings(world: &mut World, config: &SimConfig, rng: &mut StdRng) -> BuildingEvents {
    let mut events = BuildingEvents::default();
    for id in world.building_ids() {
        if let Some(done) = step_construction(world, config, id) {
            events.construction.push(done);
        }
        if let Some(produced) = advance(world, config, rng, id) {
            events.production.push(produced);
        }
        events.combat.extend(step_defense(world, config, id));
    }
    events
}

/// Advance construction of one building by a tick.
///
/// A builder within the interaction radius contributes the full rate. A
/// building without a builder slowly completes itself. A builder that is
/// assigned but still walking contributes nothing.
pub fn step_construction(
    world: &mut World,
    config: &SimConfig,
    building_id: EntityId,
) -> Option<ConstructionEvent> {
    let building = world.building(building_id)?;
    if building.is_complete() || building.health.is_dead() {
        return None;
    }
    let position = building.position;

    // Drop a builder that died or took other work.
    let builder = building.builder.filter(|&worker| {
        world.unit(worker).is_some_and(|u| {
            !u.health.is_dead() && u.state == UnitState::Building { site: building_id }
        })
    });

    let radius = Fixed::from_num(config.worker.interaction_radius);
    let rate = match builder {
        Some(worker) => {
            let in_range = world
                .unit(worker)
                .is_some_and(|u| u.position.within(position, radius));
            if in_range {
                config.worker.builder_rate
            } else {
                0
            }
        }
        None => config.worker.passive_rate,
    };

    let building = world.building_mut(building_id)?;
    building.builder = builder;
    building.progress = building.progress.saturating_add(rate).min(CONSTRUCTION_COMPLETE);
    if !building.is_complete() {
        return None;
    }

    let (kind, faction) = (building.kind, building.faction);
    building.builder = None;
    if let Some(unit) = builder.and_then(|w| world.unit_mut(w)) {
        unit.state = UnitState::Idle;
    }
    tracing::info!(building = building_id, ?kind, %faction, "Construction complete");
    Some(ConstructionEvent {
        building: building_id,
        kind,
        faction,
    })
}
