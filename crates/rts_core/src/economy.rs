//! Harvesting and delivery.
//!
//! Workers assigned to a Resource tile gather one gold every
//! `harvest_interval` ticks while standing on it. A full worker drops its
//! assignment and walks to the drop-off tile below its nearest Command
//! Center; a worker with cargo that is not harvesting and stands within one
//! tile of that spot delivers everything it carries.
//!
//! Resource tiles are never depleted.

use crate::components::EntityId;
use crate::event_log::GameEvent;
use crate::factions::FactionId;
use crate::grid::{Tile, TilePos};
use crate::systems::System;
use crate::world::World;

/// Drop-off tile for a faction's nearest Command Center: directly below its
/// footprint at the anchor column.
#[must_use]
pub fn drop_off_point(world: &World, owner: FactionId, from: TilePos) -> Option<TilePos> {
    world
        .nearest_command_center(owner, from)
        .map(|cc| cc.pos.offset(0, cc.size()))
}

/// Gathers and delivers gold for every worker.
#[derive(Debug, Default, Clone, Copy)]
pub struct EconomySystem;

impl EconomySystem {
    fn advance_worker(world: &mut World, id: EntityId) {
        let harvest_tick = world.tick() % world.rules().harvest_interval == 0;

        let Some(entity) = world.entity(id) else {
            return;
        };
        let (owner, pos) = (entity.owner, entity.pos);
        let Some(unit) = entity.as_unit() else {
            return;
        };
        let Some(cargo) = unit.cargo else {
            return;
        };
        let harvest = unit.harvest;
        let last_harvest = unit.last_harvest;
        let move_target = unit.move_target;
        let drop_off = drop_off_point(world, owner, pos);

        if let Some(spot) = harvest {
            if pos != spot || !harvest_tick || world.tile(spot) != Tile::Resource {
                return;
            }
            let Some(unit) = world.entity_mut(id).and_then(|e| e.as_unit_mut()) else {
                return;
            };
            let Some(cargo) = unit.cargo.as_mut() else {
                return;
            };
            cargo.carried = (cargo.carried + 1).min(cargo.capacity);
            if cargo.is_full() {
                unit.harvest = None;
                unit.last_harvest = Some(spot);
                unit.move_target = drop_off;
            }
            return;
        }

        let Some(drop_off) = drop_off else {
            return;
        };
        if cargo.is_empty() || pos.manhattan(drop_off) > 1 {
            return;
        }

        // A worker passing by under a player order keeps that order.
        let heading_home = move_target.map_or(true, |target| target == drop_off);
        let resume = last_harvest
            .filter(|_| heading_home)
            .filter(|&tile| world.tile(tile) == Tile::Resource);
        let Some(unit) = world.entity_mut(id).and_then(|e| e.as_unit_mut()) else {
            return;
        };
        let amount = unit.cargo.as_mut().map_or(0, |c| c.unload());
        if let Some(tile) = resume {
            unit.harvest = Some(tile);
            unit.move_target = Some(tile);
        }

        world.ledger_mut(owner).credit(amount);
        world.record(GameEvent::Deliver { owner, amount });
        tracing::debug!(%id, %owner, amount, "Gold delivered");
    }
}

impl System for EconomySystem {
    fn name(&self) -> &'static str {
        "economy"
    }

    fn advance(&mut self, world: &mut World) {
        for id in world.unit_ids() {
            Self::advance_worker(world, id);
        }
    }
}
