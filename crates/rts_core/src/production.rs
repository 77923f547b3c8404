//! Unit production.
//!
//! Each building trains the head of its queue one tick at a time. When the
//! head's training time is reached the unit is released onto the first free
//! tile around the building. If every candidate tile is taken the building
//! holds the finished unit at full progress and retries every tick; nothing
//! is refunded or lost.

use crate::components::EntityId;
use crate::factions::FactionId;
use crate::systems::System;
use crate::world::World;

/// Advances production queues and spawns finished units.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProductionSystem;

impl ProductionSystem {
    fn advance_building(world: &mut World, id: EntityId) {
        let rules = world.rules();
        let Some(building) = world.entity(id).and_then(|e| e.as_building()) else {
            return;
        };
        let Some(&head) = building.queue.front() else {
            return;
        };
        let train_ticks = rules.unit(head).train_ticks;
        let rally = rules.opponent.rally_point;

        let Some(building) = world.entity_mut(id).and_then(|e| e.as_building_mut()) else {
            return;
        };
        building.progress = (building.progress + 1).min(train_ticks);
        if building.progress < train_ticks {
            return;
        }

        let Some(unit_id) = world.spawn_adjacent(id, head) else {
            tracing::trace!(%id, unit = %head, "Spawn blocked; holding");
            return;
        };

        if let Some(building) = world.entity_mut(id).and_then(|e| e.as_building_mut()) {
            building.queue.pop_front();
            building.progress = 0;
        }

        if let Some(unit) = world.entity_mut(unit_id) {
            if unit.owner == FactionId::Opponent && head.is_combat() {
                if let Some(unit) = unit.as_unit_mut() {
                    unit.move_target = Some(rally);
                }
            }
        }
    }
}

impl System for ProductionSystem {
    fn name(&self) -> &'static str {
        "production"
    }

    fn advance(&mut self, world: &mut World) {
        for id in world.building_ids() {
            Self::advance_building(world, id);
        }
    }
}
