//! Movement and combat.
//!
//! Every unit first takes its movement step, then every unit acquires the
//! nearest enemy and attacks it if in range. Units always auto-engage; there
//! is no hold or passive stance.
//!
//! Targets are ranked by Manhattan distance from the attacker's tile to a
//! unit's tile or to a building's [`center`](crate::components::Entity::center),
//! ties going to the lowest entity id. The same distance decides range, so a
//! melee unit only reaches a 2x2 building from the side nearest its center.

use crate::components::EntityId;
use crate::event_log::GameEvent;
use crate::movement::step_toward;
use crate::systems::System;
use crate::world::World;

/// Nearest enemy of `attacker`, lowest id on equal distance.
#[must_use]
pub fn find_target(world: &World, attacker: EntityId) -> Option<EntityId> {
    let attacker = world.entity(attacker)?;
    world
        .entities()
        .filter(|entity| entity.owner != attacker.owner)
        .min_by_key(|entity| (attacker.pos.manhattan(entity.center()), entity.id))
        .map(|entity| entity.id)
}

/// Moves units toward their targets, then resolves attacks.
#[derive(Debug, Default, Clone, Copy)]
pub struct CombatSystem;

impl CombatSystem {
    fn move_unit(world: &mut World, id: EntityId) {
        let Some(entity) = world.entity(id) else {
            return;
        };
        let Some(target) = entity.as_unit().and_then(|u| u.move_target) else {
            return;
        };
        let next = step_toward(world.grid(), entity.pos, target);

        let Some(entity) = world.entity_mut(id) else {
            return;
        };
        entity.pos = next;
        if next == target {
            if let Some(unit) = entity.as_unit_mut() {
                unit.move_target = None;
            }
        }
    }

    fn engage(world: &mut World, id: EntityId) {
        let cooldown_after_attack = world.rules().attack_cooldown;

        let Some(unit) = world.entity_mut(id).and_then(|e| e.as_unit_mut()) else {
            return;
        };
        unit.cooldown = unit.cooldown.saturating_sub(1);

        let Some(target_id) = find_target(world, id) else {
            return;
        };
        let (Some(attacker), Some(target)) = (world.entity(id), world.entity(target_id)) else {
            return;
        };
        let Some(stats) = attacker.as_unit() else {
            return;
        };
        let in_range = attacker.pos.manhattan(target.center()) <= stats.range;
        let (damage, ready, idle) = (stats.attack, stats.cooldown == 0, !stats.has_orders());
        let target_pos = target.pos;

        if !in_range {
            if idle {
                if let Some(unit) = world.entity_mut(id).and_then(|e| e.as_unit_mut()) {
                    unit.move_target = Some(target_pos);
                }
            }
            return;
        }
        if !ready {
            return;
        }

        if let Some(unit) = world.entity_mut(id).and_then(|e| e.as_unit_mut()) {
            unit.cooldown = cooldown_after_attack;
        }
        let Some(target) = world.entity_mut(target_id) else {
            return;
        };
        target.hp -= damage;
        if !target.is_dead() {
            return;
        }

        if let Some(dead) = world.remove_entity(target_id) {
            tracing::info!(
                attacker = %id,
                target = %target_id,
                kind = dead.label(),
                owner = %dead.owner,
                "Entity destroyed"
            );
            world.record(GameEvent::Destroyed {
                owner: dead.owner,
                id: target_id,
                kind: dead.label().to_string(),
            });
        }
    }
}

impl System for CombatSystem {
    fn name(&self) -> &'static str {
        "combat"
    }

    fn advance(&mut self, world: &mut World) {
        let ids = world.unit_ids();
        for &id in &ids {
            Self::move_unit(world, id);
        }
        // Units killed earlier in this pass no longer resolve.
        for &id in &ids {
            Self::engage(world, id);
        }
    }
}
