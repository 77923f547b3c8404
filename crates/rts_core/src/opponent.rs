//! Scripted opponent.
//!
//! The opponent is an ordinary command-layer caller: it reads the world and
//! issues the same commands a human could. It thinks every
//! `think_interval` ticks and keeps no plan between evaluations; the only
//! state it carries is its random stream, which is seeded separately from
//! the map generator.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::commands::{self, CommandOutcome};
use crate::components::{BuildingKind, UnitKind};
use crate::factions::FactionId;
use crate::grid::{Tile, TilePos};
use crate::world::World;

/// Salt mixed into the session seed so opponent rolls differ from map rolls.
const OPPONENT_SEED_SALT: u64 = 0xA11C_E5ED_0BAD_F00D;

/// Stateless build-order policy with its own random stream.
#[derive(Debug, Clone)]
pub struct OpponentController {
    faction: FactionId,
    rng: StdRng,
}

impl OpponentController {
    /// Create a controller for a faction.
    #[must_use]
    pub fn new(faction: FactionId, seed: u64) -> Self {
        Self {
            faction,
            rng: StdRng::seed_from_u64(seed ^ OPPONENT_SEED_SALT),
        }
    }

    /// The faction this controller plays.
    #[must_use]
    pub const fn faction(&self) -> FactionId {
        self.faction
    }

    /// Evaluate the policy if this is a thinking tick.
    ///
    /// Returns the outcome of every command issued (empty on other ticks).
    pub fn think(&mut self, world: &mut World) -> Vec<CommandOutcome> {
        let mut issued = Vec::new();
        if world.tick() % world.rules().opponent.think_interval != 0 {
            return issued;
        }

        let faction = self.faction;
        let rules = world.rules().clone();
        let tuning = &rules.opponent;
        let command_center = world
            .find_building(faction, BuildingKind::CommandCenter)
            .map(|cc| cc.pos);
        let had_barracks = world
            .find_building(faction, BuildingKind::Barracks)
            .is_some();

        // 1. Another worker, occasionally.
        let workers = world.count_units(faction, UnitKind::Worker)
            + world.count_queued(faction, UnitKind::Worker);
        if command_center.is_some()
            && world.ledger(faction).can_afford(rules.worker.cost)
            && workers < tuning.worker_target
            && self.rng.gen_bool(tuning.worker_chance)
        {
            issued.push(commands::train_unit(
                world,
                BuildingKind::CommandCenter,
                UnitKind::Worker,
                faction,
            ));
        }

        // 2. A Barracks next to the Command Center.
        if let (Some(cc), Some(cost), false) = (command_center, rules.barracks.cost, had_barracks) {
            if world.ledger(faction).can_afford(cost) {
                let (dx, dy) = tuning.barracks_offset;
                let size = rules.barracks.size;
                let anchor = TilePos::new(
                    (cc.x + dx).clamp(0, rules.grid_width - size),
                    (cc.y + dy).clamp(0, rules.grid_height - size),
                );
                issued.push(commands::place_building(
                    world,
                    BuildingKind::Barracks,
                    anchor,
                    faction,
                ));
            }
        }

        // 3. Combat units from a Barracks that stood when this evaluation began.
        let cheapest = rules.melee.cost.min(rules.ranged.cost);
        if had_barracks && world.ledger(faction).can_afford(cheapest) {
            let pick = if self.rng.gen_bool(tuning.melee_weight) {
                UnitKind::Melee
            } else {
                UnitKind::Ranged
            };
            issued.push(commands::train_unit(
                world,
                BuildingKind::Barracks,
                pick,
                faction,
            ));
        }

        // 4. Idle workers go harvest.
        self.send_idle_workers(world, &mut issued);

        for outcome in &issued {
            tracing::debug!(
                %faction,
                tick = world.tick(),
                success = outcome.success,
                message = %outcome.message,
                "Opponent command"
            );
        }
        issued
    }

    fn send_idle_workers(&self, world: &mut World, issued: &mut Vec<CommandOutcome>) {
        let idle: Vec<_> = world
            .units()
            .filter(|e| e.owner == self.faction)
            .filter_map(|e| e.as_unit().map(|u| (e.id, e.pos, u)))
            .filter(|(_, _, u)| {
                u.kind == UnitKind::Worker
                    && !u.has_orders()
                    && u.cargo.is_some_and(|c| c.is_empty())
            })
            .map(|(id, pos, _)| (id, pos))
            .collect();

        for (id, pos) in idle {
            if let Some(spot) = nearest_resource(world, pos) {
                issued.push(commands::order_unit(world, id, spot, self.faction));
            }
        }
    }
}

/// Closest Resource tile, lowest row-major index on ties.
#[must_use]
pub fn nearest_resource(world: &World, from: TilePos) -> Option<TilePos> {
    world
        .grid()
        .positions()
        .filter(|&pos| world.tile(pos) == Tile::Resource)
        .min_by_key(|&pos| from.manhattan(pos))
}
