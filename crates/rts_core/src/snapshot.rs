//! Serializable read-only view of the world.
//!
//! Front-ends that cannot borrow the [`World`] (the JSON protocol, tests
//! comparing runs) take a [`WorldSnapshot`] instead. It holds everything a
//! renderer needs: terrain, entities, ledgers and the local UI state.

use serde::{Deserialize, Serialize};

use crate::components::{EntityId, EntityKind, UnitKind};
use crate::event_log::GoldSummary;
use crate::factions::FactionId;
use crate::grid::TilePos;
use crate::world::{InteractionMode, World};

/// One entity as seen from outside.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    /// Entity id.
    pub id: EntityId,
    /// Owning faction.
    pub owner: FactionId,
    /// Kind name, e.g. "Worker" or "Barracks".
    pub kind: String,
    /// Tile (anchor for buildings).
    pub pos: TilePos,
    /// Footprint edge length.
    pub size: i32,
    /// Current hit points.
    pub hp: i32,
    /// Maximum hit points.
    pub max_hp: i32,
    /// Where the unit is walking.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub move_target: Option<TilePos>,
    /// Resource tile the worker is assigned to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub harvest: Option<TilePos>,
    /// Gold the worker carries.
    #[serde(default)]
    pub carried: u32,
    /// Production queue, head first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub queue: Vec<UnitKind>,
    /// Ticks invested in the queue head.
    #[serde(default)]
    pub progress: u32,
}

/// The renderable state of a world at one tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    /// Tick the snapshot was taken at.
    pub tick: u64,
    /// Grid width.
    pub width: i32,
    /// Grid height.
    pub height: i32,
    /// One string per row: `.` empty, `$` resource, `#` blocked.
    pub tiles: Vec<String>,
    /// Entities in id order.
    pub entities: Vec<EntitySnapshot>,
    /// Both balances.
    pub gold: GoldSummary,
    /// Selected entity.
    pub selected: Option<EntityId>,
    /// Click mode.
    pub mode: InteractionMode,
}

impl WorldSnapshot {
    /// Copy the renderable state out of a world.
    #[must_use]
    pub fn capture(world: &World) -> Self {
        let grid = world.grid();
        let tiles = (0..grid.height())
            .map(|y| {
                (0..grid.width())
                    .map(|x| grid.get(TilePos::new(x, y)).symbol())
                    .collect()
            })
            .collect();

        let entities = world
            .entities()
            .map(|entity| {
                let mut snapshot = EntitySnapshot {
                    id: entity.id,
                    owner: entity.owner,
                    kind: entity.label().to_string(),
                    pos: entity.pos,
                    size: entity.size(),
                    hp: entity.hp,
                    max_hp: entity.max_hp,
                    move_target: None,
                    harvest: None,
                    carried: 0,
                    queue: Vec::new(),
                    progress: 0,
                };
                match &entity.kind {
                    EntityKind::Unit(unit) => {
                        snapshot.move_target = unit.move_target;
                        snapshot.harvest = unit.harvest;
                        snapshot.carried = unit.carried();
                    }
                    EntityKind::Building(building) => {
                        snapshot.queue = building.queue.iter().copied().collect();
                        snapshot.progress = building.progress;
                    }
                }
                snapshot
            })
            .collect();

        Self {
            tick: world.tick(),
            width: grid.width(),
            height: grid.height(),
            tiles,
            entities,
            gold: GoldSummary {
                player: world.ledger(FactionId::Player).gold(),
                opponent: world.ledger(FactionId::Opponent).gold(),
            },
            selected: world.ui().selected,
            mode: world.ui().mode,
        }
    }

    /// Look up an entity by id.
    #[must_use]
    pub fn entity(&self, id: EntityId) -> Option<&EntitySnapshot> {
        self.entities.iter().find(|e| e.id == id)
    }
}
