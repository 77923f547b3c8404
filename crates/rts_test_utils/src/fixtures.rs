//! Test fixtures and helpers.
//!
//! Pre-built worlds and a small RON scenario format for consistent testing.
//!
//! # Scenario RON
//!
//! ```ron
//! Scenario(
//!     gold: Some((player: 200, opponent: 0)),
//!     resources: [(x: 6, y: 6)],
//!     buildings: [(owner: player, kind: Barracks, x: 4, y: 4)],
//!     units: [(owner: opponent, kind: Melee, x: 9, y: 9)],
//! )
//! ```

use serde::Deserialize;

use rts_core::components::{BuildingKind, EntityId, Unit, UnitKind};
use rts_core::error::PlacementError;
use rts_core::factions::FactionId;
use rts_core::grid::{Tile, TilePos};
use rts_core::rules::GameRules;
use rts_core::simulation::Simulation;
use rts_core::world::World;

/// Seed used by fixtures that do not care about the map.
pub const FIXTURE_SEED: u64 = 0x7E57;

/// A freshly set up match with default rules.
///
/// # Panics
///
/// Panics if the default rules fail validation.
#[must_use]
pub fn session(seed: u64) -> World {
    World::new_session(GameRules::default(), seed).expect("default rules are valid")
}

/// A match driven by the scripted opponent only.
///
/// # Panics
///
/// Panics if the default rules fail validation.
#[must_use]
pub fn simulation(seed: u64) -> Simulation {
    Simulation::new(GameRules::default(), seed).expect("default rules are valid")
}

/// A match with the scripted policy playing both sides.
#[must_use]
pub fn scripted_match(seed: u64) -> Simulation {
    simulation(seed).with_scripted_player(seed)
}

/// An empty 20x20 world: no entities, default balances.
#[must_use]
pub fn empty_world() -> World {
    World::empty(GameRules::default(), FIXTURE_SEED)
}

/// Mutable unit data for an id.
///
/// # Panics
///
/// Panics if the id is not a live unit.
pub fn unit_mut(world: &mut World, id: EntityId) -> &mut Unit {
    world
        .entity_mut(id)
        .and_then(|e| e.as_unit_mut())
        .unwrap_or_else(|| panic!("{id} is not a live unit"))
}

/// Read-only unit data for an id.
///
/// # Panics
///
/// Panics if the id is not a live unit.
#[must_use]
pub fn unit(world: &World, id: EntityId) -> &Unit {
    world
        .entity(id)
        .and_then(|e| e.as_unit())
        .unwrap_or_else(|| panic!("{id} is not a live unit"))
}

/// Force a faction's balance to an exact amount through the ledger API.
pub fn set_gold(world: &mut World, faction: FactionId, amount: u32) {
    let ledger = world.ledger_mut(faction);
    let current = ledger.gold();
    if current > amount {
        ledger.try_spend(current - amount);
    } else {
        ledger.credit(amount - current);
    }
}

/// Gold for both sides.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ScenarioGold {
    /// Player balance.
    pub player: u32,
    /// Opponent balance.
    pub opponent: u32,
}

/// A tile coordinate.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ScenarioTile {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

/// A building to place.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ScenarioBuilding {
    /// Owning faction.
    pub owner: FactionId,
    /// Building kind.
    pub kind: BuildingKind,
    /// Anchor column.
    pub x: i32,
    /// Anchor row.
    pub y: i32,
}

/// A unit to place.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ScenarioUnit {
    /// Owning faction.
    pub owner: FactionId,
    /// Unit kind.
    pub kind: UnitKind,
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

/// Hand-made starting position.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Scenario {
    /// Rules to run under.
    pub rules: GameRules,
    /// Starting balances; rules default when absent.
    pub gold: Option<ScenarioGold>,
    /// Resource tiles.
    pub resources: Vec<ScenarioTile>,
    /// Buildings, spawned in order.
    pub buildings: Vec<ScenarioBuilding>,
    /// Units, spawned in order after the buildings.
    pub units: Vec<ScenarioUnit>,
}

impl Scenario {
    /// Parse a scenario from RON.
    pub fn from_ron(text: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(text)
    }

    /// Build the world. Ids are assigned buildings first, then units.
    pub fn build(&self) -> Result<World, PlacementError> {
        let mut world = World::empty(self.rules.clone(), FIXTURE_SEED);

        for tile in &self.resources {
            world.set_tile(TilePos::new(tile.x, tile.y), Tile::Resource)?;
        }
        for b in &self.buildings {
            world.spawn_building(b.kind, b.owner, TilePos::new(b.x, b.y))?;
        }
        for u in &self.units {
            world.spawn_unit(u.kind, u.owner, TilePos::new(u.x, u.y))?;
        }
        if let Some(gold) = self.gold {
            set_gold(&mut world, FactionId::Player, gold.player);
            set_gold(&mut world, FactionId::Opponent, gold.opponent);
        }

        tracing::debug!(entities = world.entity_count(), "Scenario built");
        Ok(world)
    }

    /// Parse and build in one go.
    ///
    /// # Panics
    ///
    /// Panics if the text does not parse or an entity cannot be placed.
    #[must_use]
    pub fn world_from_ron(text: &str) -> World {
        let scenario = Self::from_ron(text).expect("scenario RON parses");
        scenario.build().expect("scenario entities fit")
    }
}
