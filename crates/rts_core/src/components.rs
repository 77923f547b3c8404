//! Entity definitions.
//!
//! An [`Entity`] carries the fields every entity has (owner, position, hit
//! points) and an [`EntityKind`] holding the variant-specific data. Code that
//! needs kind-specific behaviour matches on the kind explicitly.

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::factions::FactionId;
use crate::grid::{square, TilePos};
use crate::rules::{BuildingStats, UnitStats};

/// Unique identifier for entities.
///
/// Assigned monotonically from 1 and never reused within a session, so a
/// stale id simply fails to resolve.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Trainable unit types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum UnitKind {
    /// Harvests gold.
    Worker,
    /// Short-range fighter.
    Melee,
    /// Long-range fighter.
    Ranged,
}

impl UnitKind {
    /// All unit kinds.
    pub const ALL: [Self; 3] = [Self::Worker, Self::Melee, Self::Ranged];

    /// Returns true for Melee and Ranged.
    #[must_use]
    pub const fn is_combat(self) -> bool {
        matches!(self, Self::Melee | Self::Ranged)
    }

    /// Display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Worker => "Worker",
            Self::Melee => "Melee",
            Self::Ranged => "Ranged",
        }
    }
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Building types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BuildingKind {
    /// Main base; trains workers and receives deliveries.
    CommandCenter,
    /// Trains combat units.
    Barracks,
}

impl BuildingKind {
    /// All building kinds.
    pub const ALL: [Self; 2] = [Self::CommandCenter, Self::Barracks];

    /// Whether this building can train the given unit kind.
    #[must_use]
    pub const fn trains(self, unit: UnitKind) -> bool {
        match self {
            Self::CommandCenter => matches!(unit, UnitKind::Worker),
            Self::Barracks => unit.is_combat(),
        }
    }

    /// The building that trains a unit kind.
    #[must_use]
    pub const fn producer_of(unit: UnitKind) -> Self {
        match unit {
            UnitKind::Worker => Self::CommandCenter,
            UnitKind::Melee | UnitKind::Ranged => Self::Barracks,
        }
    }

    /// Display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::CommandCenter => "CommandCenter",
            Self::Barracks => "Barracks",
        }
    }
}

impl fmt::Display for BuildingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Gold carried by a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cargo {
    /// Gold currently held.
    pub carried: u32,
    /// Maximum gold held.
    pub capacity: u32,
}

impl Cargo {
    /// Empty cargo hold of the given capacity.
    #[must_use]
    pub const fn new(capacity: u32) -> Self {
        Self {
            carried: 0,
            capacity,
        }
    }

    /// Check if the hold is full.
    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.carried >= self.capacity
    }

    /// Check if the hold is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.carried == 0
    }

    /// Empty the hold, returning what it held.
    pub fn unload(&mut self) -> u32 {
        std::mem::take(&mut self.carried)
    }
}

/// Unit-specific state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Unit {
    /// Unit type.
    pub kind: UnitKind,
    /// Nominal movement speed.
    pub speed: u32,
    /// Damage per attack.
    pub attack: i32,
    /// Attack range (Manhattan tiles).
    pub range: i32,
    /// Ticks until the next attack is allowed.
    pub cooldown: u32,
    /// Tile the unit is walking to.
    pub move_target: Option<TilePos>,
    /// Resource tile the worker is assigned to.
    pub harvest: Option<TilePos>,
    /// Resource tile to go back to after a delivery.
    pub last_harvest: Option<TilePos>,
    /// Worker cargo; `None` for combat units.
    pub cargo: Option<Cargo>,
}

impl Unit {
    /// Build unit state from its stats. Workers get a cargo hold.
    #[must_use]
    pub fn from_stats(kind: UnitKind, stats: &UnitStats, carry_capacity: u32) -> Self {
        Self {
            kind,
            speed: stats.speed,
            attack: stats.attack,
            range: stats.range,
            cooldown: 0,
            move_target: None,
            harvest: None,
            last_harvest: None,
            cargo: (kind == UnitKind::Worker).then(|| Cargo::new(carry_capacity)),
        }
    }

    /// Gold carried (0 for non-workers).
    #[must_use]
    pub fn carried(&self) -> u32 {
        self.cargo.map_or(0, |c| c.carried)
    }

    /// Returns true if the unit follows an order of its own
    /// (a move target or a harvest assignment).
    #[must_use]
    pub const fn has_orders(&self) -> bool {
        self.move_target.is_some() || self.harvest.is_some()
    }
}

/// Building-specific state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Building {
    /// Building type.
    pub kind: BuildingKind,
    /// Footprint edge length.
    pub size: i32,
    /// Pending unit kinds; the head is in training.
    pub queue: VecDeque<UnitKind>,
    /// Ticks invested in the queue head.
    pub progress: u32,
}

impl Building {
    /// Build building state from its stats.
    #[must_use]
    pub fn from_stats(kind: BuildingKind, stats: &BuildingStats) -> Self {
        Self {
            kind,
            size: stats.size,
            queue: VecDeque::new(),
            progress: 0,
        }
    }
}

/// Variant-specific entity data.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    /// A mobile unit.
    Unit(Unit),
    /// A stationary building.
    Building(Building),
}

/// A unit or building in the world.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Entity {
    /// Unique identifier for this entity.
    pub id: EntityId,
    /// Owning faction.
    pub owner: FactionId,
    /// Tile position; the top-left footprint tile for buildings.
    pub pos: TilePos,
    /// Current hit points. Removed once this reaches zero or below.
    pub hp: i32,
    /// Maximum hit points.
    pub max_hp: i32,
    /// Unit or building data.
    pub kind: EntityKind,
}

impl Entity {
    /// Unit data, if this is a unit.
    #[must_use]
    pub const fn as_unit(&self) -> Option<&Unit> {
        match &self.kind {
            EntityKind::Unit(unit) => Some(unit),
            EntityKind::Building(_) => None,
        }
    }

    /// Mutable unit data, if this is a unit.
    pub fn as_unit_mut(&mut self) -> Option<&mut Unit> {
        match &mut self.kind {
            EntityKind::Unit(unit) => Some(unit),
            EntityKind::Building(_) => None,
        }
    }

    /// Building data, if this is a building.
    #[must_use]
    pub const fn as_building(&self) -> Option<&Building> {
        match &self.kind {
            EntityKind::Building(building) => Some(building),
            EntityKind::Unit(_) => None,
        }
    }

    /// Mutable building data, if this is a building.
    pub fn as_building_mut(&mut self) -> Option<&mut Building> {
        match &mut self.kind {
            EntityKind::Building(building) => Some(building),
            EntityKind::Unit(_) => None,
        }
    }

    /// Footprint edge length (1 for units).
    #[must_use]
    pub const fn size(&self) -> i32 {
        match &self.kind {
            EntityKind::Unit(_) => 1,
            EntityKind::Building(building) => building.size,
        }
    }

    /// Tiles this entity covers.
    pub fn footprint(&self) -> impl Iterator<Item = TilePos> {
        square(self.pos, self.size())
    }

    /// Returns true if the tile is part of this entity's footprint.
    #[must_use]
    pub const fn covers(&self, tile: TilePos) -> bool {
        let size = self.size();
        tile.x >= self.pos.x
            && tile.x < self.pos.x + size
            && tile.y >= self.pos.y
            && tile.y < self.pos.y + size
    }

    /// Reference point for targeting and range checks.
    ///
    /// Units use their tile; buildings use `(x + size/2, y + size/2)`.
    #[must_use]
    pub const fn center(&self) -> TilePos {
        let half = self.size() / 2;
        self.pos.offset(half, half)
    }

    /// Returns true once hit points have fallen to zero or below.
    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.hp <= 0
    }

    /// Kind name, e.g. "Worker" or "Barracks".
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match &self.kind {
            EntityKind::Unit(unit) => unit.kind.name(),
            EntityKind::Building(building) => building.kind.name(),
        }
    }
}
