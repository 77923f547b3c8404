//! Authoritative world state.
//!
//! [`World`] owns the tile grid, the entity table, the per-faction ledgers,
//! UI selection state, the event log and the map generator. Every mutation
//! that touches both tiles and entities goes through a method here so the
//! two can never disagree: a building always owns exactly `size²` Blocked
//! tiles, and removing it frees them in the same call.
//!
//! # Determinism
//!
//! Entities live in a `BTreeMap` keyed by [`EntityId`], so every iteration
//! is in ascending id order. Systems snapshot id lists before mutating.

use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, BTreeSet};
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::components::{Building, BuildingKind, Entity, EntityId, EntityKind, Unit, UnitKind};
use crate::error::{PlacementError, Result};
use crate::event_log::{EventLog, GameEvent, GoldSummary, MatchSummary, SUMMARY_VERSION};
use crate::factions::FactionId;
use crate::grid::{square, Tile, TileGrid, TilePos};
use crate::rules::GameRules;

/// A faction's gold account.
///
/// Tracks lifetime totals so `gold == starting + earned - spent` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Ledger {
    gold: u32,
    earned: u32,
    spent: u32,
}

impl Ledger {
    /// Create a ledger with an opening balance.
    #[must_use]
    pub const fn new(gold: u32) -> Self {
        Self {
            gold,
            earned: 0,
            spent: 0,
        }
    }

    /// Current balance.
    #[must_use]
    pub const fn gold(&self) -> u32 {
        self.gold
    }

    /// Total gold ever credited.
    #[must_use]
    pub const fn earned(&self) -> u32 {
        self.earned
    }

    /// Total gold ever spent.
    #[must_use]
    pub const fn spent(&self) -> u32 {
        self.spent
    }

    /// Check if a cost can be paid.
    #[must_use]
    pub const fn can_afford(&self, cost: u32) -> bool {
        self.gold >= cost
    }

    /// Credit delivered gold.
    pub fn credit(&mut self, amount: u32) {
        self.gold += amount;
        self.earned += amount;
    }

    /// Spend gold if available.
    ///
    /// Returns true if the transaction succeeded; the balance is untouched
    /// otherwise.
    pub fn try_spend(&mut self, cost: u32) -> bool {
        if self.can_afford(cost) {
            self.gold -= cost;
            self.spent += cost;
            true
        } else {
            false
        }
    }
}

/// What a click on the map means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionMode {
    /// Clicks select.
    #[default]
    Default,
    /// The next click places this building.
    PlacingBuilding(BuildingKind),
}

/// Selection and interaction mode of the local player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct UiState {
    /// Currently selected entity.
    pub selected: Option<EntityId>,
    /// Current click mode.
    pub mode: InteractionMode,
}

/// Deterministic generator for map layout.
///
/// Seeded once per session. Decision-making randomness lives elsewhere so
/// opponent rolls never perturb the map.
#[derive(Debug, Clone)]
pub struct WorldRng {
    state: u64,
}

impl WorldRng {
    /// Create a generator from a seed.
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self {
            state: seed.wrapping_add(0x9E37_79B9_7F4A_7C15),
        }
    }

    /// Next raw value.
    pub fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        self.state >> 33
    }

    /// Uniform value in `0..bound` (`bound` must be positive).
    pub fn next_below(&mut self, bound: i32) -> i32 {
        debug_assert!(bound > 0);
        (self.next_u64() % bound.max(1) as u64) as i32
    }
}

/// The whole simulation state.
#[derive(Debug, Clone)]
pub struct World {
    rules: GameRules,
    seed: u64,
    tick: u64,
    grid: TileGrid,
    entities: BTreeMap<EntityId, Entity>,
    unit_ids: BTreeSet<EntityId>,
    building_ids: BTreeSet<EntityId>,
    next_id: u32,
    ledgers: [Ledger; 2],
    ui: UiState,
    log: EventLog,
    rng: WorldRng,
}

impl World {
    /// Create a blank world: empty grid, no entities, opening balances.
    ///
    /// # Panics
    ///
    /// Panics if the rules' grid dimensions are not positive; validated
    /// rules never are.
    #[must_use]
    pub fn empty(rules: GameRules, seed: u64) -> Self {
        let grid = TileGrid::new(rules.grid_width, rules.grid_height);
        let ledger = Ledger::new(rules.starting_gold);
        Self {
            rules,
            seed,
            tick: 0,
            grid,
            entities: BTreeMap::new(),
            unit_ids: BTreeSet::new(),
            building_ids: BTreeSet::new(),
            next_id: 1,
            ledgers: [ledger; 2],
            ui: UiState::default(),
            log: EventLog::new(),
            rng: WorldRng::new(seed),
        }
    }

    /// Create a fresh match: scattered resources, one Command Center and one
    /// Worker per faction in opposite corners.
    ///
    /// The player base sits bottom-left, the opponent base top-right.
    pub fn new_session(rules: GameRules, seed: u64) -> Result<Self> {
        rules.validate()?;
        let mut world = Self::empty(rules, seed);
        world.scatter_resources();

        let (w, h) = (world.grid.width(), world.grid.height());
        world.spawn_building(
            BuildingKind::CommandCenter,
            FactionId::Player,
            TilePos::new(1, h - 3),
        )?;
        world.spawn_building(
            BuildingKind::CommandCenter,
            FactionId::Opponent,
            TilePos::new(w - 3, 1),
        )?;
        world.spawn_unit(UnitKind::Worker, FactionId::Player, TilePos::new(3, h - 3))?;
        world.spawn_unit(UnitKind::Worker, FactionId::Opponent, TilePos::new(w - 4, 3))?;

        tracing::debug!(
            seed,
            resources = world.grid.count(Tile::Resource),
            "Session created"
        );
        Ok(world)
    }

    fn scatter_resources(&mut self) {
        let (w, h) = (self.grid.width(), self.grid.height());
        let clearance = self.rules.base_clearance;
        for _ in 0..self.rules.resource_scatter_attempts {
            let pos = TilePos::new(self.rng.next_below(w), self.rng.next_below(h));
            let player_corner = pos.x < clearance && pos.y >= h - clearance;
            let opponent_corner = pos.x >= w - clearance && pos.y < clearance;
            if player_corner || opponent_corner {
                continue;
            }
            if self.grid.get(pos) == Tile::Empty {
                self.grid.set(pos, Tile::Resource);
            }
        }
    }

    // ------------------------------------------------------------------
    // Read access
    // ------------------------------------------------------------------

    /// The rules this world runs under.
    #[must_use]
    pub const fn rules(&self) -> &GameRules {
        &self.rules
    }

    /// Seed the map was generated from.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Current tick.
    #[must_use]
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// The tile grid.
    #[must_use]
    pub const fn grid(&self) -> &TileGrid {
        &self.grid
    }

    /// Tile at a position; Blocked outside the grid.
    #[must_use]
    pub fn tile(&self, pos: TilePos) -> Tile {
        self.grid.get(pos)
    }

    /// Look up an entity.
    #[must_use]
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Look up an entity mutably.
    ///
    /// Moving a building or changing its size through this reference breaks
    /// tile bookkeeping; use it for unit orders, hit points and queues.
    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    /// All entities in ascending id order.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    /// Number of live entities.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Live unit ids in ascending order.
    #[must_use]
    pub fn unit_ids(&self) -> Vec<EntityId> {
        self.unit_ids.iter().copied().collect()
    }

    /// Live building ids in ascending order.
    #[must_use]
    pub fn building_ids(&self) -> Vec<EntityId> {
        self.building_ids.iter().copied().collect()
    }

    /// All units in ascending id order.
    pub fn units(&self) -> impl Iterator<Item = &Entity> {
        self.unit_ids.iter().filter_map(|id| self.entities.get(id))
    }

    /// All buildings in ascending id order.
    pub fn buildings(&self) -> impl Iterator<Item = &Entity> {
        self.building_ids
            .iter()
            .filter_map(|id| self.entities.get(id))
    }

    /// Lowest-id building of a faction and kind.
    #[must_use]
    pub fn find_building(&self, owner: FactionId, kind: BuildingKind) -> Option<&Entity> {
        self.buildings().find(|entity| {
            entity.owner == owner && entity.as_building().is_some_and(|b| b.kind == kind)
        })
    }

    /// Count a faction's units of a kind.
    #[must_use]
    pub fn count_units(&self, owner: FactionId, kind: UnitKind) -> usize {
        self.units()
            .filter(|entity| {
                entity.owner == owner && entity.as_unit().is_some_and(|u| u.kind == kind)
            })
            .count()
    }

    /// Count a unit kind waiting in a faction's production queues.
    #[must_use]
    pub fn count_queued(&self, owner: FactionId, kind: UnitKind) -> usize {
        self.buildings()
            .filter(|entity| entity.owner == owner)
            .filter_map(Entity::as_building)
            .map(|b| b.queue.iter().filter(|&&queued| queued == kind).count())
            .sum()
    }

    /// Returns true while the faction still owns a Command Center.
    #[must_use]
    pub fn has_command_center(&self, owner: FactionId) -> bool {
        self.find_building(owner, BuildingKind::CommandCenter)
            .is_some()
    }

    /// The faction's Command Center closest to a tile (Manhattan distance to
    /// its anchor, lowest id on ties).
    #[must_use]
    pub fn nearest_command_center(&self, owner: FactionId, from: TilePos) -> Option<&Entity> {
        self.buildings()
            .filter(|entity| {
                entity.owner == owner
                    && entity
                        .as_building()
                        .is_some_and(|b| b.kind == BuildingKind::CommandCenter)
            })
            .min_by_key(|entity| (from.manhattan(entity.pos), entity.id))
    }

    /// The building whose footprint covers a tile.
    #[must_use]
    pub fn building_at(&self, pos: TilePos) -> Option<&Entity> {
        self.buildings().find(|entity| entity.covers(pos))
    }

    /// Returns true if any unit stands on the tile.
    #[must_use]
    pub fn is_occupied_by_unit(&self, pos: TilePos) -> bool {
        self.units().any(|entity| entity.pos == pos)
    }

    /// A faction's ledger.
    #[must_use]
    pub const fn ledger(&self, faction: FactionId) -> &Ledger {
        &self.ledgers[faction.index()]
    }

    /// A faction's ledger, mutably.
    pub fn ledger_mut(&mut self, faction: FactionId) -> &mut Ledger {
        &mut self.ledgers[faction.index()]
    }

    /// Selection and interaction mode.
    #[must_use]
    pub const fn ui(&self) -> &UiState {
        &self.ui
    }

    /// Selection and interaction mode, mutably.
    pub fn ui_mut(&mut self) -> &mut UiState {
        &mut self.ui
    }

    /// The event log.
    #[must_use]
    pub const fn log(&self) -> &EventLog {
        &self.log
    }

    /// Append an event stamped with the current tick.
    pub fn record(&mut self, event: GameEvent) {
        self.log.push(self.tick, event);
    }

    /// Build the exported summary: version, trailing events, gold, tick.
    #[must_use]
    pub fn summary(&self) -> MatchSummary {
        MatchSummary {
            version: SUMMARY_VERSION.to_string(),
            events: self.log.recent(self.rules.event_log_capacity).to_vec(),
            gold: GoldSummary {
                player: self.ledger(FactionId::Player).gold(),
                opponent: self.ledger(FactionId::Opponent).gold(),
            },
            tick: self.tick,
        }
    }

    // ------------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------------

    pub(crate) fn advance_tick(&mut self) {
        self.tick += 1;
    }

    /// Overwrite a terrain tile.
    ///
    /// Tiles under a building belong to that building and cannot be
    /// rewritten; destroy the building instead.
    pub fn set_tile(&mut self, pos: TilePos, tile: Tile) -> std::result::Result<(), PlacementError> {
        if !self.grid.in_bounds(pos) {
            return Err(PlacementError::OutOfBounds);
        }
        if self.building_at(pos).is_some() {
            return Err(PlacementError::SpaceBlocked);
        }
        self.grid.set(pos, tile);
        Ok(())
    }

    /// Check whether a building of the given kind fits at an anchor:
    /// footprint in bounds, every tile Empty and free of units.
    pub fn check_footprint(
        &self,
        kind: BuildingKind,
        anchor: TilePos,
    ) -> std::result::Result<(), PlacementError> {
        let size = self.rules.building(kind).size;
        if !self.grid.square_in_bounds(anchor, size) {
            return Err(PlacementError::OutOfBounds);
        }
        let blocked = square(anchor, size)
            .any(|pos| self.grid.get(pos) != Tile::Empty || self.is_occupied_by_unit(pos));
        if blocked {
            return Err(PlacementError::SpaceBlocked);
        }
        Ok(())
    }

    fn allocate_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Spawn a building and mark its footprint Blocked.
    pub fn spawn_building(
        &mut self,
        kind: BuildingKind,
        owner: FactionId,
        anchor: TilePos,
    ) -> std::result::Result<EntityId, PlacementError> {
        self.check_footprint(kind, anchor)?;

        let stats = *self.rules.building(kind);
        let id = self.allocate_id();
        for pos in square(anchor, stats.size) {
            self.grid.set(pos, Tile::Blocked);
        }
        self.entities.insert(
            id,
            Entity {
                id,
                owner,
                pos: anchor,
                hp: stats.hp,
                max_hp: stats.hp,
                kind: EntityKind::Building(Building::from_stats(kind, &stats)),
            },
        );
        self.building_ids.insert(id);

        tracing::debug!(%id, %kind, %owner, %anchor, "Building spawned");
        Ok(id)
    }

    /// Spawn a unit on a walkable tile.
    pub fn spawn_unit(
        &mut self,
        kind: UnitKind,
        owner: FactionId,
        pos: TilePos,
    ) -> std::result::Result<EntityId, PlacementError> {
        if !self.grid.in_bounds(pos) {
            return Err(PlacementError::OutOfBounds);
        }
        if !self.grid.is_walkable(pos) {
            return Err(PlacementError::SpaceBlocked);
        }

        let stats = *self.rules.unit(kind);
        let id = self.allocate_id();
        self.entities.insert(
            id,
            Entity {
                id,
                owner,
                pos,
                hp: stats.hp,
                max_hp: stats.hp,
                kind: EntityKind::Unit(Unit::from_stats(kind, &stats, self.rules.carry_capacity)),
            },
        );
        self.unit_ids.insert(id);

        tracing::debug!(%id, %kind, %owner, %pos, "Unit spawned");
        Ok(id)
    }

    /// Tiles a building may release a unit onto, in priority order:
    /// east, west, south, north of the footprint.
    #[must_use]
    pub fn spawn_candidates(building: &Entity) -> [TilePos; 4] {
        let size = building.size();
        let p = building.pos;
        [
            p.offset(size, 0),
            p.offset(-1, 0),
            p.offset(0, size),
            p.offset(0, -1),
        ]
    }

    /// Spawn a unit next to a building on the first free candidate tile
    /// (in bounds, Empty, no unit standing there) and log it.
    ///
    /// Returns `None` when the building is gone or every candidate is taken.
    pub fn spawn_adjacent(&mut self, building: EntityId, kind: UnitKind) -> Option<EntityId> {
        let source = self.entities.get(&building)?;
        let owner = source.owner;
        let spot = Self::spawn_candidates(source).into_iter().find(|&pos| {
            self.grid.in_bounds(pos)
                && self.grid.get(pos) == Tile::Empty
                && !self.is_occupied_by_unit(pos)
        })?;

        let id = self.spawn_unit(kind, owner, spot).ok()?;
        self.record(GameEvent::Spawn {
            owner,
            unit: kind,
            x: spot.x,
            y: spot.y,
        });
        Some(id)
    }

    /// Remove an entity, freeing a building's tiles and dropping it from the
    /// selection.
    pub fn remove_entity(&mut self, id: EntityId) -> Option<Entity> {
        let entity = self.entities.remove(&id)?;
        match &entity.kind {
            EntityKind::Unit(_) => {
                self.unit_ids.remove(&id);
            }
            EntityKind::Building(_) => {
                for pos in entity.footprint() {
                    self.grid.set(pos, Tile::Empty);
                }
                self.building_ids.remove(&id);
            }
        }
        if self.ui.selected == Some(id) {
            self.ui.selected = None;
        }
        Some(entity)
    }

    // ------------------------------------------------------------------
    // Diagnostics
    // ------------------------------------------------------------------

    /// Calculate a hash of the current simulation state.
    ///
    /// Two worlds with identical state produce identical hashes.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.tick.hash(&mut hasher);
        self.grid.tiles().hash(&mut hasher);

        self.entities.len().hash(&mut hasher);
        for entity in self.entities.values() {
            entity.hash(&mut hasher);
        }

        self.ledgers.hash(&mut hasher);
        self.log.len().hash(&mut hasher);

        hasher.finish()
    }

    /// Check tile/entity bookkeeping.
    ///
    /// Returns a list of problems (empty if consistent).
    #[must_use]
    pub fn consistency_problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        let mut owned = BTreeSet::new();

        for building in self.buildings() {
            for pos in building.footprint() {
                if self.grid.get(pos) != Tile::Blocked {
                    problems.push(format!("{} tile {pos} is not Blocked", building.id));
                }
                if !owned.insert(pos) {
                    problems.push(format!("{} overlaps another footprint at {pos}", building.id));
                }
            }
        }

        for pos in self.grid.positions() {
            if self.grid.get(pos) == Tile::Blocked && !owned.contains(&pos) {
                problems.push(format!("tile {pos} is Blocked without a building"));
            }
        }

        for unit in self.units() {
            if !self.grid.in_bounds(unit.pos) {
                problems.push(format!("{} is out of bounds at {}", unit.id, unit.pos));
            }
        }

        if self.unit_ids.len() + self.building_ids.len() != self.entities.len() {
            problems.push("index sets disagree with the entity table".to_string());
        }

        problems
    }
}
