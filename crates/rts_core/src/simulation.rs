//! Core simulation loop.
//!
//! [`Simulation`] owns the world, the scripted controllers and the systems,
//! and advances them in a fixed order each tick:
//!
//! 1. scripted controllers (on their thinking ticks)
//! 2. economy
//! 3. production
//! 4. combat & movement
//! 5. match outcome check, then the tick counter increments
//!
//! # Determinism
//!
//! Given the same rules, seeds and command sequence, two simulations produce
//! identical states:
//! - map generation and opponent decisions use separately seeded generators
//! - entities are processed in ascending id order
//! - no wall-clock time enters the world; [`TickClock`] only decides *when*
//!   to step
//!
//! # Example
//!
//! ```
//! use rts_core::prelude::*;
//!
//! let mut sim = Simulation::new(GameRules::default(), 7).unwrap();
//! let outcome = sim.apply_command(
//!     FactionId::Player,
//!     &PlayerCommand::Train { building: BuildingKind::CommandCenter, unit: UnitKind::Worker },
//! );
//! assert!(outcome.success);
//!
//! sim.step();
//! assert_eq!(sim.tick(), 1);
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::commands::{self, CommandOutcome, PlayerCommand};
use crate::error::Result;
use crate::event_log::{GameEvent, LogRecord, MatchSummary};
use crate::factions::FactionId;
use crate::opponent::OpponentController;
use crate::rules::GameRules;
use crate::snapshot::WorldSnapshot;
use crate::systems::{default_systems, System};
use crate::world::World;

/// Seed offset for a scripted player so it does not mirror the opponent's rolls.
const SCRIPTED_PLAYER_SEED_OFFSET: u64 = 0x5EED_0F_9A3E;

/// How the match stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchOutcome {
    /// Both sides still own a Command Center.
    #[default]
    InProgress,
    /// Only this faction still owns a Command Center.
    Victory(FactionId),
    /// Both Command Centers fell on the same tick.
    Draw,
}

impl MatchOutcome {
    /// Returns true once the match has been decided.
    #[must_use]
    pub const fn is_decided(self) -> bool {
        !matches!(self, Self::InProgress)
    }

    /// The winner, if there is one.
    #[must_use]
    pub const fn winner(self) -> Option<FactionId> {
        match self {
            Self::Victory(faction) => Some(faction),
            Self::InProgress | Self::Draw => None,
        }
    }
}

/// Everything that happened during one step.
#[derive(Debug, Clone, Default)]
pub struct TickEvents {
    /// Tick counter after the step.
    pub tick: u64,
    /// Log records written during the step.
    pub events: Vec<LogRecord>,
    /// Outcomes of commands issued by scripted controllers.
    pub commands: Vec<CommandOutcome>,
}

/// Fixed-timestep driver.
///
/// Fed monotonically increasing timestamps, it reports that a step is due
/// once at least one period has elapsed since the last step, then takes the
/// current timestamp as the new reference. Leftover time is discarded, so a
/// slow caller runs slower rather than catching up in bursts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickClock {
    period: Duration,
    last: Option<Duration>,
}

impl TickClock {
    /// Create a clock stepping every `period`.
    #[must_use]
    pub const fn new(period: Duration) -> Self {
        Self { period, last: None }
    }

    /// Step period.
    #[must_use]
    pub const fn period(&self) -> Duration {
        self.period
    }

    /// Check whether a step is due at `now`.
    ///
    /// The first poll only records the reference time.
    pub fn poll(&mut self, now: Duration) -> bool {
        let Some(last) = self.last else {
            self.last = Some(now);
            return false;
        };
        if now.saturating_sub(last) >= self.period {
            self.last = Some(now);
            true
        } else {
            false
        }
    }
}

/// The core game simulation.
///
/// Owns all game state. Commands from outside are applied between steps
/// through [`apply_command`](Self::apply_command); nothing else mutates the
/// world.
#[derive(Debug)]
pub struct Simulation {
    world: World,
    opponent: OpponentController,
    scripted_player: Option<OpponentController>,
    systems: Vec<Box<dyn System>>,
    outcome: MatchOutcome,
    clock: TickClock,
}

impl Simulation {
    /// Start a new session; the seed drives both the map and the opponent.
    pub fn new(rules: GameRules, seed: u64) -> Result<Self> {
        Self::with_seeds(rules, seed, seed)
    }

    /// Start a new session with separate map and opponent seeds.
    pub fn with_seeds(rules: GameRules, map_seed: u64, opponent_seed: u64) -> Result<Self> {
        let world = World::new_session(rules, map_seed)?;
        tracing::info!(map_seed, opponent_seed, "Simulation started");
        Ok(Self::from_world(world, opponent_seed))
    }

    /// Drive an already built world, e.g. a hand-made scenario.
    #[must_use]
    pub fn from_world(world: World, opponent_seed: u64) -> Self {
        let clock = TickClock::new(world.rules().tick_period());
        Self {
            world,
            opponent: OpponentController::new(FactionId::Opponent, opponent_seed),
            scripted_player: None,
            systems: default_systems(),
            outcome: MatchOutcome::InProgress,
            clock,
        }
    }

    /// Let the scripted policy play the player side too.
    #[must_use]
    pub fn with_scripted_player(mut self, seed: u64) -> Self {
        self.scripted_player = Some(OpponentController::new(
            FactionId::Player,
            seed.wrapping_add(SCRIPTED_PLAYER_SEED_OFFSET),
        ));
        self
    }

    /// Current tick.
    #[must_use]
    pub const fn tick(&self) -> u64 {
        self.world.tick()
    }

    /// Read access to the world.
    #[must_use]
    pub const fn world(&self) -> &World {
        &self.world
    }

    /// Mutable access to the world, for setting up scenarios.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// How the match stands.
    #[must_use]
    pub const fn outcome(&self) -> MatchOutcome {
        self.outcome
    }

    /// Apply an external command between steps.
    pub fn apply_command(&mut self, faction: FactionId, command: &PlayerCommand) -> CommandOutcome {
        commands::apply(&mut self.world, faction, command)
    }

    /// Advance the simulation by one tick.
    ///
    /// Returns the log records and scripted command outcomes of the step.
    pub fn step(&mut self) -> TickEvents {
        let log_start = self.world.log().len();

        let mut issued = Vec::new();
        if let Some(player) = self.scripted_player.as_mut() {
            issued.extend(player.think(&mut self.world));
        }
        issued.extend(self.opponent.think(&mut self.world));

        for system in &mut self.systems {
            system.advance(&mut self.world);
        }

        self.update_outcome();
        self.world.advance_tick();

        #[cfg(debug_assertions)]
        {
            let hash = self.world.state_hash();
            tracing::trace!(tick = self.world.tick(), state_hash = hash, "Simulation state hash");
        }

        #[cfg(feature = "debug-validation")]
        {
            for problem in self.world.consistency_problems() {
                tracing::error!(tick = self.world.tick(), %problem, "World inconsistency");
            }
        }

        TickEvents {
            tick: self.world.tick(),
            events: self.world.log().since(log_start).to_vec(),
            commands: issued,
        }
    }

    /// Run a fixed number of steps.
    pub fn run(&mut self, ticks: u64) -> MatchOutcome {
        for _ in 0..ticks {
            self.step();
        }
        self.outcome
    }

    /// Step until the match is decided or `max_ticks` steps have run.
    pub fn run_until_decided(&mut self, max_ticks: u64) -> MatchOutcome {
        for _ in 0..max_ticks {
            if self.outcome.is_decided() {
                break;
            }
            self.step();
        }
        self.outcome
    }

    /// Real-time driver: step if a period has elapsed since the last step.
    ///
    /// Runs at most one step per call, however late the caller is.
    pub fn advance_to(&mut self, now: Duration) -> Option<TickEvents> {
        self.clock.poll(now).then(|| self.step())
    }

    /// The exported match summary.
    #[must_use]
    pub fn summary(&self) -> MatchSummary {
        self.world.summary()
    }

    /// Renderable copy of the world.
    #[must_use]
    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot::capture(&self.world)
    }

    /// Hash of the world state, for determinism checks.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        self.world.state_hash()
    }

    fn update_outcome(&mut self) {
        if self.outcome.is_decided() {
            return;
        }
        let outcome = match (
            self.world.has_command_center(FactionId::Player),
            self.world.has_command_center(FactionId::Opponent),
        ) {
            (true, true) => return,
            (true, false) => MatchOutcome::Victory(FactionId::Player),
            (false, true) => MatchOutcome::Victory(FactionId::Opponent),
            (false, false) => MatchOutcome::Draw,
        };

        self.outcome = outcome;
        self.world.record(GameEvent::MatchOver {
            winner: outcome.winner(),
        });
        tracing::info!(tick = self.world.tick(), ?outcome, "Match over");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{BuildingKind, UnitKind};

    #[test]
    fn test_step_increments_tick() {
        let mut sim = Simulation::new(GameRules::default(), 1).unwrap();
        let events = sim.step();
        assert_eq!(events.tick, 1);
        assert_eq!(sim.tick(), 1);
    }

    #[test]
    fn test_clock_first_poll_sets_reference() {
        let mut clock = TickClock::new(Duration::from_millis(50));
        assert!(!clock.poll(Duration::from_millis(1000)));
        assert!(!clock.poll(Duration::from_millis(1049)));
        assert!(clock.poll(Duration::from_millis(1050)));
        assert!(!clock.poll(Duration::from_millis(1060)));
        // remainder discarded
        assert!(clock.poll(Duration::from_millis(1400)));
        assert!(!clock.poll(Duration::from_millis(1449)));
    }

    #[test]
    fn test_advance_to_steps_at_most_once() {
        let mut sim = Simulation::new(GameRules::default(), 1).unwrap();
        assert!(sim.advance_to(Duration::ZERO).is_none());
        assert!(sim.advance_to(Duration::from_secs(10)).is_some());
        assert_eq!(sim.tick(), 1);
    }

    #[test]
    fn test_destroying_command_center_ends_match() {
        let mut sim = Simulation::new(GameRules::default(), 2).unwrap();
        let cc = sim
            .world()
            .find_building(FactionId::Opponent, BuildingKind::CommandCenter)
            .unwrap()
            .id;
        sim.world_mut().entity_mut(cc).unwrap().hp = 1;
        let attacker = sim
            .world_mut()
            .spawn_unit(UnitKind::Ranged, FactionId::Player, crate::grid::TilePos::new(18, 0))
            .unwrap();
        assert!(sim.world().entity(attacker).is_some());

        let events = sim.step();
        assert_eq!(sim.outcome(), MatchOutcome::Victory(FactionId::Player));
        assert!(events
            .events
            .iter()
            .any(|r| r.event == GameEvent::MatchOver { winner: Some(FactionId::Player) }));

        let before = sim.world().log().len();
        sim.run(5);
        assert_eq!(sim.outcome(), MatchOutcome::Victory(FactionId::Player));
        let match_overs = sim
            .world()
            .log()
            .since(before)
            .iter()
            .filter(|r| matches!(r.event, GameEvent::MatchOver { .. }))
            .count();
        assert_eq!(match_overs, 0);
    }

    #[test]
    fn test_summary_tracks_tick() {
        let mut sim = Simulation::new(GameRules::default(), 4).unwrap();
        sim.run(3);
        let summary = sim.summary();
        assert_eq!(summary.version, "0.1");
        assert_eq!(summary.tick, 3);
    }
}
