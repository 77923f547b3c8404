//! # RTS Core
//!
//! Deterministic simulation core for a two-faction tile RTS.
//!
//! This crate contains **only** simulation logic:
//! - No rendering
//! - No input devices
//! - No transport (the match summary is handed out as a value)
//! - No wall-clock time inside the world
//!
//! This separation enables:
//! - Headless drivers and batch runs
//! - Scripted and human players on equal terms
//! - Determinism testing
//!
//! ## Crate Structure
//!
//! - [`world`] - Authoritative state: grid, entities, ledgers, UI state
//! - [`components`] - Entity definitions
//! - [`systems`] - The per-tick [`System`](systems::System) trait
//! - [`economy`], [`production`], [`combat`] - The three systems
//! - [`commands`] - Command layer shared by players and the opponent
//! - [`opponent`] - Scripted opponent policy
//! - [`simulation`] - Tick scheduler
//! - [`rules`] - Tunable constants, loadable from RON

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod combat;
pub mod commands;
pub mod components;
pub mod economy;
pub mod error;
pub mod event_log;
pub mod factions;
pub mod grid;
pub mod movement;
pub mod opponent;
pub mod production;
pub mod rules;
pub mod simulation;
pub mod snapshot;
pub mod systems;
pub mod world;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::commands::{CommandError, CommandOutcome, PlayerCommand};
    pub use crate::components::{
        Building, BuildingKind, Cargo, Entity, EntityId, EntityKind, Unit, UnitKind,
    };
    pub use crate::error::{GameError, PlacementError, Result};
    pub use crate::event_log::{GameEvent, LogRecord, MatchSummary};
    pub use crate::factions::FactionId;
    pub use crate::grid::{Tile, TileGrid, TilePos};
    pub use crate::rules::GameRules;
    pub use crate::simulation::{MatchOutcome, Simulation, TickClock, TickEvents};
    pub use crate::snapshot::WorldSnapshot;
    pub use crate::world::{InteractionMode, Ledger, World};
}
