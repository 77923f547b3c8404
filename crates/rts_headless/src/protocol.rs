//! JSON protocol for headless match control.
//!
//! The runner communicates via JSON lines (one JSON object per line):
//!
//! **Input (stdin):** commands from the controller
//! **Output (stdout):** responses, one or more per command
//!
//! # Protocol Flow
//!
//! 1. Runner starts, outputs `{"type":"ready","version":"0.1","tick":0}`
//! 2. The controller sends commands as JSON lines
//! 3. Gameplay commands answer with an `outcome` (the command layer's
//!    `success`/`message` pair); `step` answers with the tick's events
//! 4. When a side loses its last Command Center the runner emits `game_over`
//!
//! # Example Session
//!
//! ```text
//! <- {"type":"ready","version":"0.1","tick":0}
//! -> {"cmd":"train","building":"CommandCenter","unit":"Worker"}
//! <- {"type":"outcome","cmd":"train","success":true,"message":"Worker queued"}
//! -> {"cmd":"step","count":60}
//! <- {"type":"stepped","tick":60,"events":[{"t":59,"type":"spawn","payload":{...}}],"outcome":"in_progress"}
//! -> {"cmd":"select","x":3,"y":17}
//! <- {"type":"outcome","cmd":"select","success":true,"message":"Selected Worker 3"}
//! -> {"cmd":"query"}
//! <- {"type":"state","hash":...,"outcome":"in_progress","world":{...}}
//! ```

use serde::{Deserialize, Serialize};

use rts_core::commands::{CommandOutcome, PlayerCommand};
use rts_core::components::{BuildingKind, EntityId, UnitKind};
use rts_core::event_log::{LogRecord, MatchSummary, SUMMARY_VERSION};
use rts_core::factions::FactionId;
use rts_core::simulation::MatchOutcome;
use rts_core::snapshot::WorldSnapshot;

// ============================================================================
// Input Commands (controller -> runner)
// ============================================================================

/// Commands that can be sent to the headless runner.
///
/// Gameplay commands act for the player faction unless `faction` says
/// otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Command {
    /// Advance the simulation by N ticks (default: 1).
    Step {
        #[serde(default = "default_step_count")]
        count: u32,
    },

    /// Current world state without advancing time.
    Query,

    /// Select whatever occupies a tile.
    Select {
        x: i32,
        y: i32,
        #[serde(default)]
        faction: Option<FactionId>,
    },

    /// Order the selected unit to a tile.
    Order {
        x: i32,
        y: i32,
        #[serde(default)]
        faction: Option<FactionId>,
    },

    /// Order a specific unit to a tile.
    OrderUnit {
        unit: EntityId,
        x: i32,
        y: i32,
        #[serde(default)]
        faction: Option<FactionId>,
    },

    /// Construct a building with its anchor on a tile.
    Place {
        building: BuildingKind,
        x: i32,
        y: i32,
        #[serde(default)]
        faction: Option<FactionId>,
    },

    /// Queue a unit at the faction's first building of a kind.
    Train {
        building: BuildingKind,
        unit: UnitKind,
        #[serde(default)]
        faction: Option<FactionId>,
    },

    /// Dispatch a click through the interaction mode.
    Click {
        x: i32,
        y: i32,
        #[serde(default)]
        faction: Option<FactionId>,
    },

    /// Arm building placement for the next click.
    BeginPlacement { building: BuildingKind },

    /// Return to the default interaction mode.
    CancelPlacement,

    /// The exported match summary.
    Summary,

    /// State hash for determinism verification.
    Hash,

    /// Quit the session.
    Quit,
}

fn default_step_count() -> u32 {
    1
}

// ============================================================================
// Output Responses (runner -> controller)
// ============================================================================

/// Responses sent from the headless runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Runner is ready to accept commands.
    Ready { version: String, tick: u64 },

    /// Result of a gameplay command.
    Outcome {
        cmd: String,
        success: bool,
        message: String,
    },

    /// Steps were run.
    Stepped {
        tick: u64,
        events: Vec<LogRecord>,
        outcome: MatchOutcome,
    },

    /// Current world state.
    State {
        hash: u64,
        outcome: MatchOutcome,
        world: WorldSnapshot,
    },

    /// The exported match summary.
    Summary { summary: MatchSummary },

    /// State hash for determinism verification.
    StateHash { tick: u64, hash: u64 },

    /// The match has been decided.
    GameOver {
        outcome: MatchOutcome,
        winner: Option<FactionId>,
        tick: u64,
    },

    /// Error processing a line.
    Error {
        message: String,
        cmd: Option<String>,
    },

    /// Goodbye message before shutdown.
    Bye,
}

// ============================================================================
// Helpers
// ============================================================================

impl Response {
    /// Create a ready response.
    pub fn ready(tick: u64) -> Self {
        Self::Ready {
            version: SUMMARY_VERSION.to_string(),
            tick,
        }
    }

    /// Wrap a command-layer outcome.
    pub fn outcome(cmd: &str, outcome: CommandOutcome) -> Self {
        Self::Outcome {
            cmd: cmd.to_string(),
            success: outcome.success,
            message: outcome.message,
        }
    }

    /// Create a game-over notice.
    pub fn game_over(outcome: MatchOutcome, tick: u64) -> Self {
        Self::GameOver {
            outcome,
            winner: outcome.winner(),
            tick,
        }
    }

    /// Create an error response.
    pub fn error(message: impl Into<String>, cmd: Option<&str>) -> Self {
        Self::Error {
            message: message.into(),
            cmd: cmd.map(String::from),
        }
    }

    /// Serialize to JSON line (with newline).
    pub fn to_json_line(&self) -> String {
        let mut json = serde_json::to_string(self).unwrap_or_else(|e| {
            format!(
                r#"{{"type":"error","message":"Serialization failed: {}"}}"#,
                e
            )
        });
        json.push('\n');
        json
    }
}

impl Command {
    /// Parse from a JSON line.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Get command name for responses.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Step { .. } => "step",
            Self::Query => "query",
            Self::Select { .. } => "select",
            Self::Order { .. } => "order",
            Self::OrderUnit { .. } => "order_unit",
            Self::Place { .. } => "place",
            Self::Train { .. } => "train",
            Self::Click { .. } => "click",
            Self::BeginPlacement { .. } => "begin_placement",
            Self::CancelPlacement => "cancel_placement",
            Self::Summary => "summary",
            Self::Hash => "hash",
            Self::Quit => "quit",
        }
    }

    /// The command-layer call this maps to, with the issuing faction.
    ///
    /// Returns `None` for session commands (step, query, ...).
    pub fn to_player_command(&self) -> Option<(FactionId, PlayerCommand)> {
        let acting = |faction: &Option<FactionId>| faction.unwrap_or(FactionId::Player);
        let mapped = match self {
            Self::Select { x, y, faction } => {
                (acting(faction), PlayerCommand::Select { x: *x, y: *y })
            }
            Self::Order { x, y, faction } => {
                (acting(faction), PlayerCommand::Order { x: *x, y: *y })
            }
            Self::OrderUnit { unit, x, y, faction } => (
                acting(faction),
                PlayerCommand::OrderUnit {
                    unit: *unit,
                    x: *x,
                    y: *y,
                },
            ),
            Self::Place {
                building,
                x,
                y,
                faction,
            } => (
                acting(faction),
                PlayerCommand::Place {
                    building: *building,
                    x: *x,
                    y: *y,
                },
            ),
            Self::Train {
                building,
                unit,
                faction,
            } => (
                acting(faction),
                PlayerCommand::Train {
                    building: *building,
                    unit: *unit,
                },
            ),
            Self::Click { x, y, faction } => {
                (acting(faction), PlayerCommand::Click { x: *x, y: *y })
            }
            Self::BeginPlacement { building } => (
                FactionId::Player,
                PlayerCommand::BeginPlacement {
                    building: *building,
                },
            ),
            Self::CancelPlacement => (FactionId::Player, PlayerCommand::CancelPlacement),
            Self::Step { .. } | Self::Query | Self::Summary | Self::Hash | Self::Quit => {
                return None
            }
        };
        Some(mapped)
    }
}
