//! Match event log and the exported match summary.
//!
//! The log is append-only. Writers never trim; readers take the trailing
//! slice they need ([`EventLog::recent`]). The summary handed to the
//! log-submission transport carries at most `event_log_capacity` records.

use serde::{Deserialize, Serialize};

use crate::components::{BuildingKind, EntityId, UnitKind};
use crate::error::{GameError, Result};
use crate::factions::FactionId;

/// Version tag of the exported summary format.
pub const SUMMARY_VERSION: &str = "0.1";

/// Something worth recording for the external summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum GameEvent {
    /// A unit left a production building.
    Spawn {
        /// Owning faction.
        owner: FactionId,
        /// Unit type.
        unit: UnitKind,
        /// Spawn column.
        x: i32,
        /// Spawn row.
        y: i32,
    },
    /// A building was constructed by a command.
    PlaceBuilding {
        /// Owning faction.
        owner: FactionId,
        /// Building type.
        building: BuildingKind,
        /// Anchor column.
        x: i32,
        /// Anchor row.
        y: i32,
    },
    /// A unit was queued for training.
    Queue {
        /// Owning faction.
        owner: FactionId,
        /// Building type it was queued at.
        building: BuildingKind,
        /// Unit type.
        unit: UnitKind,
    },
    /// A worker delivered gold.
    Deliver {
        /// Owning faction.
        owner: FactionId,
        /// Gold credited.
        amount: u32,
    },
    /// An entity was destroyed in combat.
    Destroyed {
        /// Faction that lost the entity.
        owner: FactionId,
        /// The removed entity.
        id: EntityId,
        /// Kind name of the removed entity.
        kind: String,
    },
    /// A side lost its last Command Center.
    MatchOver {
        /// The surviving faction; `None` when both fell on the same tick.
        winner: Option<FactionId>,
    },
}

/// One log entry: `{"t": tick, "type": ..., "payload": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Tick the event happened on.
    pub t: u64,
    /// What happened.
    #[serde(flatten)]
    pub event: GameEvent,
}

/// Append-only event log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventLog {
    records: Vec<LogRecord>,
}

impl EventLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event.
    pub fn push(&mut self, tick: u64, event: GameEvent) {
        self.records.push(LogRecord { t: tick, event });
    }

    /// Every record, oldest first.
    #[must_use]
    pub fn records(&self) -> &[LogRecord] {
        &self.records
    }

    /// The trailing `limit` records, oldest first.
    #[must_use]
    pub fn recent(&self, limit: usize) -> &[LogRecord] {
        let start = self.records.len().saturating_sub(limit);
        &self.records[start..]
    }

    /// Records appended at or after position `from`.
    #[must_use]
    pub fn since(&self, from: usize) -> &[LogRecord] {
        self.records.get(from..).unwrap_or(&[])
    }

    /// Number of records ever written.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if nothing has been logged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Gold per faction in the summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoldSummary {
    /// Player balance.
    pub player: u32,
    /// Opponent balance.
    pub opponent: u32,
}

/// The value handed to the log-submission transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSummary {
    /// Format version, [`SUMMARY_VERSION`].
    pub version: String,
    /// Trailing slice of the event log.
    pub events: Vec<LogRecord>,
    /// Both ledgers.
    pub gold: GoldSummary,
    /// Current tick.
    pub tick: u64,
}

impl MatchSummary {
    /// Serialize to compact JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| GameError::Serialization {
            what: "match summary",
            message: e.to_string(),
        })
    }

    /// Serialize to indented JSON.
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| GameError::Serialization {
            what: "match summary",
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recent_keeps_trailing_slice() {
        let mut log = EventLog::new();
        for amount in 0..10 {
            log.push(
                u64::from(amount),
                GameEvent::Deliver {
                    owner: FactionId::Player,
                    amount,
                },
            );
        }
        let recent = log.recent(3);
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].t, 7);
        assert_eq!(log.recent(100).len(), 10);
        assert_eq!(log.len(), 10);
        assert_eq!(log.since(8).len(), 2);
        assert!(log.since(50).is_empty());
    }

    #[test]
    fn test_record_json_shape() {
        let record = LogRecord {
            t: 12,
            event: GameEvent::Queue {
                owner: FactionId::Opponent,
                building: BuildingKind::Barracks,
                unit: UnitKind::Melee,
            },
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["t"], 12);
        assert_eq!(value["type"], "queue");
        assert_eq!(value["payload"]["owner"], "opponent");
        assert_eq!(value["payload"]["building"], "Barracks");
        assert_eq!(value["payload"]["unit"], "Melee");
    }
}
