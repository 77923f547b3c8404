//! Tunable game rules.
//!
//! Every gameplay constant lives in [`GameRules`]. The defaults reproduce the
//! prototype's balance; a RON file can override any subset of fields.
//!
//! # Example RON
//!
//! ```ron
//! GameRules(
//!     starting_gold: 200,
//!     melee: UnitStats(hp: 100, attack: 10, range: 1, speed: 5, cost: 35, train_ticks: 40),
//!     opponent: OpponentRules(think_interval: 5),
//! )
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::components::{BuildingKind, UnitKind};
use crate::error::{GameError, Result};
use crate::grid::TilePos;

/// Per-kind unit statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitStats {
    /// Maximum hit points.
    pub hp: i32,
    /// Damage per attack.
    pub attack: i32,
    /// Attack range (Manhattan tiles).
    pub range: i32,
    /// Nominal movement speed. Movement resolves one tile per tick.
    pub speed: u32,
    /// Gold cost to train.
    pub cost: u32,
    /// Ticks spent at the head of a production queue.
    pub train_ticks: u32,
}

/// Per-kind building statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildingStats {
    /// Maximum hit points.
    pub hp: i32,
    /// Footprint edge length in tiles.
    pub size: i32,
    /// Gold cost to place. `None` means players cannot construct it.
    pub cost: Option<u32>,
}

/// Tuning for the scripted opponent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpponentRules {
    /// Ticks between policy evaluations.
    pub think_interval: u64,
    /// Chance per evaluation of queueing another worker.
    pub worker_chance: f64,
    /// Stop queueing workers once alive + queued reaches this many.
    pub worker_target: usize,
    /// Share of combat units trained as Melee (the rest are Ranged).
    pub melee_weight: f64,
    /// Barracks anchor relative to the Command Center anchor.
    pub barracks_offset: (i32, i32),
    /// Where freshly trained opponent combat units are sent.
    pub rally_point: TilePos,
}

impl Default for OpponentRules {
    fn default() -> Self {
        Self {
            think_interval: 10,
            worker_chance: 0.2,
            worker_target: 2,
            melee_weight: 0.6,
            barracks_offset: (-2, -2),
            rally_point: TilePos::new(2, 18),
        }
    }
}

/// All gameplay constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameRules {
    /// Grid width in tiles.
    pub grid_width: i32,
    /// Grid height in tiles.
    pub grid_height: i32,
    /// Gold each faction starts with.
    pub starting_gold: u32,
    /// Random draws used to scatter resource tiles.
    pub resource_scatter_attempts: u32,
    /// Edge length of the corner squares kept free of resources.
    pub base_clearance: i32,
    /// A harvesting worker gathers on ticks divisible by this.
    pub harvest_interval: u64,
    /// Gold a worker carries before returning.
    pub carry_capacity: u32,
    /// Ticks between attacks.
    pub attack_cooldown: u32,
    /// Most recent events included in the exported summary.
    pub event_log_capacity: usize,
    /// Simulation steps per real-time second.
    pub tick_rate: u32,
    /// Worker stats.
    pub worker: UnitStats,
    /// Melee stats.
    pub melee: UnitStats,
    /// Ranged stats.
    pub ranged: UnitStats,
    /// Command Center stats.
    pub command_center: BuildingStats,
    /// Barracks stats.
    pub barracks: BuildingStats,
    /// Scripted opponent tuning.
    pub opponent: OpponentRules,
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            grid_width: 20,
            grid_height: 20,
            starting_gold: 50,
            resource_scatter_attempts: 50,
            base_clearance: 5,
            harvest_interval: 5,
            carry_capacity: 20,
            attack_cooldown: 10,
            event_log_capacity: 500,
            tick_rate: 20,
            worker: UnitStats {
                hp: 60,
                attack: 2,
                range: 1,
                speed: 4,
                cost: 50,
                train_ticks: 60,
            },
            melee: UnitStats {
                hp: 80,
                attack: 8,
                range: 1,
                speed: 5,
                cost: 30,
                train_ticks: 40,
            },
            ranged: UnitStats {
                hp: 60,
                attack: 6,
                range: 3,
                speed: 4,
                cost: 40,
                train_ticks: 50,
            },
            command_center: BuildingStats {
                hp: 600,
                size: 2,
                cost: None,
            },
            barracks: BuildingStats {
                hp: 400,
                size: 2,
                cost: Some(100),
            },
            opponent: OpponentRules::default(),
        }
    }
}

impl GameRules {
    /// Stats for a unit kind.
    #[must_use]
    pub const fn unit(&self, kind: UnitKind) -> &UnitStats {
        match kind {
            UnitKind::Worker => &self.worker,
            UnitKind::Melee => &self.melee,
            UnitKind::Ranged => &self.ranged,
        }
    }

    /// Stats for a building kind.
    #[must_use]
    pub const fn building(&self, kind: BuildingKind) -> &BuildingStats {
        match kind {
            BuildingKind::CommandCenter => &self.command_center,
            BuildingKind::Barracks => &self.barracks,
        }
    }

    /// Wall-clock duration of one simulation step.
    #[must_use]
    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(1000 / u64::from(self.tick_rate.max(1)))
    }

    /// Parse rules from RON text and validate them.
    pub fn from_ron_str(text: &str) -> Result<Self> {
        let rules: Self = ron::from_str(text).map_err(|e| GameError::RulesParse(e.to_string()))?;
        rules.validate()?;
        Ok(rules)
    }

    /// Load rules from a RON file and validate them.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| GameError::RulesIo {
            path: path.display().to_string(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "Loaded rules file");
        Self::from_ron_str(&text)
    }

    /// Serialize to pretty RON, e.g. to write out a template.
    pub fn to_ron_string(&self) -> Result<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default()).map_err(|e| {
            GameError::Serialization {
                what: "rules",
                message: e.to_string(),
            }
        })
    }

    /// Check the rules for values the simulation cannot run with.
    ///
    /// Returns a list of problems (empty if valid).
    #[must_use]
    pub fn validation_errors(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.grid_width < 8 || self.grid_height < 8 {
            errors.push(format!(
                "grid must be at least 8x8, got {}x{}",
                self.grid_width, self.grid_height
            ));
        }
        if self.harvest_interval == 0 {
            errors.push("harvest_interval must be positive".to_string());
        }
        if self.carry_capacity == 0 {
            errors.push("carry_capacity must be positive".to_string());
        }
        if self.tick_rate == 0 {
            errors.push("tick_rate must be positive".to_string());
        }

        for kind in UnitKind::ALL {
            let stats = self.unit(kind);
            if stats.hp <= 0 {
                errors.push(format!("{kind} hp must be positive"));
            }
            if stats.train_ticks == 0 {
                errors.push(format!("{kind} train_ticks must be positive"));
            }
            if stats.range < 0 || stats.attack < 0 {
                errors.push(format!("{kind} attack and range must not be negative"));
            }
        }

        for kind in BuildingKind::ALL {
            let stats = self.building(kind);
            if stats.hp <= 0 {
                errors.push(format!("{kind} hp must be positive"));
            }
            if stats.size < 1 || stats.size > self.grid_width.min(self.grid_height) {
                errors.push(format!("{kind} size {} does not fit the grid", stats.size));
            }
        }

        let opponent = &self.opponent;
        if opponent.think_interval == 0 {
            errors.push("opponent.think_interval must be positive".to_string());
        }
        for (name, p) in [
            ("worker_chance", opponent.worker_chance),
            ("melee_weight", opponent.melee_weight),
        ] {
            if !(0.0..=1.0).contains(&p) {
                errors.push(format!("opponent.{name} must be within 0..=1, got {p}"));
            }
        }
        let rally = opponent.rally_point;
        if rally.x < 0 || rally.y < 0 || rally.x >= self.grid_width || rally.y >= self.grid_height
        {
            errors.push(format!("opponent.rally_point {rally} is outside the grid"));
        }

        errors
    }

    /// Validate, folding all problems into one error.
    pub fn validate(&self) -> Result<()> {
        let errors = self.validation_errors();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(GameError::InvalidRules(errors.join("; ")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let rules = GameRules::default();
        let errors = rules.validation_errors();
        assert!(errors.is_empty(), "Errors: {:?}", errors);
        assert_eq!(rules.tick_period(), Duration::from_millis(50));
    }

    #[test]
    fn test_partial_ron_keeps_defaults() {
        let rules = GameRules::from_ron_str("(starting_gold: 200, opponent: (think_interval: 5))")
            .unwrap();
        assert_eq!(rules.starting_gold, 200);
        assert_eq!(rules.opponent.think_interval, 5);
        assert_eq!(rules.opponent.worker_target, 2);
        assert_eq!(rules.unit(UnitKind::Ranged).train_ticks, 50);
    }

    #[test]
    fn test_invalid_rules_rejected() {
        let err = GameRules::from_ron_str("(harvest_interval: 0, grid_width: 4)").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("harvest_interval"));
        assert!(message.contains("grid must be at least 8x8"));
    }

    #[test]
    fn test_malformed_ron_is_parse_error() {
        let err = GameRules::from_ron_str("(starting_gold: \"lots\")").unwrap_err();
        assert!(matches!(err, GameError::RulesParse(_)));
    }

    #[test]
    fn test_ron_template_roundtrip() {
        let rules = GameRules::default();
        let text = rules.to_ron_string().unwrap();
        assert_eq!(GameRules::from_ron_str(&text).unwrap(), rules);
    }
}
