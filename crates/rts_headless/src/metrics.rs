//! Match metrics for batch analysis.
//!
//! Metrics are read off a finished [`Simulation`]: the ledgers give the gold
//! totals and the event log gives everything that happened.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use rts_core::event_log::GameEvent;
use rts_core::factions::FactionId;
use rts_core::simulation::{MatchOutcome, Simulation};

/// Complete metrics for a single match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameMetrics {
    /// Seed the match was played with.
    pub seed: u64,
    /// Ticks simulated.
    pub duration_ticks: u64,
    /// How the match stood when it stopped.
    pub outcome: MatchOutcome,
    /// Winning faction, if any.
    pub winner: Option<FactionId>,
    /// Per-faction metrics.
    pub factions: BTreeMap<FactionId, FactionMetrics>,
    /// Final simulation state hash (for determinism validation).
    pub final_state_hash: u64,
}

/// Metrics for one faction in a match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactionMetrics {
    /// Balance at the end.
    pub final_gold: u32,
    /// Gold delivered over the match.
    pub gold_earned: u32,
    /// Gold spent on buildings and units.
    pub gold_spent: u32,
    /// Number of deliveries.
    pub deliveries: u32,
    /// Units that left a production building, by kind.
    pub units_produced: BTreeMap<String, u32>,
    /// Buildings placed by command, by kind.
    pub buildings_placed: BTreeMap<String, u32>,
    /// Own entities destroyed, by kind.
    pub losses: BTreeMap<String, u32>,
    /// Enemy entities destroyed, by kind.
    pub kills: BTreeMap<String, u32>,
}

impl FactionMetrics {
    /// Total units produced.
    #[must_use]
    pub fn total_units_produced(&self) -> u32 {
        self.units_produced.values().sum()
    }
}

impl GameMetrics {
    /// Read the metrics off a simulation.
    #[must_use]
    pub fn collect(seed: u64, sim: &Simulation) -> Self {
        let world = sim.world();
        let mut factions: BTreeMap<FactionId, FactionMetrics> = FactionId::ALL
            .into_iter()
            .map(|f| {
                let ledger = world.ledger(f);
                let metrics = FactionMetrics {
                    final_gold: ledger.gold(),
                    gold_earned: ledger.earned(),
                    gold_spent: ledger.spent(),
                    ..Default::default()
                };
                (f, metrics)
            })
            .collect();

        for record in world.log().records() {
            match &record.event {
                GameEvent::Spawn { owner, unit, .. } => {
                    bump(&mut faction(&mut factions, *owner).units_produced, unit.name());
                }
                GameEvent::PlaceBuilding {
                    owner, building, ..
                } => {
                    bump(
                        &mut faction(&mut factions, *owner).buildings_placed,
                        building.name(),
                    );
                }
                GameEvent::Deliver { owner, .. } => {
                    faction(&mut factions, *owner).deliveries += 1;
                }
                GameEvent::Destroyed { owner, kind, .. } => {
                    bump(&mut faction(&mut factions, *owner).losses, kind);
                    bump(&mut faction(&mut factions, owner.enemy()).kills, kind);
                }
                GameEvent::Queue { .. } | GameEvent::MatchOver { .. } => {}
            }
        }

        let outcome = sim.outcome();
        Self {
            seed,
            duration_ticks: sim.tick(),
            outcome,
            winner: outcome.winner(),
            factions,
            final_state_hash: sim.state_hash(),
        }
    }
}

fn faction(
    factions: &mut BTreeMap<FactionId, FactionMetrics>,
    id: FactionId,
) -> &mut FactionMetrics {
    factions.entry(id).or_default()
}

fn bump(counts: &mut BTreeMap<String, u32>, kind: &str) {
    *counts.entry(kind.to_string()).or_default() += 1;
}

/// Aggregate over many matches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Total matches played.
    pub total_games: u32,
    /// Matches won by each faction.
    pub wins_by_faction: BTreeMap<FactionId, u32>,
    /// Win rates by faction.
    pub win_rates: BTreeMap<FactionId, f64>,
    /// Both Command Centers fell together.
    pub draws: u32,
    /// Hit the tick limit undecided.
    pub undecided: u32,
    /// Average match length in ticks.
    pub avg_duration_ticks: f64,
    /// Shortest match.
    pub min_duration_ticks: u64,
    /// Longest match.
    pub max_duration_ticks: u64,
    /// Average gold earned per match by faction.
    pub avg_gold_earned: BTreeMap<FactionId, f64>,
    /// Average units produced per match by faction.
    pub avg_units_produced: BTreeMap<FactionId, f64>,
}

impl BatchSummary {
    /// Calculate the summary from per-match metrics.
    #[must_use]
    pub fn from_games(games: &[GameMetrics]) -> Self {
        if games.is_empty() {
            return Self::default();
        }

        let total = games.len() as f64;
        let mut summary = Self {
            total_games: games.len() as u32,
            min_duration_ticks: u64::MAX,
            ..Default::default()
        };

        let mut duration_sum = 0u64;
        let mut earned: BTreeMap<FactionId, u64> = BTreeMap::new();
        let mut produced: BTreeMap<FactionId, u64> = BTreeMap::new();

        for game in games {
            duration_sum += game.duration_ticks;
            summary.min_duration_ticks = summary.min_duration_ticks.min(game.duration_ticks);
            summary.max_duration_ticks = summary.max_duration_ticks.max(game.duration_ticks);

            match game.outcome {
                MatchOutcome::Victory(winner) => {
                    *summary.wins_by_faction.entry(winner).or_default() += 1;
                }
                MatchOutcome::Draw => summary.draws += 1,
                MatchOutcome::InProgress => summary.undecided += 1,
            }

            for (faction, metrics) in &game.factions {
                *earned.entry(*faction).or_default() += u64::from(metrics.gold_earned);
                *produced.entry(*faction).or_default() +=
                    u64::from(metrics.total_units_produced());
            }
        }

        summary.avg_duration_ticks = duration_sum as f64 / total;
        for (faction, wins) in &summary.wins_by_faction {
            summary
                .win_rates
                .insert(*faction, f64::from(*wins) / total);
        }
        summary.avg_gold_earned = earned
            .into_iter()
            .map(|(f, sum)| (f, sum as f64 / total))
            .collect();
        summary.avg_units_produced = produced
            .into_iter()
            .map(|(f, sum)| (f, sum as f64 / total))
            .collect();

        summary
    }

    /// Check that no faction's win rate strays more than `threshold` from even.
    #[must_use]
    pub fn is_balanced(&self, threshold: f64) -> bool {
        self.win_rates
            .values()
            .all(|rate| (rate - 0.5).abs() <= threshold)
    }
}
