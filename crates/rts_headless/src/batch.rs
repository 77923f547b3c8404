//! Batch match runner for balance testing.
//!
//! Plays many seeded matches in parallel with rayon. Every match owns its own
//! [`Simulation`], so nothing is shared between workers and the results only
//! depend on the seeds.

use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use rts_core::rules::GameRules;
use rts_core::simulation::Simulation;

use crate::error::{HeadlessError, Result};
use crate::metrics::{BatchSummary, GameMetrics};

/// Configuration for a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Number of matches to run.
    pub game_count: u32,
    /// Maximum parallel matches (0 = use rayon default).
    pub parallel_games: u32,
    /// Seed of the first match; match `i` uses `seed_start + i`.
    pub seed_start: u64,
    /// Tick limit per match.
    pub max_ticks: u64,
    /// Let the scripted policy play the player side too.
    pub mirrored: bool,
    /// Rules every match runs under.
    pub rules: GameRules,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            game_count: 100,
            parallel_games: 0,
            seed_start: 0,
            max_ticks: 6000, // 5 minutes at 20 ticks/s
            mirrored: true,
            rules: GameRules::default(),
        }
    }
}

impl BatchConfig {
    /// Create config for a number of matches.
    pub fn new(game_count: u32) -> Self {
        Self {
            game_count,
            ..Default::default()
        }
    }

    /// Set seed start.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed_start = seed;
        self
    }

    /// Set the tick limit.
    pub fn with_max_ticks(mut self, max_ticks: u64) -> Self {
        self.max_ticks = max_ticks;
        self
    }

    /// Set the rules.
    pub fn with_rules(mut self, rules: GameRules) -> Self {
        self.rules = rules;
        self
    }
}

/// Results from a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResults {
    /// Configuration used.
    pub config: BatchConfig,
    /// Individual match metrics, in seed order.
    pub games: Vec<GameMetrics>,
    /// Aggregate summary.
    pub summary: BatchSummary,
    /// Total runtime.
    pub duration_seconds: f64,
    /// Matches that could not be set up.
    pub errors: Vec<BatchError>,
}

impl BatchResults {
    /// Save results to a JSON file, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        let write_err = |source| HeadlessError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|source| HeadlessError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, json).map_err(write_err)
    }

    /// Load results from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|source| HeadlessError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&json).map_err(|source| HeadlessError::Json {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// A match that failed to start.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchError {
    /// Match index.
    pub game_index: u32,
    /// Seed used.
    pub seed: u64,
    /// Error message.
    pub message: String,
}

/// Play one seeded match to a decision or the tick limit.
pub fn run_single_game(seed: u64, config: &BatchConfig) -> Result<GameMetrics> {
    let mut sim = Simulation::new(config.rules.clone(), seed)?;
    if config.mirrored {
        sim = sim.with_scripted_player(seed);
    }
    let outcome = sim.run_until_decided(config.max_ticks);
    debug!(seed, tick = sim.tick(), ?outcome, "Match finished");
    Ok(GameMetrics::collect(seed, &sim))
}

/// Run a batch of matches.
pub fn run_batch(config: BatchConfig) -> BatchResults {
    let start = Instant::now();
    let completed = AtomicU32::new(0);

    info!(
        games = config.game_count,
        seed_start = config.seed_start,
        max_ticks = config.max_ticks,
        "Starting batch run"
    );

    if config.parallel_games > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(config.parallel_games as usize)
            .build_global()
            .ok(); // Ignore if already set
    }

    let results: Vec<std::result::Result<GameMetrics, BatchError>> = (0..config.game_count)
        .into_par_iter()
        .map(|i| {
            let seed = config.seed_start.wrapping_add(u64::from(i));
            match run_single_game(seed, &config) {
                Ok(metrics) => {
                    let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                    if done % 10 == 0 {
                        debug!("Progress: {}/{}", done, config.game_count);
                    }
                    Ok(metrics)
                }
                Err(e) => {
                    warn!("Game {} failed: {}", i, e);
                    Err(BatchError {
                        game_index: i,
                        seed,
                        message: e.to_string(),
                    })
                }
            }
        })
        .collect();

    let (games, errors): (Vec<_>, Vec<_>) = results.into_iter().partition(|r| r.is_ok());
    let games: Vec<GameMetrics> = games.into_iter().filter_map(|r| r.ok()).collect();
    let errors: Vec<BatchError> = errors.into_iter().filter_map(|r| r.err()).collect();

    let summary = BatchSummary::from_games(&games);
    let duration_seconds = start.elapsed().as_secs_f64();

    info!(
        "Batch complete: {} games in {:.1}s ({} errors)",
        games.len(),
        duration_seconds,
        errors.len()
    );

    BatchResults {
        config,
        games,
        summary,
        duration_seconds,
        errors,
    }
}

/// Play the same seed `runs` times and compare final state hashes.
pub fn verify_determinism(
    rules: &GameRules,
    seed: u64,
    runs: u32,
    max_ticks: u64,
) -> Result<Vec<u64>> {
    let config = BatchConfig {
        rules: rules.clone(),
        max_ticks,
        ..Default::default()
    };
    let hashes = (0..runs)
        .map(|_| run_single_game(seed, &config).map(|m| m.final_state_hash))
        .collect::<Result<Vec<u64>>>()?;

    let mut unique = hashes.clone();
    unique.sort_unstable();
    unique.dedup();
    if unique.len() > 1 {
        return Err(HeadlessError::NonDeterministic {
            seed,
            runs,
            unique: unique.len(),
        });
    }
    Ok(hashes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small(count: u32) -> BatchConfig {
        BatchConfig::new(count).with_seed(40).with_max_ticks(400)
    }

    #[test]
    fn test_batch_config_builder() {
        let config = BatchConfig::new(500).with_seed(12345).with_max_ticks(10);
        assert_eq!(config.game_count, 500);
        assert_eq!(config.seed_start, 12345);
        assert_eq!(config.max_ticks, 10);
        assert!(config.mirrored);
    }

    #[test]
    fn test_run_batch_small() {
        let results = run_batch(small(6));
        assert_eq!(results.games.len(), 6);
        assert!(results.errors.is_empty());
        assert_eq!(results.summary.total_games, 6);

        let seeds: Vec<u64> = results.games.iter().map(|g| g.seed).collect();
        assert_eq!(seeds, (40..46).collect::<Vec<_>>());
        assert!(results.games.iter().all(|g| g.duration_ticks <= 400));
    }

    #[test]
    fn test_batch_matches_single_runs() {
        let config = small(3);
        let results = run_batch(config.clone());
        for game in &results.games {
            let single = run_single_game(game.seed, &config).unwrap();
            assert_eq!(single.final_state_hash, game.final_state_hash);
        }
    }

    #[test]
    fn test_invalid_rules_are_reported_per_game() {
        let mut rules = GameRules::default();
        rules.harvest_interval = 0;
        let results = run_batch(small(2).with_rules(rules));
        assert!(results.games.is_empty());
        assert_eq!(results.errors.len(), 2);
    }

    #[test]
    fn test_verify_determinism() {
        let hashes = verify_determinism(&GameRules::default(), 12345, 3, 300).unwrap();
        assert_eq!(hashes.len(), 3);
    }

    #[test]
    fn test_batch_results_save_load() {
        let results = run_batch(small(2));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("results.json");

        results.save(&path).unwrap();
        assert!(path.exists());

        let loaded = BatchResults::load(&path).unwrap();
        assert_eq!(loaded.games, results.games);
        assert_eq!(loaded.config.seed_start, 40);
    }
}
