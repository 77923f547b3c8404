//! Determinism testing utilities.
//!
//! Provides a harness for verifying that the simulation
//! produces identical results given identical inputs.
//!
//! # Testing Strategy
//!
//! A session is fully determined by its rules, its seeds and the commands
//! applied between steps. Sources of non-determinism to guard against:
//!
//! - **Map iteration order**: entities live in a `BTreeMap` and systems
//!   snapshot id lists, so processing is always in ascending id order.
//!
//! - **Shared randomness**: the map generator and the opponent's rolls use
//!   separate seeded generators; nothing reads thread-local randomness.
//!
//! - **Wall-clock time**: only the tick clock sees real time, and it only
//!   decides when to step.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: individual system behaviour
//! 2. **Property tests**: random command streams still replay identically
//! 3. **Integration tests**: full scripted matches are reproducible
//! 4. **Parallel tests**: running N simulations on threads all match

use std::collections::BTreeSet;
use std::thread;

use rts_core::commands::PlayerCommand;
use rts_core::factions::FactionId;
use rts_core::simulation::Simulation;

/// Final state hashes of several runs of one session setup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunHashes {
    /// Final hash of each run, in run order.
    pub hashes: Vec<u64>,
    /// Ticks stepped per run.
    pub ticks: u64,
}

impl RunHashes {
    /// Distinct final hashes; a reproducible session has exactly one.
    #[must_use]
    pub fn distinct(&self) -> BTreeSet<u64> {
        self.hashes.iter().copied().collect()
    }

    /// True when every run ended in the same state.
    #[must_use]
    pub fn is_deterministic(&self) -> bool {
        self.distinct().len() <= 1
    }

    /// # Panics
    ///
    /// Panics listing the hashes when the runs disagree.
    pub fn assert_deterministic(&self) {
        assert!(
            self.is_deterministic(),
            "{} runs of {} ticks ended in {} different states: {:x?}",
            self.hashes.len(),
            self.ticks,
            self.distinct().len(),
            self.hashes
        );
    }
}

/// Step a fresh session `runs` times in sequence and collect the final hashes.
pub fn run_sequential<F>(setup_fn: F, runs: usize, num_ticks: u64) -> RunHashes
where
    F: Fn() -> Simulation,
{
    let hashes = (0..runs)
        .map(|_| {
            let mut sim = setup_fn();
            sim.run(num_ticks);
            sim.state_hash()
        })
        .collect();
    RunHashes {
        hashes,
        ticks: num_ticks,
    }
}

/// Run the same setup twice and compare final hashes.
pub fn verify_simulation_determinism<F>(setup_fn: F, num_ticks: u64) -> bool
where
    F: Fn() -> Simulation,
{
    run_sequential(setup_fn, 2, num_ticks).is_deterministic()
}

/// A command applied right before a given tick is stepped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledCommand {
    /// Tick at which the command is applied (before stepping it).
    pub tick: u64,
    /// Issuing faction.
    pub faction: FactionId,
    /// The command.
    pub command: PlayerCommand,
}

/// Replay a command schedule against a fresh simulation.
///
/// Returns the state hash after every step, so two replays can be compared
/// tick by tick.
pub fn replay_hashes<F>(setup_fn: F, schedule: &[ScheduledCommand], num_ticks: u64) -> Vec<u64>
where
    F: Fn() -> Simulation,
{
    let mut sim = setup_fn();
    let mut pending = schedule.iter().peekable();
    let mut hashes = Vec::with_capacity(num_ticks as usize);

    for _ in 0..num_ticks {
        while let Some(scheduled) = pending.next_if(|s| s.tick <= sim.tick()) {
            sim.apply_command(scheduled.faction, &scheduled.command);
        }
        sim.step();
        hashes.push(sim.state_hash());
    }
    hashes
}

/// Run the same setup on `num_sims` scoped threads at once.
///
/// # Panics
///
/// Panics if a simulation thread panics.
pub fn run_parallel_simulations<F>(setup_fn: F, num_sims: usize, num_ticks: u64) -> RunHashes
where
    F: Fn() -> Simulation + Sync,
{
    let hashes = thread::scope(|s| {
        let handles: Vec<_> = (0..num_sims)
            .map(|_| {
                s.spawn(|| {
                    let mut sim = setup_fn();
                    sim.run(num_ticks);
                    sim.state_hash()
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().expect("session thread panicked"))
            .collect()
    });

    RunHashes {
        hashes,
        ticks: num_ticks,
    }
}

/// Compare two simulation runs tick-by-tick, finding first divergence.
///
/// Useful for debugging non-determinism by finding exactly when
/// simulations start to differ.
///
/// # Returns
///
/// `None` if simulations are deterministic, `Some(tick)` if they diverge
/// at that tick.
pub fn find_first_divergence<F>(setup_fn: F, num_ticks: u64) -> Option<u64>
where
    F: Fn() -> Simulation,
{
    let mut sim1 = setup_fn();
    let mut sim2 = setup_fn();

    if sim1.state_hash() != sim2.state_hash() {
        return Some(0);
    }

    for tick in 1..=num_ticks {
        sim1.step();
        sim2.step();

        if sim1.state_hash() != sim2.state_hash() {
            tracing::warn!(tick, "Simulations diverged");
            return Some(tick);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{scripted_match, simulation};
    use rts_core::components::{BuildingKind, UnitKind};

    #[test]
    fn test_sequential_runs_share_one_hash() {
        let runs = run_sequential(|| simulation(13), 3, 120);
        assert_eq!(runs.hashes.len(), 3);
        assert_eq!(runs.distinct().len(), 1);
    }

    #[test]
    #[should_panic(expected = "different states")]
    fn test_disagreeing_runs_are_reported() {
        RunHashes {
            hashes: vec![1, 2],
            ticks: 10,
        }
        .assert_deterministic();
    }

    #[test]
    fn test_scripted_match_is_deterministic() {
        assert!(verify_simulation_determinism(|| scripted_match(21), 600));
    }

    #[test]
    fn test_find_divergence_on_deterministic_sim() {
        assert_eq!(find_first_divergence(|| scripted_match(5), 300), None);
    }

    #[test]
    fn test_different_seeds_differ() {
        let a = scripted_match(1);
        let b = scripted_match(2);
        assert_ne!(a.state_hash(), b.state_hash());
    }

    #[test]
    fn test_parallel_simulations_match() {
        run_parallel_simulations(|| scripted_match(77), 4, 400).assert_deterministic();
    }

    #[test]
    fn test_replay_schedule_is_reproducible() {
        let schedule = vec![
            ScheduledCommand {
                tick: 0,
                faction: FactionId::Player,
                command: PlayerCommand::Train {
                    building: BuildingKind::CommandCenter,
                    unit: UnitKind::Worker,
                },
            },
            ScheduledCommand {
                tick: 30,
                faction: FactionId::Player,
                command: PlayerCommand::Select { x: 3, y: 17 },
            },
            ScheduledCommand {
                tick: 31,
                faction: FactionId::Player,
                command: PlayerCommand::Order { x: 10, y: 10 },
            },
        ];
        let first = replay_hashes(|| simulation(9), &schedule, 200);
        let second = replay_hashes(|| simulation(9), &schedule, 200);
        assert_eq!(first, second);
        assert_eq!(first.len(), 200);
    }
}
