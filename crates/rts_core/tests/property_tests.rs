//! Property tests: random command streams against full sessions.
//!
//! Each case replays a random schedule of (mostly invalid) commands from both
//! factions while the scripted policy plays both sides, and checks the world
//! bookkeeping after every step.

use proptest::prelude::*;

use rts_core::prelude::*;
use rts_test_utils::determinism::{replay_hashes, ScheduledCommand};
use rts_test_utils::fixtures::scripted_match;
use rts_test_utils::strategies::{arb_command, arb_faction, arb_schedule};

const TICKS: u64 = 300;

/// Apply the schedule and call `check` after every step.
fn drive(seed: u64, schedule: &[ScheduledCommand], mut check: impl FnMut(&Simulation)) {
    let mut sim = scripted_match(seed);
    let mut pending = schedule.iter().peekable();
    for _ in 0..TICKS {
        while let Some(scheduled) = pending.next_if(|s| s.tick <= sim.tick()) {
            sim.apply_command(scheduled.faction, &scheduled.command);
        }
        sim.step();
        check(&sim);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn ledgers_balance(seed in any::<u64>(), schedule in arb_schedule(40, TICKS)) {
        drive(seed, &schedule, |sim| {
            for faction in FactionId::ALL {
                let ledger = sim.world().ledger(faction);
                assert_eq!(
                    u64::from(ledger.gold()),
                    50 + u64::from(ledger.earned()) - u64::from(ledger.spent()),
                    "{faction} at tick {}",
                    sim.tick()
                );
            }
        });
    }

    #[test]
    fn footprints_and_tiles_agree(seed in any::<u64>(), schedule in arb_schedule(40, TICKS)) {
        drive(seed, &schedule, |sim| {
            let problems = sim.world().consistency_problems();
            assert!(problems.is_empty(), "tick {}: {problems:?}", sim.tick());
        });
    }

    #[test]
    fn units_never_stand_on_blocked_tiles(seed in any::<u64>(), schedule in arb_schedule(40, TICKS)) {
        drive(seed, &schedule, |sim| {
            let world = sim.world();
            for unit in world.units() {
                assert_ne!(
                    world.tile(unit.pos),
                    Tile::Blocked,
                    "{} on a blocked tile at tick {}",
                    unit.id,
                    sim.tick()
                );
            }
        });
    }

    #[test]
    fn entity_ids_are_never_reused(seed in any::<u64>(), schedule in arb_schedule(40, TICKS)) {
        let mut seen_max = 0u32;
        let mut live: Vec<EntityId> = Vec::new();
        drive(seed, &schedule, |sim| {
            let ids: Vec<EntityId> = sim.world().entities().map(|e| e.id).collect();
            for id in &ids {
                if !live.contains(id) {
                    assert!(id.0 > seen_max, "{id} reused after {seen_max}");
                }
            }
            seen_max = seen_max.max(ids.iter().map(|id| id.0).max().unwrap_or(0));
            live = ids;
        });
    }

    #[test]
    fn schedules_replay_identically(seed in any::<u64>(), schedule in arb_schedule(30, 150)) {
        let first = replay_hashes(|| scripted_match(seed), &schedule, 150);
        let second = replay_hashes(|| scripted_match(seed), &schedule, 150);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn rejected_commands_change_nothing(
        seed in any::<u64>(),
        faction in arb_faction(),
        command in arb_command(),
    ) {
        let mut sim = scripted_match(seed);
        sim.run(20);
        let gold_before = sim.world().ledger(faction).gold();
        let entities_before = sim.world().entity_count();
        let tiles_before = sim.world().grid().clone();

        let outcome = sim.apply_command(faction, &command);
        if !outcome.success {
            prop_assert_eq!(sim.world().ledger(faction).gold(), gold_before);
            prop_assert_eq!(sim.world().entity_count(), entities_before);
            prop_assert_eq!(sim.world().grid(), &tiles_before);
        }
        prop_assert!(sim.world().ledger(faction).gold() <= gold_before);
    }
}
