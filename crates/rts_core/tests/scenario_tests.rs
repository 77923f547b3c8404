//! Scenario tests that drive whole steps through the scheduler.
//!
//! Worlds are built from RON scenarios and stepped with
//! [`Simulation::from_world`], so every system runs in its real order.

use rts_core::prelude::*;
use rts_test_utils::fixtures::{session, set_gold, simulation, unit, Scenario, FIXTURE_SEED};

fn drive(text: &str) -> Simulation {
    Simulation::from_world(Scenario::world_from_ron(text), FIXTURE_SEED)
}

// =============================================================================
// Session setup
// =============================================================================

#[test]
fn fresh_session_layout() {
    let world = session(2024);

    for faction in FactionId::ALL {
        let centers = world
            .buildings()
            .filter(|b| b.owner == faction)
            .filter(|b| {
                b.as_building()
                    .is_some_and(|b| b.kind == BuildingKind::CommandCenter)
            })
            .count();
        assert_eq!(centers, 1, "{faction} command centers");
        assert_eq!(world.count_units(faction, UnitKind::Worker), 1);
        assert_eq!(world.ledger(faction).gold(), 50);
    }
    assert_eq!(world.entity_count(), 4);
    assert_eq!(world.grid().width(), 20);
    assert_eq!(world.grid().height(), 20);

    let resources = world.grid().count(Tile::Resource);
    assert!(resources > 0 && resources <= 50, "{resources} resources");

    for pos in world.grid().positions() {
        let player_corner = pos.x < 5 && pos.y >= 15;
        let opponent_corner = pos.x >= 15 && pos.y < 5;
        if player_corner || opponent_corner {
            assert_ne!(world.tile(pos), Tile::Resource, "resource in base corner at {pos}");
        }
    }
    assert!(world.consistency_problems().is_empty());
}

#[test]
fn map_depends_only_on_seed() {
    let a = session(99);
    let b = session(99);
    let c = session(100);
    assert_eq!(a.grid(), b.grid());
    assert_eq!(a.state_hash(), b.state_hash());
    assert_ne!(a.grid(), c.grid());
}

// =============================================================================
// Command validation
// =============================================================================

#[test]
fn out_of_bounds_barracks_is_rejected() {
    let mut sim = simulation(5);
    set_gold(sim.world_mut(), FactionId::Player, 200);

    let outcome = sim.apply_command(
        FactionId::Player,
        &PlayerCommand::Place {
            building: BuildingKind::Barracks,
            x: 19,
            y: 4,
        },
    );
    assert!(!outcome.success);
    assert_eq!(outcome.message, "Out of bounds");

    let ledger = sim.world().ledger(FactionId::Player);
    assert_eq!(ledger.gold(), 200);
    assert_eq!(ledger.spent(), 0);
    assert!(sim
        .world()
        .find_building(FactionId::Player, BuildingKind::Barracks)
        .is_none());
}

#[test]
fn unaffordable_worker_leaves_queue_alone() {
    let mut sim = simulation(6);
    set_gold(sim.world_mut(), FactionId::Player, 40);

    let outcome = sim.apply_command(
        FactionId::Player,
        &PlayerCommand::Train {
            building: BuildingKind::CommandCenter,
            unit: UnitKind::Worker,
        },
    );
    assert!(!outcome.success);
    assert_eq!(outcome.message, "Not enough gold");
    assert_eq!(sim.world().count_queued(FactionId::Player, UnitKind::Worker), 0);
    assert_eq!(sim.world().ledger(FactionId::Player).gold(), 40);
}

#[test]
fn placement_through_clicks() {
    let mut sim = simulation(7);
    set_gold(sim.world_mut(), FactionId::Player, 150);

    let armed = sim.apply_command(
        FactionId::Player,
        &PlayerCommand::BeginPlacement {
            building: BuildingKind::Barracks,
        },
    );
    assert!(armed.success);
    assert_eq!(
        sim.world().ui().mode,
        InteractionMode::PlacingBuilding(BuildingKind::Barracks)
    );

    // (0, 0) sits outside the opponent corner and is clear of the bases
    let anchor = TilePos::new(0, 0);
    let clear = [anchor, anchor.offset(1, 0), anchor.offset(0, 1), anchor.offset(1, 1)]
        .into_iter()
        .all(|p| sim.world().tile(p) == Tile::Empty);

    let placed = sim.apply_command(FactionId::Player, &PlayerCommand::Click { x: 0, y: 0 });
    if clear {
        assert!(placed.success, "{}", placed.message);
        assert_eq!(sim.world().ledger(FactionId::Player).gold(), 50);
        assert_eq!(sim.world().ui().mode, InteractionMode::Default);
    } else {
        assert_eq!(placed.message, "Space blocked");
        assert_eq!(sim.world().ledger(FactionId::Player).gold(), 150);
    }
    assert!(sim.world().consistency_problems().is_empty());
}

// =============================================================================
// Economy
// =============================================================================

#[test]
fn worker_harvests_one_gold_per_interval_then_heads_home() {
    let mut sim = drive(
        r"(
            resources: [(x: 6, y: 6)],
            buildings: [(owner: player, kind: CommandCenter, x: 1, y: 1)],
            units: [(owner: player, kind: Worker, x: 6, y: 6)],
        )",
    );
    let worker = EntityId(2);
    let spot = TilePos::new(6, 6);
    sim.world_mut()
        .entity_mut(worker)
        .and_then(|e| e.as_unit_mut())
        .unwrap()
        .harvest = Some(spot);

    // after n steps, ticks 0..n have run; harvesting happens on multiples of 5
    for n in 1..=95u32 {
        sim.step();
        let carried = unit(sim.world(), worker).carried();
        assert_eq!(carried, n.div_ceil(5), "after {n} steps");
        assert_eq!(sim.world().entity(worker).unwrap().pos, spot);
    }
    assert_eq!(unit(sim.world(), worker).carried(), 19);

    sim.step();
    let worker_unit = unit(sim.world(), worker);
    assert_eq!(worker_unit.carried(), 20);
    assert_eq!(worker_unit.harvest, None);
    assert_eq!(worker_unit.last_harvest, Some(spot));
    assert_eq!(worker_unit.move_target, Some(TilePos::new(1, 3)));
    // the movement pass of the same step already took the first tile
    assert_eq!(sim.world().entity(worker).unwrap().pos, TilePos::new(5, 6));
}

#[test]
fn full_worker_delivers_and_resumes() {
    let mut sim = drive(
        r"(
            resources: [(x: 4, y: 3)],
            buildings: [(owner: player, kind: CommandCenter, x: 1, y: 1)],
            units: [(owner: player, kind: Worker, x: 4, y: 3)],
        )",
    );
    let worker = EntityId(2);
    sim.world_mut()
        .entity_mut(worker)
        .and_then(|e| e.as_unit_mut())
        .unwrap()
        .harvest = Some(TilePos::new(4, 3));

    let delivered_tick = (0..400)
        .find_map(|_| {
            let events = sim.step();
            events
                .events
                .iter()
                .any(|r| matches!(r.event, GameEvent::Deliver { amount: 20, .. }))
                .then_some(events.tick)
        })
        .expect("worker delivers within 400 ticks");
    assert!(delivered_tick > 95);

    let ledger = sim.world().ledger(FactionId::Player);
    assert_eq!(ledger.gold(), 70);
    assert_eq!(ledger.earned(), 20);

    let worker_unit = unit(sim.world(), worker);
    assert_eq!(worker_unit.carried(), 0);
    assert_eq!(worker_unit.harvest, Some(TilePos::new(4, 3)));
}

// =============================================================================
// Production
// =============================================================================

#[test]
fn trained_worker_appears_after_training_time() {
    let mut sim = simulation(12);
    let outcome = sim.apply_command(
        FactionId::Player,
        &PlayerCommand::Train {
            building: BuildingKind::CommandCenter,
            unit: UnitKind::Worker,
        },
    );
    assert!(outcome.success);
    assert_eq!(sim.world().ledger(FactionId::Player).gold(), 0);

    sim.run(59);
    assert_eq!(sim.world().count_units(FactionId::Player, UnitKind::Worker), 1);
    sim.step();
    assert_eq!(sim.world().count_units(FactionId::Player, UnitKind::Worker), 2);
    assert_eq!(sim.world().count_queued(FactionId::Player, UnitKind::Worker), 0);
}

// =============================================================================
// Combat
// =============================================================================

#[test]
fn adjacent_melee_units_trade_blows_until_one_falls() {
    let mut sim = drive(
        r"(
            units: [
                (owner: player, kind: Melee, x: 5, y: 5),
                (owner: opponent, kind: Melee, x: 6, y: 5),
            ],
        )",
    );
    let (ours, theirs) = (EntityId(1), EntityId(2));

    sim.step();
    assert_eq!(sim.world().entity(ours).unwrap().hp, 72);
    assert_eq!(sim.world().entity(theirs).unwrap().hp, 72);

    // cooldown 10: attacks land on ticks 0, 10, ..., 90
    let mut destroyed = None;
    for _ in 0..200 {
        let events = sim.step();
        if let Some(record) = events
            .events
            .iter()
            .find(|r| matches!(r.event, GameEvent::Destroyed { .. }))
        {
            destroyed = Some(record.clone());
            break;
        }
    }
    let record = destroyed.expect("one unit dies");
    assert_eq!(record.t, 90);
    assert_eq!(
        record.event,
        GameEvent::Destroyed {
            owner: FactionId::Opponent,
            id: theirs,
            kind: "Melee".to_string(),
        }
    );

    // the lower id struck first, so the victim never answered the last blow
    assert!(sim.world().entity(theirs).is_none());
    assert_eq!(sim.world().entity(ours).unwrap().hp, 8);
}

#[test]
fn idle_unit_walks_into_range() {
    let mut sim = drive(
        r"(
            buildings: [(owner: opponent, kind: Barracks, x: 12, y: 5)],
            units: [(owner: player, kind: Ranged, x: 2, y: 5)],
        )",
    );
    let ranged = EntityId(2);

    sim.step();
    assert!(unit(sim.world(), ranged).move_target.is_some());

    sim.run(20);
    let barracks = sim
        .world()
        .find_building(FactionId::Opponent, BuildingKind::Barracks)
        .unwrap();
    assert!(barracks.hp < barracks.max_hp);
    let distance = sim.world().entity(ranged).unwrap().pos.manhattan(barracks.center());
    assert!(distance <= 3, "stopped {distance} tiles away");
}

// =============================================================================
// Match end
// =============================================================================

#[test]
fn losing_last_command_center_decides_match() {
    let mut sim = drive(
        r"(
            buildings: [
                (owner: player, kind: CommandCenter, x: 1, y: 17),
                (owner: opponent, kind: CommandCenter, x: 10, y: 10),
            ],
            units: [(owner: player, kind: Melee, x: 12, y: 11)],
        )",
    );
    let cc = sim
        .world()
        .find_building(FactionId::Opponent, BuildingKind::CommandCenter)
        .unwrap()
        .id;
    sim.world_mut().entity_mut(cc).unwrap().hp = 8;

    let outcome = sim.run_until_decided(5);
    assert_eq!(outcome, MatchOutcome::Victory(FactionId::Player));
    assert_eq!(sim.outcome().winner(), Some(FactionId::Player));
    // tiles under the fallen building are free again
    assert_eq!(sim.world().tile(TilePos::new(10, 10)), Tile::Empty);
    assert_eq!(sim.world().tile(TilePos::new(11, 11)), Tile::Empty);
}
