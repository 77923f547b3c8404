//! Proptest strategies.
//!
//! These strategies generate random but reproducible inputs for
//! property-based testing: coordinates (deliberately including a margin of
//! out-of-bounds values), kinds, and whole command schedules.

use proptest::prelude::*;

use rts_core::commands::PlayerCommand;
use rts_core::components::{BuildingKind, EntityId, UnitKind};
use rts_core::factions::FactionId;
use rts_core::grid::TilePos;

use crate::determinism::ScheduledCommand;

/// Default grid edge the strategies are tuned for.
pub const GRID: i32 = 20;

/// A coordinate on a 20-wide axis, with a two-tile margin outside it.
pub fn arb_coord() -> impl Strategy<Value = i32> {
    -2..GRID + 2
}

/// A tile position, occasionally out of bounds.
pub fn arb_tile() -> impl Strategy<Value = TilePos> {
    (arb_coord(), arb_coord()).prop_map(|(x, y)| TilePos::new(x, y))
}

/// Either faction.
pub fn arb_faction() -> impl Strategy<Value = FactionId> {
    prop_oneof![Just(FactionId::Player), Just(FactionId::Opponent)]
}

/// Any unit kind.
pub fn arb_unit_kind() -> impl Strategy<Value = UnitKind> {
    prop_oneof![
        Just(UnitKind::Worker),
        Just(UnitKind::Melee),
        Just(UnitKind::Ranged)
    ]
}

/// Any building kind.
pub fn arb_building_kind() -> impl Strategy<Value = BuildingKind> {
    prop_oneof![Just(BuildingKind::CommandCenter), Just(BuildingKind::Barracks)]
}

/// Any command, valid or not.
pub fn arb_command() -> impl Strategy<Value = PlayerCommand> {
    prop_oneof![
        (arb_coord(), arb_coord()).prop_map(|(x, y)| PlayerCommand::Select { x, y }),
        (arb_coord(), arb_coord()).prop_map(|(x, y)| PlayerCommand::Order { x, y }),
        (1u32..40, arb_coord(), arb_coord()).prop_map(|(id, x, y)| PlayerCommand::OrderUnit {
            unit: EntityId(id),
            x,
            y
        }),
        (arb_building_kind(), arb_coord(), arb_coord())
            .prop_map(|(building, x, y)| PlayerCommand::Place { building, x, y }),
        (arb_building_kind(), arb_unit_kind())
            .prop_map(|(building, unit)| PlayerCommand::Train { building, unit }),
        arb_building_kind().prop_map(|building| PlayerCommand::BeginPlacement { building }),
        Just(PlayerCommand::CancelPlacement),
        (arb_coord(), arb_coord()).prop_map(|(x, y)| PlayerCommand::Click { x, y }),
    ]
}

/// A schedule of up to `max_len` commands within the first `max_tick` ticks,
/// sorted by tick.
pub fn arb_schedule(max_len: usize, max_tick: u64) -> impl Strategy<Value = Vec<ScheduledCommand>> {
    prop::collection::vec((0..max_tick, arb_faction(), arb_command()), 0..=max_len).prop_map(
        |mut entries| {
            entries.sort_by_key(|(tick, _, _)| *tick);
            entries
                .into_iter()
                .map(|(tick, faction, command)| ScheduledCommand {
                    tick,
                    faction,
                    command,
                })
                .collect()
        },
    )
}
