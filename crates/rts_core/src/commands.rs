//! Command layer.
//!
//! The only way player intent (human or scripted) reaches the world. Every
//! operation validates first and either applies fully or changes nothing,
//! and every operation reports back a [`CommandOutcome`] instead of
//! returning an error: a rejected command is an ordinary game event.
//!
//! Check order matters because the first failing check picks the message:
//! - placement: buildable, gold, bounds, free footprint;
//! - training: gold, required building, building can train the kind.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::components::{BuildingKind, EntityId, UnitKind};
use crate::error::PlacementError;
use crate::event_log::GameEvent;
use crate::factions::FactionId;
use crate::grid::{Tile, TilePos};
use crate::world::{InteractionMode, World};

/// Why a command was rejected. `Display` is the user-facing message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// Not enough gold to place a building.
    #[error("Not enough gold (need {cost})")]
    CannotAffordBuilding {
        /// Building cost.
        cost: u32,
    },
    /// Not enough gold to train a unit.
    #[error("Not enough gold")]
    NotEnoughGold,
    /// The building kind cannot be constructed.
    #[error("Cannot build {0}")]
    NotBuildable(BuildingKind),
    /// Footprint or target tile problem.
    #[error(transparent)]
    Placement(#[from] PlacementError),
    /// The faction owns no building of the required kind.
    #[error("Need {0}")]
    MissingBuilding(BuildingKind),
    /// The building kind does not train that unit.
    #[error("{building} cannot train {unit}")]
    CannotTrain {
        /// Requested building kind.
        building: BuildingKind,
        /// Requested unit kind.
        unit: UnitKind,
    },
    /// No owned entity near the clicked tile.
    #[error("Nothing to select")]
    NothingToSelect,
    /// An order was issued with no selection.
    #[error("Nothing selected")]
    NothingSelected,
    /// The ordered entity does not exist or is not a unit.
    #[error("{0} is not a unit")]
    NotAUnit(EntityId),
    /// The ordered unit belongs to someone else.
    #[error("{0} is not yours")]
    NotOwned(EntityId),
}

/// Result reported to the caller of any command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandOutcome {
    /// Whether the command was applied.
    pub success: bool,
    /// Human-readable result.
    pub message: String,
}

impl CommandOutcome {
    /// A successful outcome.
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    /// A rejected outcome.
    pub fn rejected(error: &CommandError) -> Self {
        Self {
            success: false,
            message: error.to_string(),
        }
    }
}

impl From<CommandError> for CommandOutcome {
    fn from(error: CommandError) -> Self {
        Self::rejected(&error)
    }
}

type CommandResult = std::result::Result<String, CommandError>;

fn report(faction: FactionId, command: &'static str, result: CommandResult) -> CommandOutcome {
    match result {
        Ok(message) => CommandOutcome::ok(message),
        Err(error) => {
            tracing::debug!(%faction, command, reason = %error, "Command rejected");
            error.into()
        }
    }
}

fn check_bounds(world: &World, tile: TilePos) -> std::result::Result<(), CommandError> {
    if world.grid().in_bounds(tile) {
        Ok(())
    } else {
        Err(PlacementError::OutOfBounds.into())
    }
}

/// A command as submitted by a front-end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum PlayerCommand {
    /// Select at a tile.
    Select {
        /// Column.
        x: i32,
        /// Row.
        y: i32,
    },
    /// Order the selected unit to a tile.
    Order {
        /// Column.
        x: i32,
        /// Row.
        y: i32,
    },
    /// Order a specific unit to a tile.
    OrderUnit {
        /// Unit to order.
        unit: EntityId,
        /// Column.
        x: i32,
        /// Row.
        y: i32,
    },
    /// Construct a building anchored at a tile.
    Place {
        /// Building kind.
        building: BuildingKind,
        /// Anchor column.
        x: i32,
        /// Anchor row.
        y: i32,
    },
    /// Queue a unit.
    Train {
        /// Building kind to queue at.
        building: BuildingKind,
        /// Unit kind.
        unit: UnitKind,
    },
    /// Enter placement mode.
    BeginPlacement {
        /// Building kind.
        building: BuildingKind,
    },
    /// Leave placement mode.
    CancelPlacement,
    /// A left click: place in placement mode, select otherwise.
    Click {
        /// Column.
        x: i32,
        /// Row.
        y: i32,
    },
}

/// Apply a command on behalf of a faction.
pub fn apply(world: &mut World, faction: FactionId, command: &PlayerCommand) -> CommandOutcome {
    match *command {
        PlayerCommand::Select { x, y } => select(world, TilePos::new(x, y), faction),
        PlayerCommand::Order { x, y } => order_selected(world, TilePos::new(x, y), faction),
        PlayerCommand::OrderUnit { unit, x, y } => {
            order_unit(world, unit, TilePos::new(x, y), faction)
        }
        PlayerCommand::Place { building, x, y } => {
            place_building(world, building, TilePos::new(x, y), faction)
        }
        PlayerCommand::Train { building, unit } => train_unit(world, building, unit, faction),
        PlayerCommand::BeginPlacement { building } => begin_placement(world, building),
        PlayerCommand::CancelPlacement => cancel_placement(world),
        PlayerCommand::Click { x, y } => click_tile(world, TilePos::new(x, y), faction),
    }
}

/// Select the faction's entity at or nearest to a tile.
///
/// A building whose footprint covers the tile wins; otherwise the closest
/// owned unit (lowest id on ties). With nothing owned the selection is
/// cleared.
pub fn select(world: &mut World, tile: TilePos, faction: FactionId) -> CommandOutcome {
    let result = check_bounds(world, tile).and_then(|()| {
        let building = world
            .buildings()
            .find(|b| b.owner == faction && b.covers(tile));
        let chosen = building.or_else(|| {
            world
                .units()
                .filter(|u| u.owner == faction)
                .min_by_key(|u| (u.pos.manhattan(tile), u.id))
        });
        let picked = chosen.map(|e| (e.id, e.label()));

        world.ui_mut().selected = picked.map(|(id, _)| id);
        picked
            .map(|(id, label)| format!("Selected {label} {id}"))
            .ok_or(CommandError::NothingToSelect)
    });
    report(faction, "select", result)
}

/// Order the selected unit to a tile.
pub fn order_selected(world: &mut World, tile: TilePos, faction: FactionId) -> CommandOutcome {
    match world.ui().selected {
        Some(id) => order_unit(world, id, tile, faction),
        None => report(faction, "order", Err(CommandError::NothingSelected)),
    }
}

/// Order a unit to a tile.
///
/// A Worker sent to a Resource tile gets a harvest assignment; any other
/// order is a plain move and drops the harvest assignment.
pub fn order_unit(
    world: &mut World,
    id: EntityId,
    tile: TilePos,
    faction: FactionId,
) -> CommandOutcome {
    let result = (|| -> CommandResult {
        let entity = world.entity(id).ok_or(CommandError::NotAUnit(id))?;
        let unit = entity.as_unit().ok_or(CommandError::NotAUnit(id))?;
        if entity.owner != faction {
            return Err(CommandError::NotOwned(id));
        }
        check_bounds(world, tile)?;

        let harvest = unit.kind == UnitKind::Worker && world.tile(tile) == Tile::Resource;
        let unit = world
            .entity_mut(id)
            .and_then(|e| e.as_unit_mut())
            .ok_or(CommandError::NotAUnit(id))?;
        unit.move_target = Some(tile);
        if harvest {
            unit.harvest = Some(tile);
            unit.last_harvest = Some(tile);
            Ok(format!("Harvesting {tile}"))
        } else {
            unit.harvest = None;
            unit.last_harvest = None;
            Ok(format!("Moving to {tile}"))
        }
    })();
    report(faction, "order", result)
}

/// Construct a building with its top-left corner at `anchor`.
pub fn place_building(
    world: &mut World,
    kind: BuildingKind,
    anchor: TilePos,
    faction: FactionId,
) -> CommandOutcome {
    let result = (|| -> CommandResult {
        let cost = world
            .rules()
            .building(kind)
            .cost
            .ok_or(CommandError::NotBuildable(kind))?;
        if !world.ledger(faction).can_afford(cost) {
            return Err(CommandError::CannotAffordBuilding { cost });
        }
        world.check_footprint(kind, anchor)?;

        world.spawn_building(kind, faction, anchor)?;
        world.ledger_mut(faction).try_spend(cost);
        world.record(GameEvent::PlaceBuilding {
            owner: faction,
            building: kind,
            x: anchor.x,
            y: anchor.y,
        });
        tracing::info!(%faction, %kind, %anchor, "Building placed");
        Ok(format!("{kind} placed"))
    })();
    report(faction, "place", result)
}

/// Queue a unit at the faction's first building of the given kind.
pub fn train_unit(
    world: &mut World,
    building: BuildingKind,
    unit: UnitKind,
    faction: FactionId,
) -> CommandOutcome {
    let result = (|| -> CommandResult {
        let cost = world.rules().unit(unit).cost;
        if !world.ledger(faction).can_afford(cost) {
            return Err(CommandError::NotEnoughGold);
        }
        let producer = world
            .find_building(faction, building)
            .map(|b| b.id)
            .ok_or(CommandError::MissingBuilding(building))?;
        if !building.trains(unit) {
            return Err(CommandError::CannotTrain { building, unit });
        }

        let queue = world
            .entity_mut(producer)
            .and_then(|e| e.as_building_mut())
            .map(|b| &mut b.queue)
            .ok_or(CommandError::MissingBuilding(building))?;
        queue.push_back(unit);
        world.ledger_mut(faction).try_spend(cost);
        world.record(GameEvent::Queue {
            owner: faction,
            building,
            unit,
        });
        tracing::debug!(%faction, %building, %unit, "Unit queued");
        Ok(format!("{unit} queued"))
    })();
    report(faction, "train", result)
}

/// Enter placement mode for a building kind.
pub fn begin_placement(world: &mut World, kind: BuildingKind) -> CommandOutcome {
    if world.rules().building(kind).cost.is_none() {
        return CommandError::NotBuildable(kind).into();
    }
    world.ui_mut().mode = InteractionMode::PlacingBuilding(kind);
    CommandOutcome::ok(format!("Placing {kind}"))
}

/// Return to the default click mode.
pub fn cancel_placement(world: &mut World) -> CommandOutcome {
    world.ui_mut().mode = InteractionMode::Default;
    CommandOutcome::ok("Placement cancelled")
}

/// Handle a primary click.
///
/// In placement mode the click places the pending building and the mode
/// returns to default whether or not placement succeeded.
pub fn click_tile(world: &mut World, tile: TilePos, faction: FactionId) -> CommandOutcome {
    match world.ui().mode {
        InteractionMode::PlacingBuilding(kind) => {
            world.ui_mut().mode = InteractionMode::Default;
            place_building(world, kind, tile, faction)
        }
        InteractionMode::Default => select(world, tile, faction),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::GameRules;

    fn session() -> World {
        World::new_session(GameRules::default(), 42).unwrap()
    }

    fn player_worker(world: &World) -> EntityId {
        world
            .units()
            .find(|u| u.owner == FactionId::Player)
            .unwrap()
            .id
    }

    #[test]
    fn test_place_without_gold() {
        let mut world = session();
        let outcome = place_building(
            &mut world,
            BuildingKind::Barracks,
            TilePos::new(5, 10),
            FactionId::Player,
        );
        assert_eq!(
            outcome,
            CommandOutcome::rejected(&CommandError::CannotAffordBuilding { cost: 100 })
        );
        assert_eq!(outcome.message, "Not enough gold (need 100)");
        assert_eq!(world.ledger(FactionId::Player).gold(), 50);
    }

    #[test]
    fn test_place_out_of_bounds() {
        let mut world = session();
        world.ledger_mut(FactionId::Player).credit(100);
        let outcome = place_building(
            &mut world,
            BuildingKind::Barracks,
            TilePos::new(19, 19),
            FactionId::Player,
        );
        assert!(!outcome.success);
        assert_eq!(outcome.message, "Out of bounds");
        assert_eq!(world.ledger(FactionId::Player).gold(), 150);
    }

    #[test]
    fn test_place_on_occupied_space() {
        let mut world = session();
        world.ledger_mut(FactionId::Player).credit(100);
        // overlaps the player Command Center at (1, 17)
        let outcome = place_building(
            &mut world,
            BuildingKind::Barracks,
            TilePos::new(0, 16),
            FactionId::Player,
        );
        assert_eq!(outcome.message, "Space blocked");

        // under the player worker at (3, 17)
        let outcome = place_building(
            &mut world,
            BuildingKind::Barracks,
            TilePos::new(3, 16),
            FactionId::Player,
        );
        assert_eq!(outcome.message, "Space blocked");
    }

    #[test]
    fn test_place_success_debits_and_logs() {
        let mut world = World::empty(GameRules::default(), 0);
        world.ledger_mut(FactionId::Player).credit(100);
        let outcome = place_building(
            &mut world,
            BuildingKind::Barracks,
            TilePos::new(6, 6),
            FactionId::Player,
        );
        assert_eq!(outcome, CommandOutcome::ok("Barracks placed"));
        assert_eq!(world.ledger(FactionId::Player).gold(), 50);
        assert_eq!(world.ledger(FactionId::Player).spent(), 100);
        assert_eq!(world.tile(TilePos::new(7, 7)), Tile::Blocked);
        assert!(matches!(
            world.log().records()[0].event,
            GameEvent::PlaceBuilding { x: 6, y: 6, .. }
        ));
    }

    #[test]
    fn test_command_center_not_buildable() {
        let mut world = session();
        world.ledger_mut(FactionId::Player).credit(1000);
        let outcome = place_building(
            &mut world,
            BuildingKind::CommandCenter,
            TilePos::new(8, 8),
            FactionId::Player,
        );
        assert_eq!(outcome.message, "Cannot build CommandCenter");
        assert!(!begin_placement(&mut world, BuildingKind::CommandCenter).success);
    }

    #[test]
    fn test_train_check_order() {
        let mut world = session();
        let outcome = train_unit(
            &mut world,
            BuildingKind::Barracks,
            UnitKind::Ranged,
            FactionId::Player,
        );
        assert_eq!(outcome.message, "Need Barracks");

        world.ledger_mut(FactionId::Player).try_spend(50);
        let outcome = train_unit(
            &mut world,
            BuildingKind::Barracks,
            UnitKind::Ranged,
            FactionId::Player,
        );
        assert_eq!(outcome.message, "Not enough gold");

        world.ledger_mut(FactionId::Player).credit(100);
        let outcome = train_unit(
            &mut world,
            BuildingKind::CommandCenter,
            UnitKind::Melee,
            FactionId::Player,
        );
        assert_eq!(outcome.message, "CommandCenter cannot train Melee");
        assert_eq!(world.ledger(FactionId::Player).gold(), 100);
    }

    #[test]
    fn test_train_worker_queues() {
        let mut world = session();
        let outcome = train_unit(
            &mut world,
            BuildingKind::CommandCenter,
            UnitKind::Worker,
            FactionId::Player,
        );
        assert_eq!(outcome, CommandOutcome::ok("Worker queued"));
        assert_eq!(world.ledger(FactionId::Player).gold(), 0);
        assert_eq!(world.count_queued(FactionId::Player, UnitKind::Worker), 1);
    }

    #[test]
    fn test_select_prefers_building_footprint() {
        let mut world = session();
        let outcome = select(&mut world, TilePos::new(2, 18), FactionId::Player);
        assert!(outcome.success);
        let selected = world.ui().selected.unwrap();
        assert!(world.entity(selected).unwrap().as_building().is_some());

        select(&mut world, TilePos::new(10, 10), FactionId::Player);
        assert_eq!(world.ui().selected, Some(player_worker(&world)));
    }

    #[test]
    fn test_select_never_picks_enemy() {
        let mut world = session();
        select(&mut world, TilePos::new(17, 1), FactionId::Player);
        let selected = world.ui().selected.unwrap();
        assert_eq!(world.entity(selected).unwrap().owner, FactionId::Player);

        let outcome = select(&mut world, TilePos::new(20, 0), FactionId::Player);
        assert_eq!(outcome.message, "Out of bounds");
        assert_eq!(world.ui().selected, Some(selected));
    }

    #[test]
    fn test_select_nothing_clears() {
        let mut world = World::empty(GameRules::default(), 0);
        world.ui_mut().selected = Some(EntityId(9));
        let outcome = select(&mut world, TilePos::new(3, 3), FactionId::Player);
        assert_eq!(outcome.message, "Nothing to select");
        assert_eq!(world.ui().selected, None);
    }

    #[test]
    fn test_order_worker_to_resource_assigns_harvest() {
        let mut world = World::empty(GameRules::default(), 0);
        let spot = TilePos::new(8, 8);
        world.set_tile(spot, Tile::Resource).unwrap();
        let id = world
            .spawn_unit(UnitKind::Worker, FactionId::Player, TilePos::new(2, 2))
            .unwrap();
        world.ui_mut().selected = Some(id);

        let outcome = order_selected(&mut world, spot, FactionId::Player);
        assert!(outcome.success);
        let unit = world.entity(id).unwrap().as_unit().unwrap();
        assert_eq!(unit.harvest, Some(spot));
        assert_eq!(unit.move_target, Some(spot));

        order_selected(&mut world, TilePos::new(4, 4), FactionId::Player);
        let unit = world.entity(id).unwrap().as_unit().unwrap();
        assert_eq!(unit.harvest, None);
        assert_eq!(unit.last_harvest, None);
        assert_eq!(unit.move_target, Some(TilePos::new(4, 4)));
    }

    #[test]
    fn test_order_rejections() {
        let mut world = session();
        assert_eq!(
            order_selected(&mut world, TilePos::new(5, 5), FactionId::Player).message,
            "Nothing selected"
        );

        let enemy = world
            .units()
            .find(|u| u.owner == FactionId::Opponent)
            .unwrap()
            .id;
        let outcome = order_unit(&mut world, enemy, TilePos::new(5, 5), FactionId::Player);
        assert!(!outcome.success);

        let cc = world.buildings().next().unwrap().id;
        assert!(!order_unit(&mut world, cc, TilePos::new(5, 5), FactionId::Player).success);

        let worker = player_worker(&world);
        let outcome = order_unit(&mut world, worker, TilePos::new(-1, 5), FactionId::Player);
        assert_eq!(outcome.message, "Out of bounds");
        assert_eq!(world.entity(worker).unwrap().as_unit().unwrap().move_target, None);
    }

    #[test]
    fn test_click_places_then_resets_mode() {
        let mut world = World::empty(GameRules::default(), 0);
        begin_placement(&mut world, BuildingKind::Barracks);
        assert_eq!(
            world.ui().mode,
            InteractionMode::PlacingBuilding(BuildingKind::Barracks)
        );

        let outcome = click_tile(&mut world, TilePos::new(5, 5), FactionId::Player);
        assert_eq!(outcome.message, "Not enough gold (need 100)");
        assert_eq!(world.ui().mode, InteractionMode::Default);

        let outcome = click_tile(&mut world, TilePos::new(5, 5), FactionId::Player);
        assert_eq!(outcome.message, "Nothing to select");
    }

    #[test]
    fn test_apply_parses_json_commands() {
        let mut world = session();
        let command: PlayerCommand =
            serde_json::from_str(r#"{"cmd":"train","building":"CommandCenter","unit":"Worker"}"#)
                .unwrap();
        assert!(apply(&mut world, FactionId::Player, &command).success);

        let command: PlayerCommand =
            serde_json::from_str(r#"{"cmd":"place","building":"Barracks","x":19,"y":0}"#).unwrap();
        let outcome = apply(&mut world, FactionId::Player, &command);
        assert_eq!(outcome.message, "Not enough gold (need 100)");
    }
}
