//! Simulation systems.
//!
//! Systems contain the per-tick rules. Each system does one thing and reads
//! or writes the world only through `&mut World`, so the scheduler fully
//! controls ordering.

use std::fmt::Debug;

use crate::combat::CombatSystem;
use crate::economy::EconomySystem;
use crate::production::ProductionSystem;
use crate::world::World;

/// A per-tick rule set applied to the world.
pub trait System: Send + Debug {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Apply one step of this system.
    ///
    /// Runs before the tick counter is incremented, so `world.tick()` is the
    /// tick being simulated.
    fn advance(&mut self, world: &mut World);
}

/// The standard pipeline: economy, then production, then combat & movement.
#[must_use]
pub fn default_systems() -> Vec<Box<dyn System>> {
    vec![
        Box::new(EconomySystem),
        Box::new(ProductionSystem),
        Box::new(CombatSystem),
    ]
}
