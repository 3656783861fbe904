mod bookkeeping;
mod combat;
mod decay;
mod migration;
mod supply;

pub use bookkeeping::BookkeepingSystem;
pub use combat::{resolve_combat, CombatReport, CombatSystem};
pub use decay::{resolve_decay, DecayReport, DecaySystem};
pub use migration::{resolve_migration, MigrationReport, MigrationSystem};
pub use supply::{resolve_supply_drop, DropOutcome};
