pub mod config;
pub mod engine;
pub mod events;
pub mod headless;
pub mod rng;
pub mod scenario;
pub mod snapshot;
pub mod spatial;
pub mod systems;
pub mod web;
pub mod world;

pub use config::{AidType, GameConfig};
pub use engine::{Engine, EngineBuilder, GamePhase};
pub use events::{Action, GameEvent, Notification};
pub use scenario::{Scenario, ScenarioLoader};
