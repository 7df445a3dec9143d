pub mod config;
pub mod kinds;
pub mod position;
pub mod sim_params;
pub mod snapshot;

// Re-export key types for easier use by dependent crates
pub use config::{SimulationConfig, WorldConfig, RunConfig, OutputConfig, AgentSpec};
pub use kinds::{Consumable, Diet, FoodKind, ObstacleKind, SenseType, Species};
pub use position::{Direction, Position, in_bounds};
pub use sim_params::SimParams;
pub use snapshot::{Snapshot, AgentView, FoodView, ObstacleView};
