//! Grid-based artificial-life engine: agents sense, move and eat on a square
//! world while food regrows and energy decides who survives.

pub mod boundary;
pub mod error;
pub mod grid;
pub mod movement;
pub mod persistence;
pub mod registry;
pub mod requests;
pub mod sensing;
pub mod simulation;
pub mod spawner;

pub use error::{EngineError, EngineResult};
pub use grid::{Grid, Marker};
pub use movement::MoveOutcome;
pub use persistence::{SaveFormat, SavedWorld};
pub use registry::{Agent, Entity, EntityRegistry, FoodItem, Obstacle};
pub use requests::{AddAgentRequest, ModifyAgentRequest};
pub use simulation::{ClockState, Simulation, TickReport};
