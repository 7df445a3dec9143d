use serde::{Serialize, Deserialize};
use std::fmt;

use crate::kinds::{FoodKind, ObstacleKind, Species};
use crate::position::Position;

/// Read-only view of one agent, as handed to renderers between ticks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentView {
    pub id: u32,
    pub name: String,
    pub species: Species,
    pub energy: i32,
    pub position: Position,
    pub alive: bool,
    /// Cell of the food or prey consumed during the last cycle, if any.
    pub last_food: Option<Position>,
}

/// Info-panel line: `name: energy`.
impl fmt::Display for AgentView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.energy)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoodView {
    pub kind: FoodKind,
    pub nutrition: i32,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObstacleView {
    pub kind: ObstacleKind,
    pub position: Position,
}

/// A snapshot of the world taken between two ticks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Cycles completed when the snapshot was taken.
    pub cycle: u32,
    /// Target number of cycles for the run.
    pub total_cycles: u32,
    pub world_size: u32,
    /// Live agents in registry (processing) order.
    pub agents: Vec<AgentView>,
    pub food: Vec<FoodView>,
    pub obstacles: Vec<ObstacleView>,
}

impl Snapshot {
    pub fn live_agent_count(&self) -> usize {
        self.agents.len()
    }

    pub fn total_energy(&self) -> i64 {
        self.agents.iter().map(|a| a.energy as i64).sum()
    }
}
