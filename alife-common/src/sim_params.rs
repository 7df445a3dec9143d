use serde::{Deserialize, Serialize};

/// Simulation parameters derived from the configuration, used frequently during simulation steps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimParams {
    // World & Grid
    pub world_size: i32,
    pub num_cells: usize,
    pub food_density: usize,
    pub object_density: usize,

    // Time
    pub simulation_cycles: u32,

    // Stochastic behaviour
    pub spawn_probability: f64, // Chance per cycle of adding food while below density
    pub max_placement_attempts: u32, // Random cell draws before falling back to a full scan
    pub max_direction_retries: u32, // Boundary re-rolls before the agent stays put
    pub negative_energy_is_fatal: bool,
}
