use serde::{Deserialize, Serialize};
use anyhow::Result;
use crate::sim_params::SimParams;
use std::path::Path;

// World shape and population targets
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct WorldConfig {
    pub simulation_cycles: u32,
    pub world_size: u32,
    pub food_density: u32,   // Target standing food count
    pub object_density: u32, // Obstacle count
}

impl Default for WorldConfig {
    fn default() -> Self {
        WorldConfig {
            simulation_cycles: 1000,
            world_size: 10,
            food_density: 20,
            object_density: 10,
        }
    }
}

// Stochastic behaviour and retry bounds
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct RunConfig {
    /// Seed for the engine RNG. `None` draws from OS entropy.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_spawn_probability")]
    pub spawn_probability: f64,
    #[serde(default = "default_max_placement_attempts")]
    pub max_placement_attempts: u32,
    #[serde(default = "default_max_direction_retries")]
    pub max_direction_retries: u32,
    /// When false only energy of exactly zero kills an agent.
    #[serde(default)]
    pub negative_energy_is_fatal: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            seed: None,
            spawn_probability: default_spawn_probability(),
            max_placement_attempts: default_max_placement_attempts(),
            max_direction_retries: default_max_direction_retries(),
            negative_energy_is_fatal: false,
        }
    }
}

// Configuration for output settings
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct OutputConfig {
    #[serde(default = "default_base_filename")]
    pub base_filename: String,
    #[serde(default = "default_true")]
    pub save_snapshots: bool,
    #[serde(default = "default_true")]
    pub save_roster: bool,
    pub format: Option<String>, // Output format: "json", "bincode", "messagepack"
    #[serde(default = "default_record_interval")]
    pub record_interval_cycles: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            base_filename: default_base_filename(),
            save_snapshots: true,
            save_roster: true,
            format: None,
            record_interval_cycles: default_record_interval(),
        }
    }
}

/// One entry of the initial roster. Species stays a string here; it is
/// validated when the engine turns the entry into an add request.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct AgentSpec {
    pub species: String,
    pub name: String,
    pub energy: i32,
    #[serde(default)]
    pub x: Option<i32>,
    #[serde(default)]
    pub y: Option<i32>,
}

// Main simulation configuration structure, loaded from config.toml.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct SimulationConfig {
    #[serde(default)]
    pub world: WorldConfig,
    #[serde(default)]
    pub run: RunConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub agents: Vec<AgentSpec>,
}

impl SimulationConfig {
    /// Loads the simulation configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();

        let config_str = std::fs::read_to_string(path_ref)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path_ref.display(), e))?;
        let config = Self::from_toml_str(&config_str)
            .map_err(|e| anyhow::anyhow!("Invalid config '{}': {}", path_ref.display(), e))?;
        Ok(config)
    }

    /// Parses and validates configuration held in memory.
    pub fn from_toml_str(config_str: &str) -> Result<Self> {
        let config: SimulationConfig = toml::from_str(config_str)
            .map_err(|e| anyhow::anyhow!("Failed to parse TOML: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let world = &self.world;
        if world.world_size == 0 {
            anyhow::bail!("world_size must be greater than 0.");
        }
        if world.world_size > i32::MAX as u32 / 2 {
            anyhow::bail!("world_size {} is too large.", world.world_size);
        }
        let capacity = world.world_size as u64 * world.world_size as u64;
        let requested = world.food_density as u64 + world.object_density as u64;
        if requested > capacity {
            anyhow::bail!(
                "food_density + object_density ({}) exceeds the {} cells of a {}x{} world.",
                requested, capacity, world.world_size, world.world_size
            );
        }
        if !(0.0..=1.0).contains(&self.run.spawn_probability) {
            anyhow::bail!("spawn_probability must lie in [0, 1].");
        }
        if self.run.max_placement_attempts == 0 {
            anyhow::bail!("max_placement_attempts must be greater than 0.");
        }
        for spec in &self.agents {
            if spec.name.trim().is_empty() {
                anyhow::bail!("Agent entries must have a non-empty name.");
            }
        }
        Ok(())
    }

    /// Converts the configuration into parameters used at runtime.
    pub fn get_sim_params(&self) -> SimParams {
        SimParams {
            world_size: self.world.world_size as i32,
            num_cells: self.world.world_size as usize * self.world.world_size as usize,
            food_density: self.world.food_density as usize,
            object_density: self.world.object_density as usize,
            simulation_cycles: self.world.simulation_cycles,
            spawn_probability: self.run.spawn_probability,
            max_placement_attempts: self.run.max_placement_attempts,
            max_direction_retries: self.run.max_direction_retries,
            negative_energy_is_fatal: self.run.negative_energy_is_fatal,
        }
    }
}

fn default_spawn_probability() -> f64 {
    0.5
}

fn default_max_placement_attempts() -> u32 {
    256
}

fn default_max_direction_retries() -> u32 {
    32
}

fn default_base_filename() -> String {
    "alife".to_string()
}

fn default_record_interval() -> u32 {
    1
}

fn default_true() -> bool {
    true
}
