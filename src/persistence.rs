//! Save files and snapshot output.
//!
//! A save holds the roster, the world configuration and the id counter. Food
//! and obstacles are regenerated by `init_world`, so they are never written.

use alife_common::{SimulationConfig, WorldConfig};
use log::{info, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::error::{EngineError, EngineResult};
use crate::registry::{Agent, EntityRegistry};
use crate::simulation::Simulation;

const SAVE_FORMAT_VERSION: u32 = 1;

/// On-disk encoding, picked from a file extension or a config string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveFormat {
    Json,
    Bincode,
    MessagePack,
}

impl SaveFormat {
    /// `.bin` is bincode, `.msgpack` is MessagePack, anything else is JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase).as_deref() {
            Some("bin") | Some("bincode") => SaveFormat::Bincode,
            Some("msgpack") | Some("mp") => SaveFormat::MessagePack,
            _ => SaveFormat::Json,
        }
    }

    /// Parses the `output.format` setting. Unknown names fall back to JSON.
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "json" => SaveFormat::Json,
            "bincode" => SaveFormat::Bincode,
            "messagepack" | "msgpack" => SaveFormat::MessagePack,
            other => {
                warn!("Unknown output format: {}. Using JSON instead.", other);
                SaveFormat::Json
            }
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            SaveFormat::Json => "json",
            SaveFormat::Bincode => "bin",
            SaveFormat::MessagePack => "msgpack",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedWorld {
    pub format_version: u32,
    pub world: WorldConfig,
    pub current_cycle: u32,
    pub next_agent_id: u32,
    pub agents: Vec<Agent>,
}

/// Serialises `value` to `path` in the given format.
pub fn write_serialized<T: Serialize + ?Sized>(path: &Path, format: SaveFormat, value: &T) -> EngineResult<()> {
    let file = File::create(path).map_err(|e| EngineError::persistence(path, e))?;
    let mut writer = BufWriter::new(file);
    match format {
        SaveFormat::Json => serde_json::to_writer(&mut writer, value).map_err(|e| EngineError::persistence(path, e))?,
        SaveFormat::Bincode => bincode::serialize_into(&mut writer, value).map_err(|e| EngineError::persistence(path, e))?,
        SaveFormat::MessagePack => rmp_serde::encode::write(&mut writer, value).map_err(|e| EngineError::persistence(path, e))?,
    }
    writer.flush().map_err(|e| EngineError::persistence(path, e))
}

/// Reads a value written by `write_serialized`.
pub fn read_serialized<T: DeserializeOwned>(path: &Path, format: SaveFormat) -> EngineResult<T> {
    let file = File::open(path).map_err(|e| EngineError::persistence(path, e))?;
    let reader = BufReader::new(file);
    match format {
        SaveFormat::Json => serde_json::from_reader(reader).map_err(|e| EngineError::persistence(path, e)),
        SaveFormat::Bincode => bincode::deserialize_from(reader).map_err(|e| EngineError::persistence(path, e)),
        SaveFormat::MessagePack => rmp_serde::decode::from_read(reader).map_err(|e| EngineError::persistence(path, e)),
    }
}

pub fn save_world(path: &Path, saved: &SavedWorld) -> EngineResult<()> {
    write_serialized(path, SaveFormat::from_path(path), saved)
}

pub fn load_world(path: &Path) -> EngineResult<SavedWorld> {
    let saved: SavedWorld = read_serialized(path, SaveFormat::from_path(path))?;
    if saved.format_version != SAVE_FORMAT_VERSION {
        return Err(EngineError::persistence(
            path,
            format!("unsupported save format version {}", saved.format_version),
        ));
    }
    Ok(saved)
}

impl Simulation {
    /// Writes the roster, world configuration and id counter to `path`.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> EngineResult<()> {
        let path = path.as_ref();
        let saved = SavedWorld {
            format_version: SAVE_FORMAT_VERSION,
            world: self.config.world.clone(),
            current_cycle: self.current_cycle,
            next_agent_id: self.registry.next_id(),
            agents: self.registry.agents.clone(),
        };
        save_world(path, &saved)?;
        info!("Saved {} agents to {}", saved.agents.len(), path.display());
        Ok(())
    }

    /// Restores a saved world in the Idle state.
    ///
    /// `base` supplies everything a save does not carry (run and output
    /// settings). Its roster is ignored in favour of the saved one. Food and
    /// obstacles stay empty until `init_world` or `init_world_keeping_agents`;
    /// the latter also keeps the saved cycle count.
    pub fn load<P: AsRef<Path>>(path: P, base: SimulationConfig) -> EngineResult<Self> {
        let path = path.as_ref();
        let saved = load_world(path)?;
        let mut config = base;
        config.world = saved.world;
        config.agents.clear();
        config
            .validate()
            .map_err(|e| EngineError::persistence(path, e))?;

        let mut agents = saved.agents;
        for agent in agents.iter_mut() {
            agent.last_food = None;
        }
        let registry = EntityRegistry::with_agents(agents, saved.next_agent_id);
        let mut sim = Simulation::with_registry(config, registry);
        sim.current_cycle = saved.current_cycle;
        info!("Loaded {} agents from {}", sim.agents().len(), path.display());
        Ok(sim)
    }

    /// Loads `path`, or builds a fresh simulation from `fallback` when the
    /// file is missing or unreadable.
    pub fn load_or_default<P: AsRef<Path>>(path: P, fallback: SimulationConfig) -> EngineResult<Self> {
        let path = path.as_ref();
        match Simulation::load(path, fallback.clone()) {
            Ok(sim) => Ok(sim),
            Err(e) => {
                warn!("{}. Starting from the default configuration.", e);
                Simulation::new(fallback)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::requests::AddAgentRequest;
    use crate::simulation::ClockState;
    use alife_common::{Position, Species};

    fn populated() -> Simulation {
        let mut config = SimulationConfig::default();
        config.world = WorldConfig {
            simulation_cycles: 50,
            world_size: 8,
            food_density: 10,
            object_density: 5,
        };
        config.run.seed = Some(17);
        let mut sim = Simulation::new(config).unwrap();
        sim.add_agent(AddAgentRequest::new(Species::Fox, "Rusty", 20).at(Position::new(1, 1))).unwrap();
        sim.add_agent(AddAgentRequest::new(Species::Rabbit, "Thumper", 8).at(Position::new(4, 2))).unwrap();
        sim.add_agent(AddAgentRequest::new(Species::Whale, "Orca", 35).at(Position::new(6, 6))).unwrap();
        sim
    }

    #[test]
    fn detects_format_from_extension() {
        assert_eq!(SaveFormat::from_path(Path::new("world.json")), SaveFormat::Json);
        assert_eq!(SaveFormat::from_path(Path::new("world.BIN")), SaveFormat::Bincode);
        assert_eq!(SaveFormat::from_path(Path::new("world.msgpack")), SaveFormat::MessagePack);
        assert_eq!(SaveFormat::from_path(Path::new("world")), SaveFormat::Json);
    }

    #[test]
    fn round_trip_restores_roster_and_config() {
        let dir = tempfile::tempdir().unwrap();
        let sim = populated();
        for name in ["world.json", "world.bin", "world.msgpack"] {
            let path = dir.path().join(name);
            sim.save(&path).unwrap();

            let loaded = Simulation::load(&path, SimulationConfig::default()).unwrap();
            assert_eq!(loaded.agents(), sim.agents(), "{name}");
            assert_eq!(loaded.config().world, sim.config().world);
            assert_eq!(loaded.state(), ClockState::Idle);
            assert!(loaded.registry().food.is_empty());
            assert!(loaded.registry().obstacles.is_empty());
            assert_eq!(loaded.registry().next_id(), 3);
        }
    }

    #[test]
    fn loaded_world_keeps_agent_cells_after_init() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("world.json");
        let sim = populated();
        sim.save(&path).unwrap();

        let mut loaded = Simulation::load(&path, SimulationConfig::default()).unwrap();
        loaded.init_world_keeping_agents().unwrap();
        assert_eq!(loaded.registry().food.len(), 10);
        assert_eq!(loaded.registry().obstacles.len(), 5);
        let positions: Vec<_> = loaded.agents().iter().map(|a| a.position).collect();
        assert_eq!(positions, [Position::new(1, 1), Position::new(4, 2), Position::new(6, 6)]);
        loaded.check_consistency().unwrap();
    }

    #[test]
    fn missing_file_is_a_persistence_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Simulation::load(dir.path().join("nope.json"), SimulationConfig::default()).unwrap_err();
        assert!(matches!(err, EngineError::Persistence { .. }));
    }

    #[test]
    fn corrupt_file_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, b"{ not json").unwrap();
        assert!(matches!(
            Simulation::load(&path, SimulationConfig::default()),
            Err(EngineError::Persistence { .. })
        ));

        let sim = Simulation::load_or_default(&path, SimulationConfig::default()).unwrap();
        assert_eq!(sim.config().world, WorldConfig::default());
        assert!(sim.agents().is_empty());
    }
}
