use alife_common::{in_bounds, FoodKind, Position, SimParams, SimulationConfig, Snapshot, WorldConfig};
use log::{debug, error, info, trace, warn};
use rand::prelude::*;
use std::collections::HashSet;

use crate::boundary::protect_boundaries;
use crate::error::{EngineError, EngineResult};
use crate::grid::Grid;
use crate::movement::{move_agent, MoveOutcome};
use crate::registry::{Agent, EntityRegistry};
use crate::requests::{AddAgentRequest, ModifyAgentRequest};
use crate::sensing::direction_of_food;
use crate::spawner::{is_vacant, place_obstacle, random_vacant_cell, spawn_food_item};

/// Lifecycle of the clock. Ticking is only allowed once the world is populated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockState {
    Idle,
    Running,
}

/// How `init_world` treats existing agent coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AgentPlacement {
    Randomize,
    Keep,
}

/// Tally of what happened during one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Cycle number after the tick.
    pub cycle: u32,
    pub food_spawned: Option<FoodKind>,
    pub agents_moved: u32,
    pub meals: u32,
    pub prey_killed: u32,
    pub collisions: u32,
    pub deaths: u32,
}

impl TickReport {
    fn record(&mut self, outcome: &MoveOutcome) {
        if outcome.is_meal() {
            self.meals += 1;
        }
        if outcome.is_collision() {
            self.collisions += 1;
        }
        match outcome {
            MoveOutcome::AtePrey { .. } => self.prey_killed += 1,
            MoveOutcome::Moved => self.agents_moved += 1,
            _ => {}
        }
    }
}

/// Owns the world (grid, entities, RNG) and advances it one cycle at a time.
#[derive(Debug)]
pub struct Simulation {
    /// The simulation configuration, including the initial roster.
    pub(crate) config: SimulationConfig,
    /// Runtime parameters derived from `config`.
    params: SimParams,
    pub(crate) grid: Grid,
    pub(crate) registry: EntityRegistry,
    /// Single RNG threaded through every stochastic operation.
    rng: StdRng,
    pub(crate) current_cycle: u32,
    state: ClockState,
    /// Ids of agents added with explicit coordinates that the next
    /// `init_world` must not scatter.
    pinned: HashSet<u32>,
    /// Snapshots collected by `record_snapshot`.
    recorded_snapshots: Vec<Snapshot>,
}

impl Simulation {
    /// Creates an idle simulation and adds the configured roster.
    pub fn new(config: SimulationConfig) -> EngineResult<Self> {
        let mut sim = Self::with_registry(config, EntityRegistry::new());
        let specs = sim.config.agents.clone();
        for spec in &specs {
            let request = AddAgentRequest::from_spec(spec)?;
            sim.add_agent(request)?;
        }
        Ok(sim)
    }

    /// Idle simulation around an existing registry, used when restoring a save.
    pub(crate) fn with_registry(config: SimulationConfig, registry: EntityRegistry) -> Self {
        let rng = match config.run.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let params = config.get_sim_params();
        Self {
            grid: Grid::new(params.world_size),
            params,
            config,
            registry,
            rng,
            current_cycle: 0,
            state: ClockState::Idle,
            pinned: HashSet::new(),
            recorded_snapshots: Vec::new(),
        }
    }

    /// Clears and repopulates food and obstacles, scatters the live agents on
    /// random vacant cells, and resets the cycle counter. Agents added with
    /// explicit coordinates keep them.
    pub fn init_world(&mut self) -> EngineResult<()> {
        self.populate(AgentPlacement::Randomize)
    }

    /// Like `init_world`, but every agent keeps its current coordinates when
    /// those are on the grid and not shared with an earlier agent. The cycle
    /// counter carries on from where a restored save left it.
    pub fn init_world_keeping_agents(&mut self) -> EngineResult<()> {
        self.populate(AgentPlacement::Keep)
    }

    /// Fails when `params` leave no room for the live agents.
    fn check_capacity(&self, params: &SimParams) -> EngineResult<()> {
        let live_agents = self.registry.live_agent_count();
        let needed = params.food_density + params.object_density + live_agents;
        if needed > params.num_cells {
            return Err(EngineError::Configuration(format!(
                "{} food, {} obstacles and {} agents do not fit in a {}x{} world",
                params.food_density, params.object_density, live_agents, params.world_size, params.world_size
            )));
        }
        Ok(())
    }

    fn populate(&mut self, placement: AgentPlacement) -> EngineResult<()> {
        info!("Initialising world...");
        self.check_capacity(&self.params)?;
        let size = self.params.world_size;
        let live_agents = self.registry.live_agent_count();

        if self.grid.size() != size {
            self.grid.resize(size);
        } else {
            self.grid.clear();
        }
        self.registry.clear_world_items();
        if placement == AgentPlacement::Randomize {
            self.current_cycle = 0;
        }

        let attempts = self.params.max_placement_attempts;

        // Kept agents claim their cells first so food and obstacles route around them.
        let keep_all = placement == AgentPlacement::Keep;
        let mut kept: HashSet<usize> = HashSet::new();
        let mut taken = HashSet::new();
        for (idx, agent) in self.registry.agents.iter().enumerate() {
            let wants_cell = keep_all || self.pinned.contains(&agent.id);
            if wants_cell && agent.alive && in_bounds(agent.position, size) && taken.insert(agent.position) {
                kept.insert(idx);
            }
        }
        // Park the rest off-grid until they are placed below.
        for (idx, agent) in self.registry.agents.iter_mut().enumerate() {
            if !kept.contains(&idx) {
                agent.position = Position::new(-1, -1);
            }
        }

        let mut food_placed = 0;
        for _ in 0..self.params.food_density {
            // A roll outside every band places nothing; retry so the world starts at density.
            loop {
                if spawn_food_item(&mut self.registry, &mut self.grid, &mut self.rng, attempts)?.is_some() {
                    food_placed += 1;
                    break;
                }
            }
        }
        for _ in 0..self.params.object_density {
            place_obstacle(&mut self.registry, &mut self.grid, &mut self.rng, attempts)?;
        }

        for idx in 0..self.registry.agents.len() {
            if kept.contains(&idx) || !self.registry.agents[idx].alive {
                continue;
            }
            let pos = random_vacant_cell(&self.registry, &self.grid, &mut self.rng, attempts)?;
            let agent = &mut self.registry.agents[idx];
            agent.position = pos;
            agent.last_food = None;
        }

        self.pinned.clear();
        self.state = ClockState::Running;
        info!(
            "World {}x{} ready: {} food items, {} obstacles, {} agents ({} kept in place).",
            size, size, food_placed, self.registry.obstacles.len(), live_agents, kept.len()
        );
        Ok(())
    }

    /// Replaces the world configuration and rebuilds the world around it.
    pub fn reconfigure(&mut self, world: WorldConfig) -> EngineResult<()> {
        let mut config = self.config.clone();
        config.world = world;
        config
            .validate()
            .map_err(|e| EngineError::Configuration(e.to_string()))?;
        let params = config.get_sim_params();
        self.check_capacity(&params)?;

        let previous_config = std::mem::replace(&mut self.config, config);
        let previous_params = std::mem::replace(&mut self.params, params);
        if let Err(e) = self.init_world() {
            self.config = previous_config;
            self.params = previous_params;
            return Err(e);
        }
        Ok(())
    }

    /// Changes the run length without touching the world.
    pub fn set_simulation_cycles(&mut self, cycles: u32) {
        self.config.world.simulation_cycles = cycles;
        self.params.simulation_cycles = cycles;
    }

    /// Advances the world by one cycle.
    pub fn tick(&mut self) -> EngineResult<TickReport> {
        if self.state != ClockState::Running {
            return Err(EngineError::NotInitialised);
        }
        let mut report = TickReport::default();

        // --- 1. Replenish food ---
        if self.registry.food.len() < self.params.food_density
            && self.rng.random_bool(self.params.spawn_probability)
        {
            match spawn_food_item(
                &mut self.registry,
                &mut self.grid,
                &mut self.rng,
                self.params.max_placement_attempts,
            ) {
                Ok(kind) => report.food_spawned = kind,
                Err(e) => warn!("Skipping food spawn this cycle: {}", e),
            }
        }

        // --- 2. Sense, guard and move every active agent in registry order ---
        let world_size = self.grid.size();
        for idx in 0..self.registry.agents.len() {
            {
                let agent = &self.registry.agents[idx];
                if !agent.alive || agent.energy == 0 {
                    continue;
                }
            }
            self.registry.agents[idx].last_food = None;

            let agent = &self.registry.agents[idx];
            let sensed = direction_of_food(agent, &self.registry.agents, &self.grid, &mut self.rng);
            let direction = protect_boundaries(
                agent.position,
                sensed,
                world_size,
                self.params.max_direction_retries,
                &mut self.rng,
            );

            let outcome = move_agent(idx, direction, &mut self.registry, &mut self.grid);
            let agent = &mut self.registry.agents[idx];
            agent.energy = agent.energy.saturating_add(outcome.energy_delta());
            trace!("{} went {:?}: {:?}, energy now {}", agent.name, direction, outcome, agent.energy);
            report.record(&outcome);
        }

        // --- 3. Death check ---
        let fatal_negative = self.params.negative_energy_is_fatal;
        for agent in self.registry.agents.iter_mut() {
            if agent.alive && (agent.energy == 0 || (fatal_negative && agent.energy < 0)) {
                agent.alive = false;
                report.deaths += 1;
                debug!("{} ({}) ran out of energy and died.", agent.name, agent.species);
            }
        }

        if cfg!(debug_assertions) {
            if let Err(e) = self.registry.check_consistency(&self.grid) {
                error!("World inconsistent after cycle {}: {}", self.current_cycle + 1, e);
            }
        }

        self.current_cycle += 1;
        report.cycle = self.current_cycle;
        Ok(report)
    }

    /// Adds an agent and returns its id.
    ///
    /// Supplied coordinates must be on the grid, and vacant once the world is
    /// running. They survive the next `init_world`. Without coordinates the
    /// agent lands on a random vacant cell.
    pub fn add_agent(&mut self, request: AddAgentRequest) -> EngineResult<u32> {
        let position = match request.position {
            Some(pos) if !self.grid.in_bounds(pos) => {
                return Err(EngineError::InvalidRequest(format!(
                    "position {} is outside the {}x{} world",
                    pos,
                    self.grid.size(),
                    self.grid.size()
                )));
            }
            Some(pos) if self.state == ClockState::Running && !self.is_vacant(pos) => {
                return Err(EngineError::InvalidRequest(format!("cell {} is already occupied", pos)));
            }
            Some(pos) => pos,
            None => random_vacant_cell(
                &self.registry,
                &self.grid,
                &mut self.rng,
                self.params.max_placement_attempts,
            )?,
        };
        let id = self.registry.allocate_id();
        if request.position.is_some() {
            self.pinned.insert(id);
        }
        let agent = Agent::new(id, request.name, request.species, request.energy, position);
        info!("Added {} '{}' (id {}) at {} with energy {}.", agent.species, agent.name, id, position, agent.energy);
        self.registry.agents.push(agent);
        Ok(id)
    }

    /// Removes every agent called `name`. Returns how many were removed.
    pub fn remove_agent(&mut self, name: &str) -> EngineResult<usize> {
        let before = self.registry.agents.len();
        self.registry.agents.retain(|a| a.name != name);
        let removed = before - self.registry.agents.len();
        if removed == 0 {
            return Err(EngineError::InvalidRequest(format!("no agent named '{}'", name)));
        }
        info!("Removed {} agent(s) named '{}'.", removed, name);
        Ok(removed)
    }

    /// Applies a rename/energy change to every agent matching the request name.
    pub fn modify_agent(&mut self, request: &ModifyAgentRequest) -> EngineResult<usize> {
        let mut changed = 0;
        for agent in self.registry.agents.iter_mut().filter(|a| a.name == request.name) {
            agent.name = request.new_name.clone();
            agent.energy = request.new_energy;
            changed += 1;
        }
        if changed == 0 {
            return Err(EngineError::InvalidRequest(format!("no agent named '{}'", request.name)));
        }
        Ok(changed)
    }

    /// Drops dead agents from the roster. Call between ticks.
    pub fn prune_dead(&mut self) -> usize {
        self.registry.prune_dead()
    }

    /// True once the target cycle count is reached or nobody is left alive.
    pub fn is_finished(&self) -> bool {
        self.current_cycle >= self.params.simulation_cycles || self.registry.live_agent_count() == 0
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            cycle: self.current_cycle,
            total_cycles: self.params.simulation_cycles,
            world_size: self.config.world.world_size,
            agents: self.registry.live_agents().map(Agent::view).collect(),
            food: self.registry.food_views(),
            obstacles: self.registry.obstacle_views(),
        }
    }

    /// Stores a snapshot of the current state.
    pub fn record_snapshot(&mut self) {
        debug!("Recording snapshot at cycle {}...", self.current_cycle);
        let snapshot = self.snapshot();
        self.recorded_snapshots.push(snapshot);
    }

    pub fn recorded_snapshots(&self) -> &[Snapshot] {
        &self.recorded_snapshots
    }

    /// Checks that the grid and the registry agree.
    pub fn check_consistency(&self) -> Result<(), String> {
        self.registry.check_consistency(&self.grid)
    }

    /// Whether `pos` has no marker and no live agent.
    pub fn is_vacant(&self, pos: Position) -> bool {
        is_vacant(pos, &self.registry, &self.grid)
    }

    pub fn state(&self) -> ClockState {
        self.state
    }

    pub fn current_cycle(&self) -> u32 {
        self.current_cycle
    }

    pub fn params(&self) -> &SimParams {
        &self.params
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    pub fn agents(&self) -> &[Agent] {
        &self.registry.agents
    }

    pub fn live_agent_count(&self) -> usize {
        self.registry.live_agent_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alife_common::{AgentSpec, Position, Species};

    fn config(size: u32, food: u32, obstacles: u32, seed: u64) -> SimulationConfig {
        let mut config = SimulationConfig::default();
        config.world = WorldConfig {
            simulation_cycles: 50,
            world_size: size,
            food_density: food,
            object_density: obstacles,
        };
        config.run.seed = Some(seed);
        config
    }

    #[test]
    fn tick_before_init_is_rejected() {
        let mut sim = Simulation::new(config(5, 2, 2, 1)).unwrap();
        assert_eq!(sim.state(), ClockState::Idle);
        assert!(matches!(sim.tick(), Err(EngineError::NotInitialised)));
    }

    #[test]
    fn init_populates_densities_without_overlap() {
        let mut sim = Simulation::new(config(8, 10, 5, 4)).unwrap();
        sim.add_agent(AddAgentRequest::new(Species::Cow, "Daisy", 10)).unwrap();
        sim.add_agent(AddAgentRequest::new(Species::Fox, "Rusty", 10)).unwrap();
        sim.init_world().unwrap();

        assert_eq!(sim.registry().food.len(), 10);
        assert_eq!(sim.registry().obstacles.len(), 5);
        assert_eq!(sim.current_cycle(), 0);
        sim.check_consistency().unwrap();
        for agent in sim.agents() {
            assert!(sim.grid().cell_at(agent.position).is_empty(), "{} placed on an item", agent.name);
        }
        assert_ne!(sim.agents()[0].position, sim.agents()[1].position);
    }

    #[test]
    fn over_capacity_world_is_a_configuration_error() {
        let mut sim = Simulation::new(config(3, 5, 4, 2)).unwrap();
        sim.add_agent(AddAgentRequest::new(Species::Bug, "Bee", 3)).unwrap();
        assert!(matches!(sim.init_world(), Err(EngineError::Configuration(_))));
        assert_eq!(sim.state(), ClockState::Idle);
    }

    #[test]
    fn zero_energy_agent_dies_without_moving() {
        let mut sim = Simulation::new(config(6, 0, 0, 3)).unwrap();
        sim.add_agent(AddAgentRequest::new(Species::Cow, "Tired", 0)).unwrap();
        sim.init_world().unwrap();
        let start = sim.agents()[0].position;

        let report = sim.tick().unwrap();
        assert_eq!(report.deaths, 1);
        assert!(!sim.agents()[0].alive);
        assert_eq!(sim.agents()[0].position, start);
        assert_eq!(sim.current_cycle(), 1);
    }

    #[test]
    fn negative_energy_keeps_acting_unless_configured_fatal() {
        let mut lenient = Simulation::new(config(6, 0, 0, 3)).unwrap();
        lenient.add_agent(AddAgentRequest::new(Species::Pig, "Wilbur", -4)).unwrap();
        lenient.init_world().unwrap();
        lenient.tick().unwrap();
        assert!(lenient.agents()[0].alive);

        let mut strict_config = config(6, 0, 0, 3);
        strict_config.run.negative_energy_is_fatal = true;
        let mut strict = Simulation::new(strict_config).unwrap();
        strict.add_agent(AddAgentRequest::new(Species::Pig, "Wilbur", -4)).unwrap();
        strict.init_world().unwrap();
        strict.tick().unwrap();
        assert!(!strict.agents()[0].alive);
    }

    #[test]
    fn food_is_replenished_toward_density() {
        let mut cfg = config(6, 4, 0, 8);
        cfg.run.spawn_probability = 1.0;
        let mut sim = Simulation::new(cfg).unwrap();
        sim.init_world().unwrap();
        sim.registry.food.clear();
        sim.grid.clear();
        for _ in 0..40 {
            sim.tick().unwrap();
        }
        assert_eq!(sim.registry().food.len(), 4);
        sim.check_consistency().unwrap();
    }

    #[test]
    fn add_remove_modify_by_name() {
        let mut sim = Simulation::new(config(6, 0, 0, 9)).unwrap();
        let id = sim
            .add_agent(AddAgentRequest::new(Species::Rabbit, "Thumper", 5).at(Position::new(2, 3)))
            .unwrap();
        assert_eq!(sim.agents()[0].id, id);
        assert_eq!(sim.agents()[0].position, Position::new(2, 3));

        let off_grid = AddAgentRequest::new(Species::Rabbit, "Lost", 5).at(Position::new(6, 0));
        assert!(matches!(sim.add_agent(off_grid), Err(EngineError::InvalidRequest(_))));

        let modify = ModifyAgentRequest { name: "Thumper".into(), new_name: "Bugs".into(), new_energy: 12 };
        assert_eq!(sim.modify_agent(&modify).unwrap(), 1);
        assert_eq!(sim.agents()[0].name, "Bugs");
        assert_eq!(sim.agents()[0].energy, 12);

        assert!(sim.remove_agent("Thumper").is_err());
        assert_eq!(sim.remove_agent("Bugs").unwrap(), 1);
        assert!(sim.agents().is_empty());

        let next = sim.add_agent(AddAgentRequest::new(Species::Rabbit, "Again", 5)).unwrap();
        assert!(next > id, "ids are never reused");
    }

    #[test]
    fn reconfigure_resizes_and_rebuilds() {
        let mut sim = Simulation::new(config(5, 3, 3, 10)).unwrap();
        sim.init_world().unwrap();
        sim.tick().unwrap();
        sim.reconfigure(WorldConfig {
            simulation_cycles: 20,
            world_size: 9,
            food_density: 12,
            object_density: 4,
        })
        .unwrap();
        assert_eq!(sim.grid().size(), 9);
        assert_eq!(sim.current_cycle(), 0);
        assert_eq!(sim.registry().food.len(), 12);
        assert_eq!(sim.snapshot().total_cycles, 20);
    }

    #[test]
    fn finishes_when_everyone_is_dead() {
        let mut sim = Simulation::new(config(5, 0, 0, 12)).unwrap();
        sim.add_agent(AddAgentRequest::new(Species::Bug, "Bee", 0)).unwrap();
        sim.init_world().unwrap();
        assert!(!sim.is_finished());
        sim.tick().unwrap();
        assert!(sim.is_finished());
        assert_eq!(sim.prune_dead(), 1);
        assert!(sim.snapshot().agents.is_empty());
    }

    #[test]
    fn supplied_coordinates_survive_init() {
        let mut cfg = config(10, 20, 10, 13);
        cfg.agents.push(AgentSpec {
            species: "Fox".into(),
            name: "Rusty".into(),
            energy: 20,
            x: Some(0),
            y: Some(0),
        });
        let mut sim = Simulation::new(cfg).unwrap();
        sim.add_agent(AddAgentRequest::new(Species::Cow, "Daisy", 9).at(Position::new(7, 3))).unwrap();
        sim.add_agent(AddAgentRequest::new(Species::Bug, "Bee", 4)).unwrap();
        sim.init_world().unwrap();

        assert_eq!(sim.agents()[0].position, Position::new(0, 0));
        assert_eq!(sim.agents()[1].position, Position::new(7, 3));
        assert!(sim.grid().cell_at(Position::new(0, 0)).is_empty());
        assert!(sim.grid().cell_at(Position::new(7, 3)).is_empty());
        sim.check_consistency().unwrap();
    }

    #[test]
    fn failed_reconfigure_keeps_the_old_world() {
        let mut sim = Simulation::new(config(10, 5, 5, 14)).unwrap();
        sim.add_agent(AddAgentRequest::new(Species::Pig, "Wilbur", 10)).unwrap();
        sim.init_world().unwrap();
        sim.tick().unwrap();

        let cramped = WorldConfig {
            simulation_cycles: 50,
            world_size: 2,
            food_density: 3,
            object_density: 1,
        };
        assert!(matches!(sim.reconfigure(cramped), Err(EngineError::Configuration(_))));
        assert_eq!(sim.config().world.world_size, 10);
        assert_eq!(sim.params().world_size, 10);
        assert_eq!(sim.grid().size(), 10);
        assert_eq!(sim.snapshot().world_size, 10);
        assert_eq!(sim.current_cycle(), 1);
        sim.tick().unwrap();
        sim.check_consistency().unwrap();
    }

    #[test]
    fn running_world_rejects_occupied_cells() {
        let mut sim = Simulation::new(config(5, 0, 1, 15)).unwrap();
        sim.add_agent(AddAgentRequest::new(Species::Cow, "Daisy", 10)).unwrap();
        sim.init_world().unwrap();

        let rock = sim.registry().obstacles[0].position;
        let on_rock = AddAgentRequest::new(Species::Cow, "Rocky", 5).at(rock);
        assert!(matches!(sim.add_agent(on_rock), Err(EngineError::InvalidRequest(_))));

        let daisy = sim.agents()[0].position;
        let on_daisy = AddAgentRequest::new(Species::Cow, "Twin", 5).at(daisy);
        assert!(matches!(sim.add_agent(on_daisy), Err(EngineError::InvalidRequest(_))));

        let free = sim.grid().positions().find(|&p| sim.is_vacant(p)).unwrap();
        sim.add_agent(AddAgentRequest::new(Species::Cow, "Clover", 5).at(free)).unwrap();
        assert_eq!(sim.agents().len(), 2);
        sim.check_consistency().unwrap();
    }
}
