use alife_common::{
    AgentView, Consumable, Diet, FoodKind, FoodView, ObstacleKind, ObstacleView, Position,
    SenseType, Species,
};
use serde::{Deserialize, Serialize};

use crate::grid::{Grid, Marker};

/// A mobile life form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    pub id: u32,
    pub name: String,
    pub species: Species,
    pub diet: Diet,
    pub energy: i32,
    pub position: Position,
    pub alive: bool,
    pub consumes: Vec<Consumable>,
    /// Only meaningful during and right after this agent's move.
    #[serde(skip)]
    pub last_food: Option<Position>,
}

impl Agent {
    pub fn new(id: u32, name: impl Into<String>, species: Species, energy: i32, position: Position) -> Self {
        Self {
            id,
            name: name.into(),
            species,
            diet: species.diet(),
            energy,
            position,
            alive: true,
            consumes: species.default_consumes(),
            last_food: None,
        }
    }

    #[inline]
    pub fn can_eat_species(&self, species: Species) -> bool {
        self.consumes.contains(&Consumable::Prey(species))
    }

    #[inline]
    pub fn can_eat_food(&self, kind: FoodKind) -> bool {
        self.consumes.contains(&Consumable::Food(kind))
    }

    pub fn sense_type(&self) -> SenseType {
        SenseType::select(self.species, self.diet)
    }

    pub fn view(&self) -> AgentView {
        AgentView {
            id: self.id,
            name: self.name.clone(),
            species: self.species,
            energy: self.energy,
            position: self.position,
            alive: self.alive,
            last_food: self.last_food,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoodItem {
    pub kind: FoodKind,
    pub nutrition: i32,
    pub position: Position,
}

impl FoodItem {
    pub fn new(kind: FoodKind, position: Position) -> Self {
        Self { kind, nutrition: kind.nutrition(), position }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Obstacle {
    pub kind: ObstacleKind,
    pub position: Position,
}

/// Borrowed view over anything that occupies the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity<'a> {
    Agent(&'a Agent),
    Food(&'a FoodItem),
    Obstacle(&'a Obstacle),
}

impl Entity<'_> {
    pub fn position(&self) -> Position {
        match self {
            Entity::Agent(a) => a.position,
            Entity::Food(f) => f.position,
            Entity::Obstacle(o) => o.position,
        }
    }
}

/// Owns every agent, food item and obstacle in the world.
#[derive(Debug, Clone, Default)]
pub struct EntityRegistry {
    pub agents: Vec<Agent>,
    pub food: Vec<FoodItem>,
    pub obstacles: Vec<Obstacle>,
    next_id: u32,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a registry from a persisted roster. The id counter never goes
    /// below one past the highest id present.
    pub fn with_agents(agents: Vec<Agent>, next_id: u32) -> Self {
        let floor = agents.iter().map(|a| a.id + 1).max().unwrap_or(0);
        Self {
            agents,
            food: Vec::new(),
            obstacles: Vec::new(),
            next_id: next_id.max(floor),
        }
    }

    pub fn next_id(&self) -> u32 {
        self.next_id
    }

    pub fn allocate_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn live_agents(&self) -> impl Iterator<Item = &Agent> {
        self.agents.iter().filter(|a| a.alive)
    }

    pub fn live_agent_count(&self) -> usize {
        self.live_agents().count()
    }

    /// Index of a live agent other than `exclude` standing on `pos`.
    pub fn occupant_at(&self, pos: Position, exclude: usize) -> Option<usize> {
        self.agents
            .iter()
            .enumerate()
            .find(|(idx, a)| *idx != exclude && a.alive && a.position == pos)
            .map(|(idx, _)| idx)
    }

    /// Index of a live agent on `pos` that the hunter at `hunter` may eat.
    pub fn prey_at(&self, pos: Position, hunter: usize) -> Option<usize> {
        let predator = &self.agents[hunter];
        self.agents
            .iter()
            .enumerate()
            .find(|(idx, a)| {
                *idx != hunter && a.alive && a.position == pos && predator.can_eat_species(a.species)
            })
            .map(|(idx, _)| idx)
    }

    pub fn is_agent_at(&self, pos: Position) -> bool {
        self.live_agents().any(|a| a.position == pos)
    }

    /// Removes and returns the food item on `pos`.
    pub fn take_food_at(&mut self, pos: Position) -> Option<FoodItem> {
        let idx = self.food.iter().position(|f| f.position == pos)?;
        Some(self.food.remove(idx))
    }

    /// Drops dead agents, keeping survivors in order. Returns how many were removed.
    pub fn prune_dead(&mut self) -> usize {
        let before = self.agents.len();
        self.agents.retain(|a| a.alive);
        before - self.agents.len()
    }

    /// Forgets food and obstacles. Agents are kept.
    pub fn clear_world_items(&mut self) {
        self.food.clear();
        self.obstacles.clear();
    }

    pub fn entities(&self) -> impl Iterator<Item = Entity<'_>> {
        self.agents
            .iter()
            .filter(|a| a.alive)
            .map(Entity::Agent)
            .chain(self.food.iter().map(Entity::Food))
            .chain(self.obstacles.iter().map(Entity::Obstacle))
    }

    pub fn entities_at(&self, pos: Position) -> Vec<Entity<'_>> {
        self.entities().filter(|e| e.position() == pos).collect()
    }

    pub fn food_views(&self) -> Vec<FoodView> {
        self.food
            .iter()
            .map(|f| FoodView { kind: f.kind, nutrition: f.nutrition, position: f.position })
            .collect()
    }

    pub fn obstacle_views(&self) -> Vec<ObstacleView> {
        self.obstacles
            .iter()
            .map(|o| ObstacleView { kind: o.kind, position: o.position })
            .collect()
    }

    /// Checks that grid markers and registry entries describe the same world.
    pub fn check_consistency(&self, grid: &Grid) -> Result<(), String> {
        for agent in self.live_agents() {
            if !grid.in_bounds(agent.position) {
                return Err(format!("agent {} '{}' is off the grid at {}", agent.id, agent.name, agent.position));
            }
        }
        for entity in self.entities() {
            let pos = entity.position();
            let expected = match entity {
                Entity::Agent(_) => continue,
                Entity::Food(f) => Marker::Food(f.kind),
                Entity::Obstacle(_) => Marker::Obstacle,
            };
            if !grid.in_bounds(pos) {
                return Err(format!("entity off the grid at {}", pos));
            }
            let items_here = self
                .entities_at(pos)
                .iter()
                .filter(|e| !matches!(e, Entity::Agent(_)))
                .count();
            if items_here != 1 {
                return Err(format!("{} food/obstacle entries share cell {}", items_here, pos));
            }
            if grid.cell_at(pos) != expected {
                return Err(format!("cell {} holds {:?}, registry expects {:?}", pos, grid.cell_at(pos), expected));
            }
        }
        let marked = grid.count_where(|m| !m.is_empty());
        let registered = self.food.len() + self.obstacles.len();
        if marked != registered {
            return Err(format!("{} marked cells but {} registered items", marked, registered));
        }
        Ok(())
    }
}
