use alife_common::{Diet, Direction, FoodKind, Position};
use log::{debug, warn};

use crate::grid::{Grid, Marker};
use crate::registry::EntityRegistry;

/// Energy change for bumping into another agent or an obstacle.
pub const COLLISION_PENALTY: i32 = -1;

/// Result of resolving one agent's move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Carnivore ate another agent and took its energy.
    AtePrey { prey_id: u32, energy: i32 },
    /// Herbivore ate the food item on the target cell.
    AteFood { kind: FoodKind, nutrition: i32 },
    HitAgent { other_id: u32 },
    HitObstacle,
    Moved,
    /// No move was attempted.
    Stayed,
}

impl MoveOutcome {
    pub fn energy_delta(&self) -> i32 {
        match *self {
            MoveOutcome::AtePrey { energy, .. } => energy,
            MoveOutcome::AteFood { nutrition, .. } => nutrition,
            MoveOutcome::HitAgent { .. } | MoveOutcome::HitObstacle => COLLISION_PENALTY,
            MoveOutcome::Moved | MoveOutcome::Stayed => 0,
        }
    }

    pub fn is_meal(&self) -> bool {
        matches!(self, MoveOutcome::AtePrey { .. } | MoveOutcome::AteFood { .. })
    }

    pub fn is_collision(&self) -> bool {
        matches!(self, MoveOutcome::HitAgent { .. } | MoveOutcome::HitObstacle)
    }
}

/// Moves the agent at `agent_idx` one cell in `direction`.
pub fn move_agent(
    agent_idx: usize,
    direction: Direction,
    registry: &mut EntityRegistry,
    grid: &mut Grid,
) -> MoveOutcome {
    if direction.is_none() {
        return MoveOutcome::Stayed;
    }
    let target = registry.agents[agent_idx].position.step(direction);
    resolve_move(agent_idx, registry, grid, target)
}

/// Resolves an attempt by the agent at `agent_idx` to enter `target`.
///
/// Checked in order, first match wins: carnivore eats a consumable agent,
/// herbivore eats consumable food, collision with another live agent,
/// collision with an obstacle, free move. Only the acting agent moves.
pub fn resolve_move(
    agent_idx: usize,
    registry: &mut EntityRegistry,
    grid: &mut Grid,
    target: Position,
) -> MoveOutcome {
    if !grid.in_bounds(target) {
        warn!("Move target {} is off the grid; agent stays put.", target);
        return MoveOutcome::Stayed;
    }

    let diet = registry.agents[agent_idx].diet;

    if diet == Diet::Carnivore {
        if let Some(prey_idx) = registry.prey_at(target, agent_idx) {
            let prey = &mut registry.agents[prey_idx];
            let energy = prey.energy;
            let prey_id = prey.id;
            prey.alive = false;
            let prey_name = prey.name.clone();

            let hunter = &mut registry.agents[agent_idx];
            hunter.position = target;
            hunter.last_food = Some(target);
            debug!("{} eaten by {}", prey_name, hunter.name);
            return MoveOutcome::AtePrey { prey_id, energy };
        }
    }

    if diet == Diet::Herbivore {
        if let Marker::Food(kind) = grid.cell_at(target) {
            if registry.agents[agent_idx].can_eat_food(kind) {
                match registry.take_food_at(target) {
                    Some(item) => {
                        grid.set_cell(target, Marker::Empty);
                        let agent = &mut registry.agents[agent_idx];
                        agent.position = target;
                        agent.last_food = Some(target);
                        debug!("{} eaten by {}", item.kind, agent.name);
                        return MoveOutcome::AteFood { kind: item.kind, nutrition: item.nutrition };
                    }
                    None => warn!("Cell {} is marked {} but no food item is registered there.", target, kind),
                }
            }
        }
    }

    if let Some(other_idx) = registry.occupant_at(target, agent_idx) {
        let other_id = registry.agents[other_idx].id;
        debug!("{} hit another life form", registry.agents[agent_idx].name);
        return MoveOutcome::HitAgent { other_id };
    }

    if grid.cell_at(target) == Marker::Obstacle {
        debug!("{} hit an obstacle", registry.agents[agent_idx].name);
        return MoveOutcome::HitObstacle;
    }

    registry.agents[agent_idx].position = target;
    MoveOutcome::Moved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{Agent, FoodItem};
    use alife_common::Species;

    fn world(agents: Vec<Agent>, size: i32) -> (EntityRegistry, Grid) {
        let next = agents.len() as u32;
        (EntityRegistry::with_agents(agents, next), Grid::new(size))
    }

    fn put_food(reg: &mut EntityRegistry, grid: &mut Grid, kind: FoodKind, pos: Position) {
        reg.food.push(FoodItem::new(kind, pos));
        grid.set_cell(pos, Marker::Food(kind));
    }

    #[test]
    fn fox_eats_rabbit_and_takes_its_energy() {
        let (mut reg, mut grid) = world(
            vec![
                Agent::new(0, "Rusty", Species::Fox, 10, Position::new(2, 2)),
                Agent::new(1, "Thumper", Species::Rabbit, 7, Position::new(3, 2)),
            ],
            6,
        );
        put_food(&mut reg, &mut grid, FoodKind::Grass, Position::new(2, 3));

        let outcome = move_agent(0, Direction::East, &mut reg, &mut grid);
        assert_eq!(outcome, MoveOutcome::AtePrey { prey_id: 1, energy: 7 });
        assert_eq!(outcome.energy_delta(), 7);
        assert!(!reg.agents[1].alive);
        assert_eq!(reg.agents[0].position, Position::new(3, 2));
        assert_eq!(reg.agents[0].last_food, Some(Position::new(3, 2)));
        assert_eq!(reg.food.len(), 1, "the grass is untouched");
    }

    #[test]
    fn herbivore_eats_food_and_clears_cell() {
        let (mut reg, mut grid) = world(vec![Agent::new(0, "Daisy", Species::Cow, 5, Position::new(1, 1))], 4);
        let target = Position::new(1, 0);
        put_food(&mut reg, &mut grid, FoodKind::Mushroom, target);

        let outcome = resolve_move(0, &mut reg, &mut grid, target);
        assert_eq!(outcome, MoveOutcome::AteFood { kind: FoodKind::Mushroom, nutrition: 4 });
        assert!(reg.food.is_empty());
        assert_eq!(grid.cell_at(target), Marker::Empty);
        assert_eq!(reg.agents[0].position, target);
        assert!(reg.check_consistency(&grid).is_ok());
    }

    #[test]
    fn berries_cost_energy() {
        let (mut reg, mut grid) = world(vec![Agent::new(0, "Daisy", Species::Cow, 5, Position::new(1, 1))], 4);
        put_food(&mut reg, &mut grid, FoodKind::Berry, Position::new(2, 1));
        let outcome = move_agent(0, Direction::East, &mut reg, &mut grid);
        assert_eq!(outcome.energy_delta(), -3);
    }

    #[test]
    fn uneaten_food_is_walked_over() {
        let (mut reg, mut grid) = world(vec![Agent::new(0, "Daisy", Species::Cow, 5, Position::new(1, 1))], 4);
        put_food(&mut reg, &mut grid, FoodKind::Plankton, Position::new(1, 2));
        let outcome = move_agent(0, Direction::South, &mut reg, &mut grid);
        assert_eq!(outcome, MoveOutcome::Moved);
        assert_eq!(reg.food.len(), 1);
        assert_eq!(grid.cell_at(Position::new(1, 2)), Marker::Food(FoodKind::Plankton));
    }

    #[test]
    fn bumping_an_agent_costs_one_and_does_not_move() {
        let (mut reg, mut grid) = world(
            vec![
                Agent::new(0, "Rusty", Species::Fox, 10, Position::new(2, 2)),
                Agent::new(1, "Daisy", Species::Cow, 9, Position::new(2, 1)),
            ],
            5,
        );
        let outcome = move_agent(0, Direction::North, &mut reg, &mut grid);
        assert_eq!(outcome, MoveOutcome::HitAgent { other_id: 1 });
        assert_eq!(outcome.energy_delta(), -1);
        assert_eq!(reg.agents[0].position, Position::new(2, 2));
        assert!(reg.agents[1].alive);
    }

    #[test]
    fn bumping_an_obstacle_costs_one() {
        let (mut reg, mut grid) = world(vec![Agent::new(0, "Bee", Species::Bug, 3, Position::new(0, 0))], 3);
        grid.set_cell(Position::new(0, 1), Marker::Obstacle);
        let outcome = move_agent(0, Direction::South, &mut reg, &mut grid);
        assert_eq!(outcome, MoveOutcome::HitObstacle);
        assert_eq!(reg.agents[0].position, Position::new(0, 0));
    }

    #[test]
    fn dead_agents_do_not_block() {
        let (mut reg, mut grid) = world(
            vec![
                Agent::new(0, "Bee", Species::Bug, 3, Position::new(0, 0)),
                Agent::new(1, "Gone", Species::Bug, 0, Position::new(1, 0)),
            ],
            3,
        );
        reg.agents[1].alive = false;
        assert_eq!(move_agent(0, Direction::East, &mut reg, &mut grid), MoveOutcome::Moved);
        assert_eq!(reg.agents[0].position, Position::new(1, 0));
    }

    #[test]
    fn no_direction_means_no_move() {
        let (mut reg, mut grid) = world(vec![Agent::new(0, "Bee", Species::Bug, 3, Position::new(0, 0))], 1);
        assert_eq!(move_agent(0, Direction::None, &mut reg, &mut grid), MoveOutcome::Stayed);
    }
}
