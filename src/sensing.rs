//! Directional target detection.
//!
//! An agent looks outward along the four cardinal rays, one distance ring at a
//! time. Rings are scanned nearest-first and, within a ring, North, East,
//! South, West, so the first hit is both the closest target and the
//! highest-priority direction at that distance.

use alife_common::{Diet, Direction, SenseType};
use log::trace;
use rand::Rng;

use crate::grid::{Grid, Marker};
use crate::registry::Agent;

/// Direction of the nearest consumable target within the range of `sense`,
/// or `Direction::None` when nothing is detected.
///
/// A cell holding an obstacle is still checked for a target, then blocks its
/// ray: farther cells in that direction are not considered for this call.
/// Occlusion is tracked per ray, so an obstacle to the North never hides
/// anything to the East.
pub fn sense_direction(agent: &Agent, agents: &[Agent], grid: &Grid, sense: SenseType) -> Direction {
    let origin = agent.position;
    let mut blocked = [false; 4];

    for distance in 1..=sense.range() {
        for (ray, &direction) in Direction::CARDINALS.iter().enumerate() {
            if blocked[ray] {
                continue;
            }
            let candidate = origin.offset(direction, distance);
            if !grid.in_bounds(candidate) {
                continue;
            }

            let found = match agent.diet {
                Diet::Carnivore => agents.iter().any(|other| {
                    other.id != agent.id
                        && other.alive
                        && other.position == candidate
                        && agent.can_eat_species(other.species)
                }),
                Diet::Herbivore => match grid.cell_at(candidate) {
                    Marker::Food(kind) => agent.can_eat_food(kind),
                    _ => false,
                },
            };
            if found {
                trace!("{} senses a target {:?} at distance {}", agent.name, direction, distance);
                return direction;
            }

            if grid.cell_at(candidate) == Marker::Obstacle {
                blocked[ray] = true;
            }
        }
    }
    Direction::None
}

/// Uniformly random cardinal direction. Never `Direction::None`.
pub fn random_direction<R: Rng>(rng: &mut R) -> Direction {
    Direction::CARDINALS[rng.random_range(0..Direction::CARDINALS.len())]
}

/// Senses with the agent's own modality; wanders randomly when nothing is in range.
pub fn direction_of_food<R: Rng>(
    agent: &Agent,
    agents: &[Agent],
    grid: &Grid,
    rng: &mut R,
) -> Direction {
    match sense_direction(agent, agents, grid, agent.sense_type()) {
        Direction::None => random_direction(rng),
        found => found,
    }
}
