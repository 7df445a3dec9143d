use alife_common::{FoodKind, ObstacleKind, Position};
use log::{debug, trace};
use rand::Rng;
use rand::seq::IndexedRandom;

use crate::error::{EngineError, EngineResult};
use crate::grid::{Grid, Marker};
use crate::registry::{EntityRegistry, FoodItem, Obstacle};

/// Maps a roll in `1..=100` to a food kind. Bands are cumulative:
/// Grass 24%, Flower 15%, Leaf 25%, Plankton 15%, Mushroom 10%, Berry 10%.
/// A roll of 100 falls outside every band and yields nothing.
pub fn food_kind_for_roll(roll: u32) -> Option<FoodKind> {
    match roll {
        1..=24 => Some(FoodKind::Grass),
        25..=39 => Some(FoodKind::Flower),
        40..=64 => Some(FoodKind::Leaf),
        65..=79 => Some(FoodKind::Plankton),
        80..=89 => Some(FoodKind::Mushroom),
        90..=99 => Some(FoodKind::Berry),
        _ => None,
    }
}

/// True when the cell has no marker and no live agent on it.
pub fn is_vacant(pos: Position, registry: &EntityRegistry, grid: &Grid) -> bool {
    grid.cell_at(pos).is_empty() && !registry.is_agent_at(pos)
}

/// Picks a random vacant cell.
///
/// Tries `max_attempts` uniform draws first; if all land on occupied cells,
/// falls back to choosing among the vacant cells that remain. Fails only when
/// the grid has no vacant cell at all.
pub fn random_vacant_cell<R: Rng>(
    registry: &EntityRegistry,
    grid: &Grid,
    rng: &mut R,
    max_attempts: u32,
) -> EngineResult<Position> {
    let size = grid.size();
    if size == 0 {
        return Err(EngineError::Configuration("the world has no cells".to_string()));
    }
    for _ in 0..max_attempts {
        let pos = Position::new(rng.random_range(0..size), rng.random_range(0..size));
        if is_vacant(pos, registry, grid) {
            return Ok(pos);
        }
    }
    trace!("No vacant cell after {} random draws; scanning the grid.", max_attempts);
    let vacant: Vec<Position> = grid.positions().filter(|&p| is_vacant(p, registry, grid)).collect();
    vacant.choose(rng).copied().ok_or_else(|| {
        EngineError::Configuration(format!("no vacant cell left in the {}x{} world", size, size))
    })
}

/// Adds one food item of weighted-random kind at a random vacant cell.
/// Returns the kind placed, or `None` when the roll matched no band.
pub fn spawn_food_item<R: Rng>(
    registry: &mut EntityRegistry,
    grid: &mut Grid,
    rng: &mut R,
    max_attempts: u32,
) -> EngineResult<Option<FoodKind>> {
    let pos = random_vacant_cell(registry, grid, rng, max_attempts)?;
    let roll = rng.random_range(1..=100u32);
    let Some(kind) = food_kind_for_roll(roll) else {
        debug!("Food roll {} matched no band; nothing spawned.", roll);
        return Ok(None);
    };
    registry.food.push(FoodItem::new(kind, pos));
    grid.set_cell(pos, Marker::Food(kind));
    debug!("Added new food item of type: {} at {}", kind, pos);
    Ok(Some(kind))
}

/// Adds one rock or tree (even odds) at a random vacant cell.
pub fn place_obstacle<R: Rng>(
    registry: &mut EntityRegistry,
    grid: &mut Grid,
    rng: &mut R,
    max_attempts: u32,
) -> EngineResult<ObstacleKind> {
    let pos = random_vacant_cell(registry, grid, rng, max_attempts)?;
    let kind = if rng.random_bool(0.5) { ObstacleKind::Rock } else { ObstacleKind::Tree };
    registry.obstacles.push(Obstacle { kind, position: pos });
    grid.set_cell(pos, Marker::Obstacle);
    Ok(kind)
}
