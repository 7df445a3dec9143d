use alife_common::{Direction, Position};
use log::debug;
use rand::Rng;

use crate::sensing::random_direction;

/// True when one step in `direction` from `pos` would leave a `world_size` grid.
#[inline]
pub fn would_cross_boundary(pos: Position, direction: Direction, world_size: i32) -> bool {
    match direction {
        Direction::West => pos.x < 1,
        Direction::East => pos.x > world_size - 2,
        Direction::North => pos.y < 1,
        Direction::South => pos.y > world_size - 2,
        Direction::None => false,
    }
}

/// Re-rolls `direction` until the step stays on the grid.
///
/// Gives up after `max_retries` re-rolls and returns `Direction::None`, which
/// leaves the agent in place. In a 1x1 world every direction is outward, so
/// this always ends in `None` there.
pub fn protect_boundaries<R: Rng>(
    pos: Position,
    direction: Direction,
    world_size: i32,
    max_retries: u32,
    rng: &mut R,
) -> Direction {
    let mut direction = direction;
    let mut retries = 0;
    while would_cross_boundary(pos, direction, world_size) {
        if retries == max_retries {
            debug!("No safe direction from {} after {} retries; staying in place.", pos, retries);
            return Direction::None;
        }
        direction = random_direction(rng);
        retries += 1;
    }
    if retries > 0 {
        debug!("Agent at {} reached the world boundary. Changed direction to {:?}.", pos, direction);
    }
    direction
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn edges_block_only_outward_moves() {
        let size = 5;
        let corner = Position::new(0, 0);
        assert!(would_cross_boundary(corner, Direction::North, size));
        assert!(would_cross_boundary(corner, Direction::West, size));
        assert!(!would_cross_boundary(corner, Direction::East, size));
        assert!(!would_cross_boundary(corner, Direction::South, size));

        let far = Position::new(4, 4);
        assert!(would_cross_boundary(far, Direction::East, size));
        assert!(would_cross_boundary(far, Direction::South, size));
        assert!(!would_cross_boundary(Position::new(3, 3), Direction::East, size));
    }

    #[test]
    fn corrected_direction_always_stays_on_grid() {
        let mut rng = StdRng::seed_from_u64(3);
        let size = 4;
        for &pos in &[Position::new(0, 0), Position::new(3, 0), Position::new(0, 3), Position::new(3, 3)] {
            for &dir in &Direction::CARDINALS {
                let fixed = protect_boundaries(pos, dir, size, 64, &mut rng);
                assert!(!fixed.is_none(), "a 4x4 corner always has two exits");
                let next = pos.step(fixed);
                assert!(alife_common::in_bounds(next, size), "{pos} -> {fixed:?} leaves the grid");
            }
        }
    }

    #[test]
    fn single_cell_world_stays_put() {
        let mut rng = StdRng::seed_from_u64(5);
        let dir = protect_boundaries(Position::new(0, 0), Direction::East, 1, 16, &mut rng);
        assert_eq!(dir, Direction::None);
    }

    #[test]
    fn safe_direction_is_returned_unchanged() {
        let mut rng = StdRng::seed_from_u64(9);
        let dir = protect_boundaries(Position::new(2, 2), Direction::West, 5, 0, &mut rng);
        assert_eq!(dir, Direction::West);
    }
}
