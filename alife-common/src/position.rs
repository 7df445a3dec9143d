use serde::{Serialize, Deserialize};

/// Integer cell coordinate on the square world grid. `x` grows East, `y` grows South.
#[derive(Copy, Clone, Default, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    #[inline(always)]
    pub fn new(x: i32, y: i32) -> Self { Self { x, y } }

    /// The cell `distance` steps away in `direction`. `Direction::None` yields `self`.
    #[inline(always)]
    pub fn offset(self, direction: Direction, distance: i32) -> Self {
        let (dx, dy) = direction.delta();
        Self::new(self.x + dx * distance, self.y + dy * distance)
    }

    #[inline(always)]
    pub fn step(self, direction: Direction) -> Self { self.offset(direction, 1) }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Heading chosen by an agent for its next single-cell move.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    East,
    South,
    West,
    None,
}

impl Direction {
    /// Scan order for sensing. Earlier entries win ties at equal distance.
    pub const CARDINALS: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    #[inline(always)]
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::East => (1, 0),
            Direction::South => (0, 1),
            Direction::West => (-1, 0),
            Direction::None => (0, 0),
        }
    }

    #[inline(always)]
    pub fn is_none(self) -> bool { self == Direction::None }
}

/// True when `pos` lies inside a `world_size` x `world_size` grid.
#[inline(always)]
pub fn in_bounds(pos: Position, world_size: i32) -> bool {
    pos.x >= 0 && pos.y >= 0 && pos.x < world_size && pos.y < world_size
}
