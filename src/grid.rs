use alife_common::{in_bounds, FoodKind, Position};

/// Content tag of one grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Marker {
    #[default]
    Empty,
    Food(FoodKind),
    Obstacle,
}

impl Marker {
    #[inline(always)]
    pub fn is_empty(self) -> bool { self == Marker::Empty }
}

/// Square cell map. Agents are not stored here; only food and obstacle markers.
#[derive(Debug, Clone)]
pub struct Grid {
    size: i32,
    cells: Vec<Marker>,
}

impl Grid {
    pub fn new(size: i32) -> Self {
        let size = size.max(0);
        Self {
            size,
            cells: vec![Marker::Empty; (size as usize) * (size as usize)],
        }
    }

    #[inline(always)]
    pub fn size(&self) -> i32 { self.size }

    #[inline(always)]
    pub fn num_cells(&self) -> usize { self.cells.len() }

    #[inline(always)]
    pub fn in_bounds(&self, pos: Position) -> bool { in_bounds(pos, self.size) }

    // Row-major index. Out-of-range positions are a caller bug.
    #[inline(always)]
    fn cell_idx(&self, pos: Position) -> usize {
        assert!(self.in_bounds(pos), "grid access out of bounds at {} (size {})", pos, self.size);
        pos.y as usize * self.size as usize + pos.x as usize
    }

    #[inline(always)]
    pub fn cell_at(&self, pos: Position) -> Marker {
        self.cells[self.cell_idx(pos)]
    }

    #[inline(always)]
    pub fn set_cell(&mut self, pos: Position, marker: Marker) {
        let idx = self.cell_idx(pos);
        self.cells[idx] = marker;
    }

    /// Marks every cell empty.
    pub fn clear(&mut self) {
        self.cells.iter_mut().for_each(|c| *c = Marker::Empty);
    }

    /// Reallocates to `new_size` x `new_size`, all empty. Callers re-populate afterwards.
    pub fn resize(&mut self, new_size: i32) {
        *self = Grid::new(new_size);
    }

    /// All cell coordinates in row-major order.
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        let size = self.size;
        (0..size).flat_map(move |y| (0..size).map(move |x| Position::new(x, y)))
    }

    pub fn count_where<F: Fn(Marker) -> bool>(&self, f: F) -> usize {
        self.cells.iter().filter(|&&m| f(m)).count()
    }
}
