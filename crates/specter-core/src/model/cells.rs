use super::position::{BOARD_COLS, BOARD_ROWS, Coordinate};

const CELL_COUNT: usize = BOARD_ROWS * BOARD_COLS;
const WORDS: usize = CELL_COUNT.div_ceil(64);

/// Bit-set over every cell of the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CellSet([u64; WORDS]);

impl CellSet {
    pub const EMPTY: Self = Self([0; WORDS]);

    /// Adds `cell`; off-board coordinates are ignored.
    pub fn insert(&mut self, cell: Coordinate) {
        if let Some(index) = cell.index() {
            self.0[index / 64] |= 1u64 << (index % 64);
        }
    }

    pub fn contains(&self, cell: Coordinate) -> bool {
        match cell.index() {
            Some(index) => self.0[index / 64] & (1u64 << (index % 64)) != 0,
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.0.iter().map(|word| word.count_ones() as usize).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|word| *word == 0)
    }

    /// True when any coordinate of `path` is in the set.
    pub fn intersects(&self, path: &[Coordinate]) -> bool {
        path.iter().any(|cell| self.contains(*cell))
    }

    /// Cells in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = Coordinate> + '_ {
        (0..CELL_COUNT)
            .filter(|index| self.0[index / 64] & (1u64 << (index % 64)) != 0)
            .filter_map(Coordinate::from_index)
    }
}

impl FromIterator<Coordinate> for CellSet {
    fn from_iter<I: IntoIterator<Item = Coordinate>>(iter: I) -> Self {
        let mut set = CellSet::EMPTY;
        for cell in iter {
            set.insert(cell);
        }
        set
    }
}

impl Extend<Coordinate> for CellSet {
    fn extend<I: IntoIterator<Item = Coordinate>>(&mut self, iter: I) {
        for cell in iter {
            self.insert(cell);
        }
    }
}
