use core::fmt;
use core::hash::{Hash, Hasher};
use core::str::FromStr;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Number of rows on the board.
pub const BOARD_ROWS: usize = 32;
/// Number of columns on the board.
pub const BOARD_COLS: usize = 23;

const FIRST_COL: u8 = b'A';
const UNKNOWN_MARKER: &str = "??";

/// Direction an observer is looking along the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Facing {
    East = 0,
    North = 1,
    West = 2,
    South = 3,
}

impl Facing {
    pub const ALL: [Facing; 4] = [Facing::East, Facing::North, Facing::West, Facing::South];

    pub const fn letter(self) -> char {
        match self {
            Facing::East => 'E',
            Facing::North => 'N',
            Facing::West => 'W',
            Facing::South => 'S',
        }
    }

    pub fn from_letter(letter: char) -> Option<Self> {
        match letter.to_ascii_uppercase() {
            'E' => Some(Facing::East),
            'N' => Some(Facing::North),
            'W' => Some(Facing::West),
            'S' => Some(Facing::South),
            _ => None,
        }
    }

    /// Row and column step taken when walking one cell in this direction.
    pub const fn step(self) -> (i16, i16) {
        match self {
            Facing::East => (0, 1),
            Facing::North => (-1, 0),
            Facing::West => (0, -1),
            Facing::South => (1, 0),
        }
    }
}

/// A board cell with an optional facing.
///
/// Equality and hashing only look at row and column: two coordinates naming the
/// same cell are the same position whatever way the observer faces. A
/// coordinate outside the board is the canonical "unknown" position.
#[derive(Debug, Clone, Copy)]
pub struct Coordinate {
    row: i16,
    col: i16,
    facing: Option<Facing>,
}

impl Coordinate {
    pub const UNKNOWN: Coordinate = Coordinate {
        row: -1,
        col: -1,
        facing: None,
    };

    pub const fn new(row: i16, col: i16) -> Self {
        Self {
            row,
            col,
            facing: None,
        }
    }

    pub const fn facing_towards(row: i16, col: i16, facing: Facing) -> Self {
        Self {
            row,
            col,
            facing: Some(facing),
        }
    }

    pub const fn row(self) -> i16 {
        self.row
    }

    pub const fn col(self) -> i16 {
        self.col
    }

    /// `None` means the observer looks in every direction.
    pub const fn facing(self) -> Option<Facing> {
        self.facing
    }

    pub const fn with_facing(self, facing: Option<Facing>) -> Self {
        Self {
            row: self.row,
            col: self.col,
            facing,
        }
    }

    pub const fn on_board(self) -> bool {
        self.row >= 0
            && (self.row as usize) < BOARD_ROWS
            && self.col >= 0
            && (self.col as usize) < BOARD_COLS
    }

    /// Flat index into a row-major board, `None` when off the board.
    pub fn index(self) -> Option<usize> {
        if self.on_board() {
            Some(self.row as usize * BOARD_COLS + self.col as usize)
        } else {
            None
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        if index >= BOARD_ROWS * BOARD_COLS {
            return None;
        }
        Some(Self::new(
            (index / BOARD_COLS) as i16,
            (index % BOARD_COLS) as i16,
        ))
    }

    pub const fn offset(self, d_row: i16, d_col: i16) -> Self {
        Self::new(self.row + d_row, self.col + d_col)
    }

    pub const fn east_of(self, other: Coordinate) -> bool {
        self.col > other.col
    }

    pub const fn west_of(self, other: Coordinate) -> bool {
        self.col < other.col
    }

    pub const fn north_of(self, other: Coordinate) -> bool {
        self.row < other.row
    }

    pub const fn south_of(self, other: Coordinate) -> bool {
        self.row > other.row
    }

    /// Chebyshev distance: the larger of the row and column deltas.
    pub fn distance(self, other: Coordinate) -> u16 {
        let d_row = (self.row - other.row).unsigned_abs();
        let d_col = (self.col - other.col).unsigned_abs();
        d_row.max(d_col)
    }

    pub fn within(self, other: Coordinate, radius: u16) -> bool {
        self.distance(other) <= radius
    }

    /// Parses `<column-letter><row-number>[<facing-letter>]`.
    ///
    /// The empty string and the `??` marker yield [`Coordinate::UNKNOWN`].
    pub fn parse(token: &str) -> Result<Self, PositionError> {
        let token = token.trim();
        if token.is_empty() || token == UNKNOWN_MARKER {
            return Ok(Self::UNKNOWN);
        }

        let mut chars = token.chars();
        let column = chars.next().ok_or(PositionError::Empty)?;
        if !column.is_ascii_alphabetic() {
            return Err(PositionError::InvalidColumn {
                token: token.to_string(),
            });
        }
        let col = (column.to_ascii_uppercase() as u8 - FIRST_COL) as i16;

        let rest = chars.as_str();
        let (digits, facing) = match rest.chars().last() {
            Some(last) if last.is_ascii_alphabetic() => {
                let facing = Facing::from_letter(last).ok_or(PositionError::InvalidFacing {
                    token: token.to_string(),
                })?;
                (&rest[..rest.len() - last.len_utf8()], Some(facing))
            }
            _ => (rest, None),
        };

        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(PositionError::InvalidRow {
                token: token.to_string(),
            });
        }
        let number: i16 = digits.parse().map_err(|_| PositionError::InvalidRow {
            token: token.to_string(),
        })?;
        let coord = Self {
            row: number - 1,
            col,
            facing,
        };
        if !coord.on_board() {
            return Err(PositionError::OffBoard {
                token: token.to_string(),
            });
        }
        Ok(coord)
    }
}

impl Default for Coordinate {
    fn default() -> Self {
        Self::UNKNOWN
    }
}

impl PartialEq for Coordinate {
    fn eq(&self, other: &Self) -> bool {
        self.row == other.row && self.col == other.col
    }
}

impl Eq for Coordinate {}

impl Hash for Coordinate {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.row.hash(state);
        self.col.hash(state);
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.on_board() {
            return f.write_str(UNKNOWN_MARKER);
        }
        let column = (FIRST_COL + self.col as u8) as char;
        write!(f, "{column}{}", self.row + 1)?;
        if let Some(facing) = self.facing {
            write!(f, "{}", facing.letter())?;
        }
        Ok(())
    }
}

impl FromStr for Coordinate {
    type Err = PositionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Coordinate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Coordinate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Coordinate::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Malformed position notation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PositionError {
    #[error("empty position")]
    Empty,
    #[error("position '{token}' must start with a column letter")]
    InvalidColumn { token: String },
    #[error("position '{token}' has no valid row number")]
    InvalidRow { token: String },
    #[error("position '{token}' has an unknown facing (expected E, N, W or S)")]
    InvalidFacing { token: String },
    #[error("position '{token}' lies outside the {BOARD_COLS}x{BOARD_ROWS} board")]
    OffBoard { token: String },
}
