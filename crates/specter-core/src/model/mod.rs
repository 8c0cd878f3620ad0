//! Board geometry: position notation, terrain, line of sight and smoke.

pub mod board;
pub mod cells;
pub mod compass;
pub mod position;
pub mod terrain;

pub use board::{Board, BoardError, LayoutError, RoadCorridors};
pub use cells::CellSet;
pub use compass::{Compass, CompassError};
pub use position::{BOARD_COLS, BOARD_ROWS, Coordinate, Facing, PositionError};
pub use terrain::Terrain;
