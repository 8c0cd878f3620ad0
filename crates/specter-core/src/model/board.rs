//! Static board geometry: terrain lookups, neighbourhoods, line of sight and
//! the single smoke overlay slot.

use super::cells::CellSet;
use super::position::{BOARD_COLS, BOARD_ROWS, Coordinate, Facing};
use super::terrain::Terrain;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// A fixed 32x23 grid of terrain with one temporary smoke overlay slot.
#[derive(Debug, Clone)]
pub struct Board {
    cells: Vec<Terrain>,
    smoke: Option<SmokeOverlay>,
}

#[derive(Debug, Clone)]
struct SmokeOverlay {
    center: Coordinate,
    covered: Vec<(Coordinate, Terrain)>,
}

/// Cells of the road corridor running away from a road cell, per direction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoadCorridors {
    lanes: [Vec<Coordinate>; 4],
}

impl RoadCorridors {
    pub fn toward(&self, facing: Facing) -> &[Coordinate] {
        &self.lanes[facing as usize]
    }

    pub fn is_empty(&self) -> bool {
        self.lanes.iter().all(Vec::is_empty)
    }
}

impl Board {
    /// Builds a board by evaluating `terrain` for every cell.
    pub fn from_fn(mut terrain: impl FnMut(Coordinate) -> Terrain) -> Self {
        let cells = (0..BOARD_ROWS * BOARD_COLS)
            .filter_map(Coordinate::from_index)
            .map(&mut terrain)
            .collect();
        Self { cells, smoke: None }
    }

    /// A board made only of open path.
    pub fn open() -> Self {
        Self::from_fn(|_| Terrain::Path)
    }

    /// Parses a layout with one line per row and one character per cell.
    pub fn from_layout(layout: &str) -> Result<Self, LayoutError> {
        let rows: Vec<&str> = layout
            .lines()
            .map(|line| line.strip_suffix('\r').unwrap_or(line))
            .collect();
        if rows.len() != BOARD_ROWS {
            return Err(LayoutError::RowCount {
                expected: BOARD_ROWS,
                found: rows.len(),
            });
        }

        let mut cells = Vec::with_capacity(BOARD_ROWS * BOARD_COLS);
        for (index, row) in rows.iter().enumerate() {
            let width = row.chars().count();
            if width != BOARD_COLS {
                return Err(LayoutError::RowWidth {
                    row: index + 1,
                    expected: BOARD_COLS,
                    found: width,
                });
            }
            cells.extend(row.chars().map(Terrain::from_char));
        }
        Ok(Self { cells, smoke: None })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, LayoutError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| LayoutError::Read {
            source,
            path: path.to_path_buf(),
        })?;
        Self::from_layout(&text)
    }

    /// Renders the current terrain (smoke included) back into layout form.
    pub fn to_layout(&self) -> String {
        let mut out = String::with_capacity(BOARD_ROWS * (BOARD_COLS + 1));
        for row in self.cells.chunks(BOARD_COLS) {
            out.extend(row.iter().map(|terrain| terrain.to_char()));
            out.push('\n');
        }
        out
    }

    pub fn contains(&self, cell: Coordinate) -> bool {
        cell.on_board()
    }

    pub fn terrain(&self, cell: Coordinate) -> Option<Terrain> {
        cell.index().map(|index| self.cells[index])
    }

    pub fn is_road(&self, cell: Coordinate) -> bool {
        self.terrain(cell).is_some_and(Terrain::is_road)
    }

    pub fn is_passable(&self, cell: Coordinate) -> bool {
        self.terrain(cell).is_some_and(Terrain::is_passable)
    }

    pub fn is_wall(&self, cell: Coordinate) -> bool {
        self.terrain(cell).is_some_and(Terrain::is_wall)
    }

    pub fn is_transparent(&self, cell: Coordinate) -> bool {
        self.terrain(cell).is_some_and(Terrain::is_transparent)
    }

    pub fn is_objective(&self, cell: Coordinate) -> bool {
        self.terrain(cell).is_some_and(Terrain::is_objective)
    }

    /// On-board cells within Chebyshev `radius` of `center`, center excluded.
    pub fn adjacent(&self, center: Coordinate, radius: u16, passable_only: bool) -> Vec<Coordinate> {
        let radius = radius as i16;
        let mut cells = Vec::new();
        for d_row in -radius..=radius {
            for d_col in -radius..=radius {
                if d_row == 0 && d_col == 0 {
                    continue;
                }
                let cell = center.offset(d_row, d_col);
                if !cell.on_board() {
                    continue;
                }
                if passable_only && !self.is_passable(cell) {
                    continue;
                }
                cells.push(cell);
            }
        }
        cells
    }

    /// Cells visible from `origin` looking along its facing, or in all four
    /// directions when it has none. The origin itself is always visible.
    pub fn line_of_sight(&self, origin: Coordinate) -> CellSet {
        let mut visible = CellSet::EMPTY;
        if !origin.on_board() {
            return visible;
        }
        visible.insert(origin);

        let corridors = self.road_corridors(origin);
        let facings = match origin.facing() {
            Some(facing) => vec![facing],
            None => Facing::ALL.to_vec(),
        };

        for facing in facings {
            let (d_row, d_col) = facing.step();
            let mut cell = origin.offset(d_row, d_col);
            while self.is_transparent(cell) {
                visible.insert(cell);
                cell = cell.offset(d_row, d_col);
            }
            visible.extend(corridors.toward(facing).iter().copied());
        }
        visible
    }

    /// The two-rail road corridor extending away from `origin` in each
    /// direction. Empty unless `origin` is itself road.
    pub fn road_corridors(&self, origin: Coordinate) -> RoadCorridors {
        let mut corridors = RoadCorridors::default();
        if !self.is_road(origin) {
            return corridors;
        }

        let east = self.road_extent(origin, Facing::East);
        let west = self.road_extent(origin, Facing::West);
        if east.col() - west.col() > 1 {
            let rail_row = self.parallel_rail(origin.row(), west, east, |cell, row| {
                Coordinate::new(row, cell.col())
            });
            for col in origin.col() + 1..=east.col() {
                push_rail_pair(
                    &mut corridors.lanes[Facing::East as usize],
                    Coordinate::new(origin.row(), col),
                    Coordinate::new(rail_row, col),
                );
            }
            for col in west.col()..origin.col() {
                push_rail_pair(
                    &mut corridors.lanes[Facing::West as usize],
                    Coordinate::new(origin.row(), col),
                    Coordinate::new(rail_row, col),
                );
            }
        }

        let south = self.road_extent(origin, Facing::South);
        let north = self.road_extent(origin, Facing::North);
        if south.row() - north.row() > 1 {
            let rail_col = self.parallel_rail(origin.col(), north, south, |cell, col| {
                Coordinate::new(cell.row(), col)
            });
            for row in north.row()..origin.row() {
                push_rail_pair(
                    &mut corridors.lanes[Facing::North as usize],
                    Coordinate::new(row, origin.col()),
                    Coordinate::new(row, rail_col),
                );
            }
            for row in origin.row() + 1..=south.row() {
                push_rail_pair(
                    &mut corridors.lanes[Facing::South as usize],
                    Coordinate::new(row, origin.col()),
                    Coordinate::new(row, rail_col),
                );
            }
        }
        corridors
    }

    /// Last road cell reached walking from `origin` towards `facing`.
    fn road_extent(&self, origin: Coordinate, facing: Facing) -> Coordinate {
        let (d_row, d_col) = facing.step();
        let mut terminus = origin;
        let mut cell = origin.offset(d_row, d_col);
        while self.is_road(cell) {
            terminus = cell;
            cell = cell.offset(d_row, d_col);
        }
        terminus
    }

    /// Picks the parallel rail line next to `line`: the lower-indexed side
    /// when both corridor termini are road there, else the other side.
    fn parallel_rail(
        &self,
        line: i16,
        start: Coordinate,
        end: Coordinate,
        shift: impl Fn(Coordinate, i16) -> Coordinate,
    ) -> i16 {
        let preferred = line - 1;
        if self.is_road(shift(start, preferred)) && self.is_road(shift(end, preferred)) {
            preferred
        } else {
            line + 1
        }
    }

    /// Covers the passable cells around `center` with smoke.
    ///
    /// Only one overlay may exist at a time; it must be cleared first.
    pub fn place_smoke(&mut self, center: Coordinate) -> Result<(), BoardError> {
        if let Some(active) = &self.smoke {
            return Err(BoardError::SmokeAlreadyActive {
                active: active.center,
                requested: center,
            });
        }
        let covered: Vec<(Coordinate, Terrain)> = self
            .adjacent(center, 1, true)
            .into_iter()
            .filter_map(|cell| self.terrain(cell).map(|terrain| (cell, terrain)))
            .collect();
        for (cell, _) in &covered {
            if let Some(index) = cell.index() {
                self.cells[index] = Terrain::Smoke;
            }
        }
        tracing::info!(
            target: "specter_core::board",
            center = %center,
            cells = covered.len(),
            "smoke placed"
        );
        self.smoke = Some(SmokeOverlay { center, covered });
        Ok(())
    }

    /// Restores the terrain under the active smoke overlay, returning its
    /// center. Does nothing when no smoke is active.
    pub fn clear_smoke(&mut self) -> Option<Coordinate> {
        let overlay = self.smoke.take()?;
        for (cell, terrain) in &overlay.covered {
            if let Some(index) = cell.index() {
                self.cells[index] = *terrain;
            }
        }
        tracing::info!(target: "specter_core::board", center = %overlay.center, "smoke cleared");
        Some(overlay.center)
    }

    pub fn smoke_center(&self) -> Option<Coordinate> {
        self.smoke.as_ref().map(|overlay| overlay.center)
    }

    /// Every objective-marker cell on the board.
    pub fn objectives(&self) -> impl Iterator<Item = Coordinate> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, terrain)| terrain.is_objective())
            .filter_map(|(index, _)| Coordinate::from_index(index))
    }
}

fn push_rail_pair(lane: &mut Vec<Coordinate>, main: Coordinate, rail: Coordinate) {
    lane.push(main);
    if rail.on_board() {
        lane.push(rail);
    }
}

/// Errors raised while loading a board layout.
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("failed to read board layout {path:?}: {source}")]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("board layout must have {expected} rows but has {found}")]
    RowCount { expected: usize, found: usize },
    #[error("board layout row {row} must have {expected} cells but has {found}")]
    RowWidth {
        row: usize,
        expected: usize,
        found: usize,
    },
}

/// Contract violations on the mutable overlay slot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error("smoke at {requested} placed while smoke at {active} is still active")]
    SmokeAlreadyActive {
        active: Coordinate,
        requested: Coordinate,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(token: &str) -> Coordinate {
        Coordinate::parse(token).unwrap()
    }

    fn board_with(cells: &[(&str, Terrain)], fill: Terrain) -> Board {
        let overrides: Vec<(Coordinate, Terrain)> =
            cells.iter().map(|(token, terrain)| (pos(token), *terrain)).collect();
        Board::from_fn(|cell| {
            overrides
                .iter()
                .find(|(at, _)| *at == cell)
                .map(|(_, terrain)| *terrain)
                .unwrap_or(fill)
        })
    }

    #[test]
    fn adjacent_respects_edges_and_passability() {
        let board = board_with(&[("B1", Terrain::Wall)], Terrain::Path);
        let corner = board.adjacent(pos("A1"), 1, false);
        assert_eq!(corner.len(), 3);
        let passable = board.adjacent(pos("A1"), 1, true);
        assert_eq!(passable.len(), 2);
        assert!(!passable.contains(&pos("B1")));
        assert_eq!(board.adjacent(pos("K10"), 2, false).len(), 24);
    }

    #[test]
    fn layout_roundtrip_and_validation() {
        let board = board_with(&[("C3", Terrain::Road), ("D4", Terrain::Objective('b'))], Terrain::Wall);
        let layout = board.to_layout();
        let parsed = Board::from_layout(&layout).unwrap();
        assert!(parsed.is_road(pos("C3")));
        assert!(parsed.is_objective(pos("D4")));
        assert_eq!(parsed.objectives().collect::<Vec<_>>(), vec![pos("D4")]);

        let err = Board::from_layout("...\n").unwrap_err();
        assert!(matches!(err, LayoutError::RowCount { found: 1, .. }));
        let short = layout.replacen("#", "", 1);
        assert!(matches!(
            Board::from_layout(&short),
            Err(LayoutError::RowWidth { row: 1, .. })
        ));
    }

    #[test]
    fn sight_stops_before_blocking_cell() {
        let board = board_with(
            &[("K10", Terrain::Road), ("L10", Terrain::Wall)],
            Terrain::Path,
        );
        let los = board.line_of_sight(pos("K10E"));
        assert!(los.contains(pos("K10")));
        assert!(!los.contains(pos("L10")));
        assert!(!los.contains(pos("M10")));
        assert!(!los.contains(pos("J10")));
        assert!(!los.contains(pos("K9")));
    }

    #[test]
    fn omnidirectional_sight_covers_row_and_column() {
        let board = Board::open();
        let los = board.line_of_sight(pos("E5"));
        assert_eq!(los.len(), BOARD_ROWS + BOARD_COLS - 1);
        assert!(los.contains(pos("A5")));
        assert!(los.contains(pos("E32")));
        assert!(!los.contains(pos("F6")));
    }

    #[test]
    fn road_corridor_extends_past_obstruction() {
        // Two-lane east-west road on rows 10 and 11 from column C to column M.
        let mut overrides = Vec::new();
        for col in 'C'..='M' {
            overrides.push((format!("{col}10"), Terrain::Road));
            overrides.push((format!("{col}11"), Terrain::Road));
        }
        let cells: Vec<(&str, Terrain)> =
            overrides.iter().map(|(token, terrain)| (token.as_str(), *terrain)).collect();
        let mut board = board_with(&cells, Terrain::Wall);
        board.place_smoke(pos("H12")).unwrap();

        let los = board.line_of_sight(pos("E10E"));
        assert!(los.contains(pos("F10")));
        // G11/H11/I11 are smoked, yet the rail of the corridor stays in view.
        assert!(los.contains(pos("M10")));
        assert!(los.contains(pos("M11")));
        assert!(los.contains(pos("H11")));
        assert!(!los.contains(pos("D10")));

        let corridors = board.road_corridors(pos("E10"));
        // The row above is wall, so the rail falls back to the row below.
        assert!(corridors.toward(Facing::West).contains(&pos("C11")));
        assert!(corridors.toward(Facing::North).is_empty());
    }

    #[test]
    fn non_road_origin_has_no_corridor() {
        let board = Board::open();
        assert!(board.road_corridors(pos("E10")).is_empty());
    }

    #[test]
    fn smoke_overlay_is_reversible_and_exclusive() {
        let mut board = board_with(&[("B2", Terrain::Road), ("C3", Terrain::Wall)], Terrain::Path);
        let before = board.to_layout();

        board.place_smoke(pos("C2")).unwrap();
        assert_eq!(board.terrain(pos("B2")), Some(Terrain::Smoke));
        assert_eq!(board.terrain(pos("C3")), Some(Terrain::Wall));
        assert!(!board.is_transparent(pos("D2")));
        assert!(board.is_passable(pos("D2")));

        let err = board.place_smoke(pos("K10")).unwrap_err();
        assert_eq!(
            err,
            BoardError::SmokeAlreadyActive {
                active: pos("C2"),
                requested: pos("K10"),
            }
        );

        assert_eq!(board.clear_smoke(), Some(pos("C2")));
        assert_eq!(board.to_layout(), before);
        assert_eq!(board.clear_smoke(), None);
    }
}
