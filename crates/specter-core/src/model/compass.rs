use super::position::Coordinate;
use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Eight-way direction reported by a motion sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Compass {
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
}

impl Compass {
    pub const ALL: [Compass; 8] = [
        Compass::N,
        Compass::NE,
        Compass::E,
        Compass::SE,
        Compass::S,
        Compass::SW,
        Compass::W,
        Compass::NW,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Compass::N => "N",
            Compass::NE => "NE",
            Compass::E => "E",
            Compass::SE => "SE",
            Compass::S => "S",
            Compass::SW => "SW",
            Compass::W => "W",
            Compass::NW => "NW",
        }
    }

    /// Whether `cell` lies strictly in this direction from `origin`.
    ///
    /// Cardinal directions need an exact row or column match; diagonals need a
    /// strict inequality on both axes.
    pub fn contains(self, origin: Coordinate, cell: Coordinate) -> bool {
        let same_row = cell.row() == origin.row();
        let same_col = cell.col() == origin.col();
        match self {
            Compass::N => same_col && cell.north_of(origin),
            Compass::S => same_col && cell.south_of(origin),
            Compass::E => same_row && cell.east_of(origin),
            Compass::W => same_row && cell.west_of(origin),
            Compass::NE => cell.north_of(origin) && cell.east_of(origin),
            Compass::NW => cell.north_of(origin) && cell.west_of(origin),
            Compass::SE => cell.south_of(origin) && cell.east_of(origin),
            Compass::SW => cell.south_of(origin) && cell.west_of(origin),
        }
    }
}

impl fmt::Display for Compass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Compass {
    type Err = CompassError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Compass::ALL
            .into_iter()
            .find(|direction| direction.as_str() == upper)
            .ok_or_else(|| CompassError(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown direction '{0}' (expected N, NE, E, SE, S, SW, W, NW)")]
pub struct CompassError(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cardinal_needs_alignment() {
        let sensor = Coordinate::new(7, 4);
        assert!(Compass::N.contains(sensor, Coordinate::new(4, 4)));
        assert!(!Compass::N.contains(sensor, Coordinate::new(4, 5)));
        assert!(!Compass::S.contains(sensor, Coordinate::new(4, 4)));
        assert!(Compass::W.contains(sensor, Coordinate::new(7, 0)));
    }

    #[test]
    fn diagonal_needs_both_axes() {
        let sensor = Coordinate::new(7, 4);
        assert!(Compass::NE.contains(sensor, Coordinate::new(6, 5)));
        assert!(!Compass::NE.contains(sensor, Coordinate::new(7, 5)));
        assert!(Compass::SW.contains(sensor, Coordinate::new(9, 1)));
    }

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("ne".parse::<Compass>().unwrap(), Compass::NE);
        assert!("up".parse::<Compass>().is_err());
    }
}
