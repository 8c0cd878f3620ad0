use core::fmt;

/// Terrain category of a single board cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Terrain {
    Road,
    Path,
    Wall,
    /// Temporary overlay left by a smoke grenade.
    Smoke,
    /// Lettered mission objective marker.
    Objective(char),
    /// Any other layout character; opaque and impassable.
    Other(char),
}

impl Terrain {
    pub const fn from_char(code: char) -> Self {
        match code {
            '.' => Terrain::Road,
            ' ' => Terrain::Path,
            '#' => Terrain::Wall,
            '*' => Terrain::Smoke,
            'a'..='z' => Terrain::Objective(code),
            other => Terrain::Other(other),
        }
    }

    pub const fn to_char(self) -> char {
        match self {
            Terrain::Road => '.',
            Terrain::Path => ' ',
            Terrain::Wall => '#',
            Terrain::Smoke => '*',
            Terrain::Objective(code) | Terrain::Other(code) => code,
        }
    }

    pub const fn is_road(self) -> bool {
        matches!(self, Terrain::Road)
    }

    pub const fn is_passable(self) -> bool {
        matches!(self, Terrain::Road | Terrain::Path | Terrain::Smoke)
    }

    pub const fn is_wall(self) -> bool {
        matches!(self, Terrain::Wall)
    }

    pub const fn is_transparent(self) -> bool {
        matches!(self, Terrain::Road | Terrain::Path)
    }

    pub const fn is_objective(self) -> bool {
        matches!(self, Terrain::Objective(_))
    }
}

impl fmt::Display for Terrain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_char())
    }
}
