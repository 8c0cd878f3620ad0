//! Plain-text views of the belief for the operator's terminal.

use std::fmt::Write as _;

use specter_core::belief::{BeliefEngine, Particle};
use specter_core::model::{BOARD_COLS, BOARD_ROWS, CellSet, Coordinate};

/// Particle count, phase flags and the most likely cells.
pub fn summary(engine: &BeliefEngine, top: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "particles: {}", engine.particle_count());
    let _ = writeln!(
        out,
        "phase: {:?}  identity: {:?}",
        engine.phase(),
        engine.identity()
    );
    if let Some(center) = engine.board().smoke_center() {
        let _ = writeln!(out, "smoke: {center}");
    }
    if !engine.missions().is_empty() {
        let _ = writeln!(out, "missions: {}", join(engine.missions().iter().copied()));
    }
    if engine.is_inconsistent() {
        let _ = writeln!(out, "belief is empty: the observations contradict each other");
        return out;
    }
    let _ = writeln!(out, "most likely:");
    for (cell, probability) in engine.occupancy().ranked(top) {
        let _ = writeln!(out, "  {:<4} {:>6.2}%", cell.to_string(), probability * 100.0);
    }
    out
}

/// The board with every occupied cell shaded 1-9 by its share of the
/// busiest cell; unoccupied cells show their terrain.
pub fn heat_map(engine: &BeliefEngine) -> String {
    let occupancy = engine.occupancy();
    let busiest = occupancy
        .cells()
        .map(|(_, probability)| probability)
        .fold(0.0_f64, f64::max);

    let mut out = String::from("    ");
    for col in 0..BOARD_COLS {
        out.push((b'A' + col as u8) as char);
    }
    out.push('\n');
    for row in 0..BOARD_ROWS {
        let _ = write!(out, "{:>3} ", row + 1);
        for col in 0..BOARD_COLS {
            let cell = Coordinate::new(row as i16, col as i16);
            let probability = occupancy.probability(cell);
            let glyph = if probability > 0.0 && busiest > 0.0 {
                let shade = ((probability / busiest) * 9.0).ceil().clamp(1.0, 9.0) as u8;
                (b'0' + shade) as char
            } else {
                engine
                    .board()
                    .terrain(cell)
                    .map(|terrain| terrain.to_char())
                    .unwrap_or(' ')
            };
            out.push(glyph);
        }
        out.push('\n');
    }
    out
}

/// Full history and ledger of one particle.
pub fn particle(index: usize, particle: &Particle) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "particle {index}: ledger [{}]", particle.ledger());
    for (turn, moves) in particle.turns().enumerate() {
        let _ = writeln!(out, "  turn {turn}: {}", join(moves.iter().copied()));
    }
    out
}

pub fn cells(set: &CellSet) -> String {
    format!("{} cells: {}", set.len(), join(set.iter()))
}

fn join(cells: impl Iterator<Item = Coordinate>) -> String {
    cells
        .map(|cell| cell.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use specter_core::model::Board;
    use specter_core::rules::Rules;

    fn engine() -> BeliefEngine {
        BeliefEngine::new(Board::open(), Rules::default())
    }

    #[test]
    fn summary_lists_start_cell() {
        let text = summary(&engine(), 3);
        assert!(text.contains("particles: 1"));
        assert!(text.contains("N1"));
        assert!(text.contains("100.00%"));
    }

    #[test]
    fn heat_map_marks_occupied_cells() {
        let map = heat_map(&engine());
        let lines: Vec<&str> = map.lines().collect();
        assert_eq!(lines.len(), BOARD_ROWS + 1);
        assert!(lines[0].ends_with('W'));
        // N is the fourteenth column.
        assert_eq!(lines[1].chars().nth(4 + 13), Some('9'));
    }

    #[test]
    fn empty_belief_is_reported() {
        let mut engine = engine();
        engine.postcognition(Coordinate::new(0, 0));
        assert!(summary(&engine, 3).contains("belief is empty"));
    }
}
