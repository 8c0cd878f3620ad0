use specter_core::belief::{BeliefEngine, Equipment, Particle};
use specter_core::model::{BOARD_COLS, BOARD_ROWS, Board, Compass, Coordinate, Terrain};
use specter_core::rules::Rules;
use std::collections::HashSet;

fn pos(token: &str) -> Coordinate {
    Coordinate::parse(token).unwrap()
}

fn engine_at(start: &str) -> BeliefEngine {
    let rules = Rules {
        start: pos(start),
        ..Rules::default()
    };
    BeliefEngine::new(Board::open(), rules)
}

fn last_turn_is(particle: &Particle, path: &[&str]) -> bool {
    let expected: Vec<Coordinate> = path.iter().map(|token| pos(token)).collect();
    particle.last_turn() == expected.as_slice()
}

#[test]
fn movement_expansion_covers_chebyshev_ball_from_start() {
    let mut engine = BeliefEngine::new(Board::open(), Rules::default());
    engine.propagate();

    let start = pos("N1");
    let expected: HashSet<Coordinate> = (0..BOARD_ROWS * BOARD_COLS)
        .filter_map(Coordinate::from_index)
        .filter(|cell| cell.within(start, 4))
        .collect();
    let reached: HashSet<Coordinate> = engine.particles().iter().map(Particle::position).collect();
    assert_eq!(expected.len(), 45);
    assert_eq!(reached, expected);
    assert!(engine
        .particles()
        .iter()
        .all(|particle| particle.ledger().unknown_count() == 5));
}

#[test]
fn movement_expansion_skips_impassable_cells() {
    let wall = pos("N2");
    let board = Board::from_fn(|cell| if cell == wall { Terrain::Wall } else { Terrain::Path });
    let mut engine = BeliefEngine::new(board, Rules::default());
    engine.propagate();
    assert!(engine
        .particles()
        .iter()
        .all(|particle| !particle.last_turn().contains(&wall)));
}

#[test]
fn line_of_sight_stops_at_wall() {
    let road = pos("K10");
    let wall = pos("L10");
    let board = Board::from_fn(|cell| {
        if cell == road {
            Terrain::Road
        } else if cell == wall {
            Terrain::Wall
        } else {
            Terrain::Path
        }
    });
    let engine = BeliefEngine::new(board, Rules::default());
    let los = engine.line_of_sight(pos("K10E"));
    assert!(los.contains(road));
    assert!(!los.contains(wall));
    assert!(!los.contains(pos("M10")));
    assert!(!los.contains(pos("W10")));
}

#[test]
fn line_of_sight_stops_at_wall_below_road() {
    let road = pos("K10");
    let wall = pos("K11");
    let board = Board::from_fn(|cell| {
        if cell == road {
            Terrain::Road
        } else if cell == wall {
            Terrain::Wall
        } else {
            Terrain::Path
        }
    });
    let engine = BeliefEngine::new(board, Rules::default());

    let los = engine.line_of_sight(pos("K10E"));
    assert!(!los.contains(pos("K11")));
    assert!(los.contains(pos("L10")));

    let south = engine.line_of_sight(pos("K10S"));
    assert!(south.contains(road));
    assert!(!south.contains(wall));
    assert!(!south.contains(pos("K12")));

    let around = engine.line_of_sight(road);
    assert!(!around.contains(wall));
    assert!(around.contains(pos("K9")));
}

#[test]
fn spotted_keeps_exact_position_only() {
    let mut engine = engine_at("K22");
    engine.propagate();
    let positions: HashSet<Coordinate> = engine.particles().iter().map(Particle::position).collect();
    assert!(positions.contains(&pos("K23")));
    assert!(positions.contains(&pos("L23")));

    engine.spotted(pos("K23"), pos("A1"));
    assert!(!engine.is_inconsistent());
    assert!(engine
        .particles()
        .iter()
        .all(|particle| particle.position() == pos("K23")));
}

#[test]
fn last_seen_forks_decoy_while_identity_unresolved() {
    let mut engine = engine_at("M12");
    engine.propagate();
    // An observer at the top of column M sees the whole column.
    engine.last_seen(pos("M12"), pos("M1"));

    let particles = engine.particles();
    let plain = |particle: &&Particle| particle.count_equipment(Equipment::Unique) == 0;
    let decoy = |particle: &&Particle| particle.count_equipment(Equipment::Unique) == 1;

    assert!(particles
        .iter()
        .filter(plain)
        .any(|particle| last_turn_is(particle, &["M12", "N12"])));
    assert!(particles
        .iter()
        .filter(decoy)
        .any(|particle| last_turn_is(particle, &["M12", "N12"])));

    // Stepping back into view after the marker only survives as a decoy.
    assert!(!particles
        .iter()
        .filter(plain)
        .any(|particle| last_turn_is(particle, &["M12", "M13"])));
    assert!(particles
        .iter()
        .filter(decoy)
        .any(|particle| last_turn_is(particle, &["M12", "M13"])));

    // Standing still never crosses the marker.
    assert!(!particles
        .iter()
        .filter(plain)
        .any(|particle| last_turn_is(particle, &["M12"])));
}

#[test]
fn last_seen_has_no_decoy_once_target_ruled_out() {
    let mut engine = engine_at("M12");
    engine.identity_reveal(false);
    engine.propagate();
    engine.last_seen(pos("M12"), pos("M1"));
    assert!(!engine.is_inconsistent());
    assert!(engine
        .particles()
        .iter()
        .all(|particle| particle.count_equipment(Equipment::Unique) == 0));
}

fn with_last_turn<'a>(engine: &'a BeliefEngine, path: &[&str]) -> Vec<&'a Particle> {
    engine
        .particles()
        .iter()
        .filter(|particle| last_turn_is(particle, path))
        .collect()
}

fn is_plain(particle: &Particle) -> bool {
    particle.count_equipment(Equipment::Unique) == 0
        && particle.count_equipment(Equipment::Stealth) == 0
}

fn is_decoy(particle: &Particle) -> bool {
    particle.count_equipment(Equipment::Unique) == 1
        && particle.count_equipment(Equipment::Stealth) == 0
}

fn is_concealed(particle: &Particle) -> bool {
    particle.count_equipment(Equipment::Stealth) == 1
        && particle.count_equipment(Equipment::Unique) == 0
        && particle.concealed_this_turn()
}

#[test]
fn no_marker_drops_crossings_and_forks_concealment_and_decoy() {
    let mut engine = engine_at("K10");
    engine.propagate();
    // L1 watches column L and row 1; column K stays out of view.
    engine.last_seen(Coordinate::UNKNOWN, pos("L1"));
    assert!(!engine.is_inconsistent());

    let crossed = with_last_turn(&engine, &["K10", "L10"]);
    assert_eq!(crossed.len(), 2);
    assert!(!crossed.iter().any(|particle| is_plain(particle)));
    assert_eq!(crossed.iter().filter(|particle| is_concealed(particle)).count(), 1);
    assert_eq!(crossed.iter().filter(|particle| is_decoy(particle)).count(), 1);

    // Out of view: kept as is, and still forks its decoy.
    let unseen = with_last_turn(&engine, &["K10", "J10"]);
    assert_eq!(unseen.len(), 2);
    assert_eq!(unseen.iter().filter(|particle| is_plain(particle)).count(), 1);
    assert_eq!(unseen.iter().filter(|particle| is_decoy(particle)).count(), 1);

    let stayed = with_last_turn(&engine, &["K10"]);
    assert_eq!(stayed.len(), 2);
    assert!(!stayed.iter().any(|particle| particle.concealed_this_turn()));
}

#[test]
fn no_marker_never_conceals_an_extended_move() {
    let rules = Rules {
        start: pos("K10"),
        moves_per_turn: 2,
        extended_moves: 3,
        ..Rules::default()
    };
    let mut engine = BeliefEngine::new(Board::open(), rules);
    engine.equipment_reveal(Coordinate::UNKNOWN, Equipment::Hidden).unwrap();
    engine.propagate();
    engine.last_seen(Coordinate::UNKNOWN, pos("L1"));

    let rushed = with_last_turn(&engine, &["K10", "L10", "L11", "L12"]);
    assert_eq!(rushed.len(), 1);
    assert_eq!(rushed[0].count_equipment(Equipment::Unique), 1);
    assert_eq!(rushed[0].count_equipment(Equipment::Rush), 1);
    assert_eq!(rushed[0].count_equipment(Equipment::Stealth), 0);

    let normal = with_last_turn(&engine, &["K10", "L10", "L11"]);
    assert_eq!(normal.len(), 2);
    assert!(normal.iter().any(|particle| particle.count_equipment(Equipment::Stealth) == 1
        && particle.concealed_this_turn()));
    assert!(normal
        .iter()
        .any(|particle| particle.count_equipment(Equipment::Unique) == 1));
}

#[test]
fn motion_direction_is_relative_to_sensor() {
    let mut engine = engine_at("E9");
    engine.propagate();
    engine.spotted(pos("E5"), pos("A1"));
    assert!(engine
        .particles()
        .iter()
        .all(|particle| particle.moves_last_turn() == 4));

    let mut south = engine.clone();
    engine.motion(pos("E8"), Some(Compass::N));
    assert!(!engine.is_inconsistent());
    south.motion(pos("E8"), Some(Compass::S));
    assert!(south.is_inconsistent());
}

#[test]
fn quiet_sensor_rules_out_long_moves() {
    let mut engine = engine_at("K10");
    engine.propagate();
    engine.motion(pos("A1"), None);
    assert!(engine
        .particles()
        .iter()
        .all(|particle| particle.moves_last_turn() < 3));
}

#[test]
fn sniffing_splits_belief_by_range() {
    let mut near = engine_at("K10");
    near.propagate();
    let mut far = near.clone();
    near.sniffed(pos("K16"), true);
    far.sniffed(pos("K16"), false);
    assert_eq!(near.particle_count() + far.particle_count(), {
        let mut all = engine_at("K10");
        all.propagate();
        all.particle_count()
    });
    assert!(near
        .particles()
        .iter()
        .all(|particle| particle.position().within(pos("K16"), 4)));
}

#[test]
fn precognition_needs_an_objective_nearby() {
    let objective = pos("K14");
    let board = Board::from_fn(|cell| {
        if cell == objective {
            Terrain::Objective('a')
        } else {
            Terrain::Path
        }
    });
    let rules = Rules {
        start: pos("K10"),
        ..Rules::default()
    };
    let mut engine = BeliefEngine::new(board, rules);
    engine.propagate();
    engine.precognition();
    assert!(!engine.is_inconsistent());
    assert!(engine
        .particles()
        .iter()
        .all(|particle| particle.position().within(objective, 2)));
}
