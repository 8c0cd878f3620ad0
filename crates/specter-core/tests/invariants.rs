use specter_core::belief::{BeliefEngine, Equipment, Particle};
use specter_core::log::{Command, SessionRecorder, replay, replay_recorded};
use specter_core::model::{Board, Coordinate};
use specter_core::rules::Rules;
use std::collections::HashMap;
use std::io::Cursor;

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

/// Multiset of (history, ledger) used to compare two beliefs.
fn fingerprint(engine: &BeliefEngine) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for particle in engine.particles() {
        let history: Vec<String> = particle
            .turns()
            .map(|turn| {
                turn.iter()
                    .map(Coordinate::to_string)
                    .collect::<Vec<_>>()
                    .join(",")
            })
            .collect();
        let key = format!("{}|{}", history.join(";"), particle.ledger());
        *counts.entry(key).or_insert(0) += 1;
    }
    counts
}

const SESSION: &str = "\
propagate
last_seen K10 A10
sniffed K14 True
spotted K12 A1
hidden
propagate
spotted ?? K1
motion K8 S
smoke K15
bluejay False
";

#[test]
fn ledgers_stay_ordered_through_a_session() {
    let mut engine = engine_at("K10");
    replay(&mut engine, Cursor::new(SESSION)).unwrap();
    assert!(!engine.is_inconsistent());
    assert!(engine
        .particles()
        .iter()
        .all(|particle| particle.ledger().is_ordered()));
    assert!(engine
        .particles()
        .iter()
        .all(|particle| particle.ledger().slots().len() == 5));
}

#[test]
fn occupancy_sums_to_one() {
    let mut engine = engine_at("K10");
    replay(&mut engine, Cursor::new(SESSION)).unwrap();
    let occupancy = engine.occupancy();
    let total: f64 = occupancy.cells().map(|(_, probability)| probability).sum();
    assert!((total - 1.0).abs() < 1e-9);
}

#[test]
fn repeated_not_spotted_is_idempotent() {
    let mut engine = engine_at("K10");
    engine.propagate();
    engine.spotted(Coordinate::UNKNOWN, pos("K1"));
    let once = fingerprint(&engine);
    engine.spotted(Coordinate::UNKNOWN, pos("K1"));
    assert_eq!(fingerprint(&engine), once);
}

#[test]
fn concealment_forks_need_spare_capacity() {
    let mut rules = Rules {
        start: pos("K10"),
        ..Rules::default()
    };
    rules.caps.generic = 0;
    let mut engine = BeliefEngine::new(Board::open(), rules);
    engine.propagate();
    engine.spotted(Coordinate::UNKNOWN, pos("K1"));
    let visible = engine.line_of_sight(pos("K1"));
    assert!(!engine.is_inconsistent());
    assert!(engine
        .particles()
        .iter()
        .all(|particle| !visible.contains(particle.position())));
    assert!(engine
        .particles()
        .iter()
        .all(|particle| particle.count_equipment(Equipment::Stealth) == 0));
}

#[test]
fn multi_observer_sighting_applies_each_observer() {
    let mut combined = engine_at("K10");
    combined.propagate();
    let mut sequential = combined.clone();

    combined
        .apply(&Command::parse("spotted ?? K1 A10").unwrap())
        .unwrap();
    sequential.spotted(Coordinate::UNKNOWN, pos("K1"));
    sequential.spotted(Coordinate::UNKNOWN, pos("A10"));
    assert_eq!(fingerprint(&combined), fingerprint(&sequential));
}

#[test]
fn recorded_session_replays_to_the_same_belief() {
    let mut live = engine_at("K10");
    let mut recorder = SessionRecorder::new(Vec::new());
    replay_recorded(&mut live, Cursor::new(SESSION), &mut recorder).unwrap();
    let log = String::from_utf8(recorder.into_inner()).unwrap();

    let mut replayed = engine_at("K10");
    let summary = replay(&mut replayed, Cursor::new(log)).unwrap();
    assert_eq!(summary.applied, SESSION.lines().count());
    assert_eq!(fingerprint(&replayed), fingerprint(&live));
    assert_eq!(replayed.phase(), live.phase());
    assert_eq!(replayed.identity(), live.identity());
    assert_eq!(replayed.board().smoke_center(), live.board().smoke_center());
}

#[test]
fn histories_are_contiguous_moves() {
    let mut engine = engine_at("K10");
    engine.propagate();
    engine.spotted(pos("K12"), pos("A1"));
    engine.propagate();
    let contiguous = |particle: &Particle| {
        particle.turns().all(|turn| {
            turn.windows(2)
                .all(|step| step[0].distance(step[1]) == 1)
        })
    };
    assert!(engine.particles().iter().all(contiguous));
}

#[test]
fn shared_last_seen_matches_single_observer_multiplicities() {
    let mut single = engine_at("K10");
    single.propagate();
    let mut shared = single.clone();

    // Neither observer can see anything reachable from K10 in one turn.
    single
        .apply(&Command::parse("last_seen ?? A1").unwrap())
        .unwrap();
    shared
        .apply(&Command::parse("last_seen ?? A1 W32").unwrap())
        .unwrap();
    assert_eq!(fingerprint(&shared), fingerprint(&single));

    let stayed: Vec<&Particle> = shared
        .particles()
        .iter()
        .filter(|particle| particle.last_turn() == [pos("K10")])
        .collect();
    let decoys = stayed
        .iter()
        .filter(|particle| particle.count_equipment(Equipment::Unique) == 1)
        .count();
    assert_eq!(stayed.len() - decoys, 1);
    assert_eq!(decoys, 1);
}

#[test]
fn shared_last_seen_forks_one_decoy_outside_every_view() {
    let mut engine = engine_at("K10");
    engine.propagate();
    let before = engine.particle_count();
    engine
        .apply(&Command::parse("last_seen ?? K1 A10").unwrap())
        .unwrap();

    assert!(fingerprint(&engine).values().all(|count| *count == 1));
    let decoys = engine
        .particles()
        .iter()
        .filter(|particle| particle.count_equipment(Equipment::Unique) == 1)
        .count();
    assert_eq!(decoys, before);
    assert!(engine
        .particles()
        .iter()
        .all(|particle| particle.count_equipment(Equipment::Unique)
            + particle.count_equipment(Equipment::Stealth)
            <= 1));

    let stayed: Vec<&Particle> = engine
        .particles()
        .iter()
        .filter(|particle| particle.last_turn() == [pos("K10")])
        .collect();
    assert_eq!(stayed.len(), 2);
    assert!(stayed
        .iter()
        .any(|particle| particle.count_equipment(Equipment::Stealth) == 1
            && particle.concealed_this_turn()));
    assert!(stayed
        .iter()
        .any(|particle| particle.count_equipment(Equipment::Unique) == 1));
}
