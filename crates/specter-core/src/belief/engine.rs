//! Particle-set propagation and observation filtering.

use super::equipment::Equipment;
use super::particle::{Particle, ParticleKey};
use super::phase::{ConcealmentPhase, Identity};
use super::summary::Occupancy;
use crate::log::command::Command;
use crate::model::board::{Board, BoardError};
use crate::model::cells::CellSet;
use crate::model::compass::Compass;
use crate::model::position::{BOARD_COLS, BOARD_ROWS, Coordinate};
use crate::rules::Rules;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use thiserror::Error;

const TARGET: &str = "specter_core::engine";

/// Owns the particle set and every piece of state observations depend on.
///
/// Each operation runs to completion and replaces the particle set; an
/// observation that rules out every particle leaves the set empty rather than
/// failing, see [`BeliefEngine::is_inconsistent`].
#[derive(Debug, Clone)]
pub struct BeliefEngine {
    board: Board,
    rules: Rules,
    particles: Vec<Particle>,
    phase: ConcealmentPhase,
    identity: Identity,
    missions: Vec<Coordinate>,
}

impl BeliefEngine {
    pub fn new(board: Board, rules: Rules) -> Self {
        let particles = vec![initial_particle(&rules)];
        Self {
            board,
            rules,
            particles,
            phase: ConcealmentPhase::None,
            identity: Identity::Unknown,
            missions: Vec::new(),
        }
    }

    /// Back to the single starting hypothesis, clearing any smoke.
    pub fn reset(&mut self) {
        self.board.clear_smoke();
        self.particles = vec![initial_particle(&self.rules)];
        self.phase = ConcealmentPhase::None;
        self.identity = Identity::Unknown;
        self.missions.clear();
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn particle(&self, index: usize) -> Option<&Particle> {
        self.particles.get(index)
    }

    pub fn particle_count(&self) -> usize {
        self.particles.len()
    }

    /// True once the observations have ruled out every hypothesis.
    pub fn is_inconsistent(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn phase(&self) -> ConcealmentPhase {
        self.phase
    }

    pub fn identity(&self) -> Identity {
        self.identity
    }

    pub fn missions(&self) -> &[Coordinate] {
        &self.missions
    }

    /// Diagnostic view of what an observer at `at` would see right now.
    pub fn line_of_sight(&self, at: Coordinate) -> CellSet {
        self.board.line_of_sight(at)
    }

    pub fn occupancy(&self) -> Occupancy {
        Occupancy::from_particles(&self.particles)
    }

    /// Applies one command.
    pub fn apply(&mut self, command: &Command) -> Result<(), EngineError> {
        match command {
            Command::Propagate => self.propagate(),
            Command::Spotted { at, observers } => {
                for observer in observers {
                    self.spotted(*at, *observer);
                }
            }
            Command::LastSeen { at, observers } => self.last_seen_by(*at, observers),
            Command::Motion { sensor, direction } => self.motion(*sensor, *direction),
            Command::Sniffed { hunter, detected } => self.sniffed(*hunter, *detected),
            Command::Mission { objective } => self.mission(*objective),
            Command::Precognition => self.precognition(),
            Command::Postcognition { at } => self.postcognition(*at),
            Command::Flash { at } => self.equipment_reveal(*at, Equipment::Flash)?,
            Command::Smoke { at } => self.equipment_reveal(*at, Equipment::Smoke)?,
            Command::Unique => self.equipment_reveal(Coordinate::UNKNOWN, Equipment::Unique)?,
            Command::Hidden => self.equipment_reveal(Coordinate::UNKNOWN, Equipment::Hidden)?,
            Command::Identity { is_target } => self.identity_reveal(*is_target),
        }
        Ok(())
    }

    /// Movement phase: every particle branches into every move sequence it
    /// could legally have made this turn.
    pub fn propagate(&mut self) {
        self.board.clear_smoke();
        self.phase = self.phase.advance();
        let extended = self.phase == ConcealmentPhase::Active;

        let before = self.particles.len();
        let trimmed = deduplicate(std::mem::take(&mut self.particles));
        let neighbours = passable_neighbours(&self.board);
        let normal = self.rules.moves_per_turn;

        let mut sequences: HashMap<(Coordinate, usize), Vec<Rc<[Coordinate]>>> = HashMap::new();
        let mut next = Vec::new();
        for particle in &trimmed {
            let budget = if extended && particle.remaining_capacity_for(Equipment::Rush) > 0 {
                self.rules.extended_moves
            } else {
                normal
            };
            let start = particle.position();
            let reachable = sequences
                .entry((start, budget))
                .or_insert_with(|| move_sequences(start, budget, &neighbours));
            for moves in reachable.iter() {
                let rushed = moves.len() - 1 > normal;
                let mut child = particle.with_turn(Rc::clone(moves));
                if rushed {
                    child.record_equipment(Equipment::Rush);
                }
                next.push(child);
            }
        }

        tracing::debug!(
            target: TARGET,
            before,
            trimmed = trimmed.len(),
            after = next.len(),
            extended,
            "propagated"
        );
        self.particles = next;
    }

    /// Keeps particles consistent with a sighting from `from`. An off-board
    /// `at` means nobody saw the entity.
    pub fn spotted(&mut self, at: Coordinate, from: Coordinate) {
        if at.on_board() {
            self.refine("spotted", |particle, out| {
                if particle.position() == at {
                    out.push(particle);
                }
            });
            return;
        }

        let los = self.board.line_of_sight(from);
        let concealment = self.concealment_gate();
        self.refine("not_spotted", |particle, out| {
            if !los.contains(particle.position()) || particle.concealed_this_turn() {
                out.push(particle);
            } else if let Some(fork) = concealment.fork(&particle) {
                out.push(fork);
            }
        });
    }

    /// Keeps particles consistent with a last-seen marker at `at` left while
    /// crossing the view of `from`, or with no marker when `at` is off-board.
    pub fn last_seen(&mut self, at: Coordinate, from: Coordinate) {
        self.last_seen_by(at, &[from]);
    }

    /// Last-seen report shared by several observers. Each input particle is
    /// filtered by every observer in turn and forks at most one decoy.
    pub fn last_seen_by(&mut self, at: Coordinate, observers: &[Coordinate]) {
        if observers.is_empty() {
            return;
        }
        let sights: Vec<CellSet> = observers
            .iter()
            .map(|observer| self.board.line_of_sight(*observer))
            .collect();
        let decoy = !self.identity.target_ruled_out();
        let concealment = self.concealment_gate();
        let operator = if at.on_board() {
            "last_seen"
        } else {
            "not_last_seen"
        };

        self.refine(operator, |particle, out| {
            let fork = decoy_fork(&particle, decoy);
            let plain = sights.iter().try_fold(particle, |particle, los| {
                last_seen_filter(particle, at, los, concealment)
            });
            out.extend(plain);
            out.extend(fork);
        });
    }

    /// Motion sensor at `sensor`: `None` means nothing moved enough to trip it.
    pub fn motion(&mut self, sensor: Coordinate, direction: Option<Compass>) {
        let threshold = self.rules.motion_threshold;
        self.refine("motion", |particle, out| {
            let tripped = particle.moves_last_turn() >= threshold;
            let keep = match direction {
                None => !tripped,
                Some(direction) => tripped && direction.contains(sensor, particle.position()),
            };
            if keep {
                out.push(particle);
            }
        });
    }

    pub fn sniffed(&mut self, hunter: Coordinate, detected: bool) {
        let range = self.rules.sniff_range;
        self.refine("sniffed", |particle, out| {
            if particle.position().within(hunter, range) == detected {
                out.push(particle);
            }
        });
    }

    /// An objective at `objective` was completed this turn.
    pub fn mission(&mut self, objective: Coordinate) {
        self.missions.push(objective);
        let radius = self.rules.objective_radius(self.identity.target_ruled_out());
        let reach: CellSet = self
            .board
            .adjacent(objective, radius, true)
            .into_iter()
            .collect();
        self.refine("mission", |particle, out| {
            if reach.contains(particle.turn_start()) {
                out.push(particle);
            }
        });
    }

    /// The entity ends its turn near some objective marker.
    pub fn precognition(&mut self) {
        let radius = self.rules.objective_radius(self.identity.target_ruled_out());
        let mut near = CellSet::EMPTY;
        for objective in self.board.objectives() {
            near.extend(self.board.adjacent(objective, radius, false));
        }
        self.refine("precognition", |particle, out| {
            if near.contains(particle.position()) {
                out.push(particle);
            }
        });
    }

    /// The entity stood on `at` two turns ago.
    pub fn postcognition(&mut self, at: Coordinate) {
        self.refine("postcognition", |particle, out| {
            if particle.position_turns_ago(2) == Some(at) {
                out.push(particle);
            }
        });
    }

    /// The entity revealed a piece of equipment. Grenades carry the cell they
    /// landed on; other kinds ignore `at`.
    pub fn equipment_reveal(&mut self, at: Coordinate, kind: Equipment) -> Result<(), EngineError> {
        match kind {
            Equipment::Flash | Equipment::Smoke => {
                if !at.on_board() {
                    return Err(EngineError::GrenadeOffBoard(kind));
                }
                if kind == Equipment::Smoke {
                    self.board.place_smoke(at)?;
                }
                let range = self.rules.grenade_range;
                self.refine(kind.as_str(), |mut particle, out| {
                    let in_range = particle.last_turn().iter().any(|cell| cell.within(at, range));
                    if in_range && particle.record_equipment(kind) {
                        out.push(particle);
                    }
                });
            }
            Equipment::Hidden => {
                self.phase = ConcealmentPhase::Pending;
                self.record_or_drop(kind);
            }
            Equipment::Unique | Equipment::Rush | Equipment::Stealth => self.record_or_drop(kind),
            Equipment::Concealment | Equipment::Unknown => {
                return Err(EngineError::NotRevealable(kind));
            }
        }
        Ok(())
    }

    pub fn identity_reveal(&mut self, is_target: bool) {
        self.identity = if is_target {
            Identity::Target
        } else {
            Identity::Other
        };
        tracing::info!(target: TARGET, identity = ?self.identity, "identity revealed");
    }

    fn record_or_drop(&mut self, kind: Equipment) {
        self.refine(kind.as_str(), |mut particle, out| {
            if particle.record_equipment(kind) {
                out.push(particle);
            }
        });
    }

    fn concealment_gate(&self) -> ConcealmentGate {
        let declared = !self.rules.concealment_requires_declaration || self.phase.is_live();
        ConcealmentGate {
            enabled: declared,
            normal_moves: self.rules.moves_per_turn,
        }
    }

    /// Rebuilds the particle set by handing every particle to `decide`, which
    /// pushes whatever survives (the particle itself and/or forks of it).
    fn refine<F>(&mut self, operator: &str, mut decide: F)
    where
        F: FnMut(Particle, &mut Vec<Particle>),
    {
        let before = self.particles.len();
        let mut next = Vec::with_capacity(before);
        for particle in std::mem::take(&mut self.particles) {
            decide(particle, &mut next);
        }
        tracing::debug!(target: TARGET, operator, before, after = next.len(), "observation applied");
        if next.is_empty() && before > 0 {
            tracing::warn!(
                target: TARGET,
                operator,
                "observation ruled out every hypothesis; belief is now empty"
            );
        }
        self.particles = next;
    }
}

fn initial_particle(rules: &Rules) -> Particle {
    Particle::new(rules.start, rules.equipment_slots, rules.caps)
}

/// Keeps the first particle of every (ledger, position, previous position)
/// class.
fn deduplicate(particles: Vec<Particle>) -> Vec<Particle> {
    let mut seen: HashSet<ParticleKey> = HashSet::with_capacity(particles.len());
    particles
        .into_iter()
        .filter(|particle| seen.insert(particle.key()))
        .collect()
}

fn passable_neighbours(board: &Board) -> Vec<Vec<Coordinate>> {
    (0..BOARD_ROWS * BOARD_COLS)
        .filter_map(Coordinate::from_index)
        .map(|cell| board.adjacent(cell, 1, true))
        .collect()
}

/// Every move sequence of 0 to `budget` steps from `start`, shortest first.
fn move_sequences(
    start: Coordinate,
    budget: usize,
    neighbours: &[Vec<Coordinate>],
) -> Vec<Rc<[Coordinate]>> {
    let mut layer: Vec<Vec<Coordinate>> = vec![vec![start]];
    let mut all: Vec<Rc<[Coordinate]>> = vec![Rc::from(vec![start])];
    for _ in 0..budget {
        let mut grown = Vec::new();
        for moves in &layer {
            let Some(last) = moves.last().and_then(|cell| cell.index()) else {
                continue;
            };
            for step in &neighbours[last] {
                let mut extended = Vec::with_capacity(moves.len() + 1);
                extended.extend_from_slice(moves);
                extended.push(*step);
                grown.push(extended);
            }
        }
        all.extend(grown.iter().map(|moves| Rc::from(moves.as_slice())));
        layer = grown;
    }
    all
}

/// One observer's verdict on a last-seen report. With the marker on the
/// board the particle must have left `at` this turn unseen; with no marker it
/// must have stayed out of view, or be concealed.
fn last_seen_filter(
    particle: Particle,
    at: Coordinate,
    los: &CellSet,
    concealment: ConcealmentGate,
) -> Option<Particle> {
    let turn = particle.last_turn();
    if at.on_board() {
        let index = turn[..turn.len().saturating_sub(1)]
            .iter()
            .rposition(|cell| *cell == at)?;
        return (!los.intersects(&turn[index + 1..])).then_some(particle);
    }
    if !los.intersects(turn) || particle.concealed_this_turn() {
        Some(particle)
    } else {
        concealment.fork(&particle)
    }
}

fn decoy_fork(particle: &Particle, decoy_possible: bool) -> Option<Particle> {
    if !decoy_possible {
        return None;
    }
    particle.fork_with(Equipment::Unique)
}

#[derive(Debug, Clone, Copy)]
struct ConcealmentGate {
    enabled: bool,
    normal_moves: usize,
}

impl ConcealmentGate {
    /// A fork of `particle` that went unseen by concealment, when that is a
    /// legal explanation for it.
    fn fork(&self, particle: &Particle) -> Option<Particle> {
        if !self.enabled || particle.moves_last_turn() > self.normal_moves {
            return None;
        }
        let mut fork = particle.fork_with(Equipment::Concealment)?;
        fork.mark_concealed();
        Some(fork)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error(transparent)]
    Board(#[from] BoardError),
    #[error("{0} grenade needs an on-board landing position")]
    GrenadeOffBoard(Equipment),
    #[error("'{0}' is not an equipment kind that can be revealed")]
    NotRevealable(Equipment),
}
