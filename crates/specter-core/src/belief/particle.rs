//! A single consistent hypothesis for the hidden entity's history.

use super::equipment::{Equipment, Ledger};
use crate::model::position::Coordinate;
use crate::rules::EquipmentCaps;
use std::rc::Rc;

/// One timeline for the hidden entity: every position of every turn plus
/// what it has been inferred to have used.
///
/// Turns are immutable once appended and shared between forks of the same
/// ancestor; the ledger is owned by each particle.
#[derive(Debug, Clone)]
pub struct Particle {
    turns: Vec<Rc<[Coordinate]>>,
    ledger: Ledger,
    /// Turn count at which this particle was assumed to go unseen.
    concealed_at: Option<usize>,
}

/// Equivalence key used to collapse particles before propagation.
pub type ParticleKey = (Ledger, Coordinate, Option<Coordinate>);

impl Particle {
    /// The identity hypothesis: the entity stands on `start` with nothing used.
    pub fn new(start: Coordinate, slot_count: usize, caps: EquipmentCaps) -> Self {
        Self {
            turns: vec![Rc::from(vec![start])],
            ledger: Ledger::new(slot_count, caps),
            concealed_at: None,
        }
    }

    /// Appends a turn. Empty move sequences are ignored; a turn always holds
    /// at least its starting cell.
    pub fn append_turn(&mut self, moves: impl Into<Rc<[Coordinate]>>) {
        let moves = moves.into();
        debug_assert!(!moves.is_empty(), "a turn must contain its start cell");
        if !moves.is_empty() {
            self.turns.push(moves);
        }
    }

    /// A copy of this particle extended by one turn.
    pub fn with_turn(&self, moves: impl Into<Rc<[Coordinate]>>) -> Self {
        let mut next = self.clone();
        next.concealed_at = None;
        next.append_turn(moves);
        next
    }

    pub fn turns(&self) -> impl Iterator<Item = &[Coordinate]> + '_ {
        self.turns.iter().map(|turn| &turn[..])
    }

    pub fn turn_count(&self) -> usize {
        self.turns.len()
    }

    pub fn last_turn(&self) -> &[Coordinate] {
        self.turns.last().map(|turn| &turn[..]).unwrap_or(&[])
    }

    /// Moves made during the last turn (cells entered, not cells visited).
    pub fn moves_last_turn(&self) -> usize {
        self.last_turn().len().saturating_sub(1)
    }

    pub fn position(&self) -> Coordinate {
        self.position_turns_ago(0).unwrap_or(Coordinate::UNKNOWN)
    }

    /// End position of the turn before the last one.
    pub fn previous_position(&self) -> Option<Coordinate> {
        self.position_turns_ago(1)
    }

    /// End position `turns` turns before the current one.
    pub fn position_turns_ago(&self, turns: usize) -> Option<Coordinate> {
        let index = self.turns.len().checked_sub(turns + 1)?;
        self.turns[index].last().copied()
    }

    /// Start cell of the last turn.
    pub fn turn_start(&self) -> Coordinate {
        self.last_turn().first().copied().unwrap_or(Coordinate::UNKNOWN)
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn count_equipment(&self, kind: Equipment) -> usize {
        self.ledger.count(kind)
    }

    pub fn remaining_capacity_for(&self, kind: Equipment) -> usize {
        self.ledger.remaining_capacity(kind)
    }

    /// Records `kind` when capacity allows; a silent no-op otherwise.
    pub fn record_equipment(&mut self, kind: Equipment) -> bool {
        self.ledger.record(kind)
    }

    /// A fork with `kind` recorded, or `None` when it cannot hold one more.
    pub fn fork_with(&self, kind: Equipment) -> Option<Self> {
        if self.remaining_capacity_for(kind) == 0 {
            return None;
        }
        let mut fork = self.clone();
        fork.record_equipment(kind);
        Some(fork)
    }

    pub fn mark_concealed(&mut self) {
        self.concealed_at = Some(self.turns.len());
    }

    /// True when this particle already went unseen by concealment this turn.
    pub fn concealed_this_turn(&self) -> bool {
        self.concealed_at == Some(self.turns.len())
    }

    pub fn key(&self) -> ParticleKey {
        (
            self.ledger.clone(),
            self.position(),
            self.previous_position(),
        )
    }
}
