use super::engine::BeliefEngine;
use super::equipment::Equipment;
use super::particle::Particle;
use super::phase::{ConcealmentPhase, Identity};
use crate::model::position::{BOARD_COLS, BOARD_ROWS, Coordinate};
use serde::{Deserialize, Serialize};

/// Particle counts per board cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occupancy {
    counts: Vec<usize>,
    total: usize,
}

impl Occupancy {
    pub fn from_particles(particles: &[Particle]) -> Self {
        let mut counts = vec![0; BOARD_ROWS * BOARD_COLS];
        let mut total = 0;
        for particle in particles {
            if let Some(index) = particle.position().index() {
                counts[index] += 1;
                total += 1;
            }
        }
        Self { counts, total }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn count(&self, cell: Coordinate) -> usize {
        cell.index().map(|index| self.counts[index]).unwrap_or(0)
    }

    /// Share of particles standing on `cell`; zero for an empty belief.
    pub fn probability(&self, cell: Coordinate) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.count(cell) as f64 / self.total as f64
    }

    /// Occupied cells with their probability, in board order.
    pub fn cells(&self) -> impl Iterator<Item = (Coordinate, f64)> + '_ {
        self.counts
            .iter()
            .enumerate()
            .filter(|(_, count)| **count > 0)
            .filter_map(|(index, _)| Coordinate::from_index(index))
            .map(|cell| (cell, self.probability(cell)))
    }

    /// The `limit` most likely cells, ties broken by board order.
    pub fn ranked(&self, limit: usize) -> Vec<(Coordinate, f64)> {
        let mut cells: Vec<(Coordinate, f64)> = self.cells().collect();
        cells.sort_by(|a, b| b.1.total_cmp(&a.1));
        cells.truncate(limit);
        cells
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellProbability {
    pub cell: Coordinate,
    pub probability: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentTally {
    pub kind: Equipment,
    /// Fraction of particles that used at least one.
    pub share: f64,
}

/// Serializable digest of the belief for display and export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeliefSummary {
    pub particles: usize,
    pub phase: ConcealmentPhase,
    pub identity: Identity,
    pub missions: Vec<Coordinate>,
    pub smoke: Option<Coordinate>,
    pub most_likely: Vec<CellProbability>,
    pub equipment: Vec<EquipmentTally>,
}

impl BeliefSummary {
    pub const TRACKED: [Equipment; 6] = [
        Equipment::Unique,
        Equipment::Rush,
        Equipment::Stealth,
        Equipment::Flash,
        Equipment::Smoke,
        Equipment::Hidden,
    ];

    pub fn capture(engine: &BeliefEngine, top: usize) -> Self {
        let particles = engine.particles();
        let most_likely = engine
            .occupancy()
            .ranked(top)
            .into_iter()
            .map(|(cell, probability)| CellProbability { cell, probability })
            .collect();
        let equipment = Self::TRACKED
            .into_iter()
            .map(|kind| {
                let used = particles
                    .iter()
                    .filter(|particle| particle.ledger().known().contains(&kind))
                    .count();
                let share = if particles.is_empty() {
                    0.0
                } else {
                    used as f64 / particles.len() as f64
                };
                EquipmentTally { kind, share }
            })
            .collect();
        BeliefSummary {
            particles: particles.len(),
            phase: engine.phase(),
            identity: engine.identity(),
            missions: engine.missions().to_vec(),
            smoke: engine.board().smoke_center(),
            most_likely,
            equipment,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::board::Board;
    use crate::rules::Rules;

    fn pos(token: &str) -> Coordinate {
        Coordinate::parse(token).unwrap()
    }

    fn engine() -> BeliefEngine {
        let rules = Rules {
            start: pos("K10"),
            ..Rules::default()
        };
        BeliefEngine::new(Board::open(), rules)
    }

    #[test]
    fn probabilities_sum_to_one() {
        let mut engine = engine();
        engine.propagate();
        let occupancy = engine.occupancy();
        let total: f64 = occupancy.cells().map(|(_, p)| p).sum();
        assert!((total - 1.0).abs() < 1e-9);
        assert_eq!(occupancy.total(), engine.particle_count());
        assert_eq!(occupancy.probability(pos("A1")), 0.0);
    }

    #[test]
    fn ranked_orders_by_mass() {
        let mut engine = engine();
        engine.propagate();
        let ranked = engine.occupancy().ranked(5);
        assert_eq!(ranked.len(), 5);
        assert!(ranked.windows(2).all(|pair| pair[0].1 >= pair[1].1));
    }

    #[test]
    fn empty_belief_has_no_mass() {
        let mut engine = engine();
        engine.sniffed(pos("K10"), false);
        assert!(engine.is_inconsistent());
        let occupancy = engine.occupancy();
        assert_eq!(occupancy.cells().count(), 0);
        assert_eq!(occupancy.probability(pos("K10")), 0.0);
    }

    #[test]
    fn summary_serializes_to_json() {
        let mut engine = engine();
        engine.equipment_reveal(Coordinate::UNKNOWN, Equipment::Unique).unwrap();
        let summary = BeliefSummary::capture(&engine, 3);
        let json = summary.to_json().unwrap();
        assert!(json.contains("\"particles\": 1"));
        assert!(json.contains("\"K10\""));
        assert!(json.contains("\"unique\""));
        let restored = BeliefSummary::from_json(&json).unwrap();
        assert_eq!(restored, summary);
        assert_eq!(restored.equipment[0].share, 1.0);
    }
}
