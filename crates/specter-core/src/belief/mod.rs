//! Particle-filter belief over the hidden entity's position and equipment.
//!
//! - `particle`: one hypothesis (turn history plus equipment ledger).
//! - `equipment`: equipment kinds and the fixed-slot ledger.
//! - `engine`: propagation and observation filters over the particle set.
//! - `summary`: occupancy distribution and serializable digests.

pub mod engine;
pub mod equipment;
pub mod particle;
pub mod phase;
pub mod summary;

pub use engine::{BeliefEngine, EngineError};
pub use equipment::{Equipment, Ledger};
pub use particle::Particle;
pub use phase::{ConcealmentPhase, Identity};
pub use summary::{BeliefSummary, Occupancy};
