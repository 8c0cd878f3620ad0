//! Ruleset constants consumed by the belief engine.

use crate::model::position::Coordinate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const DEFAULT_START: Coordinate = Coordinate::new(0, 13);

/// Per-kind ceilings on how many ledger slots one equipment kind may fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct EquipmentCaps {
    /// Role-unique equipment.
    pub unique: usize,
    /// Every ordinary equipment kind.
    pub generic: usize,
    /// Equipment played without revealing which card it was.
    pub hidden: usize,
}

impl Default for EquipmentCaps {
    fn default() -> Self {
        Self {
            unique: 1,
            generic: 2,
            hidden: 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rules {
    pub moves_per_turn: usize,
    /// Move budget for a turn played under extended movement.
    pub extended_moves: usize,
    /// Minimum moves in a turn for a motion sensor to register it.
    pub motion_threshold: usize,
    pub sniff_range: u16,
    pub grenade_range: u16,
    /// Objective radius once the target role has been ruled out.
    pub mission_radius: u16,
    /// Objective radius while the target role is still possible.
    pub mission_radius_unresolved: u16,
    pub equipment_slots: usize,
    pub caps: EquipmentCaps,
    pub start: Coordinate,
    /// Only fork concealment hypotheses after a hidden equipment play.
    pub concealment_requires_declaration: bool,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            moves_per_turn: 4,
            extended_moves: 5,
            motion_threshold: 3,
            sniff_range: 4,
            grenade_range: 4,
            mission_radius: 1,
            mission_radius_unresolved: 2,
            equipment_slots: 5,
            caps: EquipmentCaps::default(),
            start: DEFAULT_START,
            concealment_requires_declaration: false,
        }
    }
}

impl Rules {
    pub fn validate(&self) -> Result<(), RulesError> {
        if self.moves_per_turn == 0 {
            return Err(RulesError::InvalidField {
                field: "moves_per_turn",
                message: "must be at least 1".to_string(),
            });
        }
        if self.extended_moves < self.moves_per_turn {
            return Err(RulesError::InvalidField {
                field: "extended_moves",
                message: format!(
                    "must not be below moves_per_turn ({})",
                    self.moves_per_turn
                ),
            });
        }
        if self.equipment_slots == 0 {
            return Err(RulesError::InvalidField {
                field: "equipment_slots",
                message: "must be at least 1".to_string(),
            });
        }
        if !self.start.on_board() {
            return Err(RulesError::InvalidField {
                field: "start",
                message: "start position must be on the board".to_string(),
            });
        }
        Ok(())
    }

    /// Radius used by mission and precognition checks for an identity state.
    pub fn objective_radius(&self, target_ruled_out: bool) -> u16 {
        if target_ruled_out {
            self.mission_radius
        } else {
            self.mission_radius_unresolved
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RulesError {
    #[error("rules.{field}: {message}")]
    InvalidField {
        field: &'static str,
        message: String,
    },
}
