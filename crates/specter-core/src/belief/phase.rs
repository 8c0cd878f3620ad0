use serde::{Deserialize, Serialize};

/// Whether a hidden equipment play affects the current movement phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConcealmentPhase {
    #[default]
    None,
    /// Declared; takes effect at the next propagation.
    Pending,
    /// In effect until the following propagation.
    Active,
}

impl ConcealmentPhase {
    /// State after a propagation step.
    pub const fn advance(self) -> Self {
        match self {
            ConcealmentPhase::Pending => ConcealmentPhase::Active,
            ConcealmentPhase::Active | ConcealmentPhase::None => ConcealmentPhase::None,
        }
    }

    pub const fn is_live(self) -> bool {
        !matches!(self, ConcealmentPhase::None)
    }
}

/// What is known about the hidden entity's role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Identity {
    #[default]
    Unknown,
    /// Positively identified as the role with the unique decoy ability.
    Target,
    /// Known not to be the target role.
    Other,
}

impl Identity {
    pub const fn target_ruled_out(self) -> bool {
        matches!(self, Identity::Other)
    }
}
