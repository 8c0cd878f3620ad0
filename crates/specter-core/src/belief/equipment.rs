//! Equipment kinds and the per-particle ledger of what has been used.

use crate::rules::EquipmentCaps;
use core::fmt;
use serde::{Deserialize, Serialize};

/// Equipment kinds in ledger order. `Unknown` always sorts last.
///
/// `Concealment` is a query-only pseudo-kind: it counts every slot that could
/// explain the entity going unseen and is recorded as [`Equipment::Stealth`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Equipment {
    /// The role-unique ability (a decoy for the target role).
    Unique,
    /// Extended movement for one turn.
    Rush,
    Stealth,
    Flash,
    Smoke,
    /// A card was played face down; which one is not known.
    Hidden,
    Concealment,
    Unknown,
}

impl Equipment {
    pub const fn as_str(self) -> &'static str {
        match self {
            Equipment::Unique => "unique",
            Equipment::Rush => "rush",
            Equipment::Stealth => "stealth",
            Equipment::Flash => "flash",
            Equipment::Smoke => "smoke",
            Equipment::Hidden => "hidden",
            Equipment::Concealment => "concealment",
            Equipment::Unknown => "unknown",
        }
    }

    /// Value actually written into a slot when `self` is recorded.
    const fn stored_as(self) -> Equipment {
        match self {
            Equipment::Concealment => Equipment::Stealth,
            other => other,
        }
    }

    const fn cap(self, caps: &EquipmentCaps) -> usize {
        match self {
            Equipment::Unknown => 0,
            Equipment::Unique => caps.unique,
            Equipment::Hidden => caps.hidden,
            _ => caps.generic,
        }
    }
}

impl fmt::Display for Equipment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixed-capacity record of equipment usage.
///
/// Slots are kept sorted so every known slot precedes every unknown one; the
/// ledger therefore only tells how many slots are still unknown, never which.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ledger {
    slots: Vec<Equipment>,
    caps: EquipmentCaps,
}

impl Ledger {
    pub fn new(slot_count: usize, caps: EquipmentCaps) -> Self {
        Self {
            slots: vec![Equipment::Unknown; slot_count],
            caps,
        }
    }

    pub fn slots(&self) -> &[Equipment] {
        &self.slots
    }

    pub fn caps(&self) -> EquipmentCaps {
        self.caps
    }

    pub fn unknown_count(&self) -> usize {
        self.count_exact(Equipment::Unknown)
    }

    pub fn known(&self) -> &[Equipment] {
        &self.slots[..self.slots.len() - self.unknown_count()]
    }

    fn count_exact(&self, kind: Equipment) -> usize {
        self.slots.iter().filter(|slot| **slot == kind).count()
    }

    /// Number of slots holding `kind`; `Concealment` also counts stealth and
    /// hidden plays.
    pub fn count(&self, kind: Equipment) -> usize {
        match kind {
            Equipment::Concealment => {
                self.count_exact(Equipment::Stealth) + self.count_exact(Equipment::Hidden)
            }
            other => self.count_exact(other),
        }
    }

    /// How many more slots of `kind` this ledger could still legally hold.
    pub fn remaining_capacity(&self, kind: Equipment) -> usize {
        kind.cap(&self.caps)
            .saturating_sub(self.count(kind))
            .min(self.unknown_count())
    }

    /// Writes `kind` into the first unknown slot. Returns `false`, leaving the
    /// ledger untouched, when no capacity remains.
    pub fn record(&mut self, kind: Equipment) -> bool {
        if self.remaining_capacity(kind) == 0 {
            return false;
        }
        let Some(slot) = self.slots.iter().position(|slot| *slot == Equipment::Unknown) else {
            return false;
        };
        self.slots[slot] = kind.stored_as();
        self.slots.sort_unstable();
        true
    }

    /// True when no unknown slot precedes a known one.
    pub fn is_ordered(&self) -> bool {
        self.slots.windows(2).all(|pair| pair[0] <= pair[1])
    }
}

impl fmt::Display for Ledger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, slot) in self.slots.iter().enumerate() {
            if index > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{slot}")?;
        }
        Ok(())
    }
}
