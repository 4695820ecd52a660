//! # Catalog — Boat Class Knowledge
//!
//! Static knowledge about boat classes: crew capacity, role layout, and the
//! cost divisor. Capacity is derived from the trailing integer of the class
//! identifier ("K-1" → 1, "C-4" → 4, "D-10" → 10). The dragon-boat class is
//! special-cased with a fixed layout of 10 rowers, 1 coxswain, 1 drummer,
//! and up to 2 reserves, and its cost divisor is always the 10 competitive
//! rower seats regardless of how many people the roster actually holds.

use crate::domain::CrewRole;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Total roster ceiling for the dragon class: 10 rowers + coxswain + drummer
/// + 2 reserve slots.
pub const DRAGON_TOTAL_CAPACITY: u32 = 14;

/// Competitive dragon crew: the fixed cost divisor and required rower count.
pub const DRAGON_ROWERS: u32 = 10;

/// Reserve slots available on a dragon roster.
pub const DRAGON_RESERVES: u32 = 2;

/// A boat class identifier, e.g. `"K-1"`, `"C-2"`, `"D-10"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoatClass(String);

/// One entry of a class's ordered role layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RoleSlot {
    pub role: CrewRole,
    pub count: u32,
}

impl BoatClass {
    pub fn new(id: impl Into<String>) -> BoatClass {
        BoatClass(id.into().trim().to_string())
    }

    pub fn id(&self) -> &str {
        &self.0
    }

    /// Crew capacity parsed from the trailing integer of the identifier.
    /// Identifiers without a trailing integer default to 1.
    pub fn capacity(&self) -> u32 {
        let digits: String = self
            .0
            .chars()
            .rev()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        digits
            .chars()
            .rev()
            .collect::<String>()
            .parse::<u32>()
            .unwrap_or(1)
            .max(1)
    }

    pub fn is_crewed(&self) -> bool {
        self.capacity() > 1
    }

    /// The dragon-boat configuration. Identified by the `D` class letter with
    /// the 10-seat hull ("D-10", "Д-10").
    pub fn is_dragon(&self) -> bool {
        let upper = self.0.to_uppercase();
        (upper.starts_with('D') || upper.starts_with('Д')) && self.capacity() == DRAGON_ROWERS
    }

    /// Roster ceiling including reserve slots. Equals `capacity()` for every
    /// class except the dragon, which carries 4 non-rower slots on top.
    pub fn total_capacity(&self) -> u32 {
        if self.is_dragon() {
            DRAGON_TOTAL_CAPACITY
        } else {
            self.capacity()
        }
    }

    /// Ordered role layout for this class.
    pub fn role_layout(&self) -> Vec<RoleSlot> {
        if self.is_dragon() {
            vec![
                RoleSlot { role: CrewRole::Rower, count: DRAGON_ROWERS },
                RoleSlot { role: CrewRole::Coxswain, count: 1 },
                RoleSlot { role: CrewRole::Drummer, count: 1 },
                RoleSlot { role: CrewRole::Reserve, count: DRAGON_RESERVES },
            ]
        } else if self.is_crewed() {
            vec![RoleSlot { role: CrewRole::Member, count: self.capacity() }]
        } else {
            vec![RoleSlot { role: CrewRole::Participant, count: 1 }]
        }
    }

    /// Slot count for a single role, 0 if the role does not exist in this
    /// class's layout.
    pub fn slots_for_role(&self, role: CrewRole) -> u32 {
        self.role_layout()
            .iter()
            .find(|s| s.role == role)
            .map(|s| s.count)
            .unwrap_or(0)
    }

    /// Role assigned when the caller does not name one.
    pub fn default_role(&self) -> CrewRole {
        if self.is_dragon() {
            CrewRole::Rower
        } else if self.is_crewed() {
            CrewRole::Member
        } else {
            CrewRole::Participant
        }
    }

    /// Divisor for splitting the event fee across a crew. Fixed at the 10
    /// competitive rower seats for the dragon class; actual occupancy
    /// (never below 1) for everything else.
    pub fn effective_team_size_for_cost(&self, occupancy: u32) -> u32 {
        if self.is_dragon() {
            DRAGON_ROWERS
        } else {
            occupancy.max(1)
        }
    }

    /// Placeholder team name when the registrant supplies none. A mandatory
    /// business default for dragon crews, a convenience elsewhere.
    pub fn placeholder_team_name(&self) -> String {
        format!("Team {}", self.0)
    }

    /// Placeholder city when the registrant supplies none.
    pub fn placeholder_city() -> &'static str {
        "City not specified"
    }
}

impl fmt::Display for BoatClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ── Tests ───────────────────────────────────────────────────────
