//! # Roster — Team Aggregate and Crew-Composition Rules
//!
//! An explicit in-memory aggregate of one team and its members, loaded and
//! saved inside a single transaction by the ledger service. All admission
//! rules live here as pure functions: capacity ceilings, per-role slot
//! counts, the dragon sex-composition rule, and the roster completeness
//! report used to decide whether a crew is confirmable.

use crate::catalog::{BoatClass, DRAGON_RESERVES, DRAGON_ROWERS};
use crate::domain::{CrewRole, Sex};
use serde::Serialize;
use thiserror::Error;

/// Admission failures for roster mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RosterError {
    #[error("team is full ({capacity} slots including reserves)")]
    CapacityExceeded { capacity: u32 },
    #[error("no free {role} slot in this boat class")]
    RoleUnavailable { role: CrewRole },
}

/// One crew member as loaded from the registrations of a team.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterMember {
    pub registration_id: i64,
    pub participant_id: i64,
    pub role: CrewRole,
    pub sex: Sex,
}

/// A missing-slot finding from the completeness check. Non-blocking entries
/// (dragon reserve shortfall) are informational only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingSlot {
    pub role: CrewRole,
    pub shortfall: u32,
    pub blocking: bool,
    pub description: String,
}

/// The team aggregate: identity fields plus the current member list.
#[derive(Debug, Clone)]
pub struct TeamRoster {
    pub team_id: i64,
    pub class: BoatClass,
    pub sex: Sex,
    members: Vec<RosterMember>,
}

impl TeamRoster {
    pub fn new(team_id: i64, class: BoatClass, sex: Sex, members: Vec<RosterMember>) -> TeamRoster {
        TeamRoster {
            team_id,
            class,
            sex,
            members,
        }
    }

    pub fn occupancy(&self) -> u32 {
        self.members.len() as u32
    }

    pub fn members(&self) -> &[RosterMember] {
        &self.members
    }

    fn count_role(&self, role: CrewRole) -> u32 {
        self.members.iter().filter(|m| m.role == role).count() as u32
    }

    fn opposite_sex_rowers(&self) -> u32 {
        self.members
            .iter()
            .filter(|m| m.role.is_rower_seat() && m.sex != self.sex)
            .count() as u32
    }

    /// Check whether a member with the given role and sex may join, without
    /// mutating anything.
    pub fn can_admit(&self, role: CrewRole, sex: Sex) -> Result<(), RosterError> {
        let capacity = self.class.total_capacity();
        if self.occupancy() + 1 > capacity {
            return Err(RosterError::CapacityExceeded { capacity });
        }
        let slots = self.class.slots_for_role(role);
        if slots == 0 || self.count_role(role) >= slots {
            return Err(RosterError::RoleUnavailable { role });
        }
        // Single-sex dragon crews may seat at most one opposite-sex rower;
        // mixed crews are unconstrained by this rule.
        if self.class.is_dragon()
            && self.sex != Sex::Mixed
            && role.is_rower_seat()
            && sex != self.sex
            && sex != Sex::Mixed
            && self.opposite_sex_rowers() >= 1
        {
            return Err(RosterError::RoleUnavailable { role });
        }
        Ok(())
    }

    /// Admit a member. The caller persists the new occupancy and re-runs the
    /// cost allocator for every member afterwards.
    pub fn add_member(&mut self, member: RosterMember) -> Result<(), RosterError> {
        self.can_admit(member.role, member.sex)?;
        self.members.push(member);
        Ok(())
    }

    /// Remove a participant. Returns the removed member, or `None` if the
    /// participant was not on the roster.
    pub fn remove_member(&mut self, participant_id: i64) -> Option<RosterMember> {
        let idx = self
            .members
            .iter()
            .position(|m| m.participant_id == participant_id)?;
        Some(self.members.remove(idx))
    }

    /// Completeness report. Dragon crews: missing coxswain, missing drummer,
    /// and rower shortfall are blocking; reserve shortfall is a note. Other
    /// crewed classes: plain occupancy shortfall against capacity.
    pub fn completeness(&self) -> Vec<MissingSlot> {
        let mut findings = Vec::new();
        if self.class.is_dragon() {
            let rowers = self.count_role(CrewRole::Rower);
            if rowers < DRAGON_ROWERS {
                let shortfall = DRAGON_ROWERS - rowers;
                findings.push(MissingSlot {
                    role: CrewRole::Rower,
                    shortfall,
                    blocking: true,
                    description: format!("{} rower(s) missing", shortfall),
                });
            }
            if self.count_role(CrewRole::Coxswain) == 0 {
                findings.push(MissingSlot {
                    role: CrewRole::Coxswain,
                    shortfall: 1,
                    blocking: true,
                    description: "coxswain missing".to_string(),
                });
            }
            if self.count_role(CrewRole::Drummer) == 0 {
                findings.push(MissingSlot {
                    role: CrewRole::Drummer,
                    shortfall: 1,
                    blocking: true,
                    description: "drummer missing".to_string(),
                });
            }
            let reserves = self.count_role(CrewRole::Reserve);
            if reserves < DRAGON_RESERVES {
                let shortfall = DRAGON_RESERVES - reserves;
                findings.push(MissingSlot {
                    role: CrewRole::Reserve,
                    shortfall,
                    blocking: false,
                    description: format!("{} reserve slot(s) unfilled", shortfall),
                });
            }
        } else if self.class.is_crewed() {
            let capacity = self.class.capacity();
            let occupancy = self.occupancy();
            if occupancy < capacity {
                let shortfall = capacity - occupancy;
                findings.push(MissingSlot {
                    role: CrewRole::Member,
                    shortfall,
                    blocking: true,
                    description: format!("{} member(s) missing", shortfall),
                });
            }
        }
        findings
    }

    /// A team is confirmable iff no blocking finding remains.
    pub fn is_confirmable(&self) -> bool {
        self.completeness().iter().all(|f| !f.blocking)
    }
}

// ── Tests ───────────────────────────────────────────────────────
