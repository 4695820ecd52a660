//! # Domain — Closed Enumerations and Distance Sets
//!
//! Normalizes the raw locale strings that arrive at the system boundary
//! ("М"/"Ж"/"M"/"W" for sex, free-text distance lists) into small closed
//! enumerations once, so the core never branches on raw strings. Each enum
//! carries a stable database representation used by the storage layer.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

// ── Sex ─────────────────────────────────────────────────────────

/// Crew or discipline sex bucket. Parsed once at the boundary; the core
/// never sees raw "М"/"Ж" strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sex {
    Male,
    Female,
    Mixed,
}

impl Sex {
    /// Normalize a raw locale string. Accepts Cyrillic and Latin forms in
    /// any case. Returns `None` for anything outside the closed set.
    pub fn parse(raw: &str) -> Option<Sex> {
        let s = raw.trim().to_lowercase();
        match s.as_str() {
            "м" | "m" | "муж" | "мужской" | "male" | "men" => Some(Sex::Male),
            "ж" | "w" | "f" | "жен" | "женский" | "female" | "women" => Some(Sex::Female),
            "mix" | "mixed" | "см" | "смешанный" | "микст" => Some(Sex::Mixed),
            _ => None,
        }
    }

    pub fn as_db_str(&self) -> &'static str {
        match self {
            Sex::Male => "M",
            Sex::Female => "W",
            Sex::Mixed => "MIX",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Sex> {
        match s {
            "M" => Some(Sex::Male),
            "W" => Some(Sex::Female),
            "MIX" => Some(Sex::Mixed),
            _ => None,
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_db_str())
    }
}

// ── Crew roles ──────────────────────────────────────────────────

/// Slot role within a boat. Solo classes use `Participant`, standard crewed
/// classes use anonymous `Member` slots, and the dragon layout uses the
/// rower/coxswain/drummer/reserve split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CrewRole {
    Participant,
    Member,
    Rower,
    Coxswain,
    Drummer,
    Reserve,
}

impl CrewRole {
    pub fn as_db_str(&self) -> &'static str {
        match self {
            CrewRole::Participant => "participant",
            CrewRole::Member => "member",
            CrewRole::Rower => "rower",
            CrewRole::Coxswain => "coxswain",
            CrewRole::Drummer => "drummer",
            CrewRole::Reserve => "reserve",
        }
    }

    pub fn from_db_str(s: &str) -> Option<CrewRole> {
        match s {
            "participant" => Some(CrewRole::Participant),
            "member" => Some(CrewRole::Member),
            "rower" => Some(CrewRole::Rower),
            "coxswain" => Some(CrewRole::Coxswain),
            "drummer" => Some(CrewRole::Drummer),
            "reserve" => Some(CrewRole::Reserve),
            _ => None,
        }
    }

    /// Roles that occupy a competitive rower seat for the dragon
    /// sex-composition rule.
    pub fn is_rower_seat(&self) -> bool {
        matches!(self, CrewRole::Rower)
    }
}

impl fmt::Display for CrewRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_db_str())
    }
}

// ── Event lifecycle status ──────────────────────────────────────

/// Event lifecycle states, entered in order, never backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventStatus {
    Registration,
    RegistrationClosed,
    Results,
    Finished,
}

impl EventStatus {
    /// Position in the lifecycle ladder. Transitions must strictly increase.
    pub fn rank(&self) -> u8 {
        match self {
            EventStatus::Registration => 0,
            EventStatus::RegistrationClosed => 1,
            EventStatus::Results => 2,
            EventStatus::Finished => 3,
        }
    }

    /// The next state in the ladder, or `None` for the terminal state.
    pub fn next(&self) -> Option<EventStatus> {
        match self {
            EventStatus::Registration => Some(EventStatus::RegistrationClosed),
            EventStatus::RegistrationClosed => Some(EventStatus::Results),
            EventStatus::Results => Some(EventStatus::Finished),
            EventStatus::Finished => None,
        }
    }

    pub fn as_db_str(&self) -> &'static str {
        match self {
            EventStatus::Registration => "registration",
            EventStatus::RegistrationClosed => "registration_closed",
            EventStatus::Results => "results",
            EventStatus::Finished => "finished",
        }
    }

    pub fn from_db_str(s: &str) -> Option<EventStatus> {
        match s {
            "registration" => Some(EventStatus::Registration),
            "registration_closed" => Some(EventStatus::RegistrationClosed),
            "results" => Some(EventStatus::Results),
            "finished" => Some(EventStatus::Finished),
            _ => None,
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_db_str())
    }
}

// ── Registration status ─────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RegistrationStatus {
    Queued,
    AwaitingTeam,
    Confirmed,
    Disqualified,
    NoShow,
}

impl RegistrationStatus {
    pub fn as_db_str(&self) -> &'static str {
        match self {
            RegistrationStatus::Queued => "queued",
            RegistrationStatus::AwaitingTeam => "awaiting_team",
            RegistrationStatus::Confirmed => "confirmed",
            RegistrationStatus::Disqualified => "disqualified",
            RegistrationStatus::NoShow => "no_show",
        }
    }

    pub fn from_db_str(s: &str) -> Option<RegistrationStatus> {
        match s {
            "queued" => Some(RegistrationStatus::Queued),
            "awaiting_team" => Some(RegistrationStatus::AwaitingTeam),
            "confirmed" => Some(RegistrationStatus::Confirmed),
            "disqualified" => Some(RegistrationStatus::Disqualified),
            "no_show" => Some(RegistrationStatus::NoShow),
            _ => None,
        }
    }

    /// Statuses the no-show sweep may flip: the participant never progressed
    /// past the waiting states.
    pub fn is_no_show_candidate(&self) -> bool {
        matches!(
            self,
            RegistrationStatus::Queued | RegistrationStatus::AwaitingTeam
        )
    }
}

impl fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_db_str())
    }
}

// ── Distance sets ───────────────────────────────────────────────

/// An ordered set of race distances in meters, parsed from free text like
/// `"200, 500"`. The canonical label (sorted, comma-joined) doubles as the
/// team bucket key when one team absorbs all distances.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DistanceSet {
    distances: BTreeSet<u32>,
}

impl DistanceSet {
    /// Parse a comma- or semicolon-separated distance list. Empty segments
    /// are skipped; a non-numeric segment fails the whole parse.
    pub fn parse(raw: &str) -> Option<DistanceSet> {
        let mut distances = BTreeSet::new();
        for part in raw.split([',', ';']) {
            let part = part.trim().trim_end_matches('м').trim_end_matches('m');
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            distances.insert(part.parse::<u32>().ok()?);
        }
        if distances.is_empty() {
            return None;
        }
        Some(DistanceSet { distances })
    }

    pub fn from_distances(distances: impl IntoIterator<Item = u32>) -> DistanceSet {
        DistanceSet {
            distances: distances.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.distances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.distances.is_empty()
    }

    pub fn contains(&self, distance: u32) -> bool {
        self.distances.contains(&distance)
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.distances.iter().copied()
    }

    pub fn is_subset(&self, other: &DistanceSet) -> bool {
        self.distances.is_subset(&other.distances)
    }

    pub fn is_disjoint(&self, other: &DistanceSet) -> bool {
        self.distances.is_disjoint(&other.distances)
    }

    /// Distances in `self` not already covered by `other`.
    pub fn difference(&self, other: &DistanceSet) -> DistanceSet {
        DistanceSet {
            distances: self.distances.difference(&other.distances).copied().collect(),
        }
    }

    /// Union of this set with another.
    pub fn union(&self, other: &DistanceSet) -> DistanceSet {
        DistanceSet {
            distances: self.distances.union(&other.distances).copied().collect(),
        }
    }

    /// Canonical sorted label, e.g. `"200, 500"`. Stable across input order.
    pub fn label(&self) -> String {
        self.distances
            .iter()
            .map(|d| d.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for DistanceSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

// ── Tests ───────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sex_parses_cyrillic_and_latin_forms() {
        for raw in ["М", "м", "M", "m", "муж", "Male"] {
            assert_eq!(Sex::parse(raw), Some(Sex::Male), "input {:?}", raw);
        }
        for raw in ["Ж", "ж", "W", "F", "жен", "female"] {
            assert_eq!(Sex::parse(raw), Some(Sex::Female), "input {:?}", raw);
        }
        for raw in ["MIX", "mixed", "СМ", "микст"] {
            assert_eq!(Sex::parse(raw), Some(Sex::Mixed), "input {:?}", raw);
        }
    }

    #[test]
    fn sex_rejects_unknown_strings() {
        for raw in ["", "x", "men and women", "М/Ж"] {
            assert_eq!(Sex::parse(raw), None, "input {:?}", raw);
        }
    }

    #[test]
    fn sex_db_roundtrip() {
        for sex in [Sex::Male, Sex::Female, Sex::Mixed] {
            assert_eq!(Sex::from_db_str(sex.as_db_str()), Some(sex));
        }
    }

    #[test]
    fn crew_role_db_roundtrip() {
        for role in [
            CrewRole::Participant,
            CrewRole::Member,
            CrewRole::Rower,
            CrewRole::Coxswain,
            CrewRole::Drummer,
            CrewRole::Reserve,
        ] {
            assert_eq!(CrewRole::from_db_str(role.as_db_str()), Some(role));
        }
    }

    #[test]
    fn event_status_ranks_strictly_increase() {
        let mut status = EventStatus::Registration;
        while let Some(next) = status.next() {
            assert!(next.rank() > status.rank());
            status = next;
        }
        assert_eq!(status, EventStatus::Finished);
    }

    #[test]
    fn event_status_db_roundtrip() {
        for status in [
            EventStatus::Registration,
            EventStatus::RegistrationClosed,
            EventStatus::Results,
            EventStatus::Finished,
        ] {
            assert_eq!(EventStatus::from_db_str(status.as_db_str()), Some(status));
        }
    }

    #[test]
    fn no_show_candidates_are_waiting_states_only() {
        assert!(RegistrationStatus::Queued.is_no_show_candidate());
        assert!(RegistrationStatus::AwaitingTeam.is_no_show_candidate());
        assert!(!RegistrationStatus::Confirmed.is_no_show_candidate());
        assert!(!RegistrationStatus::Disqualified.is_no_show_candidate());
        assert!(!RegistrationStatus::NoShow.is_no_show_candidate());
    }

    #[test]
    fn distance_set_parses_comma_list() {
        let set = DistanceSet::parse("200, 500").unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.contains(200));
        assert!(set.contains(500));
    }

    #[test]
    fn distance_set_label_is_sorted_and_stable() {
        let a = DistanceSet::parse("500,200").unwrap();
        let b = DistanceSet::parse("200, 500").unwrap();
        assert_eq!(a.label(), "200, 500");
        assert_eq!(a, b);
    }

    #[test]
    fn distance_set_strips_meter_suffix() {
        let set = DistanceSet::parse("200м; 500 м").unwrap();
        assert_eq!(set.label(), "200, 500");
    }

    #[test]
    fn distance_set_rejects_garbage() {
        assert_eq!(DistanceSet::parse(""), None);
        assert_eq!(DistanceSet::parse("marathon"), None);
        assert_eq!(DistanceSet::parse("200, x"), None);
    }

    #[test]
    fn distance_set_difference_drops_covered() {
        let requested = DistanceSet::parse("200, 500, 1000").unwrap();
        let covered = DistanceSet::parse("500").unwrap();
        let remaining = requested.difference(&covered);
        assert_eq!(remaining.label(), "200, 1000");
    }

    #[test]
    fn distance_set_disjoint_and_subset() {
        let a = DistanceSet::parse("200").unwrap();
        let b = DistanceSet::parse("500, 1000").unwrap();
        assert!(a.is_disjoint(&b));
        assert!(a.is_subset(&a.union(&b)));
    }
}
