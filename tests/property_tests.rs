//! Property-based tests for the pure domain logic.
//!
//! These tests use the `proptest` framework to verify invariants across
//! thousands of randomly generated inputs: cost rounding, distance-set
//! algebra, roster admission rules, and date parsing.
//!
//! # Prerequisites
//!
//! - No database or network access required.
//! - These tests are purely computational and always run.
//!
//! # How to run
//!
//! ```bash
//! cargo test --test property_tests
//!
//! # Increase case count for thorough testing (default is 256):
//! PROPTEST_CASES=10000 cargo test --test property_tests
//! ```

use proptest::prelude::*;
use regatta::catalog::BoatClass;
use regatta::cost::{div_round_half_up, registration_cost};
use regatta::dates::{EventWindowParser, RussianDateParser};
use regatta::domain::{CrewRole, DistanceSet, Sex};
use regatta::roster::{RosterMember, TeamRoster};

// == Cost Rounding Properties ==================================================

proptest! {
    /// Round-half-up never strays more than half a denominator from the
    /// exact quotient: |q*d - n| <= d/2 (ties go up).
    #[test]
    fn prop_div_round_half_up_within_half_denominator(
        n in 0i64..1_000_000_000,
        d in 1i64..100_000,
    ) {
        let q = div_round_half_up(n, d);
        let err = (q * d - n).abs();
        prop_assert!(err * 2 <= d, "n={n} d={d} q={q} err={err}");
    }

    /// Exact multiples divide without rounding at all.
    #[test]
    fn prop_div_round_half_up_exact_on_multiples(
        q in 0i64..1_000_000,
        d in 1i64..10_000,
    ) {
        prop_assert_eq!(div_round_half_up(q * d, d), q);
    }

    /// Cost grows monotonically with the number of distances.
    #[test]
    fn prop_registration_cost_monotone_in_distances(
        fee in 0i64..10_000_000,
        count in 0u32..10,
        team in 1u32..20,
    ) {
        let a = registration_cost(fee, count, team);
        let b = registration_cost(fee, count + 1, team);
        prop_assert!(b >= a);
    }

    /// Splitting a fee across a team never loses or creates more than one
    /// rounding step per member: occupancy * per-member cost stays within
    /// occupancy/2 minor units of the undivided total.
    #[test]
    fn prop_team_split_conserves_total_within_rounding(
        fee in 0i64..10_000_000,
        count in 1u32..6,
        team in 1u32..20,
    ) {
        let per_member = registration_cost(fee, count, team);
        let total = per_member * team as i64;
        let undivided = fee * count as i64;
        prop_assert!((total - undivided).abs() <= team as i64);
    }
}

// == Distance-Set Algebra ======================================================

fn distance_set_strategy() -> impl Strategy<Value = DistanceSet> {
    proptest::collection::btree_set(100u32..5000, 0..6)
        .prop_map(DistanceSet::from_distances)
}

proptest! {
    /// The remainder after subtracting covered distances is always disjoint
    /// from the covered set and a subset of the request.
    #[test]
    fn prop_difference_is_disjoint_remainder(
        request in distance_set_strategy(),
        covered in distance_set_strategy(),
    ) {
        let remaining = request.difference(&covered);
        prop_assert!(remaining.is_disjoint(&covered));
        prop_assert!(remaining.is_subset(&request));
    }

    /// Union covers both operands, and re-subtracting one of them leaves
    /// nothing of it behind.
    #[test]
    fn prop_union_covers_both_sides(
        a in distance_set_strategy(),
        b in distance_set_strategy(),
    ) {
        let u = a.union(&b);
        prop_assert!(a.is_subset(&u));
        prop_assert!(b.is_subset(&u));
        prop_assert!(a.difference(&u).is_empty());
    }

    /// A set survives the trip through its own canonical label.
    #[test]
    fn prop_label_parses_back(set in distance_set_strategy()) {
        if set.is_empty() {
            prop_assert!(DistanceSet::parse(&set.label()).is_none());
        } else {
            let parsed = DistanceSet::parse(&set.label()).unwrap();
            prop_assert_eq!(parsed, set);
        }
    }
}

// == Roster Admission Properties ===============================================

fn role_strategy() -> impl Strategy<Value = CrewRole> {
    prop_oneof![
        Just(CrewRole::Rower),
        Just(CrewRole::Coxswain),
        Just(CrewRole::Drummer),
        Just(CrewRole::Reserve),
    ]
}

fn sex_strategy() -> impl Strategy<Value = Sex> {
    prop_oneof![Just(Sex::Male), Just(Sex::Female)]
}

proptest! {
    /// No sequence of admission attempts ever pushes a dragon roster past
    /// its 14-slot ceiling, its per-role slot counts, or the one
    /// opposite-sex-rower allowance.
    #[test]
    fn prop_dragon_roster_invariants_hold_under_any_sequence(
        attempts in proptest::collection::vec((role_strategy(), sex_strategy()), 0..40),
        crew_sex in sex_strategy(),
    ) {
        let class = BoatClass::new("D-10");
        let mut roster = TeamRoster::new(1, class.clone(), crew_sex, Vec::new());
        for (i, (role, sex)) in attempts.into_iter().enumerate() {
            let _ = roster.add_member(RosterMember {
                registration_id: i as i64,
                participant_id: i as i64,
                role,
                sex,
            });
        }

        prop_assert!(roster.occupancy() <= class.total_capacity());
        for slot in class.role_layout() {
            let count = roster
                .members()
                .iter()
                .filter(|m| m.role == slot.role)
                .count() as u32;
            prop_assert!(count <= slot.count);
        }
        let opposite_rowers = roster
            .members()
            .iter()
            .filter(|m| m.role.is_rower_seat() && m.sex != crew_sex)
            .count();
        prop_assert!(opposite_rowers <= 1);
    }

    /// Generic crews never exceed the capacity parsed from the class id.
    #[test]
    fn prop_generic_roster_capacity_bound(
        capacity in 2u32..9,
        attempts in 0usize..20,
    ) {
        let class = BoatClass::new(format!("K-{capacity}"));
        let mut roster = TeamRoster::new(1, class, Sex::Male, Vec::new());
        for i in 0..attempts {
            let _ = roster.add_member(RosterMember {
                registration_id: i as i64,
                participant_id: i as i64,
                role: CrewRole::Member,
                sex: Sex::Male,
            });
        }
        prop_assert!(roster.occupancy() <= capacity);
        prop_assert_eq!(roster.occupancy(), attempts.min(capacity as usize) as u32);
    }
}

// == Date Parsing Properties ===================================================

const MONTHS: [&str; 12] = [
    "января", "февраля", "марта", "апреля", "мая", "июня", "июля",
    "августа", "сентября", "октября", "ноября", "декабря",
];

proptest! {
    /// Any well-formed single Russian date parses to the matching day, and
    /// the derived instants keep their fixed ordering.
    #[test]
    fn prop_single_date_roundtrip_and_instant_order(
        day in 1u32..=28,
        month in 0usize..12,
        year in 2020i32..2035,
    ) {
        use chrono::Datelike;
        let text = format!("{day} {} {year}", MONTHS[month]);
        let window = RussianDateParser.parse(&text).unwrap();
        prop_assert_eq!(window.start, window.end);
        prop_assert_eq!(window.start.day(), day);
        prop_assert_eq!(window.start.month(), month as u32 + 1);
        prop_assert_eq!(window.start.year(), year);

        prop_assert!(window.registration_closes_at() < window.starts_at());
        prop_assert!(window.results_at() < window.no_show_cutoff());
        prop_assert!(window.results_at() < window.finished_at());
    }

    /// A same-month range always spans start <= end with both days intact.
    #[test]
    fn prop_same_month_range_parses(
        start_day in 1u32..=26,
        span in 1u32..=2,
        month in 0usize..12,
        year in 2020i32..2035,
    ) {
        use chrono::Datelike;
        let end_day = start_day + span;
        let text = format!("{start_day} - {end_day} {} {year}", MONTHS[month]);
        let window = RussianDateParser.parse(&text).unwrap();
        prop_assert!(window.start < window.end);
        prop_assert_eq!(window.start.day(), start_day);
        prop_assert_eq!(window.end.day(), end_day);
    }
}
