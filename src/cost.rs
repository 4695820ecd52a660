//! # Cost — Fee Share Allocation
//!
//! Computes each registration's share of the event fee: base fee times the
//! number of registered distances, divided by the effective team size. The
//! dragon class always divides by its 10 competitive rower seats, no matter
//! how many people the roster holds; every other crewed class divides by
//! actual occupancy. Money is integer minor units (kopecks) rounded half up.
//!
//! This module is the sole writer of the `cost_minor` column. It runs inside
//! the same transaction as the roster mutation that triggered it, so cost
//! and occupancy can never be observed out of sync.

use crate::catalog::BoatClass;
use crate::db::Database;
use anyhow::{anyhow, Result};
use sqlx::PgConnection;

/// Integer division rounding half up. Non-negative operands only, which is
/// all a fee computation ever produces.
pub fn div_round_half_up(numerator: i64, denominator: i64) -> i64 {
    debug_assert!(numerator >= 0 && denominator > 0);
    (numerator + denominator / 2) / denominator
}

/// One registration's fee share in minor units.
pub fn registration_cost(base_fee_minor: i64, distance_count: u32, effective_team_size: u32) -> i64 {
    div_round_half_up(
        base_fee_minor * i64::from(distance_count),
        i64::from(effective_team_size.max(1)),
    )
}

/// Recompute and persist the cost of a single registration, standalone.
///
/// For solo registrations the divisor is 1. For team registrations the
/// divisor comes from the class's cost rule applied to current occupancy.
/// Returns the new cost in minor units.
pub async fn recompute(db: &Database, registration_id: i64) -> Result<i64> {
    let registration = db
        .get_registration(registration_id)
        .await?
        .ok_or_else(|| anyhow!("registration {} not found", registration_id))?;
    let event = db
        .get_event(registration.event_id)
        .await?
        .ok_or_else(|| anyhow!("event {} not found", registration.event_id))?;

    let class = BoatClass::new(&registration.boat_class);
    let occupancy = match registration.team_id {
        Some(team_id) => db
            .get_team(team_id)
            .await?
            .map(|t| t.persons_amount.max(0) as u32)
            .unwrap_or(1),
        None => 1,
    };
    let divisor = class.effective_team_size_for_cost(occupancy);
    let distance_count = registration
        .distance_set()
        .map(|s| s.len() as u32)
        .unwrap_or(1);

    let cost = registration_cost(event.base_fee_minor, distance_count, divisor);
    let mut conn = db.pool().acquire().await?;
    db.update_registration_cost(&mut conn, registration_id, cost)
        .await?;
    Ok(cost)
}

/// Write the cost of one registration inside the caller's transaction.
/// Used on the solo path, where the new row is not yet visible to the pool.
pub async fn write_registration_cost(
    db: &Database,
    conn: &mut PgConnection,
    registration: &crate::db::RegistrationRow,
    base_fee_minor: i64,
    effective_team_size: u32,
) -> Result<i64> {
    let distance_count = registration
        .distance_set()
        .map(|s| s.len() as u32)
        .unwrap_or(1);
    let cost = registration_cost(base_fee_minor, distance_count, effective_team_size);
    db.update_registration_cost(conn, registration.id, cost)
        .await?;
    Ok(cost)
}

/// Recompute every member registration of a team from its current occupancy.
/// Must be called after every roster mutation; the caller holds the team row
/// lock and passes its transaction connection.
pub async fn recompute_team(
    db: &Database,
    conn: &mut PgConnection,
    team_id: i64,
    base_fee_minor: i64,
    class: &BoatClass,
    occupancy: u32,
) -> Result<()> {
    let divisor = class.effective_team_size_for_cost(occupancy);
    let members = db.registrations_for_team(conn, team_id).await?;
    for member in members {
        let distance_count = member.distance_set().map(|s| s.len() as u32).unwrap_or(1);
        let cost = registration_cost(base_fee_minor, distance_count, divisor);
        db.update_registration_cost(conn, member.id, cost).await?;
    }
    Ok(())
}

// ── Tests ───────────────────────────────────────────────────────
