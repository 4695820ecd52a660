//! # Ledger — Transactional Team Service
//!
//! Owns team records and their rosters. Every mutation loads the team row
//! `FOR UPDATE`, rebuilds the [`TeamRoster`] aggregate from current
//! registrations, applies the pure admission rules, and persists occupancy
//! and recomputed costs before the transaction commits — never through
//! scattered independent UPDATEs.

use crate::audit::{self, AuditRecord};
use crate::catalog::BoatClass;
use crate::cost;
use crate::db::{Database, NewRegistration, RegistrationRow, TeamMemberRow, TeamRow};
use crate::domain::{CrewRole, Sex};
use crate::roster::{MissingSlot, RosterError, RosterMember, TeamRoster};
use anyhow::{anyhow, Result};
use sqlx::PgConnection;
use thiserror::Error;

/// Ledger failures: a pure admission rejection or a storage problem.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error(transparent)]
    Roster(#[from] RosterError),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Caller-supplied team context for a crewed registration.
#[derive(Debug, Clone, Default)]
pub struct TeamHint {
    pub name: Option<String>,
    pub city: Option<String>,
    pub age_group: Option<String>,
    pub role: Option<CrewRole>,
    /// When set, one team absorbs all distances of its bucket: an existing
    /// matching team is reused instead of creating a new one per entry.
    pub absorb_distances: bool,
}

/// Resolve the team for a crewed registration inside the caller's
/// transaction.
///
/// In absorb mode an existing `{event, class, name, city, sex, distance
/// label}` match is reused (and comes back locked); otherwise a fresh team
/// is created. Missing name/city fall back to deterministic placeholders,
/// which for dragon crews are the mandated business defaults.
pub async fn find_or_create_team(
    db: &Database,
    conn: &mut PgConnection,
    event_id: i64,
    class: &BoatClass,
    sex: Sex,
    distance_label: &str,
    hint: &TeamHint,
) -> Result<TeamRow> {
    let name = hint
        .name
        .as_deref()
        .filter(|n| !n.trim().is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| class.placeholder_team_name());
    let city = hint
        .city
        .as_deref()
        .filter(|c| !c.trim().is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| BoatClass::placeholder_city().to_string());
    let age_group = hint.age_group.clone().unwrap_or_default();

    if hint.absorb_distances {
        // A row lock cannot cover a bucket with no team row yet; the
        // advisory lock keeps two first registrants from both inserting.
        db.lock_team_bucket(conn, event_id, class.id(), &name, &city, sex, distance_label)
            .await?;
        if let Some(team) = db
            .find_team_bucket(conn, event_id, class.id(), &name, &city, sex, distance_label)
            .await?
        {
            return Ok(team);
        }
    }
    db.insert_team(
        conn,
        event_id,
        &name,
        &city,
        class.id(),
        sex,
        distance_label,
        &age_group,
        class.total_capacity(),
    )
    .await
}

/// Build the roster aggregate from a locked team row and its member rows.
fn build_roster(team: &TeamRow, members: Vec<TeamMemberRow>) -> Result<TeamRoster> {
    let class = BoatClass::new(&team.boat_class);
    let sex = team
        .sex()
        .ok_or_else(|| anyhow!("team {} has unknown sex {:?}", team.id, team.sex))?;
    let members = members
        .into_iter()
        .map(|m| {
            Ok(RosterMember {
                registration_id: m.registration_id,
                participant_id: m.participant_id,
                role: CrewRole::from_db_str(&m.crew_role)
                    .ok_or_else(|| anyhow!("unknown crew role {:?}", m.crew_role))?,
                sex: Sex::from_db_str(&m.participant_sex)
                    .ok_or_else(|| anyhow!("unknown participant sex {:?}", m.participant_sex))?,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(TeamRoster::new(team.id, class, sex, members))
}

/// Admit a participant to a locked team: validate against the roster rules,
/// insert the registration, persist the new occupancy, and recompute every
/// member's cost — all on the caller's transaction.
///
/// On a rule rejection an audit record is emitted (best effort, outside the
/// transaction) and no row is touched.
pub async fn admit_member(
    db: &Database,
    conn: &mut PgConnection,
    team: &TeamRow,
    participant_sex: Sex,
    role: CrewRole,
    base_fee_minor: i64,
    new_registration: &NewRegistration,
) -> Result<RegistrationRow, LedgerError> {
    let members = db.team_member_rows(conn, team.id).await?;
    let mut roster = build_roster(team, members)?;

    if let Err(rejection) = roster.can_admit(role, participant_sex) {
        audit::emit(
            db,
            AuditRecord::roster_rejected(team.event_id, team.id, &rejection.to_string()),
        )
        .await;
        return Err(rejection.into());
    }

    let registration = db.insert_registration(conn, new_registration).await?;
    roster
        .add_member(RosterMember {
            registration_id: registration.id,
            participant_id: registration.participant_id,
            role,
            sex: participant_sex,
        })
        .map_err(LedgerError::Roster)?;

    let occupancy = roster.occupancy();
    db.update_team_occupancy(conn, team.id, occupancy).await?;
    let class = BoatClass::new(&team.boat_class);
    cost::recompute_team(db, conn, team.id, base_fee_minor, &class, occupancy).await?;
    Ok(registration)
}

/// Remove a member registration from its team (or delete a solo
/// registration outright). Own transaction: lock, delete, re-derive
/// occupancy, garbage-collect the team when it empties, recompute remaining
/// costs.
pub async fn remove_member(db: &Database, registration_id: i64) -> Result<bool> {
    let Some(registration) = db.get_registration(registration_id).await? else {
        return Ok(false);
    };

    let mut tx = db.pool().begin().await?;
    match registration.team_id {
        None => {
            db.delete_registration(&mut tx, registration_id).await?;
        }
        Some(team_id) => {
            let team = db
                .lock_team(&mut tx, team_id)
                .await?
                .ok_or_else(|| anyhow!("team {} vanished under registration", team_id))?;
            db.delete_registration(&mut tx, registration_id).await?;
            let remaining = db.team_member_rows(&mut tx, team_id).await?;
            if remaining.is_empty() {
                db.delete_team(&mut tx, team_id).await?;
            } else {
                let occupancy = remaining.len() as u32;
                db.update_team_occupancy(&mut tx, team_id, occupancy).await?;
                let event = db
                    .get_event(team.event_id)
                    .await?
                    .ok_or_else(|| anyhow!("event {} not found", team.event_id))?;
                let class = BoatClass::new(&team.boat_class);
                cost::recompute_team(
                    db,
                    &mut tx,
                    team_id,
                    event.base_fee_minor,
                    &class,
                    occupancy,
                )
                .await?;
            }
        }
    }
    tx.commit().await?;

    audit::emit(
        db,
        AuditRecord::registration_cancelled(registration.event_id, registration_id),
    )
    .await;
    Ok(true)
}

/// Read-only completeness report for a team.
pub async fn roster_completeness(db: &Database, team_id: i64) -> Result<Vec<MissingSlot>> {
    let team = db
        .get_team(team_id)
        .await?
        .ok_or_else(|| anyhow!("team {} not found", team_id))?;
    let mut conn = db.pool().acquire().await?;
    let members = db.team_member_rows(&mut conn, team_id).await?;
    Ok(build_roster(&team, members)?.completeness())
}

/// Force a cost reallocation for a team from its current occupancy.
pub async fn recompute_team_costs(db: &Database, team_id: i64) -> Result<()> {
    let mut tx = db.pool().begin().await?;
    let team = db
        .lock_team(&mut tx, team_id)
        .await?
        .ok_or_else(|| anyhow!("team {} not found", team_id))?;
    let event = db
        .get_event(team.event_id)
        .await?
        .ok_or_else(|| anyhow!("event {} not found", team.event_id))?;
    let class = BoatClass::new(&team.boat_class);
    cost::recompute_team(
        db,
        &mut tx,
        team_id,
        event.base_fee_minor,
        &class,
        team.persons_amount.max(0) as u32,
    )
    .await?;
    tx.commit().await?;
    Ok(())
}
