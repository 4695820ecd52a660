//! Registration operations.
//!
//! Registrations reference an event, a participant, and (for crewed classes)
//! a team. The `cost_minor` column is written only by the cost allocator;
//! the no-show sweep is a single guarded UPDATE so re-running it is a no-op.

use super::{Database, NewRegistration, RegistrationRow};
use crate::domain::Sex;
use anyhow::Result;
use sqlx::PgConnection;

const REGISTRATION_COLUMNS: &str = "id, event_id, participant_id, team_id, boat_class, sex, \
                                    distances, crew_role, status, paid, cost_minor, created_at";

impl Database {
    /// Get a registration by ID.
    pub async fn get_registration(&self, registration_id: i64) -> Result<Option<RegistrationRow>> {
        let row = sqlx::query_as::<_, RegistrationRow>(&format!(
            "SELECT {REGISTRATION_COLUMNS} FROM registrations WHERE id = $1"
        ))
        .bind(registration_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Insert a new registration inside the caller's transaction.
    pub async fn insert_registration(
        &self,
        conn: &mut PgConnection,
        new: &NewRegistration,
    ) -> Result<RegistrationRow> {
        let row = sqlx::query_as::<_, RegistrationRow>(&format!(
            "INSERT INTO registrations (event_id, participant_id, team_id, boat_class, sex,
                                        distances, crew_role, status, paid, cost_minor)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, FALSE, 0)
             RETURNING {REGISTRATION_COLUMNS}"
        ))
        .bind(new.event_id)
        .bind(new.participant_id)
        .bind(new.team_id)
        .bind(&new.boat_class)
        .bind(new.sex.as_db_str())
        .bind(&new.distances)
        .bind(new.crew_role.as_db_str())
        .bind(new.status.as_db_str())
        .fetch_one(&mut *conn)
        .await?;
        Ok(row)
    }

    /// All registrations of one team, inside the caller's transaction (used
    /// by roster loading and cost fan-out while the team row is locked).
    pub async fn registrations_for_team(
        &self,
        conn: &mut PgConnection,
        team_id: i64,
    ) -> Result<Vec<RegistrationRow>> {
        let rows = sqlx::query_as::<_, RegistrationRow>(&format!(
            "SELECT {REGISTRATION_COLUMNS} FROM registrations WHERE team_id = $1 ORDER BY id"
        ))
        .bind(team_id)
        .fetch_all(&mut *conn)
        .await?;
        Ok(rows)
    }

    /// Pool-level variant of [`Self::registrations_for_team`] for read-only
    /// callers.
    pub async fn get_team_registrations(&self, team_id: i64) -> Result<Vec<RegistrationRow>> {
        let rows = sqlx::query_as::<_, RegistrationRow>(&format!(
            "SELECT {REGISTRATION_COLUMNS} FROM registrations WHERE team_id = $1 ORDER BY id"
        ))
        .bind(team_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// A participant's registrations for one (event, class, sex) discipline
    /// bucket; the engine checks these for already-covered distances.
    pub async fn participant_discipline_registrations(
        &self,
        conn: &mut PgConnection,
        event_id: i64,
        participant_id: i64,
        boat_class: &str,
        sex: Sex,
    ) -> Result<Vec<RegistrationRow>> {
        let rows = sqlx::query_as::<_, RegistrationRow>(&format!(
            "SELECT {REGISTRATION_COLUMNS} FROM registrations
             WHERE event_id = $1 AND participant_id = $2 AND boat_class = $3 AND sex = $4
             ORDER BY id"
        ))
        .bind(event_id)
        .bind(participant_id)
        .bind(boat_class)
        .bind(sex.as_db_str())
        .fetch_all(&mut *conn)
        .await?;
        Ok(rows)
    }

    /// All registrations of one participant in one event.
    pub async fn get_participant_registrations(
        &self,
        event_id: i64,
        participant_id: i64,
    ) -> Result<Vec<RegistrationRow>> {
        let rows = sqlx::query_as::<_, RegistrationRow>(&format!(
            "SELECT {REGISTRATION_COLUMNS} FROM registrations
             WHERE event_id = $1 AND participant_id = $2 ORDER BY id"
        ))
        .bind(event_id)
        .bind(participant_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Write the recomputed cost. Only the cost allocator calls this.
    pub async fn update_registration_cost(
        &self,
        conn: &mut PgConnection,
        registration_id: i64,
        cost_minor: i64,
    ) -> Result<()> {
        sqlx::query("UPDATE registrations SET cost_minor = $1 WHERE id = $2")
            .bind(cost_minor)
            .bind(registration_id)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    /// Delete a registration inside the caller's transaction.
    pub async fn delete_registration(
        &self,
        conn: &mut PgConnection,
        registration_id: i64,
    ) -> Result<()> {
        sqlx::query("DELETE FROM registrations WHERE id = $1")
            .bind(registration_id)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    /// Flip every still-waiting registration of an event to `no_show`.
    /// Returns the number of rows flipped; idempotent by construction.
    pub async fn mark_no_shows(&self, event_id: i64) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE registrations SET status = 'no_show'
             WHERE event_id = $1 AND status IN ('queued', 'awaiting_team')",
        )
        .bind(event_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
