//! Team operations.
//!
//! Teams are the crew buckets of an event, keyed by (event, class, name,
//! city, sex, distance-set label, age group). Roster mutation always locks
//! the team row `FOR UPDATE` first, so concurrent registrants targeting the
//! same bucket serialize on the row instead of both observing a non-full
//! roster. A row lock cannot cover a bucket that has no team row yet, so
//! find-or-create additionally takes a transaction-scoped advisory lock on
//! the bucket key before looking it up.

use super::{Database, TeamMemberRow, TeamRow};
use crate::domain::Sex;
use anyhow::Result;
use sqlx::PgConnection;

const TEAM_COLUMNS: &str = "id, event_id, name, city, boat_class, sex, distance_label, \
                            age_group, persons_amount, capacity, created_at";

impl Database {
    /// Get a team by ID (no lock).
    pub async fn get_team(&self, team_id: i64) -> Result<Option<TeamRow>> {
        let row = sqlx::query_as::<_, TeamRow>(&format!(
            "SELECT {TEAM_COLUMNS} FROM teams WHERE id = $1"
        ))
        .bind(team_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// List an event's teams.
    pub async fn list_teams_for_event(&self, event_id: i64) -> Result<Vec<TeamRow>> {
        let rows = sqlx::query_as::<_, TeamRow>(&format!(
            "SELECT {TEAM_COLUMNS} FROM teams WHERE event_id = $1 ORDER BY id"
        ))
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Lock a team row `FOR UPDATE` inside the caller's transaction.
    pub async fn lock_team(
        &self,
        conn: &mut PgConnection,
        team_id: i64,
    ) -> Result<Option<TeamRow>> {
        let row = sqlx::query_as::<_, TeamRow>(&format!(
            "SELECT {TEAM_COLUMNS} FROM teams WHERE id = $1 FOR UPDATE"
        ))
        .bind(team_id)
        .fetch_optional(&mut *conn)
        .await?;
        Ok(row)
    }

    /// Serialize find-or-create on one team bucket within the caller's
    /// transaction. Two concurrent first registrants of the same bucket
    /// would otherwise both see no row and both insert. The lock is
    /// released automatically at commit or rollback.
    #[allow(clippy::too_many_arguments)]
    pub async fn lock_team_bucket(
        &self,
        conn: &mut PgConnection,
        event_id: i64,
        boat_class: &str,
        name: &str,
        city: &str,
        sex: Sex,
        distance_label: &str,
    ) -> Result<()> {
        let key = format!(
            "teams:{}:{}:{}:{}:{}:{}",
            event_id,
            boat_class,
            name,
            city,
            sex.as_db_str(),
            distance_label
        );
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
            .bind(key)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    /// Find and lock an existing team bucket for the "single team absorbs
    /// all distances" registration mode. Callers must hold the bucket
    /// advisory lock first.
    #[allow(clippy::too_many_arguments)]
    pub async fn find_team_bucket(
        &self,
        conn: &mut PgConnection,
        event_id: i64,
        boat_class: &str,
        name: &str,
        city: &str,
        sex: Sex,
        distance_label: &str,
    ) -> Result<Option<TeamRow>> {
        let row = sqlx::query_as::<_, TeamRow>(&format!(
            "SELECT {TEAM_COLUMNS} FROM teams
             WHERE event_id = $1 AND boat_class = $2 AND name = $3
               AND city = $4 AND sex = $5 AND distance_label = $6
             ORDER BY id LIMIT 1
             FOR UPDATE"
        ))
        .bind(event_id)
        .bind(boat_class)
        .bind(name)
        .bind(city)
        .bind(sex.as_db_str())
        .bind(distance_label)
        .fetch_optional(&mut *conn)
        .await?;
        Ok(row)
    }

    /// Insert a new team with zero occupancy.
    #[allow(clippy::too_many_arguments)]
    pub async fn insert_team(
        &self,
        conn: &mut PgConnection,
        event_id: i64,
        name: &str,
        city: &str,
        boat_class: &str,
        sex: Sex,
        distance_label: &str,
        age_group: &str,
        capacity: u32,
    ) -> Result<TeamRow> {
        let row = sqlx::query_as::<_, TeamRow>(&format!(
            "INSERT INTO teams (event_id, name, city, boat_class, sex, distance_label,
                                age_group, persons_amount, capacity)
             VALUES ($1, $2, $3, $4, $5, $6, $7, 0, $8)
             RETURNING {TEAM_COLUMNS}"
        ))
        .bind(event_id)
        .bind(name)
        .bind(city)
        .bind(boat_class)
        .bind(sex.as_db_str())
        .bind(distance_label)
        .bind(age_group)
        .bind(capacity as i32)
        .fetch_one(&mut *conn)
        .await?;
        Ok(row)
    }

    /// Current members of a team with each participant's own sex, inside
    /// the caller's transaction.
    pub async fn team_member_rows(
        &self,
        conn: &mut PgConnection,
        team_id: i64,
    ) -> Result<Vec<TeamMemberRow>> {
        let rows = sqlx::query_as::<_, TeamMemberRow>(
            "SELECT r.id AS registration_id, r.participant_id, r.crew_role,
                    p.sex AS participant_sex
             FROM registrations r
             JOIN participants p ON p.id = r.participant_id
             WHERE r.team_id = $1
             ORDER BY r.id",
        )
        .bind(team_id)
        .fetch_all(&mut *conn)
        .await?;
        Ok(rows)
    }

    /// Persist the recomputed occupancy (`persons_amount`).
    pub async fn update_team_occupancy(
        &self,
        conn: &mut PgConnection,
        team_id: i64,
        persons_amount: u32,
    ) -> Result<()> {
        sqlx::query("UPDATE teams SET persons_amount = $1 WHERE id = $2")
            .bind(persons_amount as i32)
            .bind(team_id)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    /// Delete a team (only ever called when its last registration is gone).
    pub async fn delete_team(&self, conn: &mut PgConnection, team_id: i64) -> Result<()> {
        sqlx::query("DELETE FROM teams WHERE id = $1")
            .bind(team_id)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }
}
