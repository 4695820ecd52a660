//! Event operations.
//!
//! Events are created by organizer tooling and mutated here only through the
//! guarded status transition used by the lifecycle scheduler. The guard
//! re-checks the current status inside the UPDATE itself, so re-running a
//! tick after a transition has already happened is a no-op.

use super::{ClassDistanceSpec, Database, EventRow};
use crate::domain::EventStatus;
use anyhow::Result;

const EVENT_COLUMNS: &str =
    "id, title, date_text, class_distance, base_fee_minor, status, created_at";

impl Database {
    /// Get a single event by ID.
    pub async fn get_event(&self, event_id: i64) -> Result<Option<EventRow>> {
        let row = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE id = $1"
        ))
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// List all events, oldest first. The lifecycle scheduler iterates this
    /// and skips events with nothing left to do.
    pub async fn list_events(&self) -> Result<Vec<EventRow>> {
        let rows = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// List events currently in the given lifecycle status.
    pub async fn list_events_with_status(&self, status: EventStatus) -> Result<Vec<EventRow>> {
        let rows = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE status = $1 ORDER BY id"
        ))
        .bind(status.as_db_str())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Create an event. Organizer workflow lives outside this core; this
    /// exists for administrative tooling and the integration-test harness.
    pub async fn insert_event(
        &self,
        title: &str,
        date_text: &str,
        class_distance: &ClassDistanceSpec,
        base_fee_minor: i64,
    ) -> Result<EventRow> {
        let row = sqlx::query_as::<_, EventRow>(&format!(
            "INSERT INTO events (title, date_text, class_distance, base_fee_minor, status)
             VALUES ($1, $2, $3, $4, 'registration')
             RETURNING {EVENT_COLUMNS}"
        ))
        .bind(title)
        .bind(date_text)
        .bind(sqlx::types::Json(class_distance))
        .bind(base_fee_minor)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    /// Advance an event's status, guarded by the expected current status.
    ///
    /// Returns `true` iff the row was updated. A `false` return means another
    /// run already applied the transition (or the event moved elsewhere), and
    /// the caller must treat the tick as a no-op for this event.
    pub async fn advance_event_status(
        &self,
        event_id: i64,
        from: EventStatus,
        to: EventStatus,
    ) -> Result<bool> {
        let result = sqlx::query("UPDATE events SET status = $1 WHERE id = $2 AND status = $3")
            .bind(to.as_db_str())
            .bind(event_id)
            .bind(from.as_db_str())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Administrative cascade delete: registrations first, then the event's
    /// teams (all empty by that point), then the event itself, atomically.
    pub async fn delete_event_cascade(&self, event_id: i64) -> Result<bool> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM registrations WHERE event_id = $1")
            .bind(event_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM teams WHERE event_id = $1")
            .bind(event_id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(event_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }
}
