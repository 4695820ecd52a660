//! Participant operations.
//!
//! Participants are identified internally by a BIGSERIAL key and externally
//! by a UUID. Name lookup supports the crewed-registration mode where an
//! organizer enters crew members by name.

use super::{Database, ParticipantRow};
use crate::domain::Sex;
use anyhow::Result;

const PARTICIPANT_COLUMNS: &str =
    "id, external_id, full_name, sex, can_register_others, created_at";

impl Database {
    /// Get a participant by internal ID.
    pub async fn get_participant(&self, participant_id: i64) -> Result<Option<ParticipantRow>> {
        let row = sqlx::query_as::<_, ParticipantRow>(&format!(
            "SELECT {PARTICIPANT_COLUMNS} FROM participants WHERE id = $1"
        ))
        .bind(participant_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Find a participant by exact full name. Names are not unique; the
    /// earliest match wins, mirroring the organizer-entry flow.
    pub async fn find_participant_by_name(
        &self,
        full_name: &str,
    ) -> Result<Option<ParticipantRow>> {
        let row = sqlx::query_as::<_, ParticipantRow>(&format!(
            "SELECT {PARTICIPANT_COLUMNS} FROM participants WHERE full_name = $1 ORDER BY id LIMIT 1"
        ))
        .bind(full_name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Create a participant.
    pub async fn insert_participant(
        &self,
        full_name: &str,
        sex: Sex,
        can_register_others: bool,
    ) -> Result<ParticipantRow> {
        let row = sqlx::query_as::<_, ParticipantRow>(&format!(
            "INSERT INTO participants (external_id, full_name, sex, can_register_others)
             VALUES ($1, $2, $3, $4)
             RETURNING {PARTICIPANT_COLUMNS}"
        ))
        .bind(uuid::Uuid::new_v4())
        .bind(full_name)
        .bind(sex.as_db_str())
        .bind(can_register_others)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }
}
