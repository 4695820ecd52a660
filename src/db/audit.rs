//! Audit log operations.
//!
//! Append-only records of lifecycle transitions and capacity/role
//! rejections. Writes are best effort and never join the core transaction;
//! the audit module logs and swallows failures.

use super::{AuditRow, Database};
use anyhow::Result;

const AUDIT_COLUMNS: &str =
    "id, kind, severity, event_id, registration_id, description, created_at";

impl Database {
    /// Append one audit record.
    pub async fn insert_audit(
        &self,
        kind: &str,
        severity: &str,
        event_id: Option<i64>,
        registration_id: Option<i64>,
        description: &str,
    ) -> Result<AuditRow> {
        let row = sqlx::query_as::<_, AuditRow>(&format!(
            "INSERT INTO audit_log (kind, severity, event_id, registration_id, description)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {AUDIT_COLUMNS}"
        ))
        .bind(kind)
        .bind(severity)
        .bind(event_id)
        .bind(registration_id)
        .bind(description)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    /// Most recent audit records, newest first.
    pub async fn recent_audit(&self, limit: i64) -> Result<Vec<AuditRow>> {
        let rows = sqlx::query_as::<_, AuditRow>(&format!(
            "SELECT {AUDIT_COLUMNS} FROM audit_log ORDER BY id DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Audit records for one event, oldest first.
    pub async fn event_audit(&self, event_id: i64) -> Result<Vec<AuditRow>> {
        let rows = sqlx::query_as::<_, AuditRow>(&format!(
            "SELECT {AUDIT_COLUMNS} FROM audit_log WHERE event_id = $1 ORDER BY id"
        ))
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
