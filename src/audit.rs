//! # Audit — Append-Only Observability Records
//!
//! Every lifecycle transition and capacity/role rejection produces a
//! structured audit record {kind, event/registration id, timestamp,
//! description, severity}. Delivery is one-way and best effort: a failed
//! audit write is logged and swallowed, never allowed to fail or roll back
//! the core mutation it describes.

use crate::db::Database;
use crate::domain::EventStatus;
use tracing::warn;

/// Record severity, mirrored into the `severity` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
}

impl Severity {
    pub fn as_db_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
        }
    }
}

/// A structured audit record ready to append.
#[derive(Debug, Clone)]
pub struct AuditRecord {
    pub kind: &'static str,
    pub severity: Severity,
    pub event_id: Option<i64>,
    pub registration_id: Option<i64>,
    pub description: String,
}

impl AuditRecord {
    /// An event advanced one step along the lifecycle ladder.
    pub fn status_advanced(event_id: i64, from: EventStatus, to: EventStatus) -> AuditRecord {
        AuditRecord {
            kind: "status_advanced",
            severity: Severity::Info,
            event_id: Some(event_id),
            registration_id: None,
            description: format!("event status {} -> {}", from, to),
        }
    }

    /// The no-show sweep flipped waiting registrations of an event.
    pub fn no_shows_marked(event_id: i64, count: u64) -> AuditRecord {
        AuditRecord {
            kind: "no_shows_marked",
            severity: Severity::Info,
            event_id: Some(event_id),
            registration_id: None,
            description: format!("{} registration(s) marked as no-show", count),
        }
    }

    /// A roster mutation was rejected (capacity or role slot).
    pub fn roster_rejected(event_id: i64, team_id: i64, reason: &str) -> AuditRecord {
        AuditRecord {
            kind: "roster_rejected",
            severity: Severity::Warning,
            event_id: Some(event_id),
            registration_id: None,
            description: format!("team {}: {}", team_id, reason),
        }
    }

    /// A registration was cancelled and removed.
    pub fn registration_cancelled(event_id: i64, registration_id: i64) -> AuditRecord {
        AuditRecord {
            kind: "registration_cancelled",
            severity: Severity::Info,
            event_id: Some(event_id),
            registration_id: Some(registration_id),
            description: "registration cancelled".to_string(),
        }
    }
}

/// Append an audit record, best effort. Failures are logged and swallowed.
pub async fn emit(db: &Database, record: AuditRecord) {
    if let Err(err) = db
        .insert_audit(
            record.kind,
            record.severity.as_db_str(),
            record.event_id,
            record.registration_id,
            &record.description,
        )
        .await
    {
        warn!(
            kind = record.kind,
            event_id = record.event_id,
            "audit write failed: {err:#}"
        );
    }
}

// ── Tests ───────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_advanced_describes_both_states() {
        let record = AuditRecord::status_advanced(
            7,
            EventStatus::Registration,
            EventStatus::RegistrationClosed,
        );
        assert_eq!(record.kind, "status_advanced");
        assert_eq!(record.event_id, Some(7));
        assert_eq!(record.severity, Severity::Info);
        assert!(record.description.contains("registration"));
        assert!(record.description.contains("registration_closed"));
    }

    #[test]
    fn roster_rejection_is_warning_severity() {
        let record = AuditRecord::roster_rejected(1, 42, "team is full (14 slots)");
        assert_eq!(record.severity, Severity::Warning);
        assert!(record.description.contains("42"));
        assert!(record.description.contains("full"));
    }

    #[test]
    fn no_show_record_carries_count() {
        let record = AuditRecord::no_shows_marked(3, 5);
        assert!(record.description.contains('5'));
        assert_eq!(record.event_id, Some(3));
    }
}
