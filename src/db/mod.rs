//! # Database — PostgreSQL Storage Layer
//!
//! Async database operations for events, participants, teams, registrations,
//! and the audit log via `sqlx::PgPool`.
//!
//! ## Schema
//!
//! - `events`: title, free-text date range, class/distance specification
//!   (JSONB), base fee, lifecycle status
//! - `participants`: identity, sex, elevated registration capability
//! - `teams`: crew bucket per (event, class, sex, distance set, age group)
//!   with cached occupancy
//! - `registrations`: one participant's entry into one event
//! - `audit_log`: append-only lifecycle and rejection records
//!
//! ## Module Structure
//!
//! Operations are split into submodules by domain:
//!
//! - [`events`] — event lookup, guarded status transitions, cascade delete
//! - [`participants`] — participant lookup and creation
//! - [`teams`] — team buckets, row locking, occupancy updates
//! - [`registrations`] — registration CRUD, cost writes, no-show sweep
//! - [`audit`] — append-only audit records
//!
//! ## Transactions
//!
//! Mutations that touch a team run inside one transaction with the team row
//! locked `FOR UPDATE`, so two concurrent registrants can never both observe
//! a non-full roster. Methods that must participate in a caller-owned
//! transaction take `&mut PgConnection` instead of the pool.

mod audit;
mod events;
mod participants;
mod registrations;
mod teams;

use crate::domain::{CrewRole, EventStatus, RegistrationStatus, Sex};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use std::collections::BTreeMap;

// ── Event types ─────────────────────────────────────────────────

/// Per-class registration rules declared by the organizer: which sexes and
/// distances are open, and the age-group labels on offer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassRules {
    #[serde(default)]
    pub sexes: Vec<String>,
    #[serde(default)]
    pub distances: Vec<u32>,
    #[serde(default)]
    pub age_groups: Vec<String>,
}

/// The event's `class_distance` specification: boat class identifier →
/// rules. Stored as JSONB on the event row.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassDistanceSpec(pub BTreeMap<String, ClassRules>);

impl ClassRules {
    /// Sex entries may arrive raw ("М", "Ж") or normalized ("M", "W").
    pub fn allows_sex(&self, sex: Sex) -> bool {
        self.sexes.iter().any(|s| Sex::parse(s) == Some(sex))
    }

    pub fn allows_distance(&self, distance: u32) -> bool {
        self.distances.contains(&distance)
    }
}

impl ClassDistanceSpec {
    pub fn rules_for(&self, class_id: &str) -> Option<&ClassRules> {
        self.0.get(class_id)
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct EventRow {
    pub id: i64,
    pub title: String,
    pub date_text: String,
    pub class_distance: sqlx::types::Json<ClassDistanceSpec>,
    pub base_fee_minor: i64,
    pub status: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl EventRow {
    pub fn status(&self) -> Option<EventStatus> {
        EventStatus::from_db_str(&self.status)
    }
}

// ── Participant types ───────────────────────────────────────────

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ParticipantRow {
    pub id: i64,
    pub external_id: uuid::Uuid,
    pub full_name: String,
    pub sex: String,
    pub can_register_others: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl ParticipantRow {
    pub fn sex(&self) -> Option<Sex> {
        Sex::from_db_str(&self.sex)
    }
}

// ── Team types ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TeamRow {
    pub id: i64,
    pub event_id: i64,
    pub name: String,
    pub city: String,
    pub boat_class: String,
    pub sex: String,
    pub distance_label: String,
    pub age_group: String,
    pub persons_amount: i32,
    pub capacity: i32,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl TeamRow {
    pub fn sex(&self) -> Option<Sex> {
        Sex::from_db_str(&self.sex)
    }
}

/// A team member as needed by the roster aggregate: the registration's crew
/// role joined with the participant's own sex (the discipline sex lives on
/// the team row; the dragon composition rule needs the person's).
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TeamMemberRow {
    pub registration_id: i64,
    pub participant_id: i64,
    pub crew_role: String,
    pub participant_sex: String,
}

// ── Registration types ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct RegistrationRow {
    pub id: i64,
    pub event_id: i64,
    pub participant_id: i64,
    pub team_id: Option<i64>,
    pub boat_class: String,
    pub sex: String,
    pub distances: String,
    pub crew_role: String,
    pub status: String,
    pub paid: bool,
    pub cost_minor: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl RegistrationRow {
    pub fn status(&self) -> Option<RegistrationStatus> {
        RegistrationStatus::from_db_str(&self.status)
    }

    pub fn crew_role(&self) -> Option<CrewRole> {
        CrewRole::from_db_str(&self.crew_role)
    }

    pub fn sex(&self) -> Option<Sex> {
        Sex::from_db_str(&self.sex)
    }

    pub fn distance_set(&self) -> Option<crate::domain::DistanceSet> {
        crate::domain::DistanceSet::parse(&self.distances)
    }
}

/// Insert payload for a new registration. The cost column starts at zero;
/// the cost allocator writes it before the transaction commits.
#[derive(Debug, Clone)]
pub struct NewRegistration {
    pub event_id: i64,
    pub participant_id: i64,
    pub team_id: Option<i64>,
    pub boat_class: String,
    pub sex: Sex,
    pub distances: String,
    pub crew_role: CrewRole,
    pub status: RegistrationStatus,
}

// ── Audit types ─────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct AuditRow {
    pub id: i64,
    pub kind: String,
    pub severity: String,
    pub event_id: Option<i64>,
    pub registration_id: Option<i64>,
    pub description: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

// ── Database struct and connection ──────────────────────────────

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Connect to PostgreSQL using the provided database URL.
    ///
    /// Parses the URL manually so percent-encoded credentials (Cyrillic
    /// usernames, passwords with reserved characters) are decoded exactly
    /// once before reaching the connection options.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let url = url::Url::parse(database_url)?;
        let username = urlencoding::decode(url.username())?.into_owned();
        let password = url
            .password()
            .map(|p| urlencoding::decode(p).map(|s| s.into_owned()))
            .transpose()?;
        let mut opts = PgConnectOptions::new()
            .host(url.host_str().unwrap_or("localhost"))
            .port(url.port().unwrap_or(5432))
            .database(url.path().trim_start_matches('/'))
            .username(&username)
            .statement_cache_capacity(0);
        if let Some(ref pw) = password {
            opts = opts.password(pw);
        }
        let pool = PgPoolOptions::new()
            .max_connections(4)
            .connect_with(opts)
            .await?;
        Ok(Database { pool })
    }

    /// Get a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Health check: execute `SELECT 1` to verify database connectivity.
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(())
    }
}

// ── Tests ───────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_rules_allow_raw_and_normalized_sexes() {
        let rules = ClassRules {
            sexes: vec!["М".to_string(), "W".to_string()],
            distances: vec![200, 500],
            age_groups: vec!["open".to_string()],
        };
        assert!(rules.allows_sex(Sex::Male));
        assert!(rules.allows_sex(Sex::Female));
        assert!(!rules.allows_sex(Sex::Mixed));
    }

    #[test]
    fn class_rules_distance_whitelist() {
        let rules = ClassRules {
            distances: vec![200, 500],
            ..Default::default()
        };
        assert!(rules.allows_distance(200));
        assert!(!rules.allows_distance(1000));
    }

    #[test]
    fn class_distance_spec_json_roundtrip() {
        let json = r#"{"D-10":{"sexes":["M","W","MIX"],"distances":[200,500,2000],"age_groups":["open"]}}"#;
        let spec: ClassDistanceSpec = serde_json::from_str(json).unwrap();
        let rules = spec.rules_for("D-10").unwrap();
        assert_eq!(rules.distances, vec![200, 500, 2000]);
        assert!(spec.rules_for("K-1").is_none());
        let back = serde_json::to_string(&spec).unwrap();
        let again: ClassDistanceSpec = serde_json::from_str(&back).unwrap();
        assert!(again.rules_for("D-10").is_some());
    }

    #[test]
    fn event_row_status_parses_known_values() {
        let row = EventRow {
            id: 1,
            title: "Кубок города".to_string(),
            date_text: "10 августа 2025".to_string(),
            class_distance: sqlx::types::Json(ClassDistanceSpec::default()),
            base_fee_minor: 100_000,
            status: "registration".to_string(),
            created_at: chrono::Utc::now(),
        };
        assert_eq!(row.status(), Some(EventStatus::Registration));
    }
}
