//! # Registration — Entry Engine
//!
//! Creates or rejects a participant's entry into an event. Solo classes get
//! a direct registration; crewed classes resolve a team through the ledger
//! and admit the participant under the crew-composition rules. Distances the
//! participant already holds for the same (event, class, sex) are silently
//! dropped — registering the same selection twice is a success no-op, so
//! client retries stay idempotent.

use crate::catalog::BoatClass;
use crate::cost;
use crate::db::{Database, NewRegistration, RegistrationRow};
use crate::domain::{CrewRole, DistanceSet, RegistrationStatus, Sex};
use crate::ledger::{self, LedgerError, TeamHint};
use crate::roster::RosterError;
use anyhow::Result;
use thiserror::Error;
use tracing::error;

/// Caller-facing error taxonomy. Validation and state-conflict rejections
/// carry a specific kind; persistence failures surface as `Unavailable`
/// after rollback, never as a partial commit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    #[error("event not found")]
    EventNotFound,
    #[error("registration for this event is closed")]
    RegistrationClosed,
    #[error("boat class is not offered at this event")]
    ClassUnavailable,
    #[error("distance is not offered for this class")]
    DistanceUnavailable,
    #[error("sex bucket is not offered for this class")]
    SexUnavailable,
    #[error("not allowed to register other participants")]
    Forbidden,
    #[error("team is full")]
    CapacityExceeded,
    #[error("no free slot for the requested crew role")]
    RoleUnavailable,
    #[error("participant could not be resolved")]
    ParticipantUnresolvable,
    #[error("system unavailable, try again later")]
    Unavailable,
}

/// Who is making the call. A caller registering someone other than
/// themselves must hold the elevated capability.
#[derive(Debug, Clone, Copy)]
pub struct Actor {
    pub participant_id: i64,
    pub can_register_others: bool,
}

/// The participant being registered: the caller themselves by id, or (in
/// the organizer crew-entry mode) a person by name, with the sex to use if
/// the person has to be created.
#[derive(Debug, Clone)]
pub enum ParticipantRef {
    Id(i64),
    Name { full_name: String, sex: Option<Sex> },
}

#[derive(Debug, Clone)]
pub struct RegistrationRequest {
    pub event_id: i64,
    pub participant: ParticipantRef,
    pub class: BoatClass,
    pub sex: Sex,
    pub distances: DistanceSet,
    pub team: TeamHint,
}

/// Successful engine result. `AlreadyRegistered` is the documented
/// idempotent-duplicate outcome: every requested distance was already
/// covered, nothing was written.
#[derive(Debug, Clone)]
pub enum RegistrationOutcome {
    Created(RegistrationRow),
    AlreadyRegistered,
}

/// Authorization gate, evaluated before any lookup that could leak other
/// participants' data.
fn authorize(actor: &Actor, participant: &ParticipantRef) -> Result<(), RegistrationError> {
    let registering_self = matches!(participant, ParticipantRef::Id(id) if *id == actor.participant_id);
    if registering_self || actor.can_register_others {
        Ok(())
    } else {
        Err(RegistrationError::Forbidden)
    }
}

/// Validate the discipline selection against the event's declared
/// class/distance specification.
fn validate_selection(
    spec: &crate::db::ClassDistanceSpec,
    class: &BoatClass,
    sex: Sex,
    distances: &DistanceSet,
) -> Result<(), RegistrationError> {
    let rules = spec
        .rules_for(class.id())
        .ok_or(RegistrationError::ClassUnavailable)?;
    if !rules.allows_sex(sex) {
        return Err(RegistrationError::SexUnavailable);
    }
    for distance in distances.iter() {
        if !rules.allows_distance(distance) {
            return Err(RegistrationError::DistanceUnavailable);
        }
    }
    Ok(())
}

fn unavailable(err: anyhow::Error) -> RegistrationError {
    error!("registration storage failure: {err:#}");
    RegistrationError::Unavailable
}

/// Register a participant for an event.
///
/// Rejections leave no side effects; on success the registration and its
/// cost (and, for crews, the whole team's costs and occupancy) are committed
/// atomically.
pub async fn register(
    db: &Database,
    actor: &Actor,
    request: &RegistrationRequest,
) -> Result<RegistrationOutcome, RegistrationError> {
    authorize(actor, &request.participant)?;

    let event = db
        .get_event(request.event_id)
        .await
        .map_err(unavailable)?
        .ok_or(RegistrationError::EventNotFound)?;
    if event.status() != Some(crate::domain::EventStatus::Registration) {
        return Err(RegistrationError::RegistrationClosed);
    }
    validate_selection(&event.class_distance, &request.class, request.sex, &request.distances)?;

    let participant = resolve_participant(db, actor, &request.participant).await?;
    let participant_sex = participant.sex().unwrap_or(request.sex);

    let mut tx = db.pool().begin().await.map_err(|e| unavailable(e.into()))?;

    // Distances already covered by this participant's registrations for the
    // same (event, class, sex) are satisfied; only the remainder is new.
    let existing = db
        .participant_discipline_registrations(
            &mut tx,
            event.id,
            participant.id,
            request.class.id(),
            request.sex,
        )
        .await
        .map_err(unavailable)?;
    let mut covered = DistanceSet::default();
    for registration in &existing {
        if let Some(set) = registration.distance_set() {
            covered = covered.union(&set);
        }
    }
    let remaining = request.distances.difference(&covered);
    if remaining.is_empty() {
        return Ok(RegistrationOutcome::AlreadyRegistered);
    }

    let outcome = if !request.class.is_crewed() {
        let new = NewRegistration {
            event_id: event.id,
            participant_id: participant.id,
            team_id: None,
            boat_class: request.class.id().to_string(),
            sex: request.sex,
            distances: remaining.label(),
            crew_role: CrewRole::Participant,
            status: RegistrationStatus::Queued,
        };
        let registration = db
            .insert_registration(&mut tx, &new)
            .await
            .map_err(unavailable)?;
        cost::write_registration_cost(db, &mut tx, &registration, event.base_fee_minor, 1)
            .await
            .map_err(unavailable)?;
        registration
    } else {
        let team = ledger::find_or_create_team(
            db,
            &mut tx,
            event.id,
            &request.class,
            request.sex,
            &remaining.label(),
            &request.team,
        )
        .await
        .map_err(unavailable)?;
        let role = request.team.role.unwrap_or_else(|| request.class.default_role());
        let new = NewRegistration {
            event_id: event.id,
            participant_id: participant.id,
            team_id: Some(team.id),
            boat_class: request.class.id().to_string(),
            sex: request.sex,
            distances: remaining.label(),
            crew_role: role,
            status: RegistrationStatus::Queued,
        };
        ledger::admit_member(
            db,
            &mut tx,
            &team,
            participant_sex,
            role,
            event.base_fee_minor,
            &new,
        )
        .await
        .map_err(|err| match err {
            LedgerError::Roster(RosterError::CapacityExceeded { .. }) => {
                RegistrationError::CapacityExceeded
            }
            LedgerError::Roster(RosterError::RoleUnavailable { .. }) => {
                RegistrationError::RoleUnavailable
            }
            LedgerError::Storage(err) => unavailable(err),
        })?
    };

    tx.commit().await.map_err(|e| unavailable(e.into()))?;
    Ok(RegistrationOutcome::Created(outcome))
}

/// Cancel a registration: remove it and rebalance its team, if any.
pub async fn cancel(db: &Database, registration_id: i64) -> Result<bool, RegistrationError> {
    ledger::remove_member(db, registration_id)
        .await
        .map_err(unavailable)
}

async fn resolve_participant(
    db: &Database,
    actor: &Actor,
    participant: &ParticipantRef,
) -> Result<crate::db::ParticipantRow, RegistrationError> {
    match participant {
        ParticipantRef::Id(id) => db
            .get_participant(*id)
            .await
            .map_err(unavailable)?
            .ok_or(RegistrationError::ParticipantUnresolvable),
        ParticipantRef::Name { full_name, sex } => {
            if let Some(found) = db
                .find_participant_by_name(full_name)
                .await
                .map_err(unavailable)?
            {
                return Ok(found);
            }
            // Creating a new person on the fly is an organizer capability.
            if !actor.can_register_others {
                return Err(RegistrationError::ParticipantUnresolvable);
            }
            let Some(sex) = sex else {
                return Err(RegistrationError::ParticipantUnresolvable);
            };
            db.insert_participant(full_name, *sex, false)
                .await
                .map_err(unavailable)
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{ClassDistanceSpec, ClassRules};

    fn actor(id: i64, elevated: bool) -> Actor {
        Actor {
            participant_id: id,
            can_register_others: elevated,
        }
    }

    fn spec_with(class: &str, sexes: &[&str], distances: &[u32]) -> ClassDistanceSpec {
        let mut spec = ClassDistanceSpec::default();
        spec.0.insert(
            class.to_string(),
            ClassRules {
                sexes: sexes.iter().map(|s| s.to_string()).collect(),
                distances: distances.to_vec(),
                age_groups: vec!["open".to_string()],
            },
        );
        spec
    }

    #[test]
    fn self_registration_needs_no_capability() {
        assert!(authorize(&actor(5, false), &ParticipantRef::Id(5)).is_ok());
    }

    #[test]
    fn registering_others_requires_capability() {
        assert_eq!(
            authorize(&actor(5, false), &ParticipantRef::Id(6)),
            Err(RegistrationError::Forbidden)
        );
        assert!(authorize(&actor(5, true), &ParticipantRef::Id(6)).is_ok());
    }

    #[test]
    fn name_mode_requires_capability() {
        let by_name = ParticipantRef::Name {
            full_name: "Иванов Иван".to_string(),
            sex: Some(Sex::Male),
        };
        assert_eq!(
            authorize(&actor(5, false), &by_name),
            Err(RegistrationError::Forbidden)
        );
        assert!(authorize(&actor(5, true), &by_name).is_ok());
    }

    #[test]
    fn selection_rejects_unknown_class() {
        let spec = spec_with("K-1", &["M", "W"], &[200, 500]);
        let distances = DistanceSet::from_distances([200]);
        assert_eq!(
            validate_selection(&spec, &BoatClass::new("D-10"), Sex::Male, &distances),
            Err(RegistrationError::ClassUnavailable)
        );
    }

    #[test]
    fn selection_rejects_closed_sex_bucket() {
        let spec = spec_with("K-1", &["M"], &[200]);
        let distances = DistanceSet::from_distances([200]);
        assert_eq!(
            validate_selection(&spec, &BoatClass::new("K-1"), Sex::Female, &distances),
            Err(RegistrationError::SexUnavailable)
        );
    }

    #[test]
    fn selection_rejects_unoffered_distance() {
        let spec = spec_with("K-1", &["M"], &[200, 500]);
        let distances = DistanceSet::from_distances([200, 1000]);
        assert_eq!(
            validate_selection(&spec, &BoatClass::new("K-1"), Sex::Male, &distances),
            Err(RegistrationError::DistanceUnavailable)
        );
    }

    #[test]
    fn selection_accepts_valid_request() {
        let spec = spec_with("D-10", &["М", "Ж", "MIX"], &[200, 500, 2000]);
        let distances = DistanceSet::from_distances([200, 2000]);
        assert!(
            validate_selection(&spec, &BoatClass::new("D-10"), Sex::Mixed, &distances).is_ok()
        );
    }
}
