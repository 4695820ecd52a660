//! # Lifecycle — Timed Event Status Scheduler
//!
//! One idempotent pass over all events, advancing each along the fixed
//! ladder `Registration → RegistrationClosed → Results → Finished` based on
//! wall-clock comparisons against the parsed event window, and flipping
//! still-waiting registrations to no-show once race day has passed.
//!
//! Every status write is guarded by the expected current status, so a crash
//! mid-run (or a concurrent run) is safe: re-running simply finds nothing
//! left to do. Per-event failures are logged and skipped; only a systemic
//! failure (events cannot be listed at all) aborts the run.

use crate::audit::{self, AuditRecord};
use crate::dates::{EventWindow, EventWindowParser};
use crate::db::{Database, EventRow};
use crate::domain::EventStatus;
use anyhow::{anyhow, Context, Result};
use chrono::NaiveDateTime;
use tracing::{error, info};

/// Outcome of one scheduler pass.
#[derive(Debug, Default, Clone, Copy)]
pub struct TickReport {
    pub events_seen: u32,
    pub transitions_applied: u32,
    pub no_shows_marked: u64,
    pub failed_events: u32,
}

impl TickReport {
    /// The invoker's exit-code contract: non-zero when anything failed.
    pub fn is_clean(&self) -> bool {
        self.failed_events == 0
    }
}

/// The next ladder step due at `now`, if any. Pure; never skips a step and
/// never goes backwards.
pub fn next_transition(
    status: EventStatus,
    window: &EventWindow,
    now: NaiveDateTime,
) -> Option<EventStatus> {
    match status {
        EventStatus::Registration if now >= window.registration_closes_at() => {
            Some(EventStatus::RegistrationClosed)
        }
        EventStatus::RegistrationClosed if now >= window.results_at() => Some(EventStatus::Results),
        EventStatus::Results if now >= window.finished_at() => Some(EventStatus::Finished),
        _ => None,
    }
}

/// Whether the no-show sweep is due: the event is past open registration and
/// race day is over.
pub fn no_show_due(status: EventStatus, window: &EventWindow, now: NaiveDateTime) -> bool {
    status.rank() >= EventStatus::RegistrationClosed.rank() && now >= window.no_show_cutoff()
}

/// Run one scheduler pass against the given wall-clock instant.
pub async fn run_tick(
    db: &Database,
    parser: &dyn EventWindowParser,
    now: NaiveDateTime,
) -> Result<TickReport> {
    let events = db
        .list_events()
        .await
        .context("listing events for lifecycle tick")?;

    let mut report = TickReport::default();
    for event in events {
        report.events_seen += 1;
        match process_event(db, parser, &event, now).await {
            Ok((advanced, no_shows)) => {
                report.transitions_applied += advanced;
                report.no_shows_marked += no_shows;
            }
            Err(err) => {
                error!(event_id = event.id, "lifecycle tick failed: {err:#}");
                report.failed_events += 1;
            }
        }
    }
    info!(
        events = report.events_seen,
        transitions = report.transitions_applied,
        no_shows = report.no_shows_marked,
        failed = report.failed_events,
        "lifecycle tick complete"
    );
    Ok(report)
}

/// Advance one event by at most one ladder step, then run the no-show sweep
/// if due.
async fn process_event(
    db: &Database,
    parser: &dyn EventWindowParser,
    event: &EventRow,
    now: NaiveDateTime,
) -> Result<(u32, u64)> {
    let mut status = event
        .status()
        .ok_or_else(|| anyhow!("unknown event status {:?}", event.status))?;
    let window = parser.parse(&event.date_text)?;

    // At most one ladder step per tick. A stale event catches up over
    // successive runs, with every transition audited individually.
    let mut advanced = 0u32;
    if let Some(next) = next_transition(status, &window, now) {
        // The guard re-checks current status in the UPDATE itself; a false
        // return means another run got there first.
        if db.advance_event_status(event.id, status, next).await? {
            audit::emit(db, AuditRecord::status_advanced(event.id, status, next)).await;
            info!(event_id = event.id, from = %status, to = %next, "event status advanced");
            advanced = 1;
            status = next;
        }
    }

    let mut no_shows = 0u64;
    if no_show_due(status, &window, now) {
        no_shows = db.mark_no_shows(event.id).await?;
        if no_shows > 0 {
            audit::emit(db, AuditRecord::no_shows_marked(event.id, no_shows)).await;
            info!(event_id = event.id, count = no_shows, "no-shows marked");
        }
    }
    Ok((advanced, no_shows))
}

// ── Tests ───────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn window(start: (i32, u32, u32), end: (i32, u32, u32)) -> EventWindow {
        EventWindow {
            start: NaiveDate::from_ymd_opt(start.0, start.1, start.2).unwrap(),
            end: NaiveDate::from_ymd_opt(end.0, end.1, end.2).unwrap(),
        }
    }

    fn at(date: (i32, u32, u32), h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(date.0, date.1, date.2)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn registration_closes_one_hour_before_start() {
        let w = window((2025, 8, 10), (2025, 8, 10));
        // 09:30 on race day is past the 09:00 deadline.
        assert_eq!(
            next_transition(EventStatus::Registration, &w, at((2025, 8, 10), 9, 30)),
            Some(EventStatus::RegistrationClosed)
        );
        // 08:59 is not.
        assert_eq!(
            next_transition(EventStatus::Registration, &w, at((2025, 8, 10), 8, 59)),
            None
        );
    }

    #[test]
    fn results_open_at_midnight_of_end_date() {
        let w = window((2025, 8, 9), (2025, 8, 10));
        assert_eq!(
            next_transition(EventStatus::RegistrationClosed, &w, at((2025, 8, 10), 0, 0)),
            Some(EventStatus::Results)
        );
        assert_eq!(
            next_transition(EventStatus::RegistrationClosed, &w, at((2025, 8, 9), 23, 59)),
            None
        );
    }

    #[test]
    fn finished_one_calendar_month_after_results() {
        let w = window((2025, 8, 9), (2025, 8, 10));
        assert_eq!(
            next_transition(EventStatus::Results, &w, at((2025, 9, 10), 0, 0)),
            Some(EventStatus::Finished)
        );
        assert_eq!(
            next_transition(EventStatus::Results, &w, at((2025, 9, 9), 23, 59)),
            None
        );
    }

    #[test]
    fn finished_is_terminal() {
        let w = window((2025, 8, 9), (2025, 8, 10));
        assert_eq!(
            next_transition(EventStatus::Finished, &w, at((2030, 1, 1), 0, 0)),
            None
        );
    }

    #[test]
    fn transitions_never_regress() {
        let w = window((2025, 8, 9), (2025, 8, 10));
        let far_future = at((2030, 1, 1), 0, 0);
        for status in [
            EventStatus::Registration,
            EventStatus::RegistrationClosed,
            EventStatus::Results,
            EventStatus::Finished,
        ] {
            if let Some(next) = next_transition(status, &w, far_future) {
                assert!(next.rank() > status.rank());
                assert_eq!(status.next(), Some(next));
            }
        }
    }

    #[test]
    fn no_show_waits_for_day_after_start() {
        let w = window((2025, 8, 9), (2025, 8, 10));
        // Still race day: not due.
        assert!(!no_show_due(
            EventStatus::RegistrationClosed,
            &w,
            at((2025, 8, 9), 23, 59)
        ));
        // Midnight after the start date: due.
        assert!(no_show_due(
            EventStatus::RegistrationClosed,
            &w,
            at((2025, 8, 10), 0, 0)
        ));
    }

    #[test]
    fn no_show_never_fires_while_registration_open() {
        let w = window((2025, 8, 9), (2025, 8, 10));
        assert!(!no_show_due(
            EventStatus::Registration,
            &w,
            at((2030, 1, 1), 0, 0)
        ));
        for status in [
            EventStatus::RegistrationClosed,
            EventStatus::Results,
            EventStatus::Finished,
        ] {
            assert!(no_show_due(status, &w, at((2030, 1, 1), 0, 0)));
        }
    }
}
