//! # CLI Execution Functions
//!
//! Extracted from `main.rs` to keep the entry point slim. Each subcommand
//! connects to the database, runs the corresponding library operation on a
//! Tokio runtime, and reports to stdout. `tick` exits non-zero when any
//! event failed its pass, so a cron wrapper can alert on it.

use anyhow::{anyhow, bail, Result};
use regatta::dates::RussianDateParser;
use regatta::db::Database;
use regatta::domain::EventStatus;
use regatta::{ledger, lifecycle};
use tokio::runtime::Runtime;
use tracing::info;

use super::{Cli, Commands};

pub fn run(cli: &Cli) -> Result<()> {
    let database_url = cli.database_url.as_deref().ok_or_else(|| {
        anyhow::anyhow!("DATABASE_URL is required (set via --database-url or env)")
    })?;

    let rt = Runtime::new()?;
    let db = rt.block_on(Database::connect(database_url))?;

    match &cli.command {
        Commands::Tick => run_tick(&rt, &db),
        Commands::Events { status } => run_events(&rt, &db, status.as_deref()),
        Commands::Audit { event_id, limit } => run_audit(&rt, &db, *event_id, *limit),
        Commands::Roster { team_id } => run_roster(&rt, &db, *team_id),
        Commands::Recompute { team_id } => run_recompute(&rt, &db, *team_id),
    }
}

fn run_tick(rt: &Runtime, db: &Database) -> Result<()> {
    let now = chrono::Local::now().naive_local();
    info!(%now, "starting lifecycle tick");
    let report = rt.block_on(lifecycle::run_tick(db, &RussianDateParser, now))?;
    println!(
        "events: {}, transitions: {}, no-shows: {}, failed: {}",
        report.events_seen,
        report.transitions_applied,
        report.no_shows_marked,
        report.failed_events
    );
    if !report.is_clean() {
        bail!("{} event(s) failed the lifecycle pass", report.failed_events);
    }
    Ok(())
}

fn run_events(rt: &Runtime, db: &Database, status: Option<&str>) -> Result<()> {
    let events = match status {
        Some(raw) => {
            let status = EventStatus::from_db_str(raw)
                .ok_or_else(|| anyhow!("unknown event status {raw:?}"))?;
            rt.block_on(db.list_events_with_status(status))?
        }
        None => rt.block_on(db.list_events())?,
    };
    if events.is_empty() {
        println!("no events");
        return Ok(());
    }
    for event in events {
        println!(
            "{:>6}  {:<22}  {:<24}  {}",
            event.id, event.status, event.date_text, event.title
        );
    }
    Ok(())
}

fn run_audit(rt: &Runtime, db: &Database, event_id: Option<i64>, limit: i64) -> Result<()> {
    let records = match event_id {
        Some(id) => rt.block_on(db.event_audit(id))?,
        None => rt.block_on(db.recent_audit(limit))?,
    };
    if records.is_empty() {
        println!("no audit records");
        return Ok(());
    }
    for record in records.into_iter().take(limit.max(0) as usize) {
        println!(
            "{:>6}  {:<8}  {:<24}  {}",
            record.id, record.severity, record.kind, record.description
        );
    }
    Ok(())
}

fn run_roster(rt: &Runtime, db: &Database, team_id: i64) -> Result<()> {
    let missing = rt.block_on(ledger::roster_completeness(db, team_id))?;
    if missing.is_empty() {
        println!("team {team_id}: roster complete");
        return Ok(());
    }
    for slot in missing {
        let marker = if slot.blocking { "required" } else { "optional" };
        println!(
            "team {team_id}: missing {} x{} ({marker}): {}",
            slot.role, slot.shortfall, slot.description
        );
    }
    Ok(())
}

fn run_recompute(rt: &Runtime, db: &Database, team_id: i64) -> Result<()> {
    rt.block_on(ledger::recompute_team_costs(db, team_id))?;
    let registrations = rt.block_on(db.get_team_registrations(team_id))?;
    for registration in registrations {
        println!(
            "registration {:>6}  participant {:>6}  {:>10} minor units",
            registration.id, registration.participant_id, registration.cost_minor
        );
    }
    Ok(())
}
