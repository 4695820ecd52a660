//! # Main — CLI Entry Point
//!
//! Routes CLI subcommands to the library. Handles shared concerns: environment
//! loading, structured logging setup, and the Tokio runtime.
//!
//! ## Subcommands
//!
//! - `tick`: run one lifecycle pass (status advancement + no-show sweep);
//!   intended to be invoked from cron or a systemd timer.
//! - `events`: list events, optionally filtered by lifecycle status.
//! - `roster`: print a team's crew completeness report.
//! - `recompute`: force a cost reallocation for a team.
//! - `audit`: show recent audit records, optionally for one event.
//!
//! ## Global Options
//!
//! - `--database-url` / `DATABASE_URL`: PostgreSQL connection.

mod cli;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "regatta", about = "Regatta registration and event lifecycle core")]
struct Cli {
    /// PostgreSQL connection URL (or set DATABASE_URL env var)
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one lifecycle pass: advance event statuses and mark no-shows
    Tick,
    /// List events and their lifecycle statuses
    Events {
        /// Only events currently in this status (registration,
        /// registration_closed, results, finished)
        #[arg(long)]
        status: Option<String>,
    },
    /// Show recent audit records, newest first
    Audit {
        /// Only records for this event
        #[arg(long)]
        event_id: Option<i64>,
        /// Maximum number of records to show
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },
    /// Print a team's roster completeness report
    Roster {
        /// Team to inspect
        #[arg(long)]
        team_id: i64,
    },
    /// Recompute per-member costs for a team from its current occupancy
    Recompute {
        /// Team to recompute
        #[arg(long)]
        team_id: i64,
    },
}

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    // Initialize structured logging: LOG_FORMAT=json for K8s, human-readable otherwise
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_default();
    if log_format == "json" {
        tracing_subscriber::fmt().json().with_target(false).init();
    } else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
    }

    let cli = Cli::parse();
    cli::run(&cli)
}
