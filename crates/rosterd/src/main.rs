//! rosterd - attendance service for clinical rosters
//!
//! This is the main entry point. It wires together all the components:
//! - Configuration loading (policy + shift catalog)
//! - Ledger initialization
//! - The attendance engine and reconciler
//! - CLI subcommands for the exposed operations

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use clap::{Parser, Subcommand};
use roster_core::{AttendanceEngine, Reconciler};
use roster_store::{
    AuditEvent, AuditEventType, Ledger, ShiftAssignment, SqliteLedger,
};
use roster_util::{AssignmentId, Clock, StaffId, SystemClock, TemplateId};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// rosterd - attendance validation and work-time accounting for clinical rosters
#[derive(Parser, Debug)]
#[command(name = "rosterd")]
#[command(about = "Attendance validation and work-time accounting for clinical rosters", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "/etc/rosterd/config.toml")]
    config: PathBuf,

    /// Data directory override (or set ROSTERD_DATA_DIR env var)
    #[arg(short, long, env = "ROSTERD_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Record a staff check-in
    CheckIn {
        /// Staff member ID
        #[arg(long)]
        staff: String,

        /// Reference instant (YYYY-MM-DD HH:MM); defaults to the system clock
        #[arg(long)]
        at: Option<String>,

        /// Opaque check-in location
        #[arg(long)]
        location: Option<String>,
    },

    /// Record a staff check-out
    CheckOut {
        #[arg(long)]
        staff: String,

        #[arg(long)]
        at: Option<String>,

        #[arg(long)]
        location: Option<String>,
    },

    /// Show attendance status for a staff member
    Status {
        #[arg(long)]
        staff: String,

        #[arg(long)]
        at: Option<String>,
    },

    /// Record a shift assignment in the roster
    Assign {
        /// Assignment ID
        #[arg(long)]
        id: String,

        #[arg(long)]
        staff: String,

        /// Assignment date (YYYY-MM-DD)
        #[arg(long)]
        date: String,

        /// Shift template ID from the catalog
        #[arg(long)]
        template: String,

        #[arg(long)]
        unit: Option<String>,

        #[arg(long)]
        role: Option<String>,
    },

    /// List recent sessions for a staff member
    Sessions {
        #[arg(long)]
        staff: String,

        #[arg(long, default_value_t = 20)]
        limit: usize,
    },

    /// Close stale open sessions
    Reconcile {
        /// Sweep instant (YYYY-MM-DD HH:MM); defaults to the system clock
        #[arg(long)]
        as_of: Option<String>,
    },

    /// Show recent audit events
    Audit {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging to stderr; stdout carries the JSON results
    let filter = EnvFilter::try_new(&args.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = roster_config::load_config(&args.config)
        .with_context(|| format!("Failed to load config from {:?}", args.config))?;

    info!(
        config_path = %args.config.display(),
        template_count = config.catalog.len(),
        "Configuration loaded"
    );

    let data_dir = args
        .data_dir
        .clone()
        .unwrap_or_else(|| config.service.data_dir.clone());
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create data directory {:?}", data_dir))?;

    let db_path = data_dir.join("rosterd.db");
    let ledger: Arc<dyn Ledger> = Arc::new(
        SqliteLedger::open(&db_path)
            .with_context(|| format!("Failed to open ledger {:?}", db_path))?,
    );

    info!(db_path = %db_path.display(), "Ledger initialized");

    let clock = SystemClock;
    let _ = ledger.append_audit(AuditEvent::new(
        clock.now(),
        AuditEventType::PolicyLoaded {
            template_count: config.catalog.len(),
        },
    ));

    let engine = AttendanceEngine::new(
        config.catalog.clone(),
        config.policy.clone(),
        ledger.clone(),
    );

    match args.command {
        Command::CheckIn { staff, at, location } => {
            let now = resolve_instant(at.as_deref(), &clock)?;
            let outcome = engine.check_in(&StaffId::new(staff), now, location)?;
            print_json(&outcome)
        }
        Command::CheckOut { staff, at, location } => {
            let now = resolve_instant(at.as_deref(), &clock)?;
            let outcome = engine.check_out(&StaffId::new(staff), now, location)?;
            print_json(&outcome)
        }
        Command::Status { staff, at } => {
            let now = resolve_instant(at.as_deref(), &clock)?;
            let snapshot = engine.status(&StaffId::new(staff), now)?;
            print_json(&snapshot)
        }
        Command::Assign {
            id,
            staff,
            date,
            template,
            unit,
            role,
        } => {
            let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
                .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", date))?;
            let template_id = TemplateId::new(template);
            if config.catalog.get(&template_id).is_none() {
                anyhow::bail!("Unknown shift template: {}", template_id);
            }

            let assignment = ShiftAssignment {
                id: AssignmentId::new(id),
                staff_id: StaffId::new(staff),
                date,
                template_id,
                unit,
                role,
            };
            engine.record_assignment(&assignment, clock.now())?;
            print_json(&assignment)
        }
        Command::Sessions { staff, limit } => {
            let sessions = ledger.sessions_for(&StaffId::new(staff), limit)?;
            let infos: Vec<_> = sessions.iter().map(|s| s.to_info()).collect();
            print_json(&infos)
        }
        Command::Reconcile { as_of } => {
            let as_of = resolve_instant(as_of.as_deref(), &clock)?;
            let reconciler = Reconciler::new(
                config.catalog.clone(),
                config.policy.clone(),
                ledger.clone(),
            );
            let report = reconciler.run(as_of)?;
            print_json(&report)
        }
        Command::Audit { limit } => {
            let events = ledger.recent_audits(limit)?;
            print_json(&events)
        }
    }
}

/// Parse an explicit `--at` instant, or fall back to the clock
fn resolve_instant(at: Option<&str>, clock: &dyn Clock) -> Result<NaiveDateTime> {
    match at {
        Some(s) => parse_instant(s),
        None => Ok(clock.now()),
    }
}

fn parse_instant(s: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M"))
        .with_context(|| format!("Invalid instant '{}', expected YYYY-MM-DD HH:MM", s))
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
