//! `booking` CLI: query a ledger snapshot from the command line.
//!
//! ## Usage
//!
//! ```sh
//! # Is the hall free from 09:00 to 11:00? Alternatives are listed if not.
//! booking -l ledger.json check --type facility --id 1 --date 2026-03-10 --start 09:00 --end 11:00
//!
//! # Only the alternatives
//! booking -l ledger.json suggest --type vehicle --id 4 --date 2026-03-10 \
//!   --start 13:00 --end 15:00 --passengers 6
//!
//! # Can 4 folding chairs be borrowed on that date?
//! booking -l ledger.json check --type item --id 5 --date 2026-03-10 --quantity 4
//!
//! # Ranked recommendations for requester 7
//! booking -l ledger.json recommend --type facility --requester 7 --date 2026-03-10 \
//!   --start 14:00 --end 16:00
//!
//! # The bookable slots of one day
//! booking -l ledger.json slots --type facility --id 1 --date 2026-03-10
//!
//! # Engine tunables from TOML, pinned clock, verbose logs
//! cat ledger.json | booking --config engine.toml --now 2026-03-01T08:00:00 \
//!   --log-level debug slots ...
//! ```

use std::io::{self, Read};

use anyhow::{bail, Context, Result};
use booking_engine::model::{ResourceId, ResourceType, TimeWindow};
use booking_engine::{
    AvailabilityRequest, Clock, Engine, EngineConfig, InMemoryLedger, RecommendationRequest,
    Requirement,
};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "booking",
    version,
    about = "Resource availability and recommendation CLI"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Ledger snapshot as JSON (reads from stdin if omitted)
    #[arg(short, long, global = true)]
    ledger: Option<String>,

    /// Engine configuration as TOML
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Pin the current local time, e.g. 2026-03-01T08:00:00
    #[arg(long, global = true)]
    now: Option<NaiveDateTime>,

    /// Output file (writes to stdout if omitted)
    #[arg(short, long, global = true)]
    output: Option<String>,

    /// Log filter, e.g. "debug" (defaults to RUST_LOG, then "warn")
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check one resource for conflicts, with alternatives when it is taken
    Check(BookingArgs),
    /// List alternative slots or dates for one resource
    Suggest(BookingArgs),
    /// Rank the available resources of a type for a requester
    Recommend(RecommendArgs),
    /// Show the bookable slots of one day for a facility or vehicle
    Slots {
        /// Resource type: facility or vehicle
        #[arg(long = "type", value_name = "TYPE")]
        resource_type: ResourceType,
        #[arg(long)]
        id: ResourceId,
        #[arg(long)]
        date: NaiveDate,
    },
}

#[derive(Args)]
struct BookingArgs {
    /// Resource type: facility, vehicle or item
    #[arg(long = "type", value_name = "TYPE")]
    resource_type: ResourceType,
    #[arg(long)]
    id: ResourceId,
    #[arg(long)]
    date: NaiveDate,
    #[command(flatten)]
    window: WindowArgs,
    /// Passengers (vehicles)
    #[arg(long, default_value_t = 1)]
    passengers: u32,
    /// Units to borrow (items)
    #[arg(long, default_value_t = 1)]
    quantity: u32,
    /// Requester, enables risk predictions when a model is attached
    #[arg(long)]
    requester: Option<u64>,
}

#[derive(Args)]
struct RecommendArgs {
    /// Resource type: facility, vehicle or item
    #[arg(long = "type", value_name = "TYPE")]
    resource_type: ResourceType,
    #[arg(long)]
    requester: u64,
    #[arg(long)]
    date: NaiveDate,
    #[command(flatten)]
    window: WindowArgs,
    #[arg(long, default_value_t = 1)]
    passengers: u32,
    #[arg(long, default_value_t = 1)]
    quantity: u32,
}

#[derive(Args)]
struct WindowArgs {
    /// Window start, HH:MM
    #[arg(long, value_parser = parse_clock, requires = "end")]
    start: Option<NaiveTime>,
    /// Window end, HH:MM
    #[arg(long, value_parser = parse_clock, requires = "start")]
    end: Option<NaiveTime>,
}

impl WindowArgs {
    fn window(&self) -> Result<Option<TimeWindow>> {
        match (self.start, self.end) {
            (Some(start), Some(end)) => Ok(Some(TimeWindow::new(start, end)?)),
            _ => Ok(None),
        }
    }
}

impl BookingArgs {
    fn request(&self) -> Result<AvailabilityRequest> {
        let requirement = if self.resource_type.is_pooled() {
            Requirement::Units {
                quantity: self.quantity,
            }
        } else {
            let Some(window) = self.window.window()? else {
                bail!("--start and --end are required for {} bookings", self.resource_type);
            };
            Requirement::Window {
                window,
                passengers: self.passengers,
            }
        };
        Ok(AvailabilityRequest {
            resource_type: self.resource_type,
            resource_id: self.id,
            date: self.date,
            requirement,
            requester_id: self.requester,
        })
    }
}

impl RecommendArgs {
    fn request(&self) -> Result<RecommendationRequest> {
        let mut request = RecommendationRequest::new(self.resource_type, self.requester, self.date)
            .with_quantity(self.quantity)
            .with_passengers(self.passengers);
        if let Some(window) = self.window.window()? {
            request = request.with_window(window);
        }
        Ok(request)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref());

    let ledger = read_input(cli.ledger.as_deref())?;
    let ledger = InMemoryLedger::from_json(&ledger).context("Failed to parse ledger JSON")?;
    let config = load_config(cli.config.as_deref())?;
    let clock = cli.now.map_or(Clock::System, Clock::Fixed);

    info!(
        resources = ledger.resources.len(),
        reservations = ledger.reservations.len(),
        "ledger loaded"
    );
    let engine = Engine::over(&ledger)
        .with_config(config)
        .context("Invalid engine configuration")?
        .with_clock(clock);

    let rendered = match &cli.command {
        Commands::Check(args) => {
            let report = engine
                .check_availability(&args.request()?)
                .context("Availability check failed")?;
            to_json(&report)?
        }
        Commands::Suggest(args) => {
            let suggestions = engine
                .suggest_alternatives(&args.request()?)
                .context("Failed to plan alternatives")?;
            to_json(&suggestions)?
        }
        Commands::Recommend(args) => {
            let report = engine
                .get_recommendations(&args.request()?)
                .context("Failed to build recommendations")?;
            to_json(&report)?
        }
        Commands::Slots {
            resource_type,
            id,
            date,
        } => {
            let grid = engine
                .day_grid(*resource_type, *id, *date)
                .context("Failed to build the day grid")?;
            to_json(&grid)?
        }
    };

    write_output(cli.output.as_deref(), &rendered)
}

fn init_logging(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn load_config(path: Option<&str>) -> Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path))?;
    toml::from_str(&raw).with_context(|| format!("Invalid config file: {}", path))
}

/// Accepts `HH:MM` or `HH:MM:SS`.
fn parse_clock(s: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .map_err(|_| format!("expected HH:MM, got '{}'", s))
}

fn to_json<T: Serialize>(value: &T) -> Result<String> {
    let mut json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    json.push('\n');
    Ok(json)
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

fn write_output(path: Option<&str>, content: &str) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write file: {}", path))?;
        }
        None => {
            print!("{}", content);
        }
    }
    Ok(())
}
