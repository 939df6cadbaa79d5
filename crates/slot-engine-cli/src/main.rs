//! `slots` CLI: compute bookable slots and check bookings from JSON requests.
//!
//! ## Usage
//!
//! ```sh
//! # Compute slots (stdin → stdout)
//! echo '{"start":"2024-01-01T00:00:00Z","end":"2024-01-02T00:00:00Z"}' | slots compute
//!
//! # From file to file, pretty-printed, with a pinned clock
//! slots compute -i request.json -o slots.json --pretty --now 2024-01-01T00:00:00Z
//!
//! # Check whether a session can be booked
//! slots check -i booking.json
//!
//! # Check whether a session can still be canceled
//! slots cancel -i session.json
//! ```
//!
//! Diagnostics go to stderr; set `--log-level debug` or `SLOTS_LOG=debug` to
//! see how each day was grouped.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use slot_engine::request::parse_datetime;
use slot_engine::{BookingCheck, CancellationCheck, SlotRequest};
use std::io::{self, Read};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "slots", version, about = "Bookable slot computation CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log filter (e.g. "debug", "slot_engine=trace")
    #[arg(long, env = "SLOTS_LOG", default_value = "warn", global = true)]
    log_level: String,

    /// Evaluate as if the current time were this ISO 8601 instant
    /// (overrides any `now` in the input)
    #[arg(long, global = true)]
    now: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute bookable slots grouped by day
    Compute {
        /// Input request file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Output file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
        /// Override the request's slot length in minutes
        #[arg(long)]
        slot_minutes: Option<i64>,
        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },
    /// Check whether a session request can be booked
    Check {
        /// Input booking file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
    },
    /// Check whether a session can still be canceled
    Cancel {
        /// Input session file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level)?;

    let pinned = cli
        .now
        .as_deref()
        .map(|raw| {
            parse_datetime(raw)
                .map(|dt| dt.with_timezone(&Utc))
                .with_context(|| format!("Invalid --now value: {}", raw))
        })
        .transpose()?;
    let now = pinned.unwrap_or_else(Utc::now);
    debug!(%now, pinned = pinned.is_some(), "evaluating");

    match cli.command {
        Commands::Compute {
            input,
            output,
            slot_minutes,
            pretty,
        } => {
            let json = read_input(input.as_deref())?;
            let mut request =
                SlotRequest::from_json(&json).context("Failed to parse slot request")?;
            if slot_minutes.is_some() {
                request.slot_minutes = slot_minutes;
            }
            if let Some(pinned) = pinned {
                request.now = Some(pinned.to_rfc3339());
            }

            let groups = request.compute(now).context("Failed to compute slots")?;
            info!(days = groups.len(), "slots computed");

            let rendered = if pretty {
                serde_json::to_string_pretty(&groups)?
            } else {
                serde_json::to_string(&groups)?
            };
            write_output(output.as_deref(), &rendered)?;
        }
        Commands::Check { input } => {
            let json = read_input(input.as_deref())?;
            let mut check =
                BookingCheck::from_json(&json).context("Failed to parse booking check")?;
            if pinned.is_some() {
                check.now = pinned;
            }
            let admission = check.evaluate(now).context("Booking rejected")?;
            println!("{}", serde_json::to_string(&admission)?);
        }
        Commands::Cancel { input } => {
            let json = read_input(input.as_deref())?;
            let mut check = CancellationCheck::from_json(&json)
                .context("Failed to parse cancellation check")?;
            if pinned.is_some() {
                check.now = pinned;
            }
            check.evaluate(now).context("Cancellation rejected")?;
            println!("ok");
        }
    }

    Ok(())
}

fn init_logging(filter: &str) -> Result<()> {
    let filter =
        EnvFilter::try_new(filter).with_context(|| format!("Invalid log filter: {}", filter))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
    Ok(())
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
            println!("{}", content);
        }
    }
    Ok(())
}
