//! # engine_app — world demo driver
//!
//! Builds a small world from the command line, runs the standard queries
//! against it, and takes it through a snapshot/mutate/revert cycle.
//!
//! ## Run
//!
//! ```text
//! engine_app --entities 12 --dump
//! RUST_LOG=engine_world=debug engine_app --trace-events
//! ```

mod dump;
mod scenario;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use engine_world::{World, WorldConfig};

#[derive(Parser)]
#[command(name = "engine_app", about = "In-process entity world demo")]
struct Args {
    /// Number of entities to spawn
    #[arg(short, long, default_value_t = 8)]
    entities: usize,

    /// Log filter used when RUST_LOG is unset
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Log every world event at trace level
    #[arg(long)]
    trace_events: bool,

    /// Print the final world state as JSON
    #[arg(long)]
    dump: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .init();

    let config = WorldConfig::new("demo").with_trace_events(args.trace_events);
    let mut world = World::with_config(config);

    info!(entities = args.entities, "world demo starting");
    let report = scenario::run(&mut world, args.entities)?;
    info!(
        live = report.live,
        with_health = report.with_health,
        health_without_position = report.health_without_position,
        health_and_position = report.health_and_position,
        red_team = report.red_team,
        before_revert = report.before_revert,
        after_revert = report.after_revert,
        "world demo finished"
    );

    if args.dump {
        println!("{}", serde_json::to_string_pretty(&dump::world_to_json(&world))?);
    }
    Ok(())
}
