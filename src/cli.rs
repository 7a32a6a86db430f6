use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "snapcull")]
#[command(about = "A retention planner for snapshot histories")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Compute and display the keep/delete plan without deleting anything
    Plan(RunArgs),

    /// Compute the plan and delete every snapshot not kept
    Apply(RunArgs),

    /// Pin a snapshot so every future plan retains it
    Pin(PinArgs),

    /// Remove a pin set earlier
    Unpin(PinArgs),
}

#[derive(Parser)]
pub struct RunArgs {
    /// Path to the state file (defaults to the platform data directory)
    #[arg(long)]
    pub state: Option<PathBuf>,

    /// Profile whose generations are planned over
    #[arg(long)]
    pub profile: Option<PathBuf>,

    /// Git repository consulted for content deltas
    #[arg(long)]
    pub repo: Option<PathBuf>,

    /// Smoothing bandwidth for the activity curve, e.g. "12h" or "1d"
    #[arg(long)]
    pub sigma: Option<String>,

    /// Output as JSON instead of table
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Show detailed output including diagnostics
    #[arg(long, short = 'v', default_value_t = false)]
    pub verbose: bool,
}

#[derive(Parser)]
pub struct PinArgs {
    /// Snapshot id to pin or unpin
    pub id: u64,

    /// Path to the state file (defaults to the platform data directory)
    #[arg(long)]
    pub state: Option<PathBuf>,
}
