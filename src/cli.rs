use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "portfolio-timeline", version, about = "Swimlane timeline for phases, milestones and deliverables")]
pub struct Cli {
    /// Project JSON to open instead of the built-in sample
    #[arg(long)]
    pub project: Option<PathBuf>,
    /// Simulated save round trip, overriding the settings file
    #[arg(long)]
    pub latency_ms: Option<u64>,
    /// Settings file (defaults to the per-user config directory)
    #[arg(long)]
    pub config: Option<PathBuf>,
}
