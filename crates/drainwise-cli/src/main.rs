use std::path::PathBuf;

use clap::{Parser, Subcommand};
use drainwise_disruption::{Clock, FakeClock, RankOptions, SystemClock};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod snapshot;

use config::{DrainwiseConfig, OutputFormat};

#[derive(Parser)]
#[command(
    name = "drainwise",
    about = "drainwise: disruption cost and replacement pricing for node consolidation",
    version,
    propagate_version = true,
)]
struct Cli {
    /// Path to drainwise.toml (default: ./drainwise.toml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output format, overriding [output].format
    #[arg(short, long, global = true, value_enum)]
    format: Option<OutputFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank disruption candidates, cheapest to disrupt first
    Rank {
        /// Snapshot JSON file
        #[arg(short, long)]
        snapshot: PathBuf,
        /// Evaluate as of this Unix time (seconds) instead of now
        #[arg(long)]
        now: Option<u64>,
        /// Do not scale costs by remaining node lifetime
        #[arg(long)]
        no_decay: bool,
    },
    /// List instance types strictly cheaper than a candidate's current offering
    Replacements {
        /// Snapshot JSON file
        #[arg(short, long)]
        snapshot: PathBuf,
        /// Candidate node name
        #[arg(short, long)]
        node: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = DrainwiseConfig::load(cli.config.as_deref())?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log.filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let format = cli.format.unwrap_or(config.output.format);

    match cli.command {
        Commands::Rank {
            snapshot,
            now,
            no_decay,
        } => {
            let clock: Box<dyn Clock> = match now {
                Some(secs) => Box::new(FakeClock::at_epoch_secs(secs)),
                None => Box::new(SystemClock),
            };
            let options = RankOptions {
                apply_lifetime_decay: config.ranking.apply_lifetime_decay && !no_decay,
            };
            commands::rank::rank(&snapshot, clock.as_ref(), options, format)
        }
        Commands::Replacements { snapshot, node } => {
            commands::replacements::replacements(&snapshot, &node, format)
        }
    }
}
