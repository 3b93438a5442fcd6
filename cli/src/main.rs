mod cli;
mod commands;

use cli::{Cli, Commands};
use commands::{pipeline, stats};
use tracing_subscriber::{fmt, EnvFilter};

fn init_logging(cli: &Cli) {
    let level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    if cli.log_json {
        fmt().with_env_filter(filter).json().init();
    } else {
        fmt().with_env_filter(filter).with_target(false).init();
    }
}

pub fn run() -> anyhow::Result<()> {
    use clap::Parser;

    let cli = Cli::parse();
    init_logging(&cli);
    match &cli.command {
        Commands::Run(args) => pipeline::run_all(args),
        Commands::Features(args) => pipeline::features(args),
        Commands::Cluster(args) => pipeline::cluster(args),
        Commands::Classify(args) => pipeline::classify(args),
        Commands::Stats(args) => stats::run(args),
    }
}

fn main() -> anyhow::Result<()> { run() }
