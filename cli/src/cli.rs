use std::path::PathBuf;

use blockatlas::BoundaryType;

/// Building footprint pipeline CLI (argument schema only)
#[derive(clap::Parser, Debug)]
#[command(name = "blockatlas", version, about, propagate_version = true)]
pub struct Cli {
    /// Increase output verbosity (-v, -vv); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Emit log lines as JSON
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Run feature engineering, block clustering and classification in order
    Run(PipelineArgs),

    /// Engineer shape features for every pending municipality
    Features(PipelineArgs),

    /// Cluster every pending district into building blocks
    Cluster(PipelineArgs),

    /// Refine unclassified buildings of every pending district
    Classify(PipelineArgs),

    /// Write per-category statistics of one classified district
    Stats(StatsArgs),
}

#[derive(clap::Args, Debug)]
pub struct PipelineArgs {
    /// JSON configuration file; defaults apply when omitted
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Unit keying, overrides the configuration
    #[arg(long, value_enum)]
    pub boundary: Option<BoundaryTypeArg>,

    /// Units processed concurrently
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Minimum buildings per block
    #[arg(long)]
    pub min_cluster_size: Option<usize>,

    #[arg(long)]
    pub min_samples: Option<usize>,

    /// Block split suppression distance in metres
    #[arg(long)]
    pub epsilon: Option<f64>,
}

#[derive(clap::Args, Debug)]
pub struct StatsArgs {
    /// District code, e.g. 09162
    pub district: String,

    #[command(flatten)]
    pub pipeline: PipelineArgs,

    /// Output CSV, defaults to "./stats_<district>.csv"
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,
}

/// `--boundary` value.
#[derive(clap::ValueEnum, Clone, Copy, Debug)]
pub enum BoundaryTypeArg {
    Ags,
    Plz,
}

impl From<BoundaryTypeArg> for BoundaryType {
    fn from(arg: BoundaryTypeArg) -> Self {
        match arg {
            BoundaryTypeArg::Ags => BoundaryType::Ags,
            BoundaryTypeArg::Plz => BoundaryType::Plz,
        }
    }
}
