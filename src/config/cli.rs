use clap::{Parser, Subcommand};

#[derive(Debug, Clone, Parser)]
#[command(name = "estate-reports")]
#[command(about = "Admin reporting ETL for the property tokenization platform")]
pub struct Cli {
    /// Base URL of the platform REST API; overrides the TOML config.
    #[arg(long)]
    pub base_url: Option<String>,

    /// Directory where generated artifacts are written.
    #[arg(long)]
    pub output_path: Option<String>,

    /// Optional TOML configuration file (field chains, endpoints).
    #[arg(long)]
    pub config: Option<String>,

    /// Keep only the most recent N chart points.
    #[arg(long)]
    pub chart_window: Option<usize>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Generate a paginated PDF report for one entity.
    Report {
        /// Entity kind: property, organization or user.
        #[arg(long)]
        kind: String,

        /// Entity id or code to look up in the fetched collection.
        #[arg(long)]
        id: String,
    },
    /// Export the canonical investment-volume time series as CSV.
    Chart,
}
