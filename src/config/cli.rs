use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "visit-wrangler")]
#[command(about = "Readmission detection and periodic export concatenation for visit tables")]
pub struct CliConfig {
    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Find visits readmitted within a day threshold of a previous discharge
    Readmission(ReadmissionArgs),
    /// Stack the same export from several period folders into one table
    Concat(ConcatArgs),
}

#[derive(Debug, Clone, Args)]
pub struct ReadmissionArgs {
    /// Visit table (.xlsx, .xls, .csv or .tsv)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Override readmission.days_threshold
    #[arg(long)]
    pub days: Option<i64>,

    /// Override readmission.emergency (all, Y or N)
    #[arg(long)]
    pub emergency: Option<String>,

    /// Write the report as JSON to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
pub struct ConcatArgs {
    /// Override concat.folder
    #[arg(long)]
    pub folder: Option<String>,

    /// Override concat.file_name
    #[arg(long)]
    pub file_name: Option<String>,

    /// Override concat.periods, e.g. 202401,202402
    #[arg(long, value_delimiter = ',')]
    pub periods: Vec<String>,

    /// Override concat.features
    #[arg(long, value_delimiter = ',')]
    pub features: Vec<String>,

    /// Write the assembled table as CSV here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}
