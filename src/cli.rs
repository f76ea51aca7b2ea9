use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use healthcare_cost::RawInput;

#[derive(Parser, Debug)]
#[command(name = "healthcare-cost", version, about = "Healthcare cost predictor")]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml", global = true)]
    pub config: PathBuf,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Predict the cost for one patient
    Predict {
        #[command(flatten)]
        patient: PatientArgs,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Predict costs for JSON-lines input, one report per line
    Batch {
        /// Input file, or "-" for stdin
        #[arg(short, long, default_value = "-")]
        input: PathBuf,

        /// Write a Prometheus metrics snapshot here when done
        #[arg(short, long)]
        metrics: Option<PathBuf>,
    },

    /// Load the artifacts and check they agree with each other
    Check,

    /// Configuration management commands
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },

    /// Show version information
    Version,
}

/// Patient fields, taken as strings and validated by the pipeline
#[derive(Args, Debug, Clone)]
pub struct PatientArgs {
    #[arg(long, allow_hyphen_values = true)]
    pub age: String,

    #[arg(long)]
    pub bmi: String,

    #[arg(long, allow_hyphen_values = true)]
    pub children: String,

    /// yes or no
    #[arg(long)]
    pub smoker: String,

    /// male or female
    #[arg(long)]
    pub sex: String,

    /// northeast, northwest, southeast or southwest
    #[arg(long)]
    pub region: String,
}

impl From<PatientArgs> for RawInput {
    fn from(args: PatientArgs) -> Self {
        RawInput::new(
            args.age,
            args.bmi,
            args.children,
            args.smoker,
            args.sex,
            args.region,
        )
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommands {
    /// Display the effective configuration
    Show,

    /// Validate configuration file
    Validate,
}
