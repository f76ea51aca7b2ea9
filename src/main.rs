use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;

use healthcare_cost::init_tracing;

fn main() -> Result<()> {
    // Parse CLI arguments
    let args = cli::Cli::parse();

    init_tracing(args.log_json);

    // Dispatch to appropriate command handler
    match args.command {
        cli::Commands::Predict { patient, json } => {
            commands::predict::execute(&args.config, patient.into(), json)?;
        }
        cli::Commands::Batch { input, metrics } => {
            commands::batch::execute(&args.config, &input, metrics.as_deref())?;
        }
        cli::Commands::Check => {
            commands::check::execute(&args.config)?;
        }
        cli::Commands::Config { action } => match action {
            cli::ConfigCommands::Show => commands::config::show(&args.config)?,
            cli::ConfigCommands::Validate => commands::config::validate(&args.config)?,
        },
        cli::Commands::Version => {
            println!("Healthcare Cost v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
